//! citesupport CLI: inspect and repair persisted citation state.
//!
//! Usage:
//!   citesupport reconcile <doc.json> [--db path] [--config file]
//!   citesupport render <doc.json>
//!   citesupport records <list|clear|documents> [document-id] [--db path]

use citesupport::{
    CitationStorage, CiteConfig, CiteSupport, DocumentId, MemoryDocument, MockProcessor, OpenStorage,
    SqliteStorage,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "citesupport",
    version,
    about = "Citation state synchronization for documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Log protocol and repair steps
    #[arg(short, long, global = true)]
    verbose: bool,
    /// YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a document snapshot against its persisted citation data
    Reconcile {
        /// Document snapshot (JSON)
        document: PathBuf,
        /// Path to SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
        /// Report repairs without writing anything back
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the HTML rendering of a document snapshot
    Render {
        /// Document snapshot (JSON)
        document: PathBuf,
    },
    /// Inspect persisted citation data
    Records {
        #[command(subcommand)]
        action: RecordsAction,
        /// Path to SQLite database file
        #[arg(long, global = true)]
        db: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum RecordsAction {
    /// List stored citations and records for a document
    List {
        document_id: String,
    },
    /// Drop all citation data for a document
    Clear {
        document_id: String,
    },
    /// List documents with stored citation data
    Documents,
}

/// Get the default database path (~/.local/share/citesupport/citesupport.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let app_dir = data_dir.join("citesupport");
    std::fs::create_dir_all(&app_dir).ok();
    app_dir.join("citesupport.db")
}

fn open_storage(db: Option<PathBuf>) -> Result<SqliteStorage, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    SqliteStorage::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))
}

fn read_document(path: &Path) -> Result<MemoryDocument, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid document '{}': {}", path.display(), e))
}

fn write_document(path: &Path, doc: &MemoryDocument) -> Result<(), String> {
    let text = serde_json::to_string_pretty(doc).map_err(|e| e.to_string())?;
    std::fs::write(path, text).map_err(|e| format!("cannot write '{}': {}", path.display(), e))
}

fn cmd_reconcile(config: CiteConfig, path: &Path, db: Option<PathBuf>, dry_run: bool) -> i32 {
    let doc = match read_document(path) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let storage: Arc<dyn CitationStorage> = if dry_run {
        // Work on a copy so nothing is written back
        match copy_to_memory(&doc, db) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    } else {
        match open_storage(db) {
            Ok(s) => Arc::new(s),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    };

    // Reconciliation never reaches the processor
    let mut cs = CiteSupport::new(config, doc, storage, Arc::new(MockProcessor::unavailable()));
    let report = match cs.spoof_document() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    if report.restored_slots > 0 {
        println!("Restored {} slot(s) at pegs", report.restored_slots);
    }
    if report.reset {
        println!("Citation state reset; all citation slots removed");
    } else {
        println!("{} citation(s) reconciled", cs.state().store().len());
    }

    if dry_run {
        return 0;
    }
    match write_document(path, cs.document()) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

/// In-memory copy of everything stored for `doc`
fn copy_to_memory(doc: &MemoryDocument, db: Option<PathBuf>) -> Result<Arc<dyn CitationStorage>, String> {
    use citesupport::DocumentHost;

    let source = open_storage(db)?;
    let copy = citesupport::MemoryStorage::new();
    let id = doc.document_id();
    let copy_err = |e: citesupport::StorageError| e.to_string();
    if let Some(store) = source.load_store(id).map_err(copy_err)? {
        copy.save_store(id, &store).map_err(copy_err)?;
    }
    for record in source.load_records(id).map_err(copy_err)? {
        copy.put_record(id, &record).map_err(copy_err)?;
    }
    if let Some(settings) = source.load_settings(id).map_err(copy_err)? {
        copy.save_settings(id, &settings).map_err(copy_err)?;
    }
    if let Some(pegs) = source.load_peg_positions(id).map_err(copy_err)? {
        copy.save_peg_positions(id, &pegs).map_err(copy_err)?;
    }
    Ok(Arc::new(copy))
}

fn cmd_render(path: &Path) -> i32 {
    match read_document(path) {
        Ok(doc) => {
            println!("{}", doc.to_html());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_records_list(storage: &SqliteStorage, document_id: &str) -> i32 {
    let id = DocumentId::from(document_id);
    let result = (|| -> Result<(), citesupport::StorageError> {
        if let Some(settings) = storage.load_settings(&id)? {
            println!(
                "style: {}  mode: {}",
                settings.style_id.as_deref().unwrap_or("-"),
                settings.mode.map(|m| m.to_string()).unwrap_or_else(|| "-".into())
            );
        }
        match storage.load_store(&id)? {
            Some(store) => {
                println!("{:>5}  {:<40}  {:>5}", "INDEX", "CITATION ID", "ITEMS");
                println!("{}", "-".repeat(54));
                for (i, citation) in store.iter().enumerate() {
                    let cid = citation.id().map(|c| c.to_string()).unwrap_or_else(|| "-".into());
                    println!("{:>5}  {:<40}  {:>5}", i, cid, citation.citation_items.len());
                }
            }
            None => println!("No stored citations."),
        }
        let records = storage.load_records(&id)?;
        println!("{} record(s)", records.len());
        for record in records {
            let status = if record.decode().is_ok() { "ok" } else { "undecodable" };
            println!("  {:<40}  {}", record.citation_id.as_str(), status);
        }
        Ok(())
    })();
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_records_clear(storage: &SqliteStorage, document_id: &str) -> i32 {
    match storage.clear_citations(&DocumentId::from(document_id)) {
        Ok(()) => {
            println!("Cleared citation data for '{}'", document_id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_records_documents(storage: &SqliteStorage) -> i32 {
    match storage.list_documents() {
        Ok(ids) if ids.is_empty() => {
            println!("No documents with citation data.");
            0
        }
        Ok(ids) => {
            for id in ids {
                println!("{}", id);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => match CiteConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => CiteConfig::default(),
    };

    let level = if cli.verbose || config.debug { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let code = match cli.command {
        Commands::Reconcile { document, db, dry_run } => cmd_reconcile(config, &document, db, dry_run),
        Commands::Render { document } => cmd_render(&document),
        Commands::Records { action, db } => {
            let storage = match open_storage(db) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            match action {
                RecordsAction::List { document_id } => cmd_records_list(&storage, &document_id),
                RecordsAction::Clear { document_id } => cmd_records_clear(&storage, &document_id),
                RecordsAction::Documents => cmd_records_documents(&storage),
            }
        }
    };
    std::process::exit(code);
}
