//! Citation data model

mod ids;
mod position;
mod record;
mod state;

pub use ids::{CitationId, DocumentId};
pub use position::PositionIndex;
pub use record::{Citation, CitationItem, CitationProperties, CitationStore, Mode};
pub use state::CitationState;
