//! Bibliography replacement and layout hints

use super::ensure_container;
use crate::document::{
    Container, DocumentHost, CSL_ENTRY_CLASS, CSL_LEFT_MARGIN_CLASS, CSL_RIGHT_INLINE_CLASS,
};
use crate::processor::{Bibliography, LayoutHints};
use tracing::debug;

/// Layout policy for one render pass; exactly one applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BibliographyLayout {
    HangingIndent,
    SecondFieldAlign { max_offset: Option<u32> },
    Plain,
}

impl BibliographyLayout {
    /// Hanging indent beats second-field alignment
    pub fn from_hints(hints: &LayoutHints) -> Self {
        if hints.hanging_indent {
            Self::HangingIndent
        } else if hints.second_field_align {
            Self::SecondFieldAlign {
                max_offset: hints.max_offset.filter(|offset| *offset > 0),
            }
        } else {
            Self::Plain
        }
    }

    /// `(class, inline style)` pairs to apply to bibliography markup.
    ///
    /// `container_width` (px) stands in for the client-reported width of the
    /// bibliography, which hosts report unreliably.
    pub fn class_styles(&self, container_width: u32) -> Vec<(&'static str, String)> {
        match *self {
            Self::HangingIndent => vec![(
                CSL_ENTRY_CLASS,
                "padding-left: 1.3em;text-indent: -1.3em;".to_string(),
            )],
            Self::SecondFieldAlign { max_offset } => {
                let offset_spec = match max_offset {
                    Some(offset) => format!("width: {}em;", f64::from(offset) / 2.0 + 0.5),
                    None => "padding-right:0.3em;".to_string(),
                };
                let mut styles = vec![
                    (CSL_ENTRY_CLASS, "white-space: nowrap;".to_string()),
                    (
                        CSL_LEFT_MARGIN_CLASS,
                        format!("display:inline-block;vertical-align:top;{}", offset_spec),
                    ),
                ];
                if let Some(offset) = max_offset {
                    // Roughly ten pixels per character of the widest label
                    let number_width = i64::from(offset) * 10;
                    let text_width = i64::from(container_width) - number_width - 20;
                    styles.push((
                        CSL_RIGHT_INLINE_CLASS,
                        format!("display: inline-block;white-space: normal;width:{}px;", text_width),
                    ));
                }
                styles
            }
            Self::Plain => Vec::new(),
        }
    }
}

/// Replace the bibliography with processor output.
///
/// An empty bibliography hides the container and leaves its content alone.
pub fn set_bibliography<D: DocumentHost>(doc: &mut D, bibliography: &Bibliography, container_width: u32) {
    ensure_container(doc, Container::Bibliography);
    if bibliography.is_empty() {
        doc.set_container_hidden(Container::Bibliography, true);
        return;
    }

    doc.replace_bibliography(bibliography.entries.join("\n"));
    let layout = BibliographyLayout::from_hints(&bibliography.hints);
    debug!(entries = bibliography.entries.len(), ?layout, "set bibliography");
    for (class, style) in layout.class_styles(container_width) {
        doc.style_bibliography_class(class, &style);
    }
    doc.set_container_hidden(Container::Bibliography, false);
    doc.set_bibliography_visible(true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;

    fn hints(hanging: bool, second: bool, max_offset: Option<u32>) -> LayoutHints {
        LayoutHints {
            hanging_indent: hanging,
            second_field_align: second,
            max_offset,
        }
    }

    fn bib(hints: LayoutHints) -> Bibliography {
        Bibliography::new(
            hints,
            vec![
                "<div class=\"csl-entry\">One</div>".into(),
                "<div class=\"csl-entry\">Two</div>".into(),
            ],
        )
    }

    #[test]
    fn hanging_indent_wins_over_second_field_align() {
        let mut doc = MemoryDocument::new("doc");
        set_bibliography(&mut doc, &bib(hints(true, true, Some(3))), 680);

        let block = doc.bibliography_block().unwrap();
        assert_eq!(block.class_styles.len(), 1);
        assert_eq!(
            block.class_styles[CSL_ENTRY_CLASS],
            "padding-left: 1.3em;text-indent: -1.3em;"
        );
        assert!(block.visible);
        assert!(!block.state.hidden);
    }

    #[test]
    fn second_field_align_with_max_offset() {
        let styles = BibliographyLayout::from_hints(&hints(false, true, Some(3))).class_styles(680);
        assert_eq!(
            styles,
            vec![
                (CSL_ENTRY_CLASS, "white-space: nowrap;".to_string()),
                (
                    CSL_LEFT_MARGIN_CLASS,
                    "display:inline-block;vertical-align:top;width: 2em;".to_string()
                ),
                (
                    CSL_RIGHT_INLINE_CLASS,
                    "display: inline-block;white-space: normal;width:630px;".to_string()
                ),
            ]
        );
    }

    #[test]
    fn second_field_align_without_max_offset_pads_labels() {
        let styles = BibliographyLayout::from_hints(&hints(false, true, None)).class_styles(680);
        assert_eq!(styles.len(), 2);
        assert_eq!(
            styles[1].1,
            "display:inline-block;vertical-align:top;padding-right:0.3em;"
        );
    }

    #[test]
    fn half_em_offset_keeps_fraction() {
        let styles = BibliographyLayout::from_hints(&hints(false, true, Some(4))).class_styles(680);
        assert!(styles[1].1.ends_with("width: 2.5em;"));
    }

    #[test]
    fn plain_layout_applies_nothing() {
        let mut doc = MemoryDocument::new("doc");
        set_bibliography(&mut doc, &bib(hints(false, false, Some(2))), 680);
        let block = doc.bibliography_block().unwrap();
        assert!(block.class_styles.is_empty());
        assert!(block.markup.contains("One</div>\n<div"));
        assert!(block.visible);
    }

    #[test]
    fn empty_bibliography_hides_container() {
        let mut doc = MemoryDocument::new("doc");
        set_bibliography(&mut doc, &bib(hints(true, false, None)), 680);
        set_bibliography(&mut doc, &Bibliography::default(), 680);
        assert_eq!(doc.container_hidden(Container::Bibliography), Some(true));
    }
}
