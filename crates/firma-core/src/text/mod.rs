//! Page text layout
//!
//! Interprets a page's content stream and groups the shown text into
//! blocks, lines and spans. Every span carries a bounding rectangle in
//! top-left page space (see [`crate::geometry`]) plus the normalized forms
//! the anchor scanner compares against the roster.

mod cmap;
mod extract;
mod font;

pub use cmap::ToUnicodeMap;
pub use extract::extract_page;
pub use font::{FontInfo, Glyph};

use crate::geometry::{PageBox, Rect};
use crate::normalize::{clean_identity_label, digits_only};

#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub raw_text: String,
    /// `raw_text` with any signer prefix removed, normalized.
    pub normalized_text: String,
    pub digits_only: String,
    pub rect: Rect,
    pub font_size: f64,
}

impl TextSpan {
    pub fn new(raw_text: impl Into<String>, rect: Rect, font_size: f64) -> Self {
        let raw_text = raw_text.into();
        Self {
            normalized_text: clean_identity_label(&raw_text),
            digits_only: digits_only(&raw_text),
            raw_text,
            rect,
            font_size,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
}

/// Text layout of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// 1-based page number.
    pub number: u32,
    pub page_box: PageBox,
    pub blocks: Vec<TextBlock>,
}

impl PageText {
    pub fn width(&self) -> f64 {
        self.page_box.width()
    }

    /// All spans in document order.
    pub fn spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.blocks
            .iter()
            .flat_map(|b| b.lines.iter())
            .flat_map(|l| l.spans.iter())
    }

    pub fn span_count(&self) -> usize {
        self.spans().count()
    }

    /// Concatenated text, one line per row.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .flat_map(|b| b.lines.iter())
            .map(|line| {
                line.spans
                    .iter()
                    .map(|s| s.raw_text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_derives_normalized_forms() {
        let span = TextSpan::new("Fdo.: José Pérez", Rect::new(0.0, 0.0, 10.0, 10.0), 12.0);
        assert_eq!(span.normalized_text, "JOSE PEREZ");
        assert_eq!(span.digits_only, "");

        let span = TextSpan::new("Tel. 612 345 678", Rect::new(0.0, 0.0, 10.0, 10.0), 12.0);
        assert_eq!(span.digits_only, "612345678");
    }

    #[test]
    fn test_spans_in_document_order() {
        let rect = Rect::new(0.0, 0.0, 1.0, 1.0);
        let page = PageText {
            number: 1,
            page_box: PageBox::LETTER,
            blocks: vec![
                TextBlock {
                    lines: vec![TextLine {
                        spans: vec![TextSpan::new("a", rect, 10.0), TextSpan::new("b", rect, 10.0)],
                    }],
                },
                TextBlock {
                    lines: vec![TextLine {
                        spans: vec![TextSpan::new("c", rect, 10.0)],
                    }],
                },
            ],
        };
        let texts: Vec<&str> = page.spans().map(|s| s.raw_text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert_eq!(page.span_count(), 3);
        assert_eq!(page.plain_text(), "a b\nc");
        assert_eq!(page.width(), 612.0);
    }
}
