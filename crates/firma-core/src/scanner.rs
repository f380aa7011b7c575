//! Anchor detection
//!
//! Walks a page's spans in document order and picks at most one anchor per
//! [`Role`]. A span is a phone candidate when it carries at least
//! [`MIN_PHONE_DIGITS`] digits that the roster knows; otherwise it is a name
//! candidate when its cleaned text is longer than [`MIN_NAME_CHARS`]
//! characters and partially matches an indexed name. The first qualifying
//! span for a role wins.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::geometry::Rect;
use crate::identity::{IdentityIndex, MIN_PHONE_DIGITS};
use crate::text::{PageText, TextSpan};
use serde::Serialize;
use std::fmt;

/// Cleaned names this short or shorter are ignored.
pub const MIN_NAME_CHARS: usize = 5;

/// Signer slot, decided by which half of the page the anchor starts in.
///
/// By convention of the processed documents the left signer is the
/// professor and the right signer is the student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Left,
    Right,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Left, Role::Right];

    /// Role of a span starting at `x0` on a page `page_width` wide.
    pub fn classify(x0: f64, page_width: f64) -> Self {
        if x0 > page_width / 2.0 {
            Role::Right
        } else {
            Role::Left
        }
    }

    pub fn signer(&self) -> &'static str {
        match self {
            Role::Left => "professor",
            Role::Right => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Left => f.write_str("left"),
            Role::Right => f.write_str("right"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleAnchor {
    pub role: Role,
    /// Phone digits or normalized name, as passed to identity resolution.
    pub matched_token: String,
    pub rect: Rect,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageAnchors {
    pub left: Option<RoleAnchor>,
    pub right: Option<RoleAnchor>,
}

impl PageAnchors {
    pub fn get(&self, role: Role) -> Option<&RoleAnchor> {
        match role {
            Role::Left => self.left.as_ref(),
            Role::Right => self.right.as_ref(),
        }
    }

    fn slot(&mut self, role: Role) -> &mut Option<RoleAnchor> {
        match role {
            Role::Left => &mut self.left,
            Role::Right => &mut self.right,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Filled anchors, left first.
    pub fn iter(&self) -> impl Iterator<Item = &RoleAnchor> {
        self.left.iter().chain(self.right.iter())
    }
}

/// Find the left and right anchors of `page`.
pub fn scan(page: &PageText, index: &IdentityIndex, sink: &mut dyn DiagnosticSink) -> PageAnchors {
    let mut anchors = PageAnchors::default();
    let width = page.width();

    for span in page.spans() {
        if anchors.is_complete() {
            break;
        }
        if span.raw_text.trim().is_empty() {
            continue;
        }
        let (token, rect) = match candidate(span, index) {
            Some(found) => found,
            None => continue,
        };

        let role = Role::classify(rect.x0, width);
        let slot = anchors.slot(role);
        if slot.is_some() {
            tracing::debug!(
                "page {}: '{}' ignored, {} anchor already set",
                page.number,
                span.raw_text,
                role
            );
            continue;
        }
        sink.record(Diagnostic::AnchorDetected {
            page: page.number,
            role,
            raw_text: span.raw_text.clone(),
            token: token.clone(),
            rect,
        });
        *slot = Some(RoleAnchor {
            role,
            matched_token: token,
            rect,
        });
    }

    for role in Role::ALL {
        if anchors.get(role).is_none() {
            sink.record(Diagnostic::AnchorMissing {
                page: page.number,
                role,
            });
        }
    }
    anchors
}

/// Token and rectangle when `span` qualifies as an anchor.
fn candidate(span: &TextSpan, index: &IdentityIndex) -> Option<(String, Rect)> {
    if span.digits_only.len() >= MIN_PHONE_DIGITS && index.has_phone(&span.digits_only) {
        return Some((span.digits_only.clone(), span.rect));
    }
    let cleaned = &span.normalized_text;
    if cleaned.chars().count() > MIN_NAME_CHARS && index.find_partial(cleaned).is_some() {
        return Some((cleaned.clone(), span.rect));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NullSink;
    use crate::geometry::PageBox;
    use crate::roster::{PhoneCell, RosterEntry, RosterRow};
    use crate::text::{TextBlock, TextLine};
    use pretty_assertions::assert_eq;

    fn index() -> IdentityIndex {
        let rows = [
            RosterRow::new("Juan", "Pérez", "García")
                .with_phone(PhoneCell::Number(612345678.0))
                .with_path("juan.png"),
            RosterRow::new("Ana", "López", "Ruiz").with_path("ana.png"),
            RosterRow::new("Eva", "Mora", "").with_path("eva.png"),
        ];
        let entries: Vec<RosterEntry> = rows
            .iter()
            .filter_map(|r| RosterEntry::from_row(r, None))
            .collect();
        IdentityIndex::build(&entries)
    }

    fn span(text: &str, x0: f64, y0: f64) -> TextSpan {
        TextSpan::new(text, Rect::new(x0, y0, x0 + 100.0, y0 + 12.0), 12.0)
    }

    fn page(spans: Vec<TextSpan>) -> PageText {
        PageText {
            number: 2,
            page_box: PageBox::LETTER,
            blocks: vec![TextBlock {
                lines: spans
                    .into_iter()
                    .map(|s| TextLine { spans: vec![s] })
                    .collect(),
            }],
        }
    }

    #[test]
    fn test_phone_and_name_anchors() {
        let page = page(vec![
            span("Fdo: Ana López Ruiz", 80.0, 600.0),
            span("Tel: 612 345 678", 400.0, 600.0),
        ]);
        let mut events: Vec<Diagnostic> = Vec::new();
        let anchors = scan(&page, &index(), &mut events);

        let left = anchors.left.unwrap();
        assert_eq!(left.matched_token, "ANA LOPEZ RUIZ");
        assert_eq!(left.rect.x0, 80.0);

        let right = anchors.right.unwrap();
        assert_eq!(right.matched_token, "612345678");
        assert_eq!(right.role, Role::Right);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_first_match_wins_per_role() {
        let page = page(vec![
            span("Juan Pérez García", 350.0, 100.0),
            span("Ana López Ruiz", 400.0, 200.0),
        ]);
        let anchors = scan(&page, &index(), &mut NullSink);
        assert_eq!(anchors.right.unwrap().matched_token, "JUAN PEREZ GARCIA");
        assert!(anchors.left.is_none());
    }

    #[test]
    fn test_short_text_is_not_a_name() {
        // "EVA MORA" would match, but "EVA" alone is too short.
        let page = page(vec![span("Eva", 10.0, 10.0), span("Fdo: Eva Mora", 20.0, 50.0)]);
        let anchors = scan(&page, &index(), &mut NullSink);
        assert_eq!(anchors.left.unwrap().matched_token, "EVA MORA");
    }

    #[test]
    fn test_unknown_phone_is_examined_as_name() {
        let page = page(vec![span("699999999", 400.0, 10.0)]);
        let mut events: Vec<Diagnostic> = Vec::new();
        let anchors = scan(&page, &index(), &mut events);
        assert!(anchors.is_empty());
        assert_eq!(
            events,
            vec![
                Diagnostic::AnchorMissing {
                    page: 2,
                    role: Role::Left
                },
                Diagnostic::AnchorMissing {
                    page: 2,
                    role: Role::Right
                },
            ]
        );
    }

    #[test]
    fn test_known_phone_on_filled_role_is_not_a_name() {
        let page = page(vec![
            span("Eva Mora", 400.0, 10.0),
            span("612345678", 420.0, 40.0),
        ]);
        let anchors = scan(&page, &index(), &mut NullSink);
        assert_eq!(anchors.right.unwrap().matched_token, "EVA MORA");
        assert!(anchors.left.is_none());
    }

    #[test]
    fn test_midline_belongs_to_left() {
        assert_eq!(Role::classify(306.0, 612.0), Role::Left);
        assert_eq!(Role::classify(306.1, 612.0), Role::Right);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Right).unwrap(), r#""right""#);
        assert_eq!(Role::Left.signer(), "professor");
    }
}
