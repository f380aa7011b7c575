//! Roster-driven signature placement for PDF documents
//!
//! Finds the printed names or phone numbers of the two signers on each page,
//! looks them up in a roster spreadsheet, and overlays the matching signature
//! image just above the text:
//!
//! - [`Roster`] reads the spreadsheet and [`IdentityIndex`] resolves tokens
//! - [`text::extract_page`] lays out page text; [`scanner::scan`] picks anchors
//! - [`SignaturePlacer`] computes the rectangle and paints the image
//! - [`DocumentProcessor`] runs the whole thing over a batch of documents
//!
//! Every decision is reported as a [`Diagnostic`] to a caller-supplied sink.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod identity;
pub mod image_cache;
pub mod normalize;
pub mod pdf;
pub mod placement;
pub mod processor;
pub mod roster;
pub mod scanner;
pub mod text;

pub use config::{PlacementConfig, RunConfig, ScanConfig};
pub use diagnostics::{Diagnostic, DiagnosticSink, NullSink, Severity, TracingSink};
pub use error::{FirmaError, Result};
pub use geometry::{PageBox, Rect};
pub use identity::{IdentityIndex, MatchMethod, Resolution};
pub use image_cache::{ImageCache, SignatureImage};
pub use normalize::{clean_identity_label, digits_only, normalize};
pub use placement::{destination_rect, SignaturePlacer};
pub use processor::{output_path, BatchProgress, BatchReport, DocumentOutcome, DocumentProcessor};
pub use roster::{PhoneCell, Roster, RosterEntry, RosterRow};
pub use scanner::{PageAnchors, Role, RoleAnchor};
pub use text::{PageText, TextBlock, TextLine, TextSpan};
