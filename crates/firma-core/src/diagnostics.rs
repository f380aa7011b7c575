//! Diagnostic trace
//!
//! Matching is heuristic, so every decision the pipeline takes is reported as
//! a [`Diagnostic`]. Components never print; they hand events to a
//! [`DiagnosticSink`] supplied by the caller. [`TracingSink`] renders them
//! through `tracing`, and a plain `Vec<Diagnostic>` collects them for tests.

use crate::geometry::Rect;
use crate::identity::MatchMethod;
use crate::scanner::Role;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

/// One pipeline decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum Diagnostic {
    RosterEntryLoaded {
        name: String,
        phone: Option<String>,
        path: PathBuf,
        path_exists: bool,
    },
    RosterEntrySkipped {
        name: String,
    },
    IndexBuilt {
        phones: usize,
        names: usize,
        signatures: usize,
    },
    DocumentStarted {
        path: PathBuf,
        index: usize,
        total: usize,
    },
    DocumentOpened {
        path: PathBuf,
        pages: usize,
    },
    PageSkipped {
        page: u32,
    },
    PageScanned {
        page: u32,
        blocks: usize,
        spans: usize,
    },
    PageTextUnavailable {
        page: u32,
        reason: String,
    },
    AnchorDetected {
        page: u32,
        role: Role,
        raw_text: String,
        token: String,
        rect: Rect,
    },
    AnchorMissing {
        page: u32,
        role: Role,
    },
    IdentityResolved {
        token: String,
        method: MatchMethod,
        matched: String,
        path: PathBuf,
    },
    IdentityUnresolved {
        token: String,
        known_names: Vec<String>,
    },
    SignatureFileMissing {
        path: PathBuf,
    },
    ImageCacheHit {
        path: PathBuf,
    },
    ImageLoaded {
        path: PathBuf,
        width: u32,
        height: u32,
    },
    ImageLoadFailed {
        path: PathBuf,
        reason: String,
    },
    SignaturePlaced {
        page: u32,
        role: Role,
        anchor: Rect,
        destination: Rect,
    },
    PlacementFailed {
        page: u32,
        role: Role,
        reason: String,
    },
    DocumentSaved {
        output: PathBuf,
    },
    DocumentUnmodified {
        path: PathBuf,
    },
    DocumentFailed {
        path: PathBuf,
        reason: String,
    },
    BatchAborted {
        remaining: usize,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::RosterEntryLoaded {
                path_exists: false, ..
            } => Severity::Warning,
            Diagnostic::RosterEntryLoaded { .. } => Severity::Info,
            Diagnostic::RosterEntrySkipped { .. } => Severity::Warning,
            Diagnostic::IndexBuilt { .. } => Severity::Success,
            Diagnostic::DocumentStarted { .. } | Diagnostic::DocumentOpened { .. } => {
                Severity::Info
            }
            Diagnostic::PageSkipped { .. } => Severity::Debug,
            Diagnostic::PageScanned { .. } => Severity::Debug,
            Diagnostic::PageTextUnavailable { .. } => Severity::Warning,
            Diagnostic::AnchorDetected { .. } => Severity::Success,
            Diagnostic::AnchorMissing { .. } => Severity::Warning,
            Diagnostic::IdentityResolved { .. } => Severity::Success,
            Diagnostic::IdentityUnresolved { .. } => Severity::Error,
            Diagnostic::SignatureFileMissing { .. } => Severity::Error,
            Diagnostic::ImageCacheHit { .. } => Severity::Debug,
            Diagnostic::ImageLoaded { .. } => Severity::Info,
            Diagnostic::ImageLoadFailed { .. } => Severity::Error,
            Diagnostic::SignaturePlaced { .. } => Severity::Success,
            Diagnostic::PlacementFailed { .. } => Severity::Error,
            Diagnostic::DocumentSaved { .. } => Severity::Success,
            Diagnostic::DocumentUnmodified { .. } => Severity::Warning,
            Diagnostic::DocumentFailed { .. } => Severity::Error,
            Diagnostic::BatchAborted { .. } => Severity::Warning,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::RosterEntryLoaded {
                name,
                phone,
                path,
                path_exists,
            } => {
                let mark = if *path_exists { "ok" } else { "MISSING FILE" };
                match phone {
                    Some(phone) => write!(f, "roster: {name} (tel {phone}) [{mark}]")?,
                    None => write!(f, "roster: {name} (no phone) [{mark}]")?,
                }
                if !path_exists {
                    write!(f, " {}", path.display())?;
                }
                Ok(())
            }
            Diagnostic::RosterEntrySkipped { name } => {
                write!(f, "roster: {name} has no signature path, skipped")
            }
            Diagnostic::IndexBuilt {
                phones,
                names,
                signatures,
            } => write!(
                f,
                "index ready: {phones} phone(s), {names} name variant(s), {signatures} signature file(s)"
            ),
            Diagnostic::DocumentStarted { path, index, total } => {
                write!(f, "[{index}/{total}] {}", path.display())
            }
            Diagnostic::DocumentOpened { path, pages } => {
                write!(f, "opened {} ({pages} page(s))", path.display())
            }
            Diagnostic::PageSkipped { page } => write!(f, "page {page}: skipped (cover page)"),
            Diagnostic::PageScanned {
                page,
                blocks,
                spans,
            } => write!(f, "page {page}: {blocks} text block(s), {spans} span(s)"),
            Diagnostic::PageTextUnavailable { page, reason } => {
                write!(f, "page {page}: text not readable: {reason}")
            }
            Diagnostic::AnchorDetected {
                page,
                role,
                raw_text,
                token,
                rect,
            } => write!(
                f,
                "page {page}: {role} anchor '{raw_text}' -> '{token}' at {rect}"
            ),
            Diagnostic::AnchorMissing { page, role } => write!(
                f,
                "page {page}: no {role} anchor detected, {} signature skipped",
                role.signer()
            ),
            Diagnostic::IdentityResolved {
                token,
                method,
                matched,
                path,
            } => write!(
                f,
                "'{token}' matched '{matched}' by {method} -> {}",
                path.display()
            ),
            Diagnostic::IdentityUnresolved { token, known_names } => write!(
                f,
                "'{token}' matches no roster entry (known: {})",
                known_names.join(", ")
            ),
            Diagnostic::SignatureFileMissing { path } => {
                write!(f, "signature file does not exist: {}", path.display())
            }
            Diagnostic::ImageCacheHit { path } => {
                write!(f, "using cached signature {}", path.display())
            }
            Diagnostic::ImageLoaded {
                path,
                width,
                height,
            } => write!(f, "loaded {} ({width}x{height})", path.display()),
            Diagnostic::ImageLoadFailed { path, reason } => {
                write!(f, "cannot load {}: {reason}", path.display())
            }
            Diagnostic::SignaturePlaced {
                page,
                role,
                anchor,
                destination,
            } => write!(
                f,
                "page {page}: {role} signature placed at {destination} above text at {anchor}"
            ),
            Diagnostic::PlacementFailed { page, role, reason } => {
                write!(f, "page {page}: {role} signature not placed: {reason}")
            }
            Diagnostic::DocumentSaved { output } => write!(f, "saved {}", output.display()),
            Diagnostic::DocumentUnmodified { path } => write!(
                f,
                "{} unchanged (no anchors or signatures found)",
                path.display()
            ),
            Diagnostic::DocumentFailed { path, reason } => {
                write!(f, "{} failed: {reason}", path.display())
            }
            Diagnostic::BatchAborted { remaining } => {
                write!(f, "batch stopped, {remaining} document(s) not attempted")
            }
        }
    }
}

/// Consumer of diagnostic events.
pub trait DiagnosticSink {
    fn record(&mut self, event: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn record(&mut self, event: Diagnostic) {
        self.push(event);
    }
}

/// Renders every event as a `tracing` record under the `firma` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&mut self, event: Diagnostic) {
        match event.severity() {
            Severity::Debug => tracing::debug!(target: "firma", "{}", event),
            Severity::Info | Severity::Success => tracing::info!(target: "firma", "{}", event),
            Severity::Warning => tracing::warn!(target: "firma", "{}", event),
            Severity::Error => tracing::error!(target: "firma", "{}", event),
        }
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&mut self, _event: Diagnostic) {}
}
