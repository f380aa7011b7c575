//! Document processing
//!
//! Per document: open, scan every eligible page for anchors, resolve each
//! anchor to a signature, load and place it, and save a copy when at least
//! one signature went in. Failures below the document level only skip the
//! affected signature; a document that cannot be opened or saved fails on
//! its own and the batch moves on.

use crate::config::{PlacementConfig, ScanConfig};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{FirmaError, Result};
use crate::identity::IdentityIndex;
use crate::image_cache::ImageCache;
use crate::placement::SignaturePlacer;
use crate::scanner::{scan, RoleAnchor};
use crate::text::extract_page;
use lopdf::{Document, ObjectId};
use serde::Serialize;
use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

/// Suffix added to the file stem of every signed copy.
pub const OUTPUT_SUFFIX: &str = "_firmado";

#[derive(Debug)]
pub enum DocumentOutcome {
    /// At least one signature was placed and the copy was written here.
    Saved(PathBuf),
    /// Nothing was placed; no file written.
    Unmodified,
    Failed(FirmaError),
}

impl DocumentOutcome {
    pub fn output(&self) -> Option<&Path> {
        match self {
            DocumentOutcome::Saved(path) => Some(path),
            _ => None,
        }
    }
}

/// Totals for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// Documents attempted.
    pub processed: usize,
    pub succeeded: usize,
    pub unmodified: usize,
    pub failed: usize,
    pub outputs: Vec<PathBuf>,
}

impl BatchReport {
    fn record(&mut self, outcome: &DocumentOutcome) {
        self.processed += 1;
        match outcome {
            DocumentOutcome::Saved(path) => {
                self.succeeded += 1;
                self.outputs.push(path.clone());
            }
            DocumentOutcome::Unmodified => self.unmodified += 1,
            DocumentOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// True when at least one document was signed.
    pub fn any_signed(&self) -> bool {
        self.succeeded > 0
    }
}

/// State handed to the batch control callback after each document.
#[derive(Debug)]
pub struct BatchProgress<'a> {
    /// 1-based position of the document just processed.
    pub index: usize,
    pub total: usize,
    pub path: &'a Path,
    pub outcome: &'a DocumentOutcome,
    pub report: &'a BatchReport,
}

/// Output file for `source`: `<stem>_firmado.pdf` in `output_dir`, or beside
/// the source when no directory is given.
pub fn output_path(source: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "documento".to_string());
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| source.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}{}.pdf", stem, OUTPUT_SUFFIX))
}

pub struct DocumentProcessor {
    index: IdentityIndex,
    placement: PlacementConfig,
    scan: ScanConfig,
    output_dir: Option<PathBuf>,
    cache: ImageCache,
}

impl DocumentProcessor {
    /// Validates `placement`; out-of-range values are logged, zero sizes rejected.
    pub fn new(index: IdentityIndex, placement: PlacementConfig) -> Result<Self> {
        for warning in placement.validate()? {
            tracing::warn!("{}", warning);
        }
        Ok(Self {
            index,
            placement,
            scan: ScanConfig::default(),
            output_dir: None,
            cache: ImageCache::new(),
        })
    }

    pub fn with_scan(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Process every document, in order.
    pub fn process_batch<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        sink: &mut dyn DiagnosticSink,
    ) -> BatchReport {
        self.process_batch_with(paths, sink, |_| ControlFlow::Continue(()))
    }

    /// Process documents in order, calling `control` after each one.
    /// Returning `ControlFlow::Break` stops before the next document.
    pub fn process_batch_with<P, F>(
        &mut self,
        paths: &[P],
        sink: &mut dyn DiagnosticSink,
        mut control: F,
    ) -> BatchReport
    where
        P: AsRef<Path>,
        F: FnMut(&BatchProgress<'_>) -> ControlFlow<()>,
    {
        let total = paths.len();
        let mut report = BatchReport::default();

        for (i, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            sink.record(Diagnostic::DocumentStarted {
                path: path.to_path_buf(),
                index: i + 1,
                total,
            });

            let outcome = self.process_document(path, sink);
            report.record(&outcome);

            let progress = BatchProgress {
                index: i + 1,
                total,
                path,
                outcome: &outcome,
                report: &report,
            };
            if control(&progress).is_break() {
                let remaining = total - (i + 1);
                if remaining > 0 {
                    sink.record(Diagnostic::BatchAborted { remaining });
                }
                break;
            }
        }

        tracing::info!(
            "batch finished: {} processed, {} signed, {} unchanged, {} failed",
            report.processed,
            report.succeeded,
            report.unmodified,
            report.failed
        );
        report
    }

    /// Sign one document. Never panics on bad input; every failure is
    /// reported to `sink` and reflected in the outcome.
    pub fn process_document(
        &mut self,
        path: &Path,
        sink: &mut dyn DiagnosticSink,
    ) -> DocumentOutcome {
        match self.sign_document(path, sink) {
            Ok(Some(output)) => {
                sink.record(Diagnostic::DocumentSaved {
                    output: output.clone(),
                });
                DocumentOutcome::Saved(output)
            }
            Ok(None) => {
                sink.record(Diagnostic::DocumentUnmodified {
                    path: path.to_path_buf(),
                });
                DocumentOutcome::Unmodified
            }
            Err(err) => {
                sink.record(Diagnostic::DocumentFailed {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                });
                DocumentOutcome::Failed(err)
            }
        }
    }

    fn sign_document(
        &mut self,
        path: &Path,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Option<PathBuf>> {
        let mut doc = Document::load(path).map_err(|e| FirmaError::DocumentOpen {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
        sink.record(Diagnostic::DocumentOpened {
            path: path.to_path_buf(),
            pages: pages.len(),
        });

        let mut placer = SignaturePlacer::new(self.placement);
        let mut placed = 0usize;

        for (i, (number, page_id)) in pages.iter().enumerate() {
            if !self.scan.scans_page(i, pages.len()) {
                sink.record(Diagnostic::PageSkipped { page: *number });
                continue;
            }
            let page_text = match extract_page(&doc, *page_id, *number) {
                Ok(text) => text,
                Err(err) => {
                    sink.record(Diagnostic::PageTextUnavailable {
                        page: *number,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            sink.record(Diagnostic::PageScanned {
                page: *number,
                blocks: page_text.blocks.len(),
                spans: page_text.span_count(),
            });

            let anchors = scan(&page_text, &self.index, sink);
            for anchor in anchors.iter() {
                if self.sign_anchor(&mut doc, *page_id, *number, anchor, &mut placer, sink) {
                    placed += 1;
                }
            }
        }

        if placed == 0 {
            return Ok(None);
        }
        tracing::debug!("{} signature(s) placed in {}", placed, path.display());
        let output = output_path(path, self.output_dir.as_deref());
        save(&mut doc, path, &output)?;
        Ok(Some(output))
    }

    /// Resolve, load and place one anchor's signature. Every failure is
    /// reported and only skips this signature.
    fn sign_anchor(
        &mut self,
        doc: &mut Document,
        page_id: ObjectId,
        page: u32,
        anchor: &RoleAnchor,
        placer: &mut SignaturePlacer,
        sink: &mut dyn DiagnosticSink,
    ) -> bool {
        let resolution = match self.index.resolve_reported(&anchor.matched_token, sink) {
            Some(resolution) => resolution,
            None => return false,
        };
        let path = resolution.path;

        if !path.is_file() {
            sink.record(Diagnostic::SignatureFileMissing { path });
            return false;
        }
        let cached = self.cache.contains(&path);
        let image = match self.cache.get_or_load(&path) {
            Ok(image) => image,
            Err(err) => {
                sink.record(Diagnostic::ImageLoadFailed {
                    path,
                    reason: err.to_string(),
                });
                return false;
            }
        };
        if cached {
            sink.record(Diagnostic::ImageCacheHit { path });
        } else {
            sink.record(Diagnostic::ImageLoaded {
                path,
                width: image.width(),
                height: image.height(),
            });
        }

        match placer.place(doc, page_id, &image, &anchor.rect) {
            Ok(destination) => {
                sink.record(Diagnostic::SignaturePlaced {
                    page,
                    role: anchor.role,
                    anchor: anchor.rect,
                    destination,
                });
                true
            }
            Err(err) => {
                sink.record(Diagnostic::PlacementFailed {
                    page,
                    role: anchor.role,
                    reason: err.to_string(),
                });
                false
            }
        }
    }
}

/// Compact and write `doc` to `output`, which must not be the source file.
fn save(doc: &mut Document, source: &Path, output: &Path) -> Result<()> {
    let save_err = |reason: String| FirmaError::DocumentSave {
        path: output.to_path_buf(),
        reason,
    };
    if output == source {
        return Err(save_err("output would overwrite the source".to_string()));
    }
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| save_err(e.to_string()))?;
    }

    doc.prune_objects();
    doc.delete_zero_length_streams();
    doc.renumber_objects();
    doc.compress();
    doc.save(output).map_err(|e| save_err(e.to_string()))?;

    if !output.is_file() {
        return Err(save_err("file not present after write".to_string()));
    }
    Ok(())
}
