//! Expansion of command-line inputs into PDF paths.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

/// Files are taken as given; directories contribute their `*.pdf` files
/// (sorted, not recursive). Signed copies from earlier runs are left out.
pub fn collect_pdfs(inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(input)
                .with_context(|| format!("Failed to read directory: {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && is_pdf(path) && !is_signed_copy(path))
                .collect();
            found.sort();
            if found.is_empty() {
                tracing::warn!("no PDF files in {}", input.display());
            }
            documents.extend(found);
        } else {
            documents.push(input.clone());
        }
    }
    Ok(documents)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn is_signed_copy(path: &Path) -> bool {
    path.file_stem()
        .is_some_and(|stem| stem.to_string_lossy().ends_with(firma_core::processor::OUTPUT_SUFFIX))
}
