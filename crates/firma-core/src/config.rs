//! Run configuration
//!
//! Placement size and margin, the cover-page rule, and the optional TOML run
//! file the CLI layers its flags over.

use crate::error::{FirmaError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

pub const RECOMMENDED_WIDTH: RangeInclusive<u32> = 50..=300;
pub const RECOMMENDED_HEIGHT: RangeInclusive<u32> = 30..=200;
pub const RECOMMENDED_MARGIN: RangeInclusive<i32> = -50..=50;

/// Size of every inserted signature and its gap above the anchor text.
///
/// The "pixel" values are used directly as PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementConfig {
    #[serde(default = "default_width")]
    pub width_px: u32,
    #[serde(default = "default_height")]
    pub height_px: u32,
    /// Negative values push the signature down into the text line.
    #[serde(default = "default_top_margin")]
    pub top_margin_px: i32,
}

fn default_width() -> u32 {
    120
}

fn default_height() -> u32 {
    43
}

fn default_top_margin() -> i32 {
    0
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            width_px: default_width(),
            height_px: default_height(),
            top_margin_px: default_top_margin(),
        }
    }
}

impl PlacementConfig {
    pub fn new(width_px: u32, height_px: u32, top_margin_px: i32) -> Self {
        Self {
            width_px,
            height_px,
            top_margin_px,
        }
    }

    /// Reject unusable sizes; return a warning for each value outside its
    /// recommended range.
    pub fn validate(&self) -> Result<Vec<String>> {
        if self.width_px == 0 || self.height_px == 0 {
            return Err(FirmaError::Config(format!(
                "signature size must be positive, got {}x{}",
                self.width_px, self.height_px
            )));
        }

        let mut warnings = Vec::new();
        if !RECOMMENDED_WIDTH.contains(&self.width_px) {
            warnings.push(format!(
                "width {} is outside the recommended range {}-{}",
                self.width_px,
                RECOMMENDED_WIDTH.start(),
                RECOMMENDED_WIDTH.end()
            ));
        }
        if !RECOMMENDED_HEIGHT.contains(&self.height_px) {
            warnings.push(format!(
                "height {} is outside the recommended range {}-{}",
                self.height_px,
                RECOMMENDED_HEIGHT.start(),
                RECOMMENDED_HEIGHT.end()
            ));
        }
        if !RECOMMENDED_MARGIN.contains(&self.top_margin_px) {
            warnings.push(format!(
                "top margin {} is outside the recommended range {}-{}",
                self.top_margin_px,
                RECOMMENDED_MARGIN.start(),
                RECOMMENDED_MARGIN.end()
            ));
        }
        Ok(warnings)
    }
}

/// Which pages of a document are scanned for anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Skip the first page of multi-page documents (cover/header page).
    #[serde(default = "default_skip_cover_page")]
    pub skip_cover_page: bool,
}

fn default_skip_cover_page() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            skip_cover_page: default_skip_cover_page(),
        }
    }
}

impl ScanConfig {
    /// Whether the zero-based `page_index` of a `page_count`-page document is scanned.
    pub fn scans_page(&self, page_index: usize, page_count: usize) -> bool {
        !(self.skip_cover_page && page_count > 1 && page_index == 0)
    }
}

/// Optional run file; every field can be overridden on the command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub roster: Option<PathBuf>,
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

impl RunConfig {
    /// Load a run file. Relative paths inside it are resolved against the
    /// file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    fn rebase(&mut self, base: &Path) {
        let join = |p: &PathBuf| {
            if p.is_relative() {
                base.join(p)
            } else {
                p.clone()
            }
        };
        self.roster = self.roster.as_ref().map(join);
        self.output_dir = self.output_dir.as_ref().map(join);
        self.inputs = self.inputs.iter().map(join).collect();
    }
}
