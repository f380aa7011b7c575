//! Decoded signature images, shared for the whole run.

use crate::error::{FirmaError, Result};
use image::RgbImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An RGB8 signature bitmap.
#[derive(Debug)]
pub struct SignatureImage {
    pub path: PathBuf,
    pub pixels: RgbImage,
}

impl SignatureImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Memoizes decoded images by source path. Nothing is ever evicted.
#[derive(Debug, Default)]
pub struct ImageCache {
    images: HashMap<PathBuf, Arc<SignatureImage>>,
    decodes: usize,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached image for `path`, decoding and converting to RGB8 on first use.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<SignatureImage>> {
        if let Some(image) = self.images.get(path) {
            return Ok(Arc::clone(image));
        }
        if !path.is_file() {
            return Err(FirmaError::ImageLoad {
                path: path.to_path_buf(),
                reason: "file does not exist".to_string(),
            });
        }

        let decoded = image::open(path).map_err(|e| FirmaError::ImageLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        self.decodes += 1;

        let image = Arc::new(SignatureImage {
            path: path.to_path_buf(),
            pixels: decoded.to_rgb8(),
        });
        tracing::debug!(
            "decoded {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        self.images.insert(path.to_path_buf(), Arc::clone(&image));
        Ok(image)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.images.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Number of files decoded so far.
    pub fn decode_count(&self) -> usize {
        self.decodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(4, 2, Rgba([10, 20, 30, 128]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_decodes_once_and_shares() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "firma.png");
        let mut cache = ImageCache::new();

        let first = cache.get_or_load(&path).unwrap();
        let second = cache.get_or_load(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.decode_count(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!((first.width(), first.height()), (4, 2));
        // Alpha is dropped, colour kept.
        assert_eq!(first.pixels.get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_missing_file() {
        let mut cache = ImageCache::new();
        let err = cache.get_or_load(Path::new("/nonexistent/firma.png")).unwrap_err();
        assert!(matches!(err, FirmaError::ImageLoad { .. }));
        assert!(cache.is_empty());
        assert_eq!(cache.decode_count(), 0);
    }

    #[test]
    fn test_undecodable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let mut cache = ImageCache::new();
        assert!(cache.get_or_load(&path).is_err());
        assert!(!cache.contains(&path));
    }
}
