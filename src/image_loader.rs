use std::fs;
use std::path::Path;

use image::{DynamicImage, ImageError};
use thiserror::Error;

use crate::types::RasterImage;

#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("Failed to load image: {0}")]
    Load(#[from] ImageError),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Image has no pixels: {0}")]
    Empty(String),
    #[error("Failed to save image: {0}")]
    Save(String),
}

pub fn load_image(path: &Path) -> Result<DynamicImage, ImageLoadError> {
    if !path.exists() {
        return Err(ImageLoadError::NotFound(path.display().to_string()));
    }
    Ok(image::open(path)?)
}

/// Decodes any supported format into an RGBA [`RasterImage`].
pub fn load_raster(path: &Path) -> Result<RasterImage, ImageLoadError> {
    let rgba = load_image(path)?.to_rgba8();
    RasterImage::try_from(rgba).map_err(|_| ImageLoadError::Empty(path.display().to_string()))
}

/// Writes a raster as PNG (or whatever the extension names), creating parent directories.
pub fn save_raster(raster: &RasterImage, path: &Path) -> Result<(), ImageLoadError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ImageLoadError::Save(e.to_string()))?;
    }
    raster
        .to_rgba_image()
        .save(path)
        .map_err(|e| ImageLoadError::Save(format!("{}: {}", path.display(), e)))
}
