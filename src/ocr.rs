//! OCR adapter: recognizes words in a reference design image.
//!
//! Uses Tesseract via the `leptess` crate and requires the `ocr` feature:
//!
//! ```toml
//! [dependencies]
//! uidiff = { version = "0.1", features = ["ocr"] }
//! ```
//!
//! Tesseract and its `tessdata` directory must be installed (or located via
//! `TESSDATA_PREFIX`). Without the feature, [`recognize_text`] returns
//! [`OcrError::NotAvailable`].
//!
//! The image is preprocessed before recognition (resized to a fixed width,
//! grayscale, contrast stretched) and word boxes are mapped back to the
//! original image's coordinates.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage, GenericImageView, GrayImage};
use thiserror::Error;

use crate::types::{RecognizedText, TextBox};

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Failed to initialize OCR engine: {0}")]
    InitError(String),
    #[error("Failed to load image for OCR: {0}")]
    ImageLoadError(String),
    #[error("OCR processing failed: {0}")]
    ProcessingError(String),
    #[error("OCR is not available in this build; rebuild with the 'ocr' feature and install Tesseract")]
    NotAvailable,
}

impl From<OcrError> for crate::UidiffError {
    fn from(err: OcrError) -> Self {
        crate::UidiffError::Config(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct OcrOptions {
    /// Tesseract language code
    pub language: String,
    /// Words below this confidence (0.0 - 1.0) are dropped
    pub min_confidence: f32,
    /// Width the image is resized to before recognition; `None` keeps the original size
    pub working_width: Option<u32>,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            min_confidence: 0.5,
            working_width: Some(800),
        }
    }
}

/// Resizes to `working_width` (keeping aspect), converts to grayscale and
/// stretches contrast to the full range. Returns the image and the factor that
/// maps its coordinates back to the original.
pub fn prepare_for_ocr(img: &DynamicImage, working_width: Option<u32>) -> (GrayImage, f64) {
    let (width, height) = img.dimensions();
    let (resized, scale) = match working_width {
        Some(target) if target > 0 && target != width => {
            let target_height = ((height as f64 * target as f64 / width as f64).round() as u32).max(1);
            (
                img.resize_exact(target, target_height, FilterType::Lanczos3),
                width as f64 / target as f64,
            )
        }
        _ => (img.clone(), 1.0),
    };

    let mut gray = resized.to_luma8();
    stretch_contrast(&mut gray);
    (gray, scale)
}

fn stretch_contrast(gray: &mut GrayImage) {
    let (min, max) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
    if max <= min {
        return;
    }
    let range = (max - min) as f32;
    for p in gray.pixels_mut() {
        p.0[0] = (((p.0[0] - min) as f32 * 255.0 / range).round()) as u8;
    }
}

/// Maps a box found on the working image back to original coordinates.
pub fn rescale_box(bbox: TextBox, scale: f64) -> TextBox {
    let s = |v: i64| (v as f64 * scale).round() as i64;
    TextBox {
        x0: s(bbox.x0),
        y0: s(bbox.y0),
        x1: s(bbox.x1),
        y1: s(bbox.y1),
    }
}

/// Recognizes word-level text with bounding boxes in the original image's pixels.
#[cfg(feature = "ocr")]
pub fn recognize_text(image_path: &Path, options: &OcrOptions) -> Result<Vec<RecognizedText>, OcrError> {
    use leptess::LepTess;
    use std::io::Cursor;

    let img = crate::image_loader::load_image(image_path)
        .map_err(|e| OcrError::ImageLoadError(e.to_string()))?;
    let (prepared, scale) = prepare_for_ocr(&img, options.working_width);

    let mut encoded = Vec::new();
    DynamicImage::ImageLuma8(prepared)
        .write_to(&mut Cursor::new(&mut encoded), image::ImageOutputFormat::Png)
        .map_err(|e| OcrError::ImageLoadError(e.to_string()))?;

    let mut lt = LepTess::new(None, &options.language)
        .map_err(|e| OcrError::InitError(format!("{:?}", e)))?;
    lt.set_image_from_mem(&encoded)
        .map_err(|e| OcrError::ImageLoadError(format!("{:?}", e)))?;

    let boxes = lt
        .get_component_boxes(leptess::capi::TessPageIteratorLevel_RIL_WORD, true)
        .ok_or_else(|| OcrError::ProcessingError("no text components found".to_string()))?;

    let mut words = Vec::new();
    for b in &boxes {
        lt.set_rectangle(&b);
        let text = lt.get_utf8_text().unwrap_or_default();
        let confidence = lt.mean_text_conf() as f32 / 100.0;
        let v = b.get_val();
        let bbox = TextBox {
            x0: v.x as i64,
            y0: v.y as i64,
            x1: (v.x + v.w) as i64,
            y1: (v.y + v.h) as i64,
        };
        words.push(RecognizedText {
            text: text.trim().to_string(),
            bbox: rescale_box(bbox, scale),
            confidence: Some(confidence),
        });
    }

    Ok(crate::layout::filter_by_confidence(words, options.min_confidence))
}

#[cfg(not(feature = "ocr"))]
pub fn recognize_text(_image_path: &Path, _options: &OcrOptions) -> Result<Vec<RecognizedText>, OcrError> {
    Err(OcrError::NotAvailable)
}

/// Check if OCR is available in this build.
#[inline]
pub const fn is_available() -> bool {
    cfg!(feature = "ocr")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba, RgbaImage};

    #[test]
    fn prepare_resizes_to_working_width() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1600, 900, Rgba([10, 20, 30, 255])));
        let (gray, scale) = prepare_for_ocr(&img, Some(800));
        assert_eq!(gray.dimensions(), (800, 450));
        assert!((scale - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn prepare_keeps_size_without_working_width() {
        let img = DynamicImage::new_rgba8(30, 20);
        let (gray, scale) = prepare_for_ocr(&img, None);
        assert_eq!(gray.dimensions(), (30, 20));
        assert_eq!(scale, 1.0);
    }

    #[test]
    fn contrast_stretch_uses_full_range() {
        let mut gray = GrayImage::from_fn(4, 1, |x, _| Luma([100 + x as u8 * 10]));
        stretch_contrast(&mut gray);
        assert_eq!(gray.get_pixel(0, 0).0[0], 0);
        assert_eq!(gray.get_pixel(3, 0).0[0], 255);
    }

    #[test]
    fn flat_image_is_left_alone() {
        let mut gray = GrayImage::from_pixel(3, 3, Luma([77]));
        stretch_contrast(&mut gray);
        assert!(gray.pixels().all(|p| p.0[0] == 77));
    }

    #[test]
    fn boxes_scale_back_to_original() {
        let scaled = rescale_box(TextBox { x0: 150, y0: 250, x1: 190, y1: 262 }, 2.0);
        assert_eq!(scaled, TextBox { x0: 300, y0: 500, x1: 380, y1: 524 });
    }

    #[cfg(not(feature = "ocr"))]
    #[test]
    fn reports_unavailable_without_feature() {
        assert!(!is_available());
        let err = recognize_text(Path::new("design.png"), &OcrOptions::default()).unwrap_err();
        assert!(matches!(err, OcrError::NotAvailable));
        let mapped: crate::UidiffError = err.into();
        assert!(mapped.to_payload().remediation.unwrap_or_default().contains("--layout"));
    }
}
