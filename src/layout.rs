//! Layout normalization: raw recognized text to [`ExpectedElement`]s.
//!
//! Also loads recognized-text records from JSON or YAML files, for runs where
//! OCR happened elsewhere.

use std::path::Path;

use tracing::debug;

use crate::error::UidiffError;
use crate::types::{ExpectedElement, RecognizedText};
use crate::Result;

/// Why a recognized record did not become an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyText,
    NegativeOrigin,
    InvertedBox,
    OutOfRange,
}

/// Canonicalizes one record, or explains why it was dropped.
pub fn normalize_record(record: &RecognizedText) -> std::result::Result<ExpectedElement, Rejection> {
    let text = record.text.trim();
    if text.is_empty() {
        return Err(Rejection::EmptyText);
    }

    let b = record.bbox;
    if b.x0 < 0 || b.y0 < 0 {
        return Err(Rejection::NegativeOrigin);
    }
    let width = b.x1.checked_sub(b.x0).ok_or(Rejection::OutOfRange)?;
    let height = b.y1.checked_sub(b.y0).ok_or(Rejection::OutOfRange)?;
    if width < 0 || height < 0 {
        return Err(Rejection::InvertedBox);
    }

    let to_u32 = |v: i64| u32::try_from(v).map_err(|_| Rejection::OutOfRange);
    Ok(ExpectedElement {
        text: text.to_string(),
        expected_x: to_u32(b.x0)?,
        expected_y: to_u32(b.y0)?,
        width: to_u32(width)?,
        height: to_u32(height)?,
    })
}

/// Trims text, drops empty tokens and malformed boxes, and keeps input order.
pub fn normalize_layout(records: &[RecognizedText]) -> Vec<ExpectedElement> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match normalize_record(record) {
            Ok(element) => Some(element),
            Err(reason) => {
                debug!(index, text = %record.text, ?reason, "discarding recognized text");
                None
            }
        })
        .collect()
}

/// Drops records whose reported confidence is below `min_confidence`.
/// Records without a confidence value are kept.
pub fn filter_by_confidence(records: Vec<RecognizedText>, min_confidence: f32) -> Vec<RecognizedText> {
    records
        .into_iter()
        .filter(|r| r.confidence.map_or(true, |c| c >= min_confidence))
        .collect()
}

/// Reads a JSON or YAML array of recognized-text records.
///
/// YAML is chosen for `.yaml`/`.yml` extensions; everything else is parsed as JSON.
pub fn load_recognized_text(path: &Path) -> Result<Vec<RecognizedText>> {
    if !path.exists() {
        return Err(UidiffError::config(format!(
            "Layout file not found: {}",
            path.display()
        )));
    }
    let data = std::fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    if is_yaml {
        serde_yaml::from_str(&data).map_err(|e| {
            UidiffError::config(format!(
                "Invalid layout YAML in {} (expected a list of {{text, bbox}}): {}",
                path.display(),
                e
            ))
        })
    } else {
        Ok(serde_json::from_str(&data)?)
    }
}
