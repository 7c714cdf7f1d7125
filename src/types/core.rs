//! Core layout types shared by the normalizer and the matcher.
//!
//! - [`RecognizedText`] - a raw text record as reported by a recognizer
//! - [`ExpectedElement`] - a canonical element the live page must contain
//! - [`Point`], [`Position`], [`Delta`] - coordinates in reference and live space
//! - [`ElementBox`] - geometry reported by a live render

use serde::{Deserialize, Serialize};

/// Corner coordinates of a recognized text box.
///
/// Signed so that malformed recognizer output (inverted or negative boxes)
/// survives deserialization and can be rejected by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBox {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

/// A text token and its box, as produced by OCR or read from a layout file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizedText {
    pub text: String,
    pub bbox: TextBox,
    /// Recognizer confidence (0.0 - 1.0), when the source reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl RecognizedText {
    pub fn new(text: impl Into<String>, bbox: TextBox) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence: None,
        }
    }
}

/// An element the reference design says should exist, at a given position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedElement {
    pub text: String,
    pub expected_x: u32,
    pub expected_y: u32,
    pub width: u32,
    pub height: u32,
}

impl ExpectedElement {
    pub fn position(&self) -> Point {
        Point {
            x: i64::from(self.expected_x),
            y: i64::from(self.expected_y),
        }
    }
}

/// Integer position in reference-design space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

/// Position reported by a live render (CSS pixels, fractional).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Signed offset `actual - expected`, rounded to whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub x: i64,
    pub y: i64,
}

impl Delta {
    pub fn between(expected: Point, actual: Position) -> Self {
        Self {
            x: (actual.x - expected.x as f64).round() as i64,
            y: (actual.y - expected.y as f64).round() as i64,
        }
    }
}

/// Rectangle bounds of a live element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementBox {
    pub fn origin(&self) -> Position {
        Position {
            x: self.x,
            y: self.y,
        }
    }
}
