use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Browser window size in CSS pixels. Screenshots captured for the image
/// checks have exactly these dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 900,
        }
    }
}

impl Viewport {
    /// A viewport matching an image's `(width, height)`; `None` for an empty image.
    pub fn from_dimensions((width, height): (u32, u32)) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewportParseError {
    #[error("Invalid viewport format: expected WIDTHxHEIGHT (e.g., 1440x900)")]
    InvalidFormat,
    #[error("Invalid {axis}: {value}")]
    InvalidNumber { axis: &'static str, value: String },
    #[error("Viewport {0} must be positive")]
    Zero(&'static str),
}

fn parse_axis(axis: &'static str, raw: &str) -> Result<u32, ViewportParseError> {
    let raw = raw.trim();
    let value: u32 = raw.parse().map_err(|_| ViewportParseError::InvalidNumber {
        axis,
        value: raw.to_string(),
    })?;
    if value == 0 {
        return Err(ViewportParseError::Zero(axis));
    }
    Ok(value)
}

impl FromStr for Viewport {
    type Err = ViewportParseError;

    /// Accepts `1440x900`, `1440X900` and `1440×900`, with optional spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X', '×'])
            .ok_or(ViewportParseError::InvalidFormat)?;
        if h.contains(['x', 'X', '×']) {
            return Err(ViewportParseError::InvalidFormat);
        }
        Ok(Viewport {
            width: parse_axis("width", w)?,
            height: parse_axis("height", h)?,
        })
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
