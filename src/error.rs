use crate::image_loader::ImageLoadError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UidiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Render query error: {0}")]
    Render(String),

    #[error(
        "Dimension mismatch: reference {}x{}, actual {}x{}",
        reference.0, reference.1, actual.0, actual.1
    )]
    DimensionMismatch {
        reference: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl UidiffError {
    pub fn render(message: impl Into<String>) -> Self {
        UidiffError::Render(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        UidiffError::Config(message.into())
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            UidiffError::Io(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check file paths/permissions.",
            ),
            UidiffError::Image(e) => ErrorPayload::new(
                ErrorCategory::Image,
                e.to_string(),
                "Verify image path/format and readability.",
            ),
            UidiffError::Serialization(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check JSON inputs (layout files are arrays of {text, bbox:{x0,y0,x1,y1}}).",
            ),
            UidiffError::Render(msg) => ErrorPayload::new(
                ErrorCategory::Render,
                msg.to_string(),
                "Check that the page loads in a browser; rerun with --verbose for details.",
            ),
            UidiffError::DimensionMismatch { .. } => ErrorPayload::new(
                ErrorCategory::Image,
                self.to_string(),
                "Capture the actual screenshot at the reference size (see --viewport).",
            ),
            UidiffError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("playwright npm package is missing") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Install Playwright (e.g., `npm install playwright` and `npx playwright install chromium`).",
                    )
                } else if lower.contains("chromium executable") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Run `npx playwright install chromium` (or `playwright install chromium`) to download the browser.",
                    )
                } else if lower.contains("spawn playwright helper")
                    || lower.contains("node command")
                    || lower.contains("not found on path")
                {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Install Node.js and ensure the node binary is on PATH; rerun after installing Playwright if needed.",
                    )
                } else if lower.contains("timeout") || lower.contains("timed out") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Try increasing --nav-timeout/--network-idle-timeout/--process-timeout or ensure the page loads without blocking.",
                    )
                } else if lower.contains("ocr") || lower.contains("tesseract") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Build with `--features ocr` and install Tesseract, or pass a recognized-text file with --layout.",
                    )
                } else if lower.contains("file not found") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Verify the file exists; use an absolute path or run from the working directory.",
                    )
                } else if lower.contains("check") && lower.contains("requires") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Provide the inputs the enabled checks need, or narrow them with --checks.",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Check flags/paths (e.g., --viewport WIDTHxHEIGHT, --checks pixel-diff,similarity).",
                    )
                }
            }
            UidiffError::Unknown(msg) => ErrorPayload::new(
                ErrorCategory::Unknown,
                msg.to_string(),
                "Re-run with --verbose; file an issue if persistent.",
            ),
        }
    }
}

impl From<ImageLoadError> for UidiffError {
    fn from(err: ImageLoadError) -> Self {
        match err {
            ImageLoadError::Load(e) => UidiffError::Image(e),
            ImageLoadError::NotFound(path) => {
                UidiffError::Config(format!("File not found: {}", path))
            }
            ImageLoadError::Empty(path) => {
                UidiffError::Config(format!("Image has no pixels: {}", path))
            }
            ImageLoadError::Save(msg) => UidiffError::Io(std::io::Error::other(format!(
                "Failed to save image: {}",
                msg
            ))),
        }
    }
}

pub type Result<T> = std::result::Result<T, UidiffError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Render,
    Image,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_payload_includes_playwright_remediation() {
        let err = UidiffError::Config(
            "Playwright npm package is missing; install with `npm install playwright`.".to_string(),
        );
        let payload = err.to_payload();
        assert_eq!(payload.category, ErrorCategory::Config);
        let remediation = payload.remediation.unwrap_or_default();
        assert!(
            remediation.contains("npm install playwright"),
            "expected remediation to mention npm install playwright, got: {remediation}"
        );
    }

    #[test]
    fn config_payload_uses_default_remediation_for_other_messages() {
        let err = UidiffError::Config("Some other config issue".to_string());
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(
            remediation.contains("Check flags/paths"),
            "expected default remediation for generic config errors"
        );
    }

    #[test]
    fn config_payload_includes_node_install_hint() {
        let err = UidiffError::Config(
            "Unable to spawn Playwright helper; 'node' was not found on PATH".to_string(),
        );
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(
            remediation.to_ascii_lowercase().contains("node"),
            "expected node install/path remediation, got: {remediation}"
        );
    }

    #[test]
    fn config_payload_includes_timeout_hint() {
        let err = UidiffError::Config("Playwright timed out after 45s".to_string());
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(
            remediation.contains("--nav-timeout"),
            "expected timeout remediation, got: {remediation}"
        );
    }

    #[test]
    fn config_payload_includes_ocr_hint() {
        let err = UidiffError::Config("OCR is not available in this build".to_string());
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(
            remediation.contains("--layout"),
            "expected OCR remediation to mention --layout, got: {remediation}"
        );
    }

    #[test]
    fn config_payload_explains_missing_check_inputs() {
        let err = UidiffError::Config(
            "pixel-diff check requires both --reference and --actual images".to_string(),
        );
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(
            remediation.contains("--checks"),
            "expected check-narrowing remediation, got: {remediation}"
        );
    }

    #[test]
    fn render_payload_uses_render_category() {
        let payload = UidiffError::render("page crashed").to_payload();
        assert_eq!(payload.category, ErrorCategory::Render);
        assert_eq!(payload.message, "page crashed");
    }

    #[test]
    fn dimension_mismatch_message_lists_both_sizes() {
        let err = UidiffError::DimensionMismatch {
            reference: (100, 100),
            actual: (200, 100),
        };
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: reference 100x100, actual 200x100"
        );
        assert_eq!(err.to_payload().category, ErrorCategory::Image);
    }

    #[test]
    fn missing_image_converts_to_config_error() {
        let err: UidiffError = ImageLoadError::NotFound("ref.png".to_string()).into();
        assert!(matches!(err, UidiffError::Config(ref msg) if msg.contains("ref.png")));
    }
}
