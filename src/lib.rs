//! uidiff library
//!
//! A comparison engine for UI parity checks. A reference design is compared
//! against a rendered page in up to three ways: text recognized in the design
//! is located on the live page, and the reference image is compared with a
//! screenshot by perceptual pixel count and by structural similarity.
//!
//! # Module Overview
//!
//! - [`layout`] - Recognized text to expected elements
//! - [`matcher`] - Locating expected elements through a [`LiveRender`]
//! - [`metrics`] - Pixel diff (YIQ, anti-aliasing aware) and windowed SSIM
//! - [`report`] - Merging stage results into a pass/fail report
//! - [`engine`] - One comparison run wiring the stages together
//! - [`browser`] - Playwright-backed page probe
//! - [`ocr`] - Optional Tesseract text recognition
//! - [`config`] - Configuration file support
//! - [`types`] - Core data types
//! - [`output`] - JSON output schemas
//!
//! # Example
//!
//! ```no_run
//! use uidiff_lib::{load_raster, ComparisonRun, EngineOptions, PageSnapshot};
//! use uidiff_lib::types::CheckKind;
//!
//! # async fn example() -> uidiff_lib::Result<()> {
//! let reference = load_raster("design.png".as_ref())?;
//! let actual = load_raster("screenshot.png".as_ref())?;
//!
//! let options = EngineOptions {
//!     checks: vec![CheckKind::PixelDiff, CheckKind::Similarity],
//!     ..EngineOptions::default()
//! };
//! let report = ComparisonRun::new(options)
//!     .with_images(reference, actual)
//!     .run(None::<&mut PageSnapshot>)
//!     .await?;
//! println!("passed: {}", report.passed());
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod config;
pub mod engine;
pub mod error;
pub mod image_loader;
pub mod layout;
pub mod matcher;
pub mod metrics;
pub mod ocr;
pub mod output;
pub mod report;
pub mod types;
pub mod viewport;

pub use browser::{
    BrowserOptions, PageProbe, PageSnapshot, TextProbe, DEFAULT_NAVIGATION_TIMEOUT,
    DEFAULT_NETWORK_IDLE_TIMEOUT, DEFAULT_PROCESS_TIMEOUT, MOCK_SNAPSHOT_ENV,
};
pub use config::Config;
pub use engine::{ComparisonRun, EngineOptions};
pub use error::{Result, UidiffError};
pub use image_loader::{load_image, load_raster, save_raster};
pub use layout::{filter_by_confidence, load_recognized_text, normalize_layout};
pub use matcher::{match_element, match_elements, LiveRender, MatchOptions};
pub use metrics::{compute_similarity, diff_pixels, PixelDiffOptions, SsimOptions};
pub use output::{CompareOutput, ErrorOutput, UidiffOutput, REPORT_VERSION};
pub use report::{aggregate, Thresholds};
pub use viewport::Viewport;
