//! Data model shared across the comparison stages.

mod core;
mod matching;
mod raster;
mod report;

pub use self::core::{
    Delta, ElementBox, ExpectedElement, Point, Position, RecognizedText, TextBox,
};
pub use self::matching::{MatchResult, MatchStatus};
pub use self::raster::RasterImage;
pub use self::report::{
    CheckKind, ComparisonReport, FailureStatus, ImageSize, Issue, PixelDiffResult, ReportStatus,
    SimilarityResult, StageFailure, StageOutcome,
};
pub use crate::viewport::Viewport;
