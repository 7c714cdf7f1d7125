//! Comparison result types.
//!
//! These types represent the outputs of the comparison stages and the final
//! report assembled from them:
//! - Pixel diff (perceptual difference count)
//! - Structural similarity (mean SSIM)
//! - Element matching issues
//! - Stage failures for image preconditions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::core::{Delta, Point, Position};
use super::matching::{MatchResult, MatchStatus};
use super::raster::RasterImage;

/// A comparison strategy that can be enabled for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    ElementMatch,
    PixelDiff,
    Similarity,
}

impl CheckKind {
    pub const fn all() -> [CheckKind; 3] {
        [
            CheckKind::ElementMatch,
            CheckKind::PixelDiff,
            CheckKind::Similarity,
        ]
    }

    pub fn is_image_check(self) -> bool {
        matches!(self, CheckKind::PixelDiff | CheckKind::Similarity)
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CheckKind::ElementMatch => "element-match",
                CheckKind::PixelDiff => "pixel-diff",
                CheckKind::Similarity => "similarity",
            }
        )
    }
}

impl FromStr for CheckKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "element-match" | "elements" | "element" => Ok(CheckKind::ElementMatch),
            "pixel-diff" | "pixel" => Ok(CheckKind::PixelDiff),
            "similarity" | "ssim" => Ok(CheckKind::Similarity),
            other => Err(format!(
                "unknown check '{}' (expected element-match, pixel-diff, similarity)",
                other
            )),
        }
    }
}

/// Output of the pixel diff engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelDiffResult {
    /// Pixels whose perceptual distance exceeded the threshold
    pub diff_pixel_count: u64,
    /// Pixels above the threshold that were classified as anti-aliasing
    #[serde(default)]
    pub anti_aliased_pixel_count: u64,
    #[serde(default)]
    pub total_pixels: u64,
    /// Visualization, same dimensions as the inputs; persisted separately
    #[serde(skip)]
    pub diff_image: RasterImage,
}

impl PixelDiffResult {
    pub fn diff_ratio(&self) -> f64 {
        if self.total_pixels == 0 {
            0.0
        } else {
            self.diff_pixel_count as f64 / self.total_pixels as f64
        }
    }
}

/// Output of the structural similarity scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityResult {
    /// Mean SSIM (0.0 - 1.0); 1.0 means identical
    pub score: f64,
    /// Number of windows averaged into the score
    #[serde(default)]
    pub windows: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl From<(u32, u32)> for ImageSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStatus {
    Fail,
}

/// A fatal precondition failure that replaced an image stage's result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageFailure {
    pub status: FailureStatus,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ImageSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<ImageSize>,
}

impl StageFailure {
    pub const DIMENSION_MISMATCH: &'static str = "dimension mismatch";

    pub fn dimension_mismatch(reference: (u32, u32), actual: (u32, u32)) -> Self {
        Self {
            status: FailureStatus::Fail,
            reason: Self::DIMENSION_MISMATCH.to_string(),
            reference: Some(reference.into()),
            actual: Some(actual.into()),
        }
    }
}

/// Either a stage's result or the precondition failure that prevented it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageOutcome<T> {
    Completed(T),
    Failed(StageFailure),
}

impl<T> StageOutcome<T> {
    pub fn completed(&self) -> Option<&T> {
        match self {
            StageOutcome::Completed(value) => Some(value),
            StageOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        match self {
            StageOutcome::Completed(_) => None,
            StageOutcome::Failed(failure) => Some(failure),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pass,
    Fail,
}

impl ReportStatus {
    pub fn is_pass(self) -> bool {
        matches!(self, ReportStatus::Pass)
    }
}

/// Human-facing projection of a non-found [`MatchResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub text: String,
    pub status: MatchStatus,
    pub expected: Point,
    pub actual: Option<Position>,
    pub delta: Option<Delta>,
    pub error: Option<String>,
}

impl Issue {
    pub fn message(&self) -> String {
        match self.status {
            MatchStatus::Found => format!("'{}' found", self.text),
            MatchStatus::NotFound => format!("'{}' not found on the page", self.text),
            MatchStatus::NotVisible => format!("'{}' is present but not visible", self.text),
            MatchStatus::NoBoundingBox => {
                format!("'{}' is visible but has no bounding box", self.text)
            }
            MatchStatus::Error => format!(
                "'{}' could not be resolved: {}",
                self.text,
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

impl From<&MatchResult> for Issue {
    fn from(result: &MatchResult) -> Self {
        Self {
            text: result.text.clone(),
            status: result.status,
            expected: result.expected,
            actual: result.actual,
            delta: result.delta,
            error: result.error.clone(),
        }
    }
}

/// The single structured outcome of a comparison run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub status: ReportStatus,
    pub issues: Vec<Issue>,
    pub match_results: Vec<MatchResult>,
    pub pixel_diff: Option<StageOutcome<PixelDiffResult>>,
    pub similarity: Option<StageOutcome<SimilarityResult>>,
}

impl ComparisonReport {
    pub fn passed(&self) -> bool {
        self.status.is_pass()
    }
}
