use crate::error::ErrorPayload;
use crate::types::{CheckKind, ComparisonReport};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Schema version for output payloads.
pub const REPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum UidiffOutput {
    Compare(CompareOutput),
    Error(ErrorOutput),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareOutput {
    pub version: String,
    pub checks: Vec<CheckKind>,
    pub thresholds: ThresholdSettings,
    #[serde(flatten)]
    pub report: ComparisonReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<CompareArtifacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdSettings {
    pub pixel_threshold: f64,
    pub max_allowed_diff_pixels: u64,
    pub similarity_pass_threshold: f64,
}

/// Files written alongside the report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareArtifacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_image: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_screenshot: Option<PathBuf>,
}

impl CompareArtifacts {
    pub fn is_empty(&self) -> bool {
        self.diff_image.is_none() && self.actual_screenshot.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error: ErrorPayload,
}
