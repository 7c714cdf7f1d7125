//! Element match outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::core::{Delta, ElementBox, ExpectedElement, Point, Position};

/// Outcome of resolving one expected element against the live render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Found,
    NotFound,
    NotVisible,
    NoBoundingBox,
    Error,
}

impl MatchStatus {
    pub fn is_found(self) -> bool {
        matches!(self, MatchStatus::Found)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                MatchStatus::Found => "found",
                MatchStatus::NotFound => "not_found",
                MatchStatus::NotVisible => "not_visible",
                MatchStatus::NoBoundingBox => "no_bounding_box",
                MatchStatus::Error => "error",
            }
        )
    }
}

/// Result of matching a single [`ExpectedElement`].
///
/// `actual` and `delta` are only present for [`MatchStatus::Found`];
/// `error` only for [`MatchStatus::Error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub text: String,
    pub status: MatchStatus,
    pub expected: Point,
    pub actual: Option<Position>,
    pub delta: Option<Delta>,
    pub error: Option<String>,
}

impl MatchResult {
    pub fn found(element: &ExpectedElement, bounds: ElementBox) -> Self {
        let expected = element.position();
        let actual = bounds.origin();
        Self {
            text: element.text.clone(),
            status: MatchStatus::Found,
            expected,
            actual: Some(actual),
            delta: Some(Delta::between(expected, actual)),
            error: None,
        }
    }

    /// A resolution failure that carries no position data.
    pub fn unresolved(element: &ExpectedElement, status: MatchStatus) -> Self {
        debug_assert!(!matches!(status, MatchStatus::Found | MatchStatus::Error));
        Self {
            text: element.text.clone(),
            status,
            expected: element.position(),
            actual: None,
            delta: None,
            error: None,
        }
    }

    pub fn failed(element: &ExpectedElement, message: impl Into<String>) -> Self {
        Self {
            text: element.text.clone(),
            status: MatchStatus::Error,
            expected: element.position(),
            actual: None,
            delta: None,
            error: Some(message.into()),
        }
    }
}
