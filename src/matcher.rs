//! Element matching against a live render.
//!
//! The live page is reached only through the [`LiveRender`] capability, passed
//! in explicitly. Its methods take `&mut self`: a render session is a single
//! mutable context and queries against it are serialized.
//!
//! Matching is by exact text; when several live elements share a text, the
//! collaborator reports on the first one in document order. Repeated labels
//! can therefore be matched to the wrong element.

use std::time::Duration;

use tracing::{debug, warn};

use crate::types::{ElementBox, ExpectedElement, MatchResult, MatchStatus};
use crate::Result;

/// Geometry and visibility queries against a rendered page.
#[allow(async_fn_in_trait)]
pub trait LiveRender {
    /// Number of live elements whose text equals `text`.
    async fn count(&mut self, text: &str) -> Result<usize>;

    /// Whether the first matching element is visible.
    async fn is_visible(&mut self, text: &str) -> Result<bool>;

    /// Bounds of the first matching element, if it has a layout box.
    async fn bounding_box(&mut self, text: &str) -> Result<Option<ElementBox>>;

    /// Waits up to `timeout` for `text` to appear. Returns whether it did.
    ///
    /// The default does not wait.
    async fn wait_for(&mut self, text: &str, _timeout: Duration) -> Result<bool> {
        Ok(self.count(text).await? > 0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    /// Bounded wait before each lookup; `None` queries immediately.
    pub wait_timeout: Option<Duration>,
}

/// Resolves one element. Collaborator failures become [`MatchStatus::Error`].
pub async fn match_element<R: LiveRender>(
    render: &mut R,
    element: &ExpectedElement,
    options: &MatchOptions,
) -> MatchResult {
    match resolve(render, element, options).await {
        Ok(result) => result,
        Err(err) => {
            warn!(text = %element.text, error = %err, "render query failed");
            MatchResult::failed(element, err.to_string())
        }
    }
}

async fn resolve<R: LiveRender>(
    render: &mut R,
    element: &ExpectedElement,
    options: &MatchOptions,
) -> Result<MatchResult> {
    let text = element.text.as_str();

    if let Some(timeout) = options.wait_timeout {
        // Only gives the page time to settle; the status below comes from `count`.
        render.wait_for(text, timeout).await?;
    }

    if render.count(text).await? == 0 {
        return Ok(MatchResult::unresolved(element, MatchStatus::NotFound));
    }
    if !render.is_visible(text).await? {
        return Ok(MatchResult::unresolved(element, MatchStatus::NotVisible));
    }
    match render.bounding_box(text).await? {
        Some(bounds) => Ok(MatchResult::found(element, bounds)),
        None => Ok(MatchResult::unresolved(element, MatchStatus::NoBoundingBox)),
    }
}

/// Matches every element in order. Always yields one result per element.
pub async fn match_elements<R: LiveRender>(
    render: &mut R,
    elements: &[ExpectedElement],
    options: &MatchOptions,
) -> Vec<MatchResult> {
    let mut results = Vec::with_capacity(elements.len());
    for element in elements {
        let result = match_element(render, element, options).await;
        match (result.status, result.delta) {
            (MatchStatus::Found, Some(delta)) => debug!(
                text = %result.text,
                dx = delta.x,
                dy = delta.y,
                "element found"
            ),
            (status, _) => debug!(text = %result.text, %status, "element unresolved"),
        }
        results.push(result);
    }
    results
}
