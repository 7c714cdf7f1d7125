//! Report aggregation: merges stage outputs into one [`ComparisonReport`].

use crate::types::{
    ComparisonReport, Issue, MatchResult, PixelDiffResult, ReportStatus, SimilarityResult,
    StageOutcome,
};

/// Pass/fail limits applied by [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Largest diff pixel count that still passes
    pub max_allowed_diff_pixels: u64,
    /// Lowest SSIM score that still passes
    pub similarity_pass_threshold: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_allowed_diff_pixels: 0,
            similarity_pass_threshold: 0.95,
        }
    }
}

/// Builds the report. Checks that were not run are passed as `None` and do
/// not influence the verdict.
pub fn aggregate(
    match_results: Vec<MatchResult>,
    pixel_diff: Option<StageOutcome<PixelDiffResult>>,
    similarity: Option<StageOutcome<SimilarityResult>>,
    thresholds: &Thresholds,
) -> ComparisonReport {
    let issues: Vec<Issue> = match_results
        .iter()
        .filter(|r| !r.status.is_found())
        .map(Issue::from)
        .collect();

    let pixel_ok = match &pixel_diff {
        None => true,
        Some(StageOutcome::Completed(p)) => {
            p.diff_pixel_count <= thresholds.max_allowed_diff_pixels
        }
        Some(StageOutcome::Failed(_)) => false,
    };
    let similarity_ok = match &similarity {
        None => true,
        Some(StageOutcome::Completed(s)) => s.score >= thresholds.similarity_pass_threshold,
        Some(StageOutcome::Failed(_)) => false,
    };

    let status = if issues.is_empty() && pixel_ok && similarity_ok {
        ReportStatus::Pass
    } else {
        ReportStatus::Fail
    };

    ComparisonReport {
        status,
        issues,
        match_results,
        pixel_diff,
        similarity,
    }
}

/// One-line descriptions of what failed, most severe first.
pub fn top_issues(report: &ComparisonReport, thresholds: &Thresholds, max: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for stage in [
        report.pixel_diff.as_ref().and_then(|o| o.failure()),
        report.similarity.as_ref().and_then(|o| o.failure()),
    ]
    .into_iter()
    .flatten()
    {
        let sizes = match (stage.reference, stage.actual) {
            (Some(r), Some(a)) => format!(
                " (reference {}x{}, actual {}x{})",
                r.width, r.height, a.width, a.height
            ),
            _ => String::new(),
        };
        let line = format!("Image comparison failed: {}{}", stage.reason, sizes);
        if !lines.contains(&line) {
            lines.push(line);
        }
    }

    if let Some(pixel) = report.pixel_diff.as_ref().and_then(|o| o.completed()) {
        if pixel.diff_pixel_count > thresholds.max_allowed_diff_pixels {
            lines.push(format!(
                "{} pixels differ ({:.2}% of image, {} allowed)",
                pixel.diff_pixel_count,
                pixel.diff_ratio() * 100.0,
                thresholds.max_allowed_diff_pixels
            ));
        }
    }

    if let Some(similarity) = report.similarity.as_ref().and_then(|o| o.completed()) {
        if similarity.score < thresholds.similarity_pass_threshold {
            lines.push(format!(
                "Structural similarity {:.3} is below {:.3}",
                similarity.score, thresholds.similarity_pass_threshold
            ));
        }
    }

    lines.extend(report.issues.iter().map(Issue::message));
    lines.truncate(max);
    lines
}
