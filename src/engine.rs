//! One comparison run: normalize, match, diff, score, aggregate.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::Config;
use crate::layout::normalize_layout;
use crate::matcher::{match_elements, LiveRender, MatchOptions};
use crate::metrics::{compute_similarity, diff_pixels, PixelDiffOptions, SsimOptions};
use crate::report::{aggregate, Thresholds};
use crate::types::{
    CheckKind, ComparisonReport, ExpectedElement, PixelDiffResult, RasterImage, RecognizedText,
    SimilarityResult, StageFailure, StageOutcome,
};
use crate::{Result, UidiffError};

/// Which checks run and how they are tuned.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub checks: Vec<CheckKind>,
    pub pixel: PixelDiffOptions,
    pub ssim: SsimOptions,
    pub matching: MatchOptions,
    pub thresholds: Thresholds,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for EngineOptions {
    fn from(config: &Config) -> Self {
        Self {
            checks: config.checks.clone(),
            pixel: PixelDiffOptions {
                threshold: config.pixel_threshold,
                detect_anti_aliasing: config.anti_aliasing,
                ..PixelDiffOptions::default()
            },
            ssim: SsimOptions::default(),
            matching: MatchOptions {
                wait_timeout: config.match_timeout(),
            },
            thresholds: Thresholds {
                max_allowed_diff_pixels: config.max_allowed_diff_pixels,
                similarity_pass_threshold: config.similarity_pass_threshold,
            },
        }
    }
}

impl EngineOptions {
    pub fn enabled(&self, check: CheckKind) -> bool {
        self.checks.contains(&check)
    }
}

/// Inputs for a single comparison. Built up front, validated, then run once.
#[derive(Debug, Clone)]
pub struct ComparisonRun {
    options: EngineOptions,
    elements: Option<Vec<ExpectedElement>>,
    reference: Option<Arc<RasterImage>>,
    actual: Option<Arc<RasterImage>>,
}

impl ComparisonRun {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            elements: None,
            reference: None,
            actual: None,
        }
    }

    /// Normalizes recognized text into the elements to match.
    pub fn with_layout(mut self, records: &[RecognizedText]) -> Self {
        let elements = normalize_layout(records);
        debug!(
            records = records.len(),
            kept = elements.len(),
            "layout normalized"
        );
        self.elements = Some(elements);
        self
    }

    pub fn with_images(mut self, reference: RasterImage, actual: RasterImage) -> Self {
        self.reference = Some(Arc::new(reference));
        self.actual = Some(Arc::new(actual));
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Elements that will be matched, in order. Empty without a layout.
    pub fn expected_elements(&self) -> &[ExpectedElement] {
        self.elements.as_deref().unwrap_or_default()
    }

    /// Rejects structurally invalid runs before any comparison work.
    pub fn validate(&self, has_render: bool) -> Result<()> {
        let opts = &self.options;
        if opts.checks.is_empty() {
            return Err(UidiffError::config(
                "No checks enabled; pass at least one of element-match, pixel-diff, similarity",
            ));
        }
        if !(0.0..=1.0).contains(&opts.pixel.threshold) {
            return Err(UidiffError::config(format!(
                "Pixel threshold must be within 0.0-1.0 (got {})",
                opts.pixel.threshold
            )));
        }
        if !(0.0..=1.0).contains(&opts.thresholds.similarity_pass_threshold) {
            return Err(UidiffError::config(format!(
                "Similarity threshold must be within 0.0-1.0 (got {})",
                opts.thresholds.similarity_pass_threshold
            )));
        }
        for check in [CheckKind::PixelDiff, CheckKind::Similarity] {
            if opts.enabled(check) && (self.reference.is_none() || self.actual.is_none()) {
                return Err(UidiffError::config(format!(
                    "{} check requires both a reference and an actual image",
                    check
                )));
            }
        }
        if opts.enabled(CheckKind::ElementMatch) {
            if self.elements.is_none() {
                return Err(UidiffError::config(
                    "element-match check requires a layout (recognized text or OCR)",
                ));
            }
            if !has_render {
                return Err(UidiffError::config(
                    "element-match check requires a live page to match against",
                ));
            }
        }
        Ok(())
    }

    /// Runs every enabled check and aggregates the report.
    ///
    /// Per-element and image precondition failures end up in the report; only
    /// invalid configuration returns `Err`.
    pub async fn run<R: LiveRender>(&self, render: Option<&mut R>) -> Result<ComparisonReport> {
        self.validate(render.is_some())?;
        let started = Instant::now();

        let match_results = match render {
            Some(render) if self.options.enabled(CheckKind::ElementMatch) => {
                let elements = self.expected_elements();
                let results = match_elements(render, elements, &self.options.matching).await;
                info!(
                    elements = elements.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "element matching finished"
                );
                results
            }
            _ => Vec::new(),
        };

        let (pixel_diff, similarity) = self.run_image_stages().await?;

        let report = aggregate(
            match_results,
            pixel_diff,
            similarity,
            &self.options.thresholds,
        );
        info!(
            status = ?report.status,
            issues = report.issues.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "comparison finished"
        );
        Ok(report)
    }

    async fn run_image_stages(
        &self,
    ) -> Result<(
        Option<StageOutcome<PixelDiffResult>>,
        Option<StageOutcome<SimilarityResult>>,
    )> {
        let want_pixel = self.options.enabled(CheckKind::PixelDiff);
        let want_ssim = self.options.enabled(CheckKind::Similarity);
        let (reference, actual) = match (&self.reference, &self.actual) {
            (Some(r), Some(a)) if want_pixel || want_ssim => (Arc::clone(r), Arc::clone(a)),
            _ => return Ok((None, None)),
        };

        if reference.dimensions() != actual.dimensions() {
            info!(
                reference = ?reference.dimensions(),
                actual = ?actual.dimensions(),
                "image dimensions differ; skipping image checks"
            );
            let failure = StageFailure::dimension_mismatch(reference.dimensions(), actual.dimensions());
            return Ok((
                want_pixel.then(|| StageOutcome::Failed(failure.clone())),
                want_ssim.then(|| StageOutcome::Failed(failure)),
            ));
        }

        let started = Instant::now();
        let pixel_task = want_pixel.then(|| {
            let (r, a, opts) = (Arc::clone(&reference), Arc::clone(&actual), self.options.pixel);
            tokio::task::spawn_blocking(move || diff_pixels(&r, &a, &opts))
        });
        let ssim_task = want_ssim.then(|| {
            let (r, a, opts) = (Arc::clone(&reference), Arc::clone(&actual), self.options.ssim);
            tokio::task::spawn_blocking(move || compute_similarity(&r, &a, &opts))
        });

        let pixel = match pixel_task {
            Some(task) => Some(into_outcome(task.await.map_err(join_error)?)?),
            None => None,
        };
        let ssim = match ssim_task {
            Some(task) => Some(into_outcome(task.await.map_err(join_error)?)?),
            None => None,
        };

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "image checks finished"
        );
        Ok((pixel, ssim))
    }
}

fn into_outcome<T>(result: Result<T>) -> Result<StageOutcome<T>> {
    match result {
        Ok(value) => Ok(StageOutcome::Completed(value)),
        Err(UidiffError::DimensionMismatch { reference, actual }) => Ok(StageOutcome::Failed(
            StageFailure::dimension_mismatch(reference, actual),
        )),
        Err(other) => Err(other),
    }
}

fn join_error(err: tokio::task::JoinError) -> UidiffError {
    UidiffError::Unknown(format!("image comparison task failed: {}", err))
}
