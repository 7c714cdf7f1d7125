//! Input acquisition and artifact persistence for the compare command.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;
use uidiff_lib::image_loader::{load_raster, save_raster};
use uidiff_lib::ocr::{recognize_text, OcrOptions};
use uidiff_lib::output::Summary;
use uidiff_lib::report::{top_issues, Thresholds};
use uidiff_lib::types::{ComparisonReport, RasterImage, RecognizedText};
use uidiff_lib::{load_recognized_text, UidiffError};

use crate::cli::CompareArgs;

/// Most issues listed in the summary.
pub const MAX_SUMMARY_ISSUES: usize = 10;

/// Reads recognized text from `--layout`, or runs OCR on `--ocr`. `None` when neither is given.
pub fn load_layout(args: &CompareArgs) -> Result<Option<Vec<RecognizedText>>, UidiffError> {
    if let Some(path) = &args.layout {
        let records = load_recognized_text(path)?;
        info!(path = %path.display(), records = records.len(), "layout loaded");
        return Ok(Some(records));
    }
    if let Some(path) = &args.ocr {
        let options = OcrOptions {
            min_confidence: args.min_confidence,
            ..OcrOptions::default()
        };
        let records = recognize_text(path, &options)?;
        info!(path = %path.display(), words = records.len(), "OCR finished");
        return Ok(Some(records));
    }
    Ok(None)
}

pub fn load_optional_raster(path: Option<&Path>) -> Result<Option<RasterImage>, UidiffError> {
    path.map(|p| load_raster(p).map_err(UidiffError::from))
        .transpose()
}

/// Where a screenshot captured from `--url` goes: `--screenshot` when given
/// (kept), else a temporary file (removed after the run).
pub fn resolve_screenshot_path(custom: Option<&Path>) -> (PathBuf, bool) {
    if let Some(path) = custom {
        return (path.to_path_buf(), true);
    }

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let path = std::env::temp_dir().join(format!(
        "uidiff-{}-{timestamp}-actual.png",
        std::process::id()
    ));
    (path, false)
}

/// Writes the pixel diff visualization if that stage completed.
pub fn persist_diff_image(
    report: &ComparisonReport,
    path: &Path,
) -> Result<Option<PathBuf>, UidiffError> {
    let Some(pixel) = report.pixel_diff.as_ref().and_then(|o| o.completed()) else {
        return Ok(None);
    };
    if pixel.diff_image.is_empty() {
        return Ok(None);
    }
    save_raster(&pixel.diff_image, path)?;
    info!(path = %path.display(), "diff image written");
    Ok(Some(path.to_path_buf()))
}

pub fn generate_summary(report: &ComparisonReport, thresholds: &Thresholds) -> Summary {
    let mut issues = top_issues(report, thresholds, MAX_SUMMARY_ISSUES);
    if issues.is_empty() {
        issues.push(if report.passed() {
            "UI parity check passed".to_string()
        } else {
            "UI parity check failed".to_string()
        });
    }
    Summary { top_issues: issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uidiff_lib::report::aggregate;
    use uidiff_lib::types::{PixelDiffResult, StageOutcome};

    #[test]
    fn screenshot_path_prefers_custom() {
        let (path, keep) = resolve_screenshot_path(Some(Path::new("shots/actual.png")));
        assert_eq!(path, PathBuf::from("shots/actual.png"));
        assert!(keep);

        let (tmp, keep) = resolve_screenshot_path(None);
        assert!(!keep);
        assert!(tmp.starts_with(std::env::temp_dir()));
    }

    #[test]
    fn missing_optional_raster_is_none() {
        assert!(load_optional_raster(None).unwrap().is_none());
        let err = load_optional_raster(Some(Path::new("/nonexistent/ref.png"))).unwrap_err();
        assert!(matches!(err, UidiffError::Config(ref m) if m.contains("File not found")));
    }

    #[test]
    fn diff_image_is_written_only_for_completed_stage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diff.png");

        let empty = aggregate(vec![], None, None, &Thresholds::default());
        assert!(persist_diff_image(&empty, &path).unwrap().is_none());
        assert!(!path.exists());

        let report = aggregate(
            vec![],
            Some(StageOutcome::Completed(PixelDiffResult {
                diff_pixel_count: 0,
                anti_aliased_pixel_count: 0,
                total_pixels: 4,
                diff_image: RasterImage::filled(2, 2, [255, 0, 0, 255]).unwrap(),
            })),
            None,
            &Thresholds::default(),
        );
        assert_eq!(persist_diff_image(&report, &path).unwrap(), Some(path.clone()));
        assert!(path.exists());
    }

    #[test]
    fn placeholder_diff_image_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diff.png");
        let report = aggregate(
            vec![],
            Some(StageOutcome::Completed(PixelDiffResult {
                diff_pixel_count: 0,
                anti_aliased_pixel_count: 0,
                total_pixels: 0,
                diff_image: RasterImage::default(),
            })),
            None,
            &Thresholds::default(),
        );
        assert!(persist_diff_image(&report, &path).unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn summary_falls_back_to_verdict() {
        let report = aggregate(vec![], None, None, &Thresholds::default());
        let summary = generate_summary(&report, &Thresholds::default());
        assert_eq!(summary.top_issues, vec!["UI parity check passed"]);
    }
}
