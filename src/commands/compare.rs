use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{debug, info, warn};
use uidiff_lib::output::{CompareArtifacts, CompareOutput, ThresholdSettings, REPORT_VERSION};
use uidiff_lib::types::CheckKind;
use uidiff_lib::{
    BrowserOptions, ComparisonRun, EngineOptions, PageProbe, PageSnapshot, UidiffError,
    UidiffOutput, Viewport,
};

use crate::cli::CompareArgs;
use crate::formatting::{exit_code_for_compare, render_error, write_output};
use crate::pipeline::{
    generate_summary, load_layout, load_optional_raster, persist_diff_image,
    resolve_screenshot_path,
};
use crate::settings::{
    format_effective_config, load_config, resolve_compare_settings, validate_config,
    CompareFlagSources,
};

/// Run the compare command.
pub async fn run_compare(
    raw_args: &[String],
    config_path: Option<PathBuf>,
    verbose: bool,
    args: CompareArgs,
) -> ExitCode {
    let format = args.format;
    let output = args.output.clone();

    let config = match load_config(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, output),
    };
    let flag_sources = CompareFlagSources::from_args(raw_args);
    let resolved = resolve_compare_settings(&args, &config, &flag_sources);
    if let Err(err) = validate_config(&resolved, config_path.as_deref()) {
        return render_error(err, format, output);
    }

    let effective = format_effective_config(&resolved, config_path.as_deref());
    if verbose {
        info!("{effective}");
    } else {
        debug!("{effective}");
    }

    let layout = match load_layout(&args) {
        Ok(layout) => layout,
        Err(err) => return render_error(err, format, output),
    };
    let reference = match load_optional_raster(args.reference.as_deref()) {
        Ok(img) => img,
        Err(err) => return render_error(err, format, output),
    };
    let actual = match load_optional_raster(args.actual.as_deref()) {
        Ok(img) => img,
        Err(err) => return render_error(err, format, output),
    };

    let mut options = EngineOptions::from(&resolved);
    options.pixel.diff_mask = args.diff_mask;
    let image_checks = options.checks.iter().any(|c| c.is_image_check());
    let element_match = options.enabled(CheckKind::ElementMatch);

    let mut run = ComparisonRun::new(options);
    if let Some(records) = &layout {
        run = run.with_layout(records);
    }

    // Screenshot the page when image checks have no actual image of their own.
    let pending_screenshot = args.url.is_some() && actual.is_none() && image_checks;
    let mut pending_reference = None;
    match (reference, actual) {
        (Some(reference), Some(actual)) => run = run.with_images(reference, actual),
        (reference, _) => pending_reference = reference,
    }
    if !pending_screenshot || pending_reference.is_none() {
        if let Err(err) = run.validate(args.url.is_some()) {
            return render_error(err, format, output);
        }
    }

    let mut snapshot: Option<PageSnapshot> = None;
    let mut screenshot: Option<(PathBuf, bool)> = None;
    if let Some(url) = args.url.as_deref() {
        if element_match || pending_screenshot {
            let texts: Vec<String> = if element_match {
                run.expected_elements()
                    .iter()
                    .map(|el| el.text.clone())
                    .collect()
            } else {
                Vec::new()
            };
            let shot = pending_screenshot.then(|| resolve_screenshot_path(args.screenshot.as_deref()));
            // Size the screenshot to the reference unless --viewport says otherwise.
            let viewport = match pending_reference.as_ref() {
                Some(reference) if pending_screenshot && !flag_sources.viewport => {
                    Viewport::from_dimensions(reference.dimensions()).unwrap_or(resolved.viewport)
                }
                _ => resolved.viewport,
            };
            let probe = PageProbe::new(BrowserOptions {
                viewport,
                navigation_timeout: resolved.timeouts.navigation,
                network_idle_timeout: resolved.timeouts.network_idle,
                process_timeout: resolved.timeouts.process,
                ..BrowserOptions::default()
            });
            let captured = probe
                .capture(
                    url,
                    &texts,
                    resolved.match_timeout(),
                    shot.as_ref().map(|(path, _)| path.as_path()),
                )
                .await;
            match captured {
                Ok(page) => snapshot = Some(page),
                Err(err) => {
                    cleanup_screenshot(shot.as_ref());
                    return render_error(err, format, output);
                }
            }
            screenshot = shot;
        }
    }

    if let (Some((path, _)), Some(reference)) = (&screenshot, pending_reference.take()) {
        match load_optional_raster(Some(path.as_path())) {
            Ok(Some(actual)) => run = run.with_images(reference, actual),
            Ok(None) => {}
            Err(err) => {
                cleanup_screenshot(screenshot.as_ref());
                return render_error(
                    UidiffError::render(format!("Failed to read captured screenshot: {}", err)),
                    format,
                    output,
                );
            }
        }
    }

    let result = match snapshot.as_mut() {
        Some(page) if element_match => run.run(Some(page)).await,
        _ => run.run(None::<&mut PageSnapshot>).await,
    };
    let report = match result {
        Ok(report) => report,
        Err(err) => {
            cleanup_screenshot(screenshot.as_ref());
            return render_error(err, format, output);
        }
    };

    let mut artifacts = CompareArtifacts::default();
    if let Some(path) = args.diff_image.as_deref() {
        match persist_diff_image(&report, path) {
            Ok(written) => artifacts.diff_image = written,
            Err(err) => warn!(error = %err, "failed to write diff image"),
        }
    }
    if let Some((path, keep)) = &screenshot {
        if *keep {
            artifacts.actual_screenshot = Some(path.clone());
        } else {
            cleanup_screenshot(screenshot.as_ref());
        }
    }

    let thresholds = run.options().thresholds;
    let summary = generate_summary(&report, &thresholds);
    let passed = report.passed();

    let body = UidiffOutput::Compare(CompareOutput {
        version: REPORT_VERSION.to_string(),
        checks: run.options().checks.clone(),
        thresholds: ThresholdSettings {
            pixel_threshold: resolved.pixel_threshold,
            max_allowed_diff_pixels: thresholds.max_allowed_diff_pixels,
            similarity_pass_threshold: thresholds.similarity_pass_threshold,
        },
        report,
        artifacts: (!artifacts.is_empty()).then_some(artifacts),
        summary: Some(summary),
    });

    if let Err(err) = write_output(&body, format, output.clone()) {
        return render_error(UidiffError::Unknown(err.to_string()), format, output);
    }

    exit_code_for_compare(passed)
}

/// Removes a temporary screenshot; kept paths are left alone.
fn cleanup_screenshot(shot: Option<&(PathBuf, bool)>) {
    if let Some((path, false)) = shot {
        if let Err(err) = std::fs::remove_file(path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %path.display(), error = %err, "failed to remove temp screenshot");
            }
        }
    }
}
