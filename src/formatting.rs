use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use uidiff_lib::output::REPORT_VERSION;
use uidiff_lib::types::MatchStatus;
use uidiff_lib::{ErrorOutput, UidiffError, UidiffOutput};

use crate::cli::OutputFormat;

/// Write output in the requested format.
pub fn write_output(
    body: &UidiffOutput,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => write_json_output(body, output.as_deref())?,
        OutputFormat::Pretty => write_pretty_output(body, output.as_deref())?,
    };
    Ok(())
}

/// Render an error and return the appropriate exit code.
pub fn render_error(err: UidiffError, format: OutputFormat, output: Option<PathBuf>) -> ExitCode {
    let error_payload = err.to_payload();
    let payload = UidiffOutput::Error(ErrorOutput {
        version: REPORT_VERSION.to_string(),
        message: Some(error_payload.message.clone()),
        error: error_payload,
    });

    match format {
        OutputFormat::Json => {
            let content =
                serde_json::to_string(&payload).unwrap_or_else(|_| "{\"mode\":\"error\"}".into());
            if let Some(path) = output {
                if let Err(write_err) = std::fs::write(&path, &content) {
                    eprintln!("Failed to write error output: {}", write_err);
                    println!("{content}");
                }
            } else {
                println!("{content}");
            }
        }
        OutputFormat::Pretty => {
            if let Err(write_err) = write_pretty_output(&payload, output.as_deref()) {
                eprintln!("Failed to write error output: {}", write_err);
            }
        }
    };

    // Reserve exit code 2 for fatal/errors; comparison failures use 1.
    ExitCode::from(2)
}

/// Write JSON output to file or stdout.
fn write_json_output(
    body: &UidiffOutput,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string(body)?;
    if let Some(path) = output {
        std::fs::write(path, content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Write pretty output to file or stdout.
fn write_pretty_output(body: &UidiffOutput, output: Option<&Path>) -> io::Result<()> {
    let stdout_is_tty = std::io::stdout().is_terminal();
    let use_human = output.is_none() && stdout_is_tty;

    if use_human {
        let content = format_pretty(body, true);
        println!("{content}");
        return Ok(());
    }

    // Non-tty or file output: keep JSON shape for pipelines/files.
    let content =
        serde_json::to_string_pretty(body).unwrap_or_else(|_| "{\"mode\":\"error\"}".to_string());
    if let Some(path) = output {
        std::fs::write(path, &content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &UidiffOutput, colorize: bool) -> String {
    match body {
        UidiffOutput::Compare(out) => {
            let mut buf = String::new();
            let report = &out.report;
            let passed = report.passed();
            let status = if passed { "PASS" } else { "FAIL" };
            let status_colored = color(status, if passed { "32" } else { "31" }, colorize);
            writeln!(buf, "{} UI parity check", status_colored).ok();

            if !report.match_results.is_empty() {
                let found = report
                    .match_results
                    .iter()
                    .filter(|r| r.status == MatchStatus::Found)
                    .count();
                let total = report.match_results.len();
                let text = format!("{}/{} found", found, total);
                let code = if found == total { "32" } else { "31" };
                writeln!(buf, "Elements:   {}", color(&text, code, colorize)).ok();
            }

            match &report.pixel_diff {
                Some(outcome) => {
                    let line = match (outcome.completed(), outcome.failure()) {
                        (Some(p), _) => {
                            let ok = p.diff_pixel_count <= out.thresholds.max_allowed_diff_pixels;
                            let text = format!(
                                "{} px ({:.2}%, allowed {})",
                                p.diff_pixel_count,
                                p.diff_ratio() * 100.0,
                                out.thresholds.max_allowed_diff_pixels
                            );
                            color(&text, if ok { "32" } else { "31" }, colorize)
                        }
                        (None, Some(f)) => color(&format!("failed: {}", f.reason), "31", colorize),
                        (None, None) => String::new(),
                    };
                    writeln!(buf, "Pixel diff: {line}").ok();
                }
                None => {}
            }

            if let Some(outcome) = &report.similarity {
                let line = match (outcome.completed(), outcome.failure()) {
                    (Some(s), _) => {
                        let th = out.thresholds.similarity_pass_threshold;
                        let code = if s.score >= th {
                            "32"
                        } else if (th - s.score) <= 0.05 {
                            "33"
                        } else {
                            "31"
                        };
                        let text = format!("{:.3} (threshold {:.2})", s.score, th);
                        color(&text, code, colorize)
                    }
                    (None, Some(f)) => color(&format!("failed: {}", f.reason), "31", colorize),
                    (None, None) => String::new(),
                };
                writeln!(buf, "Similarity: {line}").ok();
            }

            let issues: Vec<String> = out
                .summary
                .as_ref()
                .map(|s| s.top_issues.iter().take(5).cloned().collect())
                .unwrap_or_default();
            if !passed && !issues.is_empty() {
                writeln!(buf, "Top issues (max 5):").ok();
                for issue in issues {
                    writeln!(buf, "- {issue}").ok();
                }
            }

            if let Some(art) = &out.artifacts {
                let mut paths = Vec::new();
                if let Some(p) = &art.diff_image {
                    paths.push(("diffImage", p.clone()));
                }
                if let Some(p) = &art.actual_screenshot {
                    paths.push(("actualScreenshot", p.clone()));
                }
                if !paths.is_empty() {
                    writeln!(buf, "Artifacts:").ok();
                    for (label, path) in paths {
                        writeln!(buf, "- {:16} {}", label, path.display()).ok();
                    }
                }
            }

            buf
        }
        UidiffOutput::Error(out) => {
            let mut buf = String::new();
            let header = color("[ERROR]", "31", colorize);
            let message = out
                .message
                .as_deref()
                .unwrap_or(out.error.message.as_str());
            writeln!(buf, "{} {}", header, message).ok();
            if let Some(remediation) = &out.error.remediation {
                writeln!(buf, "Hint: {}", remediation).ok();
            }
            buf
        }
    }
}

/// Apply ANSI color codes when enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

/// Determine exit code for compare command.
pub fn exit_code_for_compare(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
