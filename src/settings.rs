use std::path::Path;
use std::time::Duration;

use uidiff_lib::{Config, UidiffError};

use crate::cli::CompareArgs;

/// Tracks which CLI flags were explicitly provided vs. defaulted.
#[derive(Debug, Default)]
pub struct CompareFlagSources {
    pub viewport: bool,
    pub pixel_threshold: bool,
    pub similarity_threshold: bool,
    pub max_diff_pixels: bool,
    pub nav_timeout: bool,
    pub network_idle_timeout: bool,
    pub process_timeout: bool,
}

impl CompareFlagSources {
    pub fn from_args(args: &[String]) -> Self {
        Self {
            viewport: flag_present(args, "--viewport"),
            pixel_threshold: flag_present(args, "--pixel-threshold"),
            similarity_threshold: flag_present(args, "--similarity-threshold"),
            max_diff_pixels: flag_present(args, "--max-diff-pixels"),
            nav_timeout: flag_present(args, "--nav-timeout"),
            network_idle_timeout: flag_present(args, "--network-idle-timeout"),
            process_timeout: flag_present(args, "--process-timeout"),
        }
    }
}

/// Checks if a flag was present in the command-line arguments.
pub fn flag_present(args: &[String], flag: &str) -> bool {
    args.iter()
        .any(|arg| arg == flag || arg.starts_with(&format!("{flag}=")))
}

/// Merge CLI arguments into the loaded config, preferring CLI when flags are present.
///
/// Flags with defaults only win when typed explicitly; optional flags win whenever set.
pub fn resolve_compare_settings(
    args: &CompareArgs,
    config: &Config,
    flags: &CompareFlagSources,
) -> Config {
    let mut resolved = config.clone();

    if flags.viewport {
        resolved.viewport = args.viewport;
    }
    if flags.pixel_threshold {
        resolved.pixel_threshold = args.pixel_threshold;
    }
    if flags.similarity_threshold {
        resolved.similarity_pass_threshold = args.similarity_threshold;
    }
    if flags.max_diff_pixels {
        resolved.max_allowed_diff_pixels = args.max_diff_pixels;
    }
    if flags.nav_timeout {
        resolved.timeouts.navigation = Duration::from_secs(args.nav_timeout);
    }
    if flags.network_idle_timeout {
        resolved.timeouts.network_idle = Duration::from_secs(args.network_idle_timeout);
    }
    if flags.process_timeout {
        resolved.timeouts.process = Duration::from_secs(args.process_timeout);
    }
    if let Some(ms) = args.match_timeout_ms {
        resolved.match_timeout_ms = Some(ms);
    }
    if let Some(checks) = &args.checks {
        let mut unique = Vec::with_capacity(checks.len());
        for check in checks {
            if !unique.contains(check) {
                unique.push(*check);
            }
        }
        resolved.checks = unique;
    }
    if args.no_anti_aliasing {
        resolved.anti_aliasing = false;
    }

    resolved
}

/// Load config from a TOML file, central config, or return defaults.
/// Priority: explicit path > ~/.config/uidiff/config.toml > defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, UidiffError> {
    let cfg = Config::load(path).map_err(|e| {
        let loc = path
            .map(|p| p.display().to_string())
            .or_else(|| Config::central_config_path().map(|p| p.display().to_string()))
            .unwrap_or_else(|| "defaults".to_string());
        UidiffError::Config(format!("Failed to read config {}: {}", loc, e))
    })?;

    validate_config(&cfg, path)?;
    Ok(cfg)
}

/// Validate a (possibly CLI-merged) config.
pub fn validate_config(cfg: &Config, path: Option<&Path>) -> Result<(), UidiffError> {
    cfg.validate().map_err(|e| {
        let prefix = path
            .map(|p| format!("Invalid config ({}): {}", p.display(), e))
            .unwrap_or_else(|| format!("Invalid config: {}", e));
        UidiffError::Config(prefix)
    })
}

/// Format effective config as a single-line string.
pub fn format_effective_config(cfg: &Config, config_source: Option<&Path>) -> String {
    let source = config_source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    let checks: Vec<String> = cfg.checks.iter().map(|c| c.to_string()).collect();
    format!(
        "Effective config [{source}]: checks={}, viewport={}, pixel_threshold={:.2}, max_diff_pixels={}, similarity_threshold={:.2}, anti_aliasing={}, match_timeout={}, timeouts: nav={}s, network-idle={}s, process={}s",
        checks.join(","),
        cfg.viewport,
        cfg.pixel_threshold,
        cfg.max_allowed_diff_pixels,
        cfg.similarity_pass_threshold,
        cfg.anti_aliasing,
        cfg.match_timeout_ms
            .map(|ms| format!("{ms}ms"))
            .unwrap_or_else(|| "none".to_string()),
        cfg.timeouts.navigation.as_secs(),
        cfg.timeouts.network_idle.as_secs(),
        cfg.timeouts.process.as_secs(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use uidiff_lib::types::CheckKind;
    use uidiff_lib::Viewport;

    fn parse(argv: &[&str]) -> (CompareArgs, CompareFlagSources) {
        let raw: Vec<String> = argv.iter().map(|s| s.to_string()).collect();
        let Commands::Compare(args) = Cli::parse_from(argv).command;
        (args, CompareFlagSources::from_args(&raw))
    }

    #[test]
    fn resolve_prefers_config_when_flags_absent() {
        let cfg = Config {
            viewport: Viewport {
                width: 111,
                height: 222,
            },
            pixel_threshold: 0.3,
            similarity_pass_threshold: 0.8,
            max_allowed_diff_pixels: 50,
            checks: vec![CheckKind::PixelDiff],
            ..Config::default()
        };
        let (args, flags) = parse(&["uidiff", "compare"]);
        let resolved = resolve_compare_settings(&args, &cfg, &flags);

        assert_eq!(resolved.viewport.width, 111);
        assert_eq!(resolved.viewport.height, 222);
        assert!((resolved.pixel_threshold - 0.3).abs() < f64::EPSILON);
        assert!((resolved.similarity_pass_threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(resolved.max_allowed_diff_pixels, 50);
        assert_eq!(resolved.checks, vec![CheckKind::PixelDiff]);
        assert!(resolved.anti_aliasing);
    }

    #[test]
    fn resolve_prefers_cli_when_flags_present() {
        let (args, flags) = parse(&[
            "uidiff",
            "compare",
            "--viewport",
            "10x20",
            "--pixel-threshold=0.05",
            "--similarity-threshold",
            "0.9",
            "--max-diff-pixels",
            "7",
            "--nav-timeout",
            "50",
            "--network-idle-timeout",
            "60",
            "--process-timeout",
            "70",
            "--match-timeout-ms",
            "1500",
            "--checks",
            "pixel,pixel-diff,similarity",
            "--no-anti-aliasing",
        ]);
        let resolved = resolve_compare_settings(&args, &Config::default(), &flags);

        assert_eq!(resolved.viewport.width, 10);
        assert_eq!(resolved.viewport.height, 20);
        assert!((resolved.pixel_threshold - 0.05).abs() < f64::EPSILON);
        assert!((resolved.similarity_pass_threshold - 0.9).abs() < f64::EPSILON);
        assert_eq!(resolved.max_allowed_diff_pixels, 7);
        assert_eq!(resolved.timeouts.navigation, Duration::from_secs(50));
        assert_eq!(resolved.timeouts.network_idle, Duration::from_secs(60));
        assert_eq!(resolved.timeouts.process, Duration::from_secs(70));
        assert_eq!(resolved.match_timeout_ms, Some(1500));
        assert_eq!(
            resolved.checks,
            vec![CheckKind::PixelDiff, CheckKind::Similarity]
        );
        assert!(!resolved.anti_aliasing);
    }

    #[test]
    fn invalid_merged_value_is_config_error() {
        let (args, flags) = parse(&["uidiff", "compare", "--similarity-threshold", "1.5"]);
        let resolved = resolve_compare_settings(&args, &Config::default(), &flags);
        let err = validate_config(&resolved, None).unwrap_err();
        assert!(err.to_string().contains("similarity_pass_threshold"));
    }

    #[test]
    fn format_effective_config_includes_all_fields() {
        let summary = format_effective_config(&Config::default(), Some(Path::new("uidiff.toml")));
        assert!(summary.contains("checks=element-match,pixel-diff,similarity"));
        assert!(summary.contains("viewport=1440x900"));
        assert!(summary.contains("pixel_threshold=0.10"));
        assert!(summary.contains("similarity_threshold=0.95"));
        assert!(summary.contains("match_timeout=none"));
        assert!(summary.contains("nav=30s"));
        assert!(summary.contains("process=45s"));
        assert!(summary.contains("uidiff.toml"));
    }

    #[test]
    fn load_config_reports_source_on_failure() {
        let err = load_config(Some(Path::new("/nonexistent/uidiff.toml"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/uidiff.toml"));
    }
}
