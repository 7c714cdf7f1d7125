use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::CheckKind;
use crate::Viewport;

/// Run defaults, loaded from TOML. CLI flags override individual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub viewport: Viewport,
    /// Per-pixel YIQ threshold (0.0 - 1.0)
    pub pixel_threshold: f64,
    /// Lowest passing SSIM score (0.0 - 1.0)
    pub similarity_pass_threshold: f64,
    pub max_allowed_diff_pixels: u64,
    /// Bounded wait per element before lookup; unset means no wait
    pub match_timeout_ms: Option<u64>,
    pub checks: Vec<CheckKind>,
    pub anti_aliasing: bool,
    pub timeouts: Timeouts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timeouts {
    #[serde(with = "humantime_serde")]
    pub navigation: Duration,
    #[serde(with = "humantime_serde")]
    pub network_idle: Duration,
    #[serde(with = "humantime_serde")]
    pub process: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(30),
            network_idle: Duration::from_secs(10),
            process: Duration::from_secs(45),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            pixel_threshold: 0.1,
            similarity_pass_threshold: 0.95,
            max_allowed_diff_pixels: 0,
            match_timeout_ms: None,
            checks: CheckKind::all().to_vec(),
            anti_aliasing: true,
            timeouts: Timeouts::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Parse(#[from] toml::de::Error),
}

impl Config {
    /// `$XDG_CONFIG_HOME/uidiff/config.toml`, else `~/.config/uidiff/config.toml`.
    pub fn central_config_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("uidiff").join("config.toml"))
    }

    /// Explicit path > central config (if it exists) > defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        let source = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::central_config_path().filter(|p| p.is_file()),
        };
        match source {
            Some(p) => Self::from_toml(&std::fs::read_to_string(p)?),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(data: &str) -> Result<Self, ConfigLoadError> {
        Ok(toml::from_str(data)?)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.pixel_threshold) {
            return Err(format!(
                "pixel_threshold must be within 0.0-1.0 (got {})",
                self.pixel_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.similarity_pass_threshold) {
            return Err(format!(
                "similarity_pass_threshold must be within 0.0-1.0 (got {})",
                self.similarity_pass_threshold
            ));
        }
        if self.checks.is_empty() {
            return Err("checks must enable at least one of element-match, pixel-diff, similarity".to_string());
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err("viewport dimensions must be positive".to_string());
        }
        for (name, value) in [
            ("navigation", self.timeouts.navigation),
            ("network_idle", self.timeouts.network_idle),
            ("process", self.timeouts.process),
        ] {
            if value.is_zero() {
                return Err(format!("timeouts.{} must be greater than zero", name));
            }
        }
        Ok(())
    }

    pub fn match_timeout(&self) -> Option<Duration> {
        self.match_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_match_expected() {
        let cfg = Config::default();

        assert_eq!(cfg.viewport.width, 1440);
        assert_eq!(cfg.viewport.height, 900);
        assert!((cfg.pixel_threshold - 0.1).abs() < f64::EPSILON);
        assert!((cfg.similarity_pass_threshold - 0.95).abs() < f64::EPSILON);
        assert_eq!(cfg.max_allowed_diff_pixels, 0);
        assert!(cfg.match_timeout().is_none());
        assert_eq!(cfg.checks.len(), 3);
        assert!(cfg.anti_aliasing);
        assert_eq!(cfg.timeouts.navigation, Duration::from_secs(30));
        assert_eq!(cfg.timeouts.network_idle, Duration::from_secs(10));
        assert_eq!(cfg.timeouts.process, Duration::from_secs(45));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parses_partial_toml_over_defaults() {
        let cfg = Config::from_toml(
            r#"
pixel_threshold = 0.2
match_timeout_ms = 3000
checks = ["pixel-diff", "similarity"]

[viewport]
width = 1280
height = 720

[timeouts]
navigation = "20s"
process = "1m"
"#,
        )
        .unwrap();

        assert!((cfg.pixel_threshold - 0.2).abs() < f64::EPSILON);
        assert_eq!(cfg.match_timeout(), Some(Duration::from_millis(3000)));
        assert_eq!(cfg.checks, vec![CheckKind::PixelDiff, CheckKind::Similarity]);
        assert_eq!(cfg.viewport.width, 1280);
        assert_eq!(cfg.timeouts.navigation, Duration::from_secs(20));
        assert_eq!(cfg.timeouts.network_idle, Duration::from_secs(10));
        assert_eq!(cfg.timeouts.process, Duration::from_secs(60));
        assert!((cfg.similarity_pass_threshold - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(Config::from_toml("treshold = 0.5").is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut cfg = Config {
            pixel_threshold: 1.5,
            ..Config::default()
        };
        assert!(cfg.validate().unwrap_err().contains("pixel_threshold"));

        cfg = Config {
            checks: vec![],
            ..Config::default()
        };
        assert!(cfg.validate().unwrap_err().contains("checks"));

        cfg = Config::default();
        cfg.timeouts.process = Duration::ZERO;
        assert!(cfg.validate().unwrap_err().contains("timeouts.process"));
    }

    #[test]
    fn load_reads_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uidiff.toml");
        std::fs::write(&path, "similarity_pass_threshold = 0.9\n").unwrap();

        let cfg = Config::load(Some(&path)).unwrap();
        assert!((cfg.similarity_pass_threshold - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn load_fails_for_missing_explicit_path() {
        let err = Config::load(Some(Path::new("/nonexistent/uidiff.toml"))).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Io(_)));
    }
}
