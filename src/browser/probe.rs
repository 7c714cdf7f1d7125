//! Page probing: one headless browser run answers every matcher query.
//!
//! [`PageProbe::capture`] loads the page once and records, for each distinct
//! expected text, what the matcher will ask: match count, visibility of the
//! first match and its bounding box. The resulting [`PageSnapshot`] replays
//! those answers through [`LiveRender`].

use crate::matcher::LiveRender;
use crate::types::ElementBox;
use crate::{Result, UidiffError, Viewport};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use super::playwright::{
    ensure_node_available, ensure_playwright_available, map_playwright_error,
    map_playwright_status_error, map_spawn_error, ScriptError, PROBE_SCRIPT,
};

/// Default timeout for page navigation.
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for waiting for network idle state.
pub const DEFAULT_NETWORK_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for the entire Playwright process.
pub const DEFAULT_PROCESS_TIMEOUT: Duration = Duration::from_secs(45);

/// Environment variable naming a JSON snapshot to use instead of launching a browser.
pub const MOCK_SNAPSHOT_ENV: &str = "UIDIFF_MOCK_SNAPSHOT";

/// Configuration options for browser sessions.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// The Node.js command to use (default: "node").
    pub node_command: String,
    /// Viewport dimensions for the browser.
    pub viewport: Viewport,
    /// Whether to run in headless mode.
    pub headless: bool,
    /// Timeout for page navigation.
    pub navigation_timeout: Duration,
    /// Timeout for waiting for network idle state.
    pub network_idle_timeout: Duration,
    /// Timeout for the entire Playwright process.
    pub process_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            node_command: "node".to_string(),
            viewport: Viewport::default(),
            headless: true,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            network_idle_timeout: DEFAULT_NETWORK_IDLE_TIMEOUT,
            process_timeout: DEFAULT_PROCESS_TIMEOUT,
        }
    }
}

/// What the page reported for one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProbe {
    pub text: String,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub bounding_box: Option<ElementBox>,
    /// Message of the exception thrown while probing, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Helper script stdout.
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    status: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    probes: Vec<TextProbe>,
}

/// Recorded answers for a set of texts on one loaded page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    #[serde(default)]
    pub url: Option<String>,
    pub probes: Vec<TextProbe>,
    /// Screenshot written during the same page load
    #[serde(skip)]
    pub screenshot_path: Option<PathBuf>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl PageSnapshot {
    pub fn new(url: Option<String>, probes: Vec<TextProbe>) -> Self {
        let mut snapshot = Self {
            url,
            probes,
            ..Self::default()
        };
        snapshot.reindex();
        snapshot
    }

    /// Loads a snapshot previously serialized as JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            UidiffError::config(format!(
                "Snapshot file not found or unreadable: {} ({})",
                path.display(),
                e
            ))
        })?;
        let mut snapshot: PageSnapshot = serde_json::from_str(&data)?;
        snapshot.reindex();
        Ok(snapshot)
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, probe) in self.probes.iter().enumerate() {
            // First record wins when a text was probed twice.
            self.index.entry(probe.text.clone()).or_insert(i);
        }
    }

    fn probe(&self, text: &str) -> Result<&TextProbe> {
        let probe = self
            .index
            .get(text)
            .and_then(|&i| self.probes.get(i))
            .ok_or_else(|| UidiffError::render(format!("text '{}' was not probed", text)))?;
        match &probe.error {
            Some(message) => Err(UidiffError::render(message.clone())),
            None => Ok(probe),
        }
    }
}

impl LiveRender for PageSnapshot {
    async fn count(&mut self, text: &str) -> Result<usize> {
        Ok(self.probe(text)?.count)
    }

    async fn is_visible(&mut self, text: &str) -> Result<bool> {
        Ok(self.probe(text)?.visible)
    }

    async fn bounding_box(&mut self, text: &str) -> Result<Option<ElementBox>> {
        Ok(self.probe(text)?.bounding_box)
    }

    /// The wait already happened in the browser; this reports its outcome.
    async fn wait_for(&mut self, text: &str, _timeout: Duration) -> Result<bool> {
        Ok(self.probe(text)?.count > 0)
    }
}

/// Launches the Playwright helper for one page.
#[derive(Debug, Clone)]
pub struct PageProbe {
    options: BrowserOptions,
}

impl PageProbe {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BrowserOptions {
        &self.options
    }

    /// Loads `url`, optionally screenshots the viewport to `screenshot_path`,
    /// and probes each distinct text. `wait` bounds the per-text wait.
    pub async fn capture(
        &self,
        url: &str,
        texts: &[String],
        wait: Option<Duration>,
        screenshot_path: Option<&Path>,
    ) -> Result<PageSnapshot> {
        if let Some(path) = std::env::var_os(MOCK_SNAPSHOT_ENV) {
            info!(path = %Path::new(&path).display(), "using mock page snapshot");
            return PageSnapshot::from_file(Path::new(&path));
        }

        // Fail fast if Node is missing to avoid spawning Playwright unnecessarily.
        ensure_node_available(&self.options.node_command).await?;
        ensure_playwright_available(&self.options.node_command).await?;

        if let Some(parent) = screenshot_path.and_then(Path::parent) {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    UidiffError::Config(format!("Failed to create screenshot dir: {}", e))
                })?;
            }
        }

        let distinct = distinct_texts(texts);
        let texts_json = serde_json::to_string(&distinct)?;

        let mut cmd = Command::new(&self.options.node_command);
        cmd.arg("-e")
            .arg(PROBE_SCRIPT)
            .arg(url)
            .arg(self.options.viewport.width.to_string())
            .arg(self.options.viewport.height.to_string())
            .arg(self.options.navigation_timeout.as_millis().to_string())
            .arg(self.options.network_idle_timeout.as_millis().to_string())
            .arg(
                screenshot_path
                    .map(|path| path.to_string_lossy().to_string())
                    .unwrap_or_default(),
            )
            .arg(if self.options.headless { "1" } else { "0" })
            .arg(wait.map_or(0, |d| d.as_millis()).to_string())
            .arg(texts_json)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        info!(
            url,
            viewport = %self.options.viewport,
            texts = distinct.len(),
            "launching headless browser"
        );
        let start = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|err| map_spawn_error(err, &self.options.node_command))?;

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut out) = stdout_pipe {
                let _ = out.read_to_end(&mut buf).await;
            }
            buf
        });

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut err) = stderr_pipe {
                let _ = err.read_to_end(&mut buf).await;
            }
            buf
        });

        let budget = process_budget(self.options.process_timeout, wait, distinct.len());
        let status = match timeout(budget, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(err)) => return Err(UidiffError::Io(err)),
            Err(_) => {
                let _ = child.kill().await;
                let _ = child.wait().await;
                return Err(UidiffError::Config(format!(
                    "Playwright timed out after {:?}",
                    budget
                )));
            }
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(map_playwright_error(status.to_string(), &stderr));
        }

        let stdout = String::from_utf8_lossy(&stdout);
        let mut snapshot = parse_probe_output(&stdout)?;
        snapshot.url.get_or_insert_with(|| url.to_string());
        snapshot.screenshot_path = screenshot_path.map(Path::to_path_buf);

        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            probes = snapshot.probes.len(),
            "page probe finished"
        );
        Ok(snapshot)
    }
}

fn distinct_texts(texts: &[String]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    texts
        .iter()
        .map(String::as_str)
        .filter(|t| seen.insert(*t))
        .collect()
}

/// Process budget plus headroom for one wait per distinct text; saturates
/// instead of overflowing.
fn process_budget(base: Duration, wait: Option<Duration>, texts: usize) -> Duration {
    let texts = u32::try_from(texts).unwrap_or(u32::MAX);
    wait.unwrap_or_default()
        .checked_mul(texts)
        .and_then(|extra| base.checked_add(extra))
        .unwrap_or(Duration::MAX)
}

fn parse_probe_output(stdout: &str) -> Result<PageSnapshot> {
    let trimmed = stdout.trim();
    let output: ProbeOutput = serde_json::from_str(trimmed).map_err(|e| {
        UidiffError::Config(format!(
            "Failed to parse Playwright output: {} - raw: {}",
            e, trimmed
        ))
    })?;

    if output.status != "ok" {
        if let Ok(err) = serde_json::from_str::<ScriptError>(trimmed) {
            return Err(map_playwright_status_error(&err.status, err.message));
        }
        return Err(UidiffError::Config(format!(
            "Playwright returned non-ok status: {}",
            output.status
        )));
    }

    Ok(PageSnapshot::new(output.url, output.probes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELPER_OUTPUT: &str = r#"{
        "status": "ok",
        "url": "http://localhost:8000/",
        "probes": [
            {"text": "Submit", "count": 1, "visible": true,
             "boundingBox": {"x": 305, "y": 495, "width": 80, "height": 24}},
            {"text": "Hidden", "count": 1, "visible": false, "boundingBox": null},
            {"text": "Gone", "count": 0, "visible": false, "boundingBox": null},
            {"text": "Detached", "count": 0, "visible": false, "boundingBox": null,
             "error": "Element is not attached to the DOM"}
        ]
    }"#;

    #[test]
    fn browser_options_default_values() {
        let opts = BrowserOptions::default();
        assert_eq!(opts.node_command, "node");
        assert!(opts.headless);
        assert_eq!(opts.viewport.width, 1440);
        assert_eq!(opts.viewport.height, 900);
        assert_eq!(opts.navigation_timeout, DEFAULT_NAVIGATION_TIMEOUT);
        assert_eq!(opts.network_idle_timeout, DEFAULT_NETWORK_IDLE_TIMEOUT);
        assert_eq!(opts.process_timeout, DEFAULT_PROCESS_TIMEOUT);
    }

    #[test]
    fn distinct_texts_keeps_first_occurrence_order() {
        let texts = vec!["OK".to_string(), "Cancel".to_string(), "OK".to_string()];
        assert_eq!(distinct_texts(&texts), vec!["OK", "Cancel"]);
    }

    #[test]
    fn parses_helper_output() {
        let snapshot = parse_probe_output(HELPER_OUTPUT).unwrap();
        assert_eq!(snapshot.url.as_deref(), Some("http://localhost:8000/"));
        assert_eq!(snapshot.probes.len(), 4);
        assert_eq!(
            snapshot.probes[0].bounding_box,
            Some(ElementBox {
                x: 305.0,
                y: 495.0,
                width: 80.0,
                height: 24.0
            })
        );
    }

    #[test]
    fn url_is_optional_in_helper_output() {
        let snapshot = parse_probe_output(
            r#"{"status":"ok","url":"http://x","probes":[{"text":"Go","count":1,"visible":true}]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.url.as_deref(), Some("http://x"));
        assert_eq!(snapshot.probes.len(), 1);
        assert_eq!(snapshot.probes[0].text, "Go");

        let snapshot = parse_probe_output(r#"{"status":"ok","probes":[]}"#).unwrap();
        assert_eq!(snapshot.url, None);
        assert!(snapshot.probes.is_empty());
    }

    #[test]
    fn process_budget_adds_one_wait_per_text() {
        let base = Duration::from_secs(60);
        assert_eq!(process_budget(base, None, 5), base);
        assert_eq!(
            process_budget(base, Some(Duration::from_millis(500)), 4),
            Duration::from_secs(62)
        );
    }

    #[test]
    fn process_budget_saturates_on_huge_waits() {
        let base = Duration::from_secs(60);
        let huge = Some(Duration::from_millis(u64::MAX));
        assert_eq!(process_budget(base, huge, 3), Duration::MAX);
        assert_eq!(
            process_budget(Duration::MAX, Some(Duration::from_secs(1)), 1),
            Duration::MAX
        );
        assert_eq!(
            process_budget(base, Some(Duration::from_secs(1)), usize::MAX),
            Duration::from_secs(60 + u64::from(u32::MAX))
        );
    }

    #[test]
    fn non_ok_output_is_mapped() {
        let err = parse_probe_output(r#"{"status":"error","message":"Timeout 30000ms exceeded"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("--nav-timeout"));
    }

    #[test]
    fn garbage_output_is_config_error() {
        let err = parse_probe_output("Debugger attached.").unwrap_err();
        assert!(matches!(err, UidiffError::Config(ref m) if m.contains("Failed to parse")));
    }

    #[tokio::test]
    async fn snapshot_answers_matcher_queries() {
        let mut snapshot = parse_probe_output(HELPER_OUTPUT).unwrap();

        assert_eq!(snapshot.count("Submit").await.unwrap(), 1);
        assert!(snapshot.is_visible("Submit").await.unwrap());
        assert!(!snapshot.is_visible("Hidden").await.unwrap());
        assert_eq!(snapshot.count("Gone").await.unwrap(), 0);
        assert!(!snapshot
            .wait_for("Gone", Duration::from_millis(10))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn probe_errors_and_unprobed_texts_are_render_errors() {
        let mut snapshot = parse_probe_output(HELPER_OUTPUT).unwrap();

        match snapshot.count("Detached").await {
            Err(UidiffError::Render(msg)) => assert!(msg.contains("not attached")),
            other => panic!("expected render error, got {other:?}"),
        }
        assert!(matches!(
            snapshot.count("Never asked").await,
            Err(UidiffError::Render(_))
        ));
    }

    #[tokio::test]
    async fn snapshot_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let snapshot = parse_probe_output(HELPER_OUTPUT).unwrap();
        fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let mut loaded = PageSnapshot::from_file(&path).unwrap();
        assert_eq!(loaded.probes, snapshot.probes);
        assert_eq!(
            loaded.bounding_box("Submit").await.unwrap().map(|b| b.x),
            Some(305.0)
        );
    }

    #[tokio::test]
    async fn capture_fails_for_missing_node() {
        if std::env::var_os(MOCK_SNAPSHOT_ENV).is_some() {
            return;
        }
        let probe = PageProbe::new(BrowserOptions {
            node_command: "definitely-not-a-binary".to_string(),
            ..BrowserOptions::default()
        });
        let result = probe
            .capture("https://example.com", &["Submit".to_string()], None, None)
            .await;
        assert!(result.is_err());
    }
}
