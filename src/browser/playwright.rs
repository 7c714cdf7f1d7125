//! Playwright integration for headless page probing.
//!
//! This module contains the inline Playwright helper script, error mapping,
//! and availability checks for Node.js and Playwright.

use crate::{Result, UidiffError};
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Loads a page, optionally screenshots the viewport, then probes each text.
///
/// argv: url, width, height, navTimeout, idleTimeout, screenshotPath,
/// headlessFlag, waitMs, textsJson. `waitMs` of 0 disables the per-text wait;
/// a timed-out wait is not an error, the probe reports whatever is present.
pub(crate) const PROBE_SCRIPT: &str = r#"
const [, url, width, height, navTimeout, idleTimeout, screenshotPath, headlessFlag, waitMs, textsJson] = process.argv;

async function run() {
  let browser;
  try {
    const { chromium } = require('playwright');
    browser = await chromium.launch({ headless: headlessFlag !== '0' });
    const context = await browser.newContext({
      viewport: {
        width: parseInt(width, 10),
        height: parseInt(height, 10)
      }
    });
    const page = await context.newPage();
    const navMs = parseInt(navTimeout, 10);
    const idleMs = parseInt(idleTimeout, 10);
    const waitFor = parseInt(waitMs, 10) || 0;

    await page.goto(url, { waitUntil: 'networkidle', timeout: navMs });
    await page.waitForLoadState('networkidle', { timeout: idleMs });

    if (screenshotPath) {
      await page.screenshot({ path: screenshotPath, fullPage: false });
    }

    const probes = [];
    for (const text of JSON.parse(textsJson || '[]')) {
      try {
        const locator = page.getByText(text, { exact: true });
        if (waitFor > 0) {
          try {
            await locator.first().waitFor({ state: 'attached', timeout: waitFor });
          } catch (err) {
            if (!err || err.name !== 'TimeoutError') throw err;
          }
        }
        const count = await locator.count();
        let visible = false;
        let boundingBox = null;
        if (count > 0) {
          const first = locator.first();
          visible = await first.isVisible();
          boundingBox = visible ? await first.boundingBox() : null;
        }
        probes.push({ text, count, visible, boundingBox });
      } catch (err) {
        const message = err && err.message ? err.message : String(err);
        probes.push({ text, count: 0, visible: false, boundingBox: null, error: message });
      }
    }

    console.log(JSON.stringify({ status: 'ok', url: page.url(), probes }));
  } catch (err) {
    const message = err && err.message ? err.message : String(err);
    console.error(JSON.stringify({ status: 'error', message }));
    process.exitCode = 1;
  } finally {
    if (browser) {
      await browser.close();
    }
  }
}

run();
"#;

/// Timeout for checking node/playwright availability.
pub(crate) const NODE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Script to check if Playwright is installed.
const PLAYWRIGHT_CHECK_SCRIPT: &str = "require('playwright'); process.stdout.write('ok');";

/// Error result from the helper script.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ScriptError {
    pub status: String,
    pub message: String,
}

pub(crate) fn map_spawn_error(err: io::Error, command: &str) -> UidiffError {
    if err.kind() == io::ErrorKind::NotFound {
        UidiffError::Config(format!(
            "Unable to spawn Playwright helper; '{}' was not found on PATH",
            command
        ))
    } else {
        UidiffError::Io(err)
    }
}

/// Maps helper stderr to an error with a remediation-friendly message.
pub(crate) fn map_playwright_error(status_text: impl Into<String>, stderr: &str) -> UidiffError {
    if let Ok(error) = serde_json::from_str::<ScriptError>(stderr.trim()) {
        return map_playwright_status_error(&error.status, error.message);
    }

    let lower = stderr.to_ascii_lowercase();

    if lower.contains("cannot find module 'playwright'") {
        return missing_playwright();
    }

    if lower.contains("executable doesn't exist") {
        return UidiffError::Config(
            "Playwright could not find its Chromium executable; download it with `npx playwright install chromium`."
                .to_string(),
        );
    }

    if lower.contains("timeout") {
        return UidiffError::Config(
            "Playwright timed out; try increasing --nav-timeout/--network-idle-timeout or --process-timeout, and ensure the page finishes loading."
                .to_string(),
        );
    }

    UidiffError::Config(format!(
        "Playwright exited with status {}: {}",
        status_text.into(),
        stderr.trim()
    ))
}

pub(crate) fn map_playwright_status_error(status: &str, message: String) -> UidiffError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("cannot find module 'playwright'") {
        missing_playwright()
    } else if lower.contains("executable doesn't exist") {
        UidiffError::Config(format!(
            "Playwright could not find its Chromium executable: {}",
            message
        ))
    } else if lower.contains("timeout") {
        UidiffError::Config(format!(
            "Playwright error (status {}): {}. Hint: increase --nav-timeout/--network-idle-timeout or --process-timeout, and ensure the page finishes loading.",
            status, message
        ))
    } else {
        UidiffError::render(format!("Playwright error (status {}): {}", status, message))
    }
}

fn missing_playwright() -> UidiffError {
    UidiffError::Config(
        "Playwright npm package is missing; install with `npm install playwright`.".to_string(),
    )
}

pub(crate) async fn ensure_node_available(node_command: &str) -> Result<()> {
    let mut cmd = Command::new(node_command);
    cmd.arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let status = tokio::time::timeout(NODE_CHECK_TIMEOUT, cmd.status())
        .await
        .map_err(|_| {
            UidiffError::Config(format!(
                "Timed out checking node availability after {:?}",
                NODE_CHECK_TIMEOUT
            ))
        })?
        .map_err(|err| map_spawn_error(err, node_command))?;

    if !status.success() {
        return Err(UidiffError::Config(format!(
            "Node command {:?} is not available (exit {})",
            node_command, status
        )));
    }

    Ok(())
}

pub(crate) async fn ensure_playwright_available(node_command: &str) -> Result<()> {
    let mut cmd = Command::new(node_command);
    cmd.arg("-e")
        .arg(PLAYWRIGHT_CHECK_SCRIPT)
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let output = tokio::time::timeout(NODE_CHECK_TIMEOUT, cmd.output())
        .await
        .map_err(|_| {
            UidiffError::Config(format!(
                "Timed out checking Playwright availability after {:?}",
                NODE_CHECK_TIMEOUT
            ))
        })?
        .map_err(|err| map_spawn_error(err, node_command))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(map_playwright_error(
            format!("{:?}", output.status),
            &stderr,
        ));
    }

    Ok(())
}
