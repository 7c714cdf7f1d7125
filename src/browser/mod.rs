//! Headless browser adapter for live element matching.
//!
//! Pages are driven by Playwright via Node.js. A single browser run loads the
//! page, optionally captures a viewport screenshot, and records the geometry
//! of every expected text.
//!
//! # Module Structure
//!
//! - [`probe`] - Browser options, the page probe and the recorded snapshot
//! - [`playwright`] - Helper script, error mapping and availability checks
//!
//! # Example
//!
//! ```no_run
//! use uidiff_lib::{BrowserOptions, PageProbe};
//!
//! # async fn example() -> uidiff_lib::Result<()> {
//! let probe = PageProbe::new(BrowserOptions::default());
//! let texts = vec!["Submit".to_string()];
//! let snapshot = probe.capture("http://localhost:8000", &texts, None, None).await?;
//! println!("probed {} texts", snapshot.probes.len());
//! # Ok(())
//! # }
//! ```

mod playwright;
mod probe;

pub use probe::{
    BrowserOptions, PageProbe, PageSnapshot, TextProbe, DEFAULT_NAVIGATION_TIMEOUT,
    DEFAULT_NETWORK_IDLE_TIMEOUT, DEFAULT_PROCESS_TIMEOUT, MOCK_SNAPSHOT_ENV,
};
