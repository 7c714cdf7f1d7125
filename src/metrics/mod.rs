//! Image comparison metrics.
//!
//! - [`diff_pixels`]: perceptual per-pixel difference count (YIQ, anti-aliasing aware)
//! - [`compute_similarity`]: windowed mean SSIM over luma
//!
//! Both are synchronous and CPU-bound; callers on an async runtime should
//! run them on a blocking thread.

mod pixel;
mod ssim;

pub use pixel::{diff_pixels, PixelDiffOptions};
pub use ssim::{compute_similarity, SsimOptions};
