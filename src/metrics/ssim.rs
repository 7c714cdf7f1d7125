//! Structural similarity (SSIM) between two rasters of equal size.
//!
//! Both images are reduced to Rec.601 luma after compositing over white.
//! Luma is compared in square 8×8 windows whose origins advance by 4 pixels
//! along each axis. Windows that would cross the right or bottom edge are
//! skipped, so a remainder narrower than the window is never scored. An axis
//! shorter than the window is covered by a single window of that length.

use crate::error::UidiffError;
use crate::types::{RasterImage, SimilarityResult};
use crate::Result;

#[derive(Debug, Clone, Copy)]
pub struct SsimOptions {
    /// Side of the square comparison window, in pixels
    pub window: u32,
    /// Distance between window origins
    pub stride: u32,
}

impl Default for SsimOptions {
    fn default() -> Self {
        Self {
            window: 8,
            stride: 4,
        }
    }
}

/// Mean structural similarity of two equally sized rasters.
///
/// Both images are reduced to Rec.601 luma after blending over white. Only
/// windows that fit entirely inside the image are scored; a dimension smaller
/// than the window gets a single window spanning it.
pub fn compute_similarity(
    reference: &RasterImage,
    actual: &RasterImage,
    options: &SsimOptions,
) -> Result<SimilarityResult> {
    if reference.dimensions() != actual.dimensions() {
        return Err(UidiffError::DimensionMismatch {
            reference: reference.dimensions(),
            actual: actual.dimensions(),
        });
    }
    if options.window == 0 || options.stride == 0 {
        return Err(UidiffError::config(
            "SSIM window and stride must be positive",
        ));
    }

    let (width, height) = reference.dimensions();
    let ref_luma = to_luma(reference);
    let act_luma = to_luma(actual);

    let (xs, win_w) = window_origins(width, options.window, options.stride);
    let (ys, win_h) = window_origins(height, options.window, options.stride);

    let mut total = 0.0f64;
    let mut windows = 0u64;
    for &y in &ys {
        for &x in &xs {
            total += window_ssim(&ref_luma, &act_luma, width, x, y, win_w, win_h);
            windows += 1;
        }
    }

    let score = if windows == 0 {
        1.0
    } else {
        (total / windows as f64).clamp(0.0, 1.0)
    };

    Ok(SimilarityResult { score, windows })
}

fn to_luma(img: &RasterImage) -> Vec<f64> {
    img.pixels()
        .chunks_exact(4)
        .map(|px| {
            let a = px[3] as f64 / 255.0;
            let over_white = |c: u8| 255.0 + (c as f64 - 255.0) * a;
            0.299 * over_white(px[0]) + 0.587 * over_white(px[1]) + 0.114 * over_white(px[2])
        })
        .collect()
}

/// Origins of every full window along one axis, and the window extent used.
fn window_origins(dim: u32, window: u32, stride: u32) -> (Vec<u32>, u32) {
    if dim <= window {
        return (vec![0], dim);
    }
    let origins = (0..=dim - window).step_by(stride as usize).collect();
    (origins, window)
}

fn window_ssim(
    ref_buf: &[f64],
    impl_buf: &[f64],
    width: u32,
    x0: u32,
    y0: u32,
    w: u32,
    h: u32,
) -> f64 {
    let mut sum_x = 0.0f64;
    let mut sum_y = 0.0f64;
    let mut sum_x2 = 0.0f64;
    let mut sum_y2 = 0.0f64;
    let mut sum_xy = 0.0f64;

    for row in y0..y0 + h {
        let start = (row * width + x0) as usize;
        for i in start..start + w as usize {
            let x = ref_buf[i];
            let y = impl_buf[i];
            sum_x += x;
            sum_y += y;
            sum_x2 += x * x;
            sum_y2 += y * y;
            sum_xy += x * y;
        }
    }

    let n = (w * h) as f64;
    let mu_x = sum_x / n;
    let mu_y = sum_y / n;
    // Identical inputs give bit-identical variance and covariance, so the ratio is exactly 1.
    let sigma_x = (sum_x2 / n) - mu_x * mu_x;
    let sigma_y = (sum_y2 / n) - mu_y * mu_y;
    let sigma_xy = (sum_xy / n) - mu_x * mu_y;

    let c1 = (0.01f64 * 255.0).powi(2);
    let c2 = (0.03f64 * 255.0).powi(2);

    let numerator = (2.0 * mu_x * mu_y + c1) * (2.0 * sigma_xy + c2);
    let denominator = (mu_x * mu_x + mu_y * mu_y + c1) * (sigma_x + sigma_y + c2);

    if denominator.abs() < f64::EPSILON {
        return 1.0;
    }

    numerator / denominator
}
