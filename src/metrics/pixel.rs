//! Perceptual pixel diff.
//!
//! Colors are compared in YIQ space after blending translucent pixels over
//! white, so hue shifts the eye barely notices score low. Pixels that sit on
//! an anti-aliased edge in either image can be left out of the count.

use crate::error::UidiffError;
use crate::types::{PixelDiffResult, RasterImage};
use crate::Result;

/// Largest possible YIQ delta between two colors.
const MAX_YIQ_DELTA: f64 = 35215.0;

#[derive(Debug, Clone, Copy)]
pub struct PixelDiffOptions {
    /// Matching threshold (0.0 - 1.0); smaller is stricter
    pub threshold: f64,
    /// Exclude pixels classified as anti-aliasing from the count
    pub detect_anti_aliasing: bool,
    /// Color for counted differences
    pub diff_color: [u8; 4],
    /// Color for pixels dismissed as anti-aliasing
    pub aa_color: [u8; 4],
    /// Opacity of the grayscale reference drawn under matching pixels
    pub faint_alpha: f64,
    /// Leave matching pixels fully transparent instead of faint
    pub diff_mask: bool,
}

impl Default for PixelDiffOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            detect_anti_aliasing: true,
            diff_color: [255, 0, 0, 255],
            aa_color: [255, 255, 0, 255],
            faint_alpha: 0.1,
            diff_mask: false,
        }
    }
}

/// Compares two equally sized rasters pixel by pixel.
///
/// Returns [`UidiffError::DimensionMismatch`] without scanning when sizes differ.
pub fn diff_pixels(
    reference: &RasterImage,
    actual: &RasterImage,
    options: &PixelDiffOptions,
) -> Result<PixelDiffResult> {
    if reference.dimensions() != actual.dimensions() {
        return Err(UidiffError::DimensionMismatch {
            reference: reference.dimensions(),
            actual: actual.dimensions(),
        });
    }

    let (width, height) = reference.dimensions();
    let img1 = reference.pixels();
    let img2 = actual.pixels();
    let max_delta = MAX_YIQ_DELTA * options.threshold * options.threshold;

    let mut output = vec![0u8; img1.len()];
    let mut diff_count = 0u64;
    let mut aa_count = 0u64;

    for y in 0..height {
        for x in 0..width {
            let pos = (y as usize * width as usize + x as usize) * 4;
            let delta = color_delta(img1, img2, pos, pos, false);

            if delta.abs() > max_delta {
                let anti_aliased = options.detect_anti_aliasing
                    && (antialiased(img1, x, y, width, height, img2)
                        || antialiased(img2, x, y, width, height, img1));
                if anti_aliased {
                    aa_count += 1;
                    put(&mut output, pos, options.aa_color);
                } else {
                    diff_count += 1;
                    put(&mut output, pos, options.diff_color);
                }
            } else if !options.diff_mask {
                draw_gray(img1, pos, options.faint_alpha, &mut output);
            }
        }
    }

    Ok(PixelDiffResult {
        diff_pixel_count: diff_count,
        anti_aliased_pixel_count: aa_count,
        total_pixels: reference.pixel_count() as u64,
        diff_image: RasterImage::new(width, height, output)?,
    })
}

fn put(output: &mut [u8], pos: usize, rgba: [u8; 4]) {
    output[pos..pos + 4].copy_from_slice(&rgba);
}

fn draw_gray(img: &[u8], pos: usize, alpha: f64, output: &mut [u8]) {
    let (r, g, b) = (img[pos] as f64, img[pos + 1] as f64, img[pos + 2] as f64);
    let a = alpha * img[pos + 3] as f64 / 255.0;
    let v = blend(rgb2y(r, g, b), a).round().clamp(0.0, 255.0) as u8;
    put(output, pos, [v, v, v, 255]);
}

/// Squared YIQ distance between pixel `k` of `img1` and pixel `m` of `img2`.
///
/// Negative when the first pixel is brighter. With `y_only`, returns the
/// signed luma difference instead.
fn color_delta(img1: &[u8], img2: &[u8], k: usize, m: usize, y_only: bool) -> f64 {
    if img1[k..k + 4] == img2[m..m + 4] {
        return 0.0;
    }

    let (r1, g1, b1) = blended(&img1[k..k + 4]);
    let (r2, g2, b2) = blended(&img2[m..m + 4]);

    let y1 = rgb2y(r1, g1, b1);
    let y2 = rgb2y(r2, g2, b2);
    let y = y1 - y2;
    if y_only {
        return y;
    }

    let i = rgb2i(r1, g1, b1) - rgb2i(r2, g2, b2);
    let q = rgb2q(r1, g1, b1) - rgb2q(r2, g2, b2);
    let delta = 0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q;

    if y1 > y2 {
        -delta
    } else {
        delta
    }
}

fn blended(px: &[u8]) -> (f64, f64, f64) {
    let (r, g, b, a) = (px[0] as f64, px[1] as f64, px[2] as f64, px[3]);
    if a < 255 {
        let a = a as f64 / 255.0;
        (blend(r, a), blend(g, a), blend(b, a))
    } else {
        (r, g, b)
    }
}

/// Composites a channel over white.
fn blend(c: f64, a: f64) -> f64 {
    255.0 + (c - 255.0) * a
}

fn rgb2y(r: f64, g: f64, b: f64) -> f64 {
    r * 0.29889531 + g * 0.58662247 + b * 0.11448223
}

fn rgb2i(r: f64, g: f64, b: f64) -> f64 {
    r * 0.59597799 - g * 0.27417610 - b * 0.32180189
}

fn rgb2q(r: f64, g: f64, b: f64) -> f64 {
    r * 0.21147017 - g * 0.52261711 + b * 0.31114694
}

fn neighbourhood(x: u32, y: u32, width: u32, height: u32) -> (u32, u32, u32, u32) {
    (
        x.saturating_sub(1),
        y.saturating_sub(1),
        (x + 1).min(width - 1),
        (y + 1).min(height - 1),
    )
}

/// Whether the pixel at `(x1, y1)` in `img` looks like an anti-aliased edge.
///
/// An anti-aliased pixel has few identical neighbours, and its darkest and
/// brightest neighbours lie in flat regions of both images.
fn antialiased(img: &[u8], x1: u32, y1: u32, width: u32, height: u32, other: &[u8]) -> bool {
    let (x0, y0, x2, y2) = neighbourhood(x1, y1, width, height);
    let pos = (y1 as usize * width as usize + x1 as usize) * 4;

    let mut zeroes = u32::from(x1 == x0 || x1 == x2 || y1 == y0 || y1 == y2);
    let mut min = 0.0;
    let mut max = 0.0;
    let mut min_at = (0, 0);
    let mut max_at = (0, 0);

    for x in x0..=x2 {
        for y in y0..=y2 {
            if x == x1 && y == y1 {
                continue;
            }
            let npos = (y as usize * width as usize + x as usize) * 4;
            let delta = color_delta(img, img, pos, npos, true);

            if delta == 0.0 {
                zeroes += 1;
                if zeroes > 2 {
                    return false;
                }
            } else if delta < min {
                min = delta;
                min_at = (x, y);
            } else if delta > max {
                max = delta;
                max_at = (x, y);
            }
        }
    }

    // No darker or no brighter neighbour: not an edge.
    if min == 0.0 || max == 0.0 {
        return false;
    }

    (has_many_siblings(img, min_at.0, min_at.1, width, height)
        && has_many_siblings(other, min_at.0, min_at.1, width, height))
        || (has_many_siblings(img, max_at.0, max_at.1, width, height)
            && has_many_siblings(other, max_at.0, max_at.1, width, height))
}

/// Whether the pixel has more than two identical neighbours.
fn has_many_siblings(img: &[u8], x1: u32, y1: u32, width: u32, height: u32) -> bool {
    let (x0, y0, x2, y2) = neighbourhood(x1, y1, width, height);
    let pos = (y1 as usize * width as usize + x1 as usize) * 4;
    let mut zeroes = u32::from(x1 == x0 || x1 == x2 || y1 == y0 || y1 == y2);

    for x in x0..=x2 {
        for y in y0..=y2 {
            if x == x1 && y == y1 {
                continue;
            }
            let npos = (y as usize * width as usize + x as usize) * 4;
            if img[pos..pos + 4] == img[npos..npos + 4] {
                zeroes += 1;
            }
            if zeroes > 2 {
                return true;
            }
        }
    }

    false
}
