//! In-memory RGBA raster shared by the image comparison stages.

use image::RgbaImage;

use crate::error::UidiffError;
use crate::Result;

/// An owned RGBA8 image with a validated buffer length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// Empty 0x0 placeholder for fields skipped by serde; not a valid comparison
/// input and never produced by [`RasterImage::new`].
#[allow(clippy::derivable_impls)]
impl Default for RasterImage {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        }
    }
}

impl RasterImage {
    /// Wraps an RGBA buffer; fails on zero dimensions or a length other than `width * height * 4`.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(UidiffError::config(format!(
                "Invalid raster: dimensions must be positive (got {}x{})",
                width, height
            )));
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(UidiffError::config(format!(
                "Invalid raster: {}x{} RGBA needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A raster where every pixel has the same RGBA value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let count = width as usize * height as usize;
        let pixels = rgba.iter().copied().cycle().take(count * 4).collect();
        Self::new(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True only for the `Default` placeholder.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA value at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        // Length is validated at construction, so this cannot fail.
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone()).unwrap_or_default()
    }
}

impl TryFrom<RgbaImage> for RasterImage {
    type Error = UidiffError;

    fn try_from(img: RgbaImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }
}
