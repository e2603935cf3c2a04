//! Pixel format conversion.
//!
//! Every pixel is widened to 16-bit RGBA, then narrowed to the target
//! layout. 8-bit values scale by 257 on the way up and round on the way
//! down, so converting 8 → 16 → 8 bit is lossless. Colour to grey uses
//! weighted luma; grey to colour replicates; missing alpha is opaque.

use serde::{Deserialize, Serialize};

use crate::buffer::{PixelBuffer, PixelSlice};
use crate::error::Result;
use crate::pixel::PixelFormat;

/// Converts an image to another pixel format.
///
/// The dispatcher calls this during encode negotiation when a codec does not
/// accept the source format.
pub trait ColorConverter: Send + Sync {
    /// Return a new buffer holding `image` in `target` format. The input
    /// view is only read.
    fn convert(&self, image: PixelSlice<'_>, target: PixelFormat) -> Result<PixelBuffer>;
}

/// Luma weights for colour → grey conversion.
///
/// Weights are normalised to sum to 1 before use. Negative or non-finite
/// weights, or an all-zero set, fall back to the defaults.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConvertOptions {
    pub red_weight: f32,
    pub green_weight: f32,
    pub blue_weight: f32,
}

impl Default for ColorConvertOptions {
    fn default() -> Self {
        Self {
            red_weight: 0.299,
            green_weight: 0.587,
            blue_weight: 0.114,
        }
    }
}

impl ColorConvertOptions {
    /// Set all three weights.
    pub fn with_weights(mut self, red: f32, green: f32, blue: f32) -> Self {
        self.red_weight = red;
        self.green_weight = green;
        self.blue_weight = blue;
        self
    }

    fn normalized(&self) -> [f32; 3] {
        let weights = [self.red_weight, self.green_weight, self.blue_weight];
        let sum: f32 = weights.iter().sum();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) || sum <= 0.0 {
            return Self::default().normalized();
        }
        weights.map(|w| w / sum)
    }
}

impl ColorConverter for ColorConvertOptions {
    fn convert(&self, image: PixelSlice<'_>, target: PixelFormat) -> Result<PixelBuffer> {
        color_convert(image, target, self)
    }
}

/// Convert `image` to `target`, returning a new buffer with default stride.
///
/// Converting to the same format is a plain copy.
pub fn color_convert<'a>(
    image: impl Into<PixelSlice<'a>>,
    target: PixelFormat,
    options: &ColorConvertOptions,
) -> Result<PixelBuffer> {
    let image = image.into();
    let source = image.pixel_format();
    if source == target {
        return image.to_buffer();
    }
    tracing::debug!(%source, %target, width = image.width(), height = image.height(), "converting pixels");

    let weights = options.normalized();
    let mut out = PixelBuffer::new(image.width(), image.height(), target)?;
    let src_bpp = source.bytes_per_pixel();
    let dst_bpp = target.bytes_per_pixel();
    for y in 0..image.height() {
        let src = image.row(y);
        let dst = out.row_mut(y);
        for (s, d) in src.chunks_exact(src_bpp).zip(dst.chunks_exact_mut(dst_bpp)) {
            let rgba = read_pixel(s, source);
            write_pixel(rgba, source.is_grey(), &weights, d, target);
        }
    }
    Ok(out)
}

/// Async form of [`color_convert`], run on the blocking pool.
#[cfg(feature = "async")]
pub async fn color_convert_async(
    image: PixelBuffer,
    target: PixelFormat,
    options: ColorConvertOptions,
) -> Result<PixelBuffer> {
    crate::blocking::run(move || color_convert(&image, target, &options)).await
}

// ---------------------------------------------------------------------------
// Per-pixel helpers
// ---------------------------------------------------------------------------

const OPAQUE: u16 = u16::MAX;

fn read_channel(bytes: &[u8], index: usize, wide: bool) -> u16 {
    if wide {
        u16::from_ne_bytes([bytes[index * 2], bytes[index * 2 + 1]])
    } else {
        u16::from(bytes[index]) * 257
    }
}

fn write_channel(bytes: &mut [u8], index: usize, wide: bool, value: u16) {
    if wide {
        bytes[index * 2..index * 2 + 2].copy_from_slice(&value.to_ne_bytes());
    } else {
        bytes[index] = ((u32::from(value) + 128) / 257) as u8;
    }
}

/// Widen one pixel to 16-bit RGBA.
fn read_pixel(bytes: &[u8], format: PixelFormat) -> [u16; 4] {
    let wide = format.is_16bit();
    let c = |i| read_channel(bytes, i, wide);
    match format.channels() {
        1 => [c(0), c(0), c(0), OPAQUE],
        2 => [c(0), c(0), c(0), c(1)],
        3 => [c(0), c(1), c(2), OPAQUE],
        _ => [c(0), c(1), c(2), c(3)],
    }
}

fn write_pixel(
    [r, g, b, a]: [u16; 4],
    grey_source: bool,
    weights: &[f32; 3],
    bytes: &mut [u8],
    format: PixelFormat,
) {
    let wide = format.is_16bit();
    let luma = || {
        if grey_source {
            r
        } else {
            let v = weights[0] * f32::from(r) + weights[1] * f32::from(g) + weights[2] * f32::from(b);
            v.round().clamp(0.0, f32::from(u16::MAX)) as u16
        }
    };
    match format.channels() {
        1 => write_channel(bytes, 0, wide, luma()),
        2 => {
            write_channel(bytes, 0, wide, luma());
            write_channel(bytes, 1, wide, a);
        }
        channels => {
            write_channel(bytes, 0, wide, r);
            write_channel(bytes, 1, wide, g);
            write_channel(bytes, 2, wide, b);
            if channels == 4 {
                write_channel(bytes, 3, wide, a);
            }
        }
    }
}
