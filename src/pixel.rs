//! Pixel format registry.
//!
//! [`PixelFormat`] is a closed set of channel layouts. Byte widths and the
//! encode-time compatibility ranking are fixed-size tables indexed by the
//! enum discriminant, so every variant is guaranteed an entry.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Channel layout and per-channel depth of a pixel.
///
/// 16-bit channels are stored in native byte order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PixelFormat {
    /// 8-bit red, green, blue.
    Rgb = 0,
    /// 8-bit red, green, blue, alpha.
    Rgba = 1,
    /// 8-bit luminance.
    Grey = 2,
    /// 8-bit luminance + alpha.
    GreyA = 3,
    /// 16-bit luminance.
    R16 = 4,
    /// 16-bit luminance + alpha.
    R16G16 = 5,
    /// 16-bit red, green, blue.
    R16G16B16 = 6,
    /// 16-bit red, green, blue, alpha.
    R16G16B16A16 = 7,
}

const COUNT: usize = 8;

use PixelFormat::*;

const BYTES_PER_PIXEL: [usize; COUNT] = [3, 4, 1, 2, 2, 4, 6, 8];

const NAMES: [&str; COUNT] = [
    "rgb",
    "rgba",
    "grey",
    "greya",
    "r16",
    "r16g16",
    "r16g16b16",
    "r16g16b16a16",
];

// Closest first: keep alpha and depth where possible, then colour.
const COMPATIBLE: [[PixelFormat; COUNT - 1]; COUNT] = [
    [Rgba, R16G16B16, R16G16B16A16, Grey, GreyA, R16, R16G16],
    [R16G16B16A16, Rgb, R16G16B16, GreyA, R16G16, Grey, R16],
    [GreyA, R16, R16G16, Rgb, Rgba, R16G16B16, R16G16B16A16],
    [R16G16, Rgba, R16G16B16A16, Grey, R16, Rgb, R16G16B16],
    [R16G16, Grey, GreyA, R16G16B16, R16G16B16A16, Rgb, Rgba],
    [GreyA, R16G16B16A16, Rgba, R16, Grey, R16G16B16, Rgb],
    [R16G16B16A16, Rgb, Rgba, R16, Grey, R16G16, GreyA],
    [Rgba, R16G16B16, Rgb, R16G16, GreyA, R16, Grey],
];

impl PixelFormat {
    /// Every format, in discriminant order.
    pub const ALL: [PixelFormat; COUNT] = [
        Rgb,
        Rgba,
        Grey,
        GreyA,
        R16,
        R16G16,
        R16G16B16,
        R16G16B16A16,
    ];

    /// Bytes per pixel (1 to 8, never zero).
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        BYTES_PER_PIXEL[self as usize]
    }

    /// Number of channels.
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            Grey | R16 => 1,
            GreyA | R16G16 => 2,
            Rgb | R16G16B16 => 3,
            Rgba | R16G16B16A16 => 4,
        }
    }

    /// Bytes per channel (1 or 2).
    #[inline]
    pub const fn bytes_per_channel(self) -> usize {
        self.bytes_per_pixel() / self.channels()
    }

    /// Whether channels are 16 bits wide.
    #[inline]
    pub const fn is_16bit(self) -> bool {
        self.bytes_per_channel() == 2
    }

    /// Whether the format carries an alpha channel.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Rgba | GreyA | R16G16 | R16G16B16A16)
    }

    /// Whether the format is single-luminance (with or without alpha).
    #[inline]
    pub const fn is_grey(self) -> bool {
        self.channels() < 3
    }

    /// Canonical lowercase name.
    #[inline]
    pub const fn name(self) -> &'static str {
        NAMES[self as usize]
    }

    /// Alternatives for encode negotiation, closest first.
    ///
    /// Contains every other format exactly once and never `self`.
    #[inline]
    pub fn compatible_formats(self) -> &'static [PixelFormat] {
        &COMPATIBLE[self as usize]
    }

    /// Default row stride for `width` pixels: the packed row length rounded
    /// up to a multiple of 4 bytes.
    ///
    /// Returns `None` on overflow.
    #[inline]
    pub const fn default_stride(self, width: u32) -> Option<usize> {
        match (width as usize).checked_mul(self.bytes_per_pixel()) {
            Some(raw) => match raw.checked_add(3) {
                Some(padded) => Some(padded & !3),
                None => None,
            },
            None => None,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        NAMES
            .iter()
            .position(|name| *name == s)
            .map(|i| Self::ALL[i])
            .ok_or_else(|| Error::UnknownPixelFormat(s.to_owned()))
    }
}

/// Byte width of the format named `name`.
///
/// # Errors
///
/// [`Error::UnknownPixelFormat`] if the name is not in the registry.
pub fn bytes_per_pixel(name: &str) -> Result<usize> {
    Ok(name.parse::<PixelFormat>()?.bytes_per_pixel())
}

/// Ranked encode alternatives for the format named `name`.
///
/// # Errors
///
/// [`Error::UnknownPixelFormat`] if the name is not in the registry.
pub fn compatible_formats_for(name: &str) -> Result<&'static [PixelFormat]> {
    Ok(name.parse::<PixelFormat>()?.compatible_formats())
}
