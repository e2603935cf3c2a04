//! The codec capability contract and its request/response types.
//!
//! A [`Codec`] is one back end keyed by media type. The dispatcher only ever
//! talks to codecs through this trait; built-in implementations live in
//! [`crate::codecs`].

use serde::{Deserialize, Serialize};

use crate::buffer::{PixelBuffer, PixelSlice};
use crate::error::CodecError;
use crate::pixel::PixelFormat;

// ---------------------------------------------------------------------------
// Codec trait
// ---------------------------------------------------------------------------

/// A single image format back end.
///
/// Implementations must be stateless with respect to individual requests:
/// the dispatcher shares one instance across threads and calls it
/// concurrently.
pub trait Codec: Send + Sync {
    /// Media type this codec handles, e.g. `"image/png"`. Catalog key.
    fn media_type(&self) -> &'static str;

    /// Parse just enough of `data` to report dimensions and layout.
    ///
    /// Returns `None` when `data` is not this codec's format. Must not
    /// decode pixel data.
    fn stat(&self, data: &[u8]) -> Option<ImageHeader>;

    /// Decode `data` into an owned buffer.
    ///
    /// An error here only means "not mine or broken"; decode dispatch moves
    /// on to the next codec.
    fn decode(&self, data: &[u8], options: &DecodeOptions) -> Result<PixelBuffer, CodecError>;

    /// Encode `image`, whose format is guaranteed to be one of
    /// [`encodable_formats`](Self::encodable_formats).
    fn encode(&self, image: PixelSlice<'_>, options: &EncodeOptions) -> Result<Vec<u8>, CodecError>;

    /// Pixel formats `encode` accepts, in the codec's order of preference.
    fn encodable_formats(&self) -> &[PixelFormat];
}

// ---------------------------------------------------------------------------
// Stat results
// ---------------------------------------------------------------------------

/// Header fields a codec reports from [`Codec::stat`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
}

impl ImageHeader {
    /// Create a header.
    pub const fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        Self {
            width,
            height,
            pixel_format,
        }
    }
}

/// Summary of an encoded image: header fields plus the media type of the
/// codec that recognised it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ImageStat {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    pub media_type: &'static str,
}

impl ImageStat {
    /// Attach a media type to a codec header.
    pub fn from_header(header: ImageHeader, media_type: &'static str) -> Self {
        Self {
            width: header.width,
            height: header.height,
            pixel_format: header.pixel_format,
            media_type,
        }
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Decode-time settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct DecodeOptions {
    /// Convert the decoded image to this layout. `None` keeps the layout
    /// closest to what the file stores.
    pub pixel_format: Option<PixelFormat>,
}

impl DecodeOptions {
    /// Request a specific output layout.
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = Some(format);
        self
    }
}

/// Encode-time settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct EncodeOptions {
    /// Lossy quality, 1 (smallest) to 100 (best). Ignored by lossless codecs.
    pub quality: Option<u8>,
}

impl EncodeOptions {
    /// Quality used when none is set.
    pub const DEFAULT_QUALITY: u8 = 85;

    /// Set lossy quality. Out-of-range values are clamped on use.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Quality clamped to `1..=100`, or [`DEFAULT_QUALITY`](Self::DEFAULT_QUALITY).
    pub fn effective_quality(&self) -> u8 {
        self.quality
            .map_or(Self::DEFAULT_QUALITY, |q| q.clamp(1, 100))
    }
}

// ---------------------------------------------------------------------------
// EncodeOutput
// ---------------------------------------------------------------------------

/// Output from an encode operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeOutput {
    data: Vec<u8>,
    media_type: &'static str,
    pixel_format: PixelFormat,
}

impl EncodeOutput {
    /// Create a new encode output.
    pub fn new(data: Vec<u8>, media_type: &'static str, pixel_format: PixelFormat) -> Self {
        Self {
            data,
            media_type,
            pixel_format,
        }
    }

    /// Consume and return the encoded bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Borrow the encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Encoded byte count.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the output is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Media type of the codec that produced the bytes.
    pub fn media_type(&self) -> &'static str {
        self.media_type
    }

    /// Pixel format the codec actually received after negotiation.
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }
}

impl AsRef<[u8]> for EncodeOutput {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_defaults_and_clamps() {
        assert_eq!(EncodeOptions::default().effective_quality(), 85);
        assert_eq!(EncodeOptions::default().with_quality(0).effective_quality(), 1);
        assert_eq!(EncodeOptions::default().with_quality(250).effective_quality(), 100);
        assert_eq!(EncodeOptions::default().with_quality(40).effective_quality(), 40);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: EncodeOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, EncodeOptions::default());
        let opts: EncodeOptions = serde_json::from_str(r#"{"quality": 70}"#).unwrap();
        assert_eq!(opts.quality, Some(70));

        let opts: DecodeOptions = serde_json::from_str(r#"{"pixel_format": "greya"}"#).unwrap();
        assert_eq!(opts.pixel_format, Some(PixelFormat::GreyA));
        assert!(serde_json::from_str::<DecodeOptions>(r#"{"pixel_format": "cmyk"}"#).is_err());
    }

    #[test]
    fn stat_serializes() {
        let stat = ImageStat::from_header(ImageHeader::new(3, 2, PixelFormat::Rgba), "image/png");
        let json = serde_json::to_value(stat).unwrap();
        assert_eq!(json["width"], 3);
        assert_eq!(json["height"], 2);
        assert_eq!(json["pixel_format"], "rgba");
        assert_eq!(json["media_type"], "image/png");
    }

    #[test]
    fn encode_output_accessors() {
        let out = EncodeOutput::new(vec![1, 2, 3], "image/png", PixelFormat::Grey);
        assert_eq!(out.len(), 3);
        assert!(!out.is_empty());
        assert_eq!(out.media_type(), "image/png");
        assert_eq!(out.pixel_format(), PixelFormat::Grey);
        assert_eq!(out.as_ref(), &[1, 2, 3]);
        assert_eq!(out.into_vec(), vec![1, 2, 3]);
    }
}
