use std::io::Cursor;

use image::codecs::webp::{WebPDecoder, WebPEncoder};

use super::{check_signature, decode_with, encode_with, stat_with};
use crate::buffer::{PixelBuffer, PixelSlice};
use crate::codec::{Codec, DecodeOptions, EncodeOptions, ImageHeader};
use crate::error::CodecError;
use crate::format::ImageFormat;
use crate::pixel::PixelFormat;

/// Lossless WebP.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebPCodec;

const ENCODABLE: [PixelFormat; 2] = [PixelFormat::Rgb, PixelFormat::Rgba];

impl Codec for WebPCodec {
    fn media_type(&self) -> &'static str {
        ImageFormat::WebP.mime_type()
    }

    fn stat(&self, data: &[u8]) -> Option<ImageHeader> {
        check_signature(data, ImageFormat::WebP).ok()?;
        stat_with(WebPDecoder::new(Cursor::new(data)))
    }

    fn decode(&self, data: &[u8], options: &DecodeOptions) -> Result<PixelBuffer, CodecError> {
        check_signature(data, ImageFormat::WebP)?;
        decode_with(WebPDecoder::new(Cursor::new(data)), options)
    }

    fn encode(&self, image: PixelSlice<'_>, _options: &EncodeOptions) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        encode_with(WebPEncoder::new_lossless(&mut out), image, &ENCODABLE)?;
        Ok(out)
    }

    fn encodable_formats(&self) -> &[PixelFormat] {
        &ENCODABLE
    }
}
