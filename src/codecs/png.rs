use std::io::Cursor;

use image::codecs::png::{PngDecoder, PngEncoder};

use super::{check_signature, decode_with, encode_with, stat_with};
use crate::buffer::{PixelBuffer, PixelSlice};
use crate::codec::{Codec, DecodeOptions, EncodeOptions, ImageHeader};
use crate::error::CodecError;
use crate::format::ImageFormat;
use crate::pixel::PixelFormat;

/// Lossless PNG. Encodes every pixel format natively, 16-bit included.
#[derive(Clone, Copy, Debug, Default)]
pub struct PngCodec;

const ENCODABLE: [PixelFormat; 8] = PixelFormat::ALL;

impl Codec for PngCodec {
    fn media_type(&self) -> &'static str {
        ImageFormat::Png.mime_type()
    }

    fn stat(&self, data: &[u8]) -> Option<ImageHeader> {
        check_signature(data, ImageFormat::Png).ok()?;
        stat_with(PngDecoder::new(Cursor::new(data)))
    }

    fn decode(&self, data: &[u8], options: &DecodeOptions) -> Result<PixelBuffer, CodecError> {
        check_signature(data, ImageFormat::Png)?;
        decode_with(PngDecoder::new(Cursor::new(data)), options)
    }

    fn encode(&self, image: PixelSlice<'_>, _options: &EncodeOptions) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        encode_with(PngEncoder::new(&mut out), image, &ENCODABLE)?;
        Ok(out)
    }

    fn encodable_formats(&self) -> &[PixelFormat] {
        &ENCODABLE
    }
}
