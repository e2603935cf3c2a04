use std::io::Cursor;

use image::codecs::jpeg::{JpegDecoder, JpegEncoder};

use super::{check_signature, decode_with, encode_with, stat_with};
use crate::buffer::{PixelBuffer, PixelSlice};
use crate::codec::{Codec, DecodeOptions, EncodeOptions, ImageHeader};
use crate::error::CodecError;
use crate::format::ImageFormat;
use crate::pixel::PixelFormat;

/// Baseline JPEG. Lossy; quality comes from [`EncodeOptions`].
#[derive(Clone, Copy, Debug, Default)]
pub struct JpegCodec;

const ENCODABLE: [PixelFormat; 2] = [PixelFormat::Rgb, PixelFormat::Grey];

impl Codec for JpegCodec {
    fn media_type(&self) -> &'static str {
        ImageFormat::Jpeg.mime_type()
    }

    fn stat(&self, data: &[u8]) -> Option<ImageHeader> {
        check_signature(data, ImageFormat::Jpeg).ok()?;
        stat_with(JpegDecoder::new(Cursor::new(data)))
    }

    fn decode(&self, data: &[u8], options: &DecodeOptions) -> Result<PixelBuffer, CodecError> {
        check_signature(data, ImageFormat::Jpeg)?;
        decode_with(JpegDecoder::new(Cursor::new(data)), options)
    }

    fn encode(&self, image: PixelSlice<'_>, options: &EncodeOptions) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut out, options.effective_quality());
        encode_with(encoder, image, &ENCODABLE)?;
        Ok(out)
    }

    fn encodable_formats(&self) -> &[PixelFormat] {
        &ENCODABLE
    }
}
