use std::io::Cursor;

use image::codecs::tiff::{TiffDecoder, TiffEncoder};

use super::{check_signature, decode_with, encode_with, stat_with};
use crate::buffer::{PixelBuffer, PixelSlice};
use crate::codec::{Codec, DecodeOptions, EncodeOptions, ImageHeader};
use crate::error::CodecError;
use crate::format::ImageFormat;
use crate::pixel::PixelFormat;

/// Uncompressed TIFF.
#[derive(Clone, Copy, Debug, Default)]
pub struct TiffCodec;

const ENCODABLE: [PixelFormat; 6] = [
    PixelFormat::Rgb,
    PixelFormat::Rgba,
    PixelFormat::Grey,
    PixelFormat::R16,
    PixelFormat::R16G16B16,
    PixelFormat::R16G16B16A16,
];

impl Codec for TiffCodec {
    fn media_type(&self) -> &'static str {
        ImageFormat::Tiff.mime_type()
    }

    fn stat(&self, data: &[u8]) -> Option<ImageHeader> {
        check_signature(data, ImageFormat::Tiff).ok()?;
        stat_with(TiffDecoder::new(Cursor::new(data)))
    }

    fn decode(&self, data: &[u8], options: &DecodeOptions) -> Result<PixelBuffer, CodecError> {
        check_signature(data, ImageFormat::Tiff)?;
        decode_with(TiffDecoder::new(Cursor::new(data)), options)
    }

    fn encode(&self, image: PixelSlice<'_>, _options: &EncodeOptions) -> Result<Vec<u8>, CodecError> {
        let mut out = Cursor::new(Vec::new());
        encode_with(TiffEncoder::new(&mut out), image, &ENCODABLE)?;
        Ok(out.into_inner())
    }

    fn encodable_formats(&self) -> &[PixelFormat] {
        &ENCODABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_bit_rgb_round_trip() {
        let mut buf = PixelBuffer::new(4, 4, PixelFormat::R16G16B16).unwrap();
        for y in 0..4 {
            for (i, pair) in buf.row_mut(y).chunks_exact_mut(2).enumerate() {
                pair.copy_from_slice(&(i as u16 * 4000 + y as u16).to_ne_bytes());
            }
        }
        let bytes = TiffCodec.encode(buf.as_slice(), &EncodeOptions::default()).unwrap();
        assert_eq!(ImageFormat::detect(&bytes), Some(ImageFormat::Tiff));
        assert_eq!(
            TiffCodec.stat(&bytes),
            Some(ImageHeader::new(4, 4, PixelFormat::R16G16B16))
        );
        let back = TiffCodec.decode(&bytes, &DecodeOptions::default()).unwrap();
        assert!(back.equal_pixels(&buf));
    }

    #[test]
    fn rejects_png() {
        assert!(TiffCodec.stat(b"\x89PNG\r\n\x1a\n").is_none());
    }
}
