//! Built-in codec back ends, one per cargo feature.
//!
//! Each back end recognises its container by magic bytes, reads headers
//! without decoding pixels for `stat`, and hands full decode and encode to
//! the `image` crate.

#[cfg(feature = "jpeg")]
mod jpeg;
#[cfg(feature = "png")]
mod png;
#[cfg(feature = "tiff")]
mod tiff;
#[cfg(feature = "webp")]
mod webp;

#[cfg(feature = "jpeg")]
pub use jpeg::JpegCodec;
#[cfg(feature = "png")]
pub use png::PngCodec;
#[cfg(feature = "tiff")]
pub use tiff::TiffCodec;
#[cfg(feature = "webp")]
pub use webp::WebPCodec;

use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageResult};

use crate::buffer::{PixelBuffer, PixelSlice};
use crate::codec::{DecodeOptions, ImageHeader};
use crate::convert::{ColorConvertOptions, color_convert};
use crate::error::CodecError;
use crate::format::ImageFormat;
use crate::interop;
use crate::pixel::PixelFormat;

/// Fail unless `data` starts with `format`'s signature.
fn check_signature(data: &[u8], format: ImageFormat) -> Result<(), CodecError> {
    if ImageFormat::detect(data) == Some(format) {
        Ok(())
    } else {
        Err(CodecError::new(format!("not a {format} file")))
    }
}

/// Header-only read through an `image` decoder.
fn stat_with<D: ImageDecoder>(decoder: ImageResult<D>) -> Option<ImageHeader> {
    let decoder = decoder.ok()?;
    let (width, height) = decoder.dimensions();
    Some(ImageHeader::new(
        width,
        height,
        interop::pixel_format_of(decoder.color_type()),
    ))
}

/// Full decode through an `image` decoder, then the layout the caller asked
/// for.
fn decode_with<D: ImageDecoder>(
    decoder: ImageResult<D>,
    options: &DecodeOptions,
) -> Result<PixelBuffer, CodecError> {
    let image = DynamicImage::from_decoder(decoder?)?;
    let buffer = interop::from_dynamic(image)?;
    match options.pixel_format {
        Some(target) if target != buffer.pixel_format() => {
            color_convert(&buffer, target, &ColorConvertOptions::default())
                .map_err(|err| CodecError::with_source("converting decoded image", err))
        }
        _ => Ok(buffer),
    }
}

/// Encode packed rows of `image` through an `image` encoder.
fn encode_with<E: ImageEncoder>(
    encoder: E,
    image: PixelSlice<'_>,
    accepted: &[PixelFormat],
) -> Result<(), CodecError> {
    let format = image.pixel_format();
    if !accepted.contains(&format) {
        return Err(CodecError::new(format!("cannot encode {format} pixels")));
    }
    encoder.write_image(
        &image.to_packed_vec(),
        image.width(),
        image.height(),
        interop::extended_color_type(format),
    )?;
    Ok(())
}
