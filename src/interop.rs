//! Glue between [`PixelBuffer`] and the `image` crate's types.

use image::{ColorType, DynamicImage, ExtendedColorType, ImageBuffer, Luma, LumaA, Rgb, Rgba};

use crate::buffer::{PixelBuffer, PixelSlice};
use crate::error::CodecError;
use crate::pixel::PixelFormat;

/// Nearest [`PixelFormat`] for a decoder's colour type.
///
/// Float images map to the 16-bit layout with the same channels; anything
/// unknown decodes as 8-bit RGBA.
pub(crate) fn pixel_format_of(color: ColorType) -> PixelFormat {
    match color {
        ColorType::L8 => PixelFormat::Grey,
        ColorType::La8 => PixelFormat::GreyA,
        ColorType::Rgb8 => PixelFormat::Rgb,
        ColorType::Rgba8 => PixelFormat::Rgba,
        ColorType::L16 => PixelFormat::R16,
        ColorType::La16 => PixelFormat::R16G16,
        ColorType::Rgb16 | ColorType::Rgb32F => PixelFormat::R16G16B16,
        ColorType::Rgba16 | ColorType::Rgba32F => PixelFormat::R16G16B16A16,
        _ => PixelFormat::Rgba,
    }
}

/// Colour type to pass to an encoder for `format`.
pub(crate) fn extended_color_type(format: PixelFormat) -> ExtendedColorType {
    match format {
        PixelFormat::Grey => ExtendedColorType::L8,
        PixelFormat::GreyA => ExtendedColorType::La8,
        PixelFormat::Rgb => ExtendedColorType::Rgb8,
        PixelFormat::Rgba => ExtendedColorType::Rgba8,
        PixelFormat::R16 => ExtendedColorType::L16,
        PixelFormat::R16G16 => ExtendedColorType::La16,
        PixelFormat::R16G16B16 => ExtendedColorType::Rgb16,
        PixelFormat::R16G16B16A16 => ExtendedColorType::Rgba16,
    }
}

/// Move a decoded image into a tightly strided buffer.
pub(crate) fn from_dynamic(image: DynamicImage) -> Result<PixelBuffer, CodecError> {
    let (width, height) = (image.width(), image.height());
    let (format, bytes) = match image {
        DynamicImage::ImageLuma8(img) => (PixelFormat::Grey, img.into_raw()),
        DynamicImage::ImageLumaA8(img) => (PixelFormat::GreyA, img.into_raw()),
        DynamicImage::ImageRgb8(img) => (PixelFormat::Rgb, img.into_raw()),
        DynamicImage::ImageRgba8(img) => (PixelFormat::Rgba, img.into_raw()),
        DynamicImage::ImageLuma16(img) => (PixelFormat::R16, ne_bytes(&img.into_raw())),
        DynamicImage::ImageLumaA16(img) => (PixelFormat::R16G16, ne_bytes(&img.into_raw())),
        DynamicImage::ImageRgb16(img) => (PixelFormat::R16G16B16, ne_bytes(&img.into_raw())),
        DynamicImage::ImageRgba16(img) => (PixelFormat::R16G16B16A16, ne_bytes(&img.into_raw())),
        other if other.color().has_alpha() && other.color().bytes_per_pixel() > 4 => (
            PixelFormat::R16G16B16A16,
            ne_bytes(&other.to_rgba16().into_raw()),
        ),
        other if other.color().bytes_per_pixel() > 4 => {
            (PixelFormat::R16G16B16, ne_bytes(&other.to_rgb16().into_raw()))
        }
        other => (PixelFormat::Rgba, other.to_rgba8().into_raw()),
    };
    let stride = width as usize * format.bytes_per_pixel();
    PixelBuffer::from_vec(bytes, width, height, format, Some(stride))
        .map_err(|err| CodecError::with_source("decoded image has an invalid layout", err))
}

/// Copy a view into an `image` crate image of the matching layout.
pub(crate) fn to_dynamic(image: PixelSlice<'_>) -> Result<DynamicImage, CodecError> {
    let (width, height) = (image.width(), image.height());
    let packed = image.to_packed_vec();
    let invalid = || CodecError::new(format!("{width}x{height} buffer does not fit {}", image.pixel_format()));
    let dynamic = match image.pixel_format() {
        PixelFormat::Grey => DynamicImage::ImageLuma8(
            ImageBuffer::<Luma<u8>, _>::from_raw(width, height, packed).ok_or_else(invalid)?,
        ),
        PixelFormat::GreyA => DynamicImage::ImageLumaA8(
            ImageBuffer::<LumaA<u8>, _>::from_raw(width, height, packed).ok_or_else(invalid)?,
        ),
        PixelFormat::Rgb => DynamicImage::ImageRgb8(
            ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, packed).ok_or_else(invalid)?,
        ),
        PixelFormat::Rgba => DynamicImage::ImageRgba8(
            ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, packed).ok_or_else(invalid)?,
        ),
        PixelFormat::R16 => DynamicImage::ImageLuma16(
            ImageBuffer::<Luma<u16>, _>::from_raw(width, height, ne_words(&packed))
                .ok_or_else(invalid)?,
        ),
        PixelFormat::R16G16 => DynamicImage::ImageLumaA16(
            ImageBuffer::<LumaA<u16>, _>::from_raw(width, height, ne_words(&packed))
                .ok_or_else(invalid)?,
        ),
        PixelFormat::R16G16B16 => DynamicImage::ImageRgb16(
            ImageBuffer::<Rgb<u16>, _>::from_raw(width, height, ne_words(&packed))
                .ok_or_else(invalid)?,
        ),
        PixelFormat::R16G16B16A16 => DynamicImage::ImageRgba16(
            ImageBuffer::<Rgba<u16>, _>::from_raw(width, height, ne_words(&packed))
                .ok_or_else(invalid)?,
        ),
    };
    Ok(dynamic)
}

fn ne_bytes(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_ne_bytes()).collect()
}

fn ne_words(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_format_maps_back_to_itself() {
        for format in PixelFormat::ALL {
            let color = match extended_color_type(format) {
                ExtendedColorType::L8 => ColorType::L8,
                ExtendedColorType::La8 => ColorType::La8,
                ExtendedColorType::Rgb8 => ColorType::Rgb8,
                ExtendedColorType::Rgba8 => ColorType::Rgba8,
                ExtendedColorType::L16 => ColorType::L16,
                ExtendedColorType::La16 => ColorType::La16,
                ExtendedColorType::Rgb16 => ColorType::Rgb16,
                ExtendedColorType::Rgba16 => ColorType::Rgba16,
                other => panic!("unexpected {other:?}"),
            };
            assert_eq!(pixel_format_of(color), format);
        }
    }

    #[test]
    fn floats_become_sixteen_bit() {
        assert_eq!(pixel_format_of(ColorType::Rgb32F), PixelFormat::R16G16B16);
        assert_eq!(pixel_format_of(ColorType::Rgba32F), PixelFormat::R16G16B16A16);
    }

    #[test]
    fn dynamic_round_trip_every_format() {
        for format in PixelFormat::ALL {
            let mut buf = PixelBuffer::new(3, 2, format).unwrap();
            for y in 0..2 {
                for (i, byte) in buf.row_mut(y).iter_mut().enumerate() {
                    *byte = (i as u8).wrapping_mul(37).wrapping_add(y as u8);
                }
            }
            let dynamic = to_dynamic(buf.as_slice()).unwrap();
            assert_eq!(pixel_format_of(dynamic.color()), format);
            let back = from_dynamic(dynamic).unwrap();
            assert!(back.equal_pixels(&buf), "{format}");
        }
    }

    #[test]
    fn float_image_converts_to_deep_rgb() {
        let img = ImageBuffer::<Rgb<f32>, _>::from_raw(1, 1, vec![1.0, 0.0, 0.5]).unwrap();
        let buf = from_dynamic(DynamicImage::ImageRgb32F(img)).unwrap();
        assert_eq!(buf.pixel_format(), PixelFormat::R16G16B16);
        let row = buf.row(0);
        assert_eq!(u16::from_ne_bytes([row[0], row[1]]), u16::MAX);
        assert_eq!(u16::from_ne_bytes([row[2], row[3]]), 0);
    }
}
