//! Resampling through the `image` crate's filters.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::buffer::{PixelBuffer, PixelSlice};
use crate::error::{Error, Result};
use crate::interop;

/// Resampling kernel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    #[default]
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Target size and kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeOptions {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub filter: ResizeFilter,
}

impl ResizeOptions {
    /// Resize to exactly `width`×`height` with the default filter.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            filter: ResizeFilter::default(),
        }
    }

    /// Use `filter` instead of the default.
    pub fn with_filter(mut self, filter: ResizeFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Resample `image` to the requested size, keeping its pixel format.
///
/// A zero target dimension yields an empty buffer.
///
/// # Errors
///
/// [`Error::InvalidDimensions`] when a non-empty result is requested from
/// an empty image.
pub fn resize<'a>(image: impl Into<PixelSlice<'a>>, options: &ResizeOptions) -> Result<PixelBuffer> {
    let image = image.into();
    let format = image.pixel_format();
    if options.width == 0 || options.height == 0 {
        return PixelBuffer::new(options.width, options.height, format);
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::InvalidDimensions {
            width: image.width(),
            height: image.height(),
        });
    }
    tracing::debug!(
        from_width = image.width(),
        from_height = image.height(),
        to_width = options.width,
        to_height = options.height,
        filter = ?options.filter,
        "resizing"
    );
    let resized = interop::to_dynamic(image)?.resize_exact(
        options.width,
        options.height,
        options.filter.into(),
    );
    Ok(interop::from_dynamic(resized)?)
}

/// Async form of [`resize`], run on the blocking pool.
#[cfg(feature = "async")]
pub async fn resize_async(image: PixelBuffer, options: ResizeOptions) -> Result<PixelBuffer> {
    crate::blocking::run(move || resize(&image, &options)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::PixelFormat;

    fn solid(width: u32, height: u32, format: PixelFormat, value: u8) -> PixelBuffer {
        let mut buf = PixelBuffer::new(width, height, format).unwrap();
        buf.as_slice_mut().fill(value);
        buf
    }

    #[test]
    fn keeps_format_and_size() {
        for format in PixelFormat::ALL {
            let src = solid(8, 6, format, 0x40);
            let out = resize(&src, &ResizeOptions::new(3, 5)).unwrap();
            assert_eq!((out.width(), out.height()), (3, 5));
            assert_eq!(out.pixel_format(), format);
        }
    }

    #[test]
    fn solid_colour_stays_solid() {
        let src = solid(10, 10, PixelFormat::Rgb, 200);
        for filter in [
            ResizeFilter::Nearest,
            ResizeFilter::Triangle,
            ResizeFilter::CatmullRom,
            ResizeFilter::Gaussian,
            ResizeFilter::Lanczos3,
        ] {
            let out = resize(&src, &ResizeOptions::new(4, 7).with_filter(filter)).unwrap();
            assert!(out.avg_channel_diff(&solid(4, 7, PixelFormat::Rgb, 200)) < 1.0, "{filter:?}");
        }
    }

    #[test]
    fn nearest_upscale_duplicates() {
        let src = PixelBuffer::from_packed(&[10, 250], 2, 1, PixelFormat::Grey).unwrap();
        let out = resize(&src, &ResizeOptions::new(4, 1).with_filter(ResizeFilter::Nearest)).unwrap();
        assert_eq!(out.row(0), &[10, 10, 250, 250]);
    }

    #[test]
    fn zero_target_is_empty() {
        let src = solid(4, 4, PixelFormat::Grey, 1);
        let out = resize(&src, &ResizeOptions::new(0, 4)).unwrap();
        assert_eq!(out.width(), 0);
        assert!(out.data().is_empty());
    }

    #[test]
    fn empty_source_cannot_grow() {
        let src = PixelBuffer::new(0, 0, PixelFormat::Rgba).unwrap();
        assert!(matches!(
            resize(&src, &ResizeOptions::new(2, 2)),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn options_from_json() {
        let opts: ResizeOptions = serde_json::from_str(r#"{"width": 4, "height": 2}"#).unwrap();
        assert_eq!(opts, ResizeOptions::new(4, 2));
        let opts: ResizeOptions =
            serde_json::from_str(r#"{"width": 4, "height": 2, "filter": "lanczos3"}"#).unwrap();
        assert_eq!(opts.filter, ResizeFilter::Lanczos3);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn async_matches_blocking() {
        let src = PixelBuffer::from_packed(&[0, 50, 100, 150, 200, 250], 3, 2, PixelFormat::Grey).unwrap();
        let options = ResizeOptions::new(5, 3);
        let blocking = resize(&src, &options).unwrap();
        let suspended = resize_async(src, options).await.unwrap();
        assert!(blocking.equal_pixels(&suspended));
    }
}
