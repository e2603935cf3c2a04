//! Strided pixel buffers and multi-codec image dispatch.
//!
//! - [`PixelFormat`] — closed set of pixel layouts with byte widths and an
//!   encode-time compatibility ranking
//! - [`PixelBuffer`] / [`PixelSlice`] / [`PixelSliceMut`] — owned strided
//!   storage and zero-copy borrowed windows into it
//! - [`Codec`] — the contract every format back end implements
//! - [`CodecCatalog`] — ordered registry of codecs keyed by media type
//! - [`Dispatcher`] — sequential-fallback stat and decode, negotiated encode
//! - [`ensure_supported`] / [`choose_replacement`] — pixel format negotiation
//! - [`color_convert`] and [`resize`] — pure pixel transforms
//! - [`ImageFormat`] — magic-byte detection for the built-in formats
//!
//! Built-in PNG, JPEG, TIFF and WebP back ends live in [`codecs`], each
//! behind the cargo feature of the same name. With the `async` feature every
//! heavy operation also has an `*_async` form that runs the same code on
//! tokio's blocking pool.
//!
//! ```no_run
//! use rastercodec::{DecodeOptions, Dispatcher, EncodeOptions};
//!
//! # fn main() -> rastercodec::Result<()> {
//! let dispatcher = Dispatcher::default();
//! let bytes = std::fs::read("photo.png").map_err(|e| rastercodec::CodecError::with_source("read", e))?;
//! let image = dispatcher.decode(&bytes, &DecodeOptions::default())?;
//! let jpeg = dispatcher.encode("image/jpeg", &image, &EncodeOptions::default().with_quality(90))?;
//! # let _ = jpeg;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

#[cfg(feature = "async")]
mod blocking;
mod buffer;
mod catalog;
mod codec;
#[cfg(any(feature = "png", feature = "jpeg", feature = "tiff", feature = "webp"))]
pub mod codecs;
mod convert;
mod dispatch;
mod error;
mod format;
mod interop;
mod negotiate;
mod pixel;
mod resize;

pub use buffer::{PixelBuffer, PixelSlice, PixelSliceMut};
pub use catalog::CodecCatalog;
pub use codec::{Codec, DecodeOptions, EncodeOptions, EncodeOutput, ImageHeader, ImageStat};
pub use convert::{ColorConvertOptions, ColorConverter, color_convert};
#[cfg(feature = "async")]
pub use convert::color_convert_async;
pub use dispatch::Dispatcher;
pub use error::{BoxError, CodecError, Error, Result};
pub use format::ImageFormat;
pub use negotiate::{Negotiated, choose_replacement, ensure_supported, is_natively_supported};
pub use pixel::{PixelFormat, bytes_per_pixel, compatible_formats_for};
pub use resize::{ResizeFilter, ResizeOptions, resize};
#[cfg(feature = "async")]
pub use resize::resize_async;

// Re-exports for interop with typed pixel containers.
pub use imgref::{Img, ImgRef};
pub use rgb;
