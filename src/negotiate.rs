//! Encode-time pixel format negotiation.
//!
//! A codec declares which formats it can encode. When the caller's image is
//! in some other format, the closest acceptable one is picked from the
//! format's compatibility ranking and the image is converted first.

use crate::buffer::{PixelBuffer, PixelSlice};
use crate::convert::ColorConverter;
use crate::error::{Error, Result};
use crate::pixel::PixelFormat;

/// Whether `accepted` contains `format`.
#[inline]
pub fn is_natively_supported(format: PixelFormat, accepted: &[PixelFormat]) -> bool {
    accepted.contains(&format)
}

/// Pick the best format in `accepted` for an image currently in `format`.
///
/// Walks `format`'s compatibility ranking and returns the first entry that
/// is accepted. If none is (only possible when `accepted` holds nothing but
/// `format` itself, which callers check first), falls back to the first
/// accepted format. Deterministic for a given input.
///
/// # Errors
///
/// [`Error::NoEncodableFormat`] if `accepted` is empty.
pub fn choose_replacement(format: PixelFormat, accepted: &[PixelFormat]) -> Result<PixelFormat> {
    if let Some(found) = format
        .compatible_formats()
        .iter()
        .find(|candidate| accepted.contains(candidate))
    {
        return Ok(*found);
    }
    let fallback = accepted.first().copied().ok_or(Error::NoEncodableFormat)?;
    tracing::warn!(%format, %fallback, "no ranked alternative accepted, using first encodable format");
    Ok(fallback)
}

/// An image ready for a codec: either the caller's view untouched or a
/// converted copy.
#[derive(Debug)]
pub enum Negotiated<'a> {
    /// The codec accepts the source format; no copy was made.
    Native(PixelSlice<'a>),
    /// Converted to the format chosen by [`choose_replacement`].
    Converted(PixelBuffer),
}

impl Negotiated<'_> {
    /// Borrow the image to hand to the codec.
    pub fn as_slice(&self) -> PixelSlice<'_> {
        match self {
            Negotiated::Native(view) => *view,
            Negotiated::Converted(buffer) => buffer.as_slice(),
        }
    }

    /// Whether a conversion happened.
    pub fn is_converted(&self) -> bool {
        matches!(self, Negotiated::Converted(_))
    }
}

/// Return `image` unchanged if its format is accepted, else converted to
/// the best replacement.
///
/// # Errors
///
/// [`Error::NoEncodableFormat`] for an empty `accepted` list, or whatever
/// the converter reports.
pub fn ensure_supported<'a>(
    image: impl Into<PixelSlice<'a>>,
    accepted: &[PixelFormat],
    converter: &dyn ColorConverter,
) -> Result<Negotiated<'a>> {
    let image = image.into();
    let format = image.pixel_format();
    if is_natively_supported(format, accepted) {
        return Ok(Negotiated::Native(image));
    }
    let target = choose_replacement(format, accepted)?;
    tracing::debug!(source = %format, %target, "encoder does not accept source format");
    Ok(Negotiated::Converted(converter.convert(image, target)?))
}
