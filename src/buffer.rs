//! Strided pixel storage.
//!
//! A [`PixelBuffer`] owns `height` rows of `stride` bytes, each row holding
//! `width` pixels of one [`PixelFormat`]. [`PixelSlice`] and
//! [`PixelSliceMut`] are windows into a buffer's storage: an offset and a
//! length over the owner's bytes, sharing its stride. A view never outlives
//! its owner, and writes made through a mutable view are what the owner sees
//! afterwards. Only one writer may exist at a time; the borrow checker holds
//! callers to that.

use core::fmt;

use imgref::ImgRef;
use rgb::{Rgb, Rgba};

use crate::error::{Error, Result};
use crate::pixel::PixelFormat;

// ---------------------------------------------------------------------------
// PixelSlice (borrowed, immutable)
// ---------------------------------------------------------------------------

/// Borrowed, read-only view of pixel rows.
///
/// Possibly a sub-region of a larger buffer. All rows share the parent's
/// stride; the last row may end without padding.
#[derive(Clone, Copy)]
pub struct PixelSlice<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
}

impl<'a> PixelSlice<'a> {
    /// Create a view over `data` with validation.
    ///
    /// # Errors
    ///
    /// [`Error::StrideTooSmall`], [`Error::InvalidDimensions`] or
    /// [`Error::InsufficientData`] when the layout does not fit.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Self> {
        check_layout(data.len(), width, height, stride, format)?;
        Ok(Self {
            data,
            width,
            height,
            stride,
            format,
        })
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte distance between row starts.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Pixel format.
    #[inline]
    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    /// Pixel bytes in one row, without padding.
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// Pixel bytes for row `y` (exactly `width * bpp` bytes, no copy).
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &'a [u8] {
        assert!(
            y < self.height,
            "row index {y} out of bounds (height: {})",
            self.height
        );
        let start = y as usize * self.stride;
        &self.data[start..start + self.row_bytes()]
    }

    /// Pixel bytes for row `y`, or [`Error::RowOutOfBounds`].
    pub fn try_row(&self, y: u32) -> Result<&'a [u8]> {
        if y >= self.height {
            return Err(Error::RowOutOfBounds {
                y,
                height: self.height,
            });
        }
        Ok(self.row(y))
    }

    /// Iterate rows top to bottom.
    pub fn rows(self) -> impl Iterator<Item = &'a [u8]> + 'a {
        (0..self.height).map(move |y| self.row(y))
    }

    /// Zero-copy view of the `w`×`h` region whose top-left pixel is `(x, y)`.
    ///
    /// The view keeps this slice's stride and format. Bounds are the
    /// caller's responsibility: only the byte range is checked, so a region
    /// spilling past the right edge reads into the following row.
    ///
    /// # Panics
    ///
    /// Panics if the region's bytes fall outside the underlying data.
    pub fn sub_view(&self, x: u32, y: u32, w: u32, h: u32) -> PixelSlice<'a> {
        debug_assert!(
            x.checked_add(w).is_some_and(|end| end <= self.width),
            "sub_view x={x} w={w} exceeds width {}",
            self.width
        );
        debug_assert!(
            y.checked_add(h).is_some_and(|end| end <= self.height),
            "sub_view y={y} h={h} exceeds height {}",
            self.height
        );
        let range = window(x, y, w, h, self.stride, self.format);
        PixelSlice {
            data: &self.data[range],
            width: w,
            height: h,
            stride: self.stride,
            format: self.format,
        }
    }

    /// Clipped, stride-aware block copy into `target`.
    ///
    /// Copies `min(width) * bpp` bytes per row for `min(height)` rows,
    /// starting at the top-left corner of both images.
    ///
    /// # Errors
    ///
    /// [`Error::PixelTypeMismatch`] if the formats differ.
    pub fn copy_to<'b>(&self, target: impl Into<PixelSliceMut<'b>>) -> Result<()> {
        let mut target = target.into();
        if target.format != self.format {
            return Err(Error::PixelTypeMismatch {
                source_format: self.format,
                target_format: target.format,
            });
        }
        let len = self.width.min(target.width) as usize * self.format.bytes_per_pixel();
        for y in 0..self.height.min(target.height) {
            let src = &self.row(y)[..len];
            target.row_mut(y)[..len].copy_from_slice(src);
        }
        Ok(())
    }

    /// Exact pixel comparison.
    ///
    /// False when width, height or format differ. Row padding is ignored.
    pub fn equal_pixels<'b>(&self, other: impl Into<PixelSlice<'b>>) -> bool {
        let other = other.into();
        self.same_shape(&other) && self.rows().zip(other.rows()).all(|(a, b)| a == b)
    }

    /// Mean absolute difference over every channel byte of every pixel.
    ///
    /// Returns 255.0 when the images are not comparable (width, height or
    /// format differ), so a single threshold works for lossy round trips.
    /// Two empty images of the same shape differ by 0.0.
    pub fn avg_channel_diff<'b>(&self, other: impl Into<PixelSlice<'b>>) -> f64 {
        let other = other.into();
        if !self.same_shape(&other) {
            return MAX_CHANNEL_DIFF;
        }
        let count = self.row_bytes() as u64 * self.height as u64;
        if count == 0 {
            return 0.0;
        }
        let sum: u64 = self
            .rows()
            .zip(other.rows())
            .map(|(a, b)| {
                a.iter()
                    .zip(b)
                    .map(|(p, q)| u64::from(p.abs_diff(*q)))
                    .sum::<u64>()
            })
            .sum();
        sum as f64 / count as f64
    }

    /// Copy the pixels into a new buffer with default stride.
    pub fn to_buffer(&self) -> Result<PixelBuffer> {
        let mut dst = PixelBuffer::new(self.width, self.height, self.format)?;
        self.copy_to(&mut dst)?;
        Ok(dst)
    }

    /// Pixel bytes with row padding removed.
    pub fn to_packed_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.row_bytes() * self.height as usize);
        for row in self.rows() {
            out.extend_from_slice(row);
        }
        out
    }

    fn same_shape(&self, other: &PixelSlice<'_>) -> bool {
        self.width == other.width && self.height == other.height && self.format == other.format
    }
}

impl fmt::Debug for PixelSlice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PixelSlice({}x{}, {}, stride {})",
            self.width, self.height, self.format, self.stride
        )
    }
}

impl<'a> From<&PixelSlice<'a>> for PixelSlice<'a> {
    fn from(slice: &PixelSlice<'a>) -> Self {
        *slice
    }
}

// ---------------------------------------------------------------------------
// PixelSliceMut (borrowed, mutable)
// ---------------------------------------------------------------------------

/// Mutable borrowed view of pixel rows.
///
/// Same layout rules as [`PixelSlice`].
pub struct PixelSliceMut<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
}

impl<'a> PixelSliceMut<'a> {
    /// Create a mutable view over `data` with validation.
    ///
    /// # Errors
    ///
    /// Same as [`PixelSlice::new`].
    pub fn new(
        data: &'a mut [u8],
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Self> {
        check_layout(data.len(), width, height, stride, format)?;
        Ok(Self {
            data,
            width,
            height,
            stride,
            format,
        })
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte distance between row starts.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Pixel format.
    #[inline]
    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    /// Reborrow as a read-only view.
    pub fn as_slice(&self) -> PixelSlice<'_> {
        PixelSlice {
            data: &*self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
            format: self.format,
        }
    }

    /// Pixel bytes for row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        self.as_slice().row(y)
    }

    /// Mutable pixel bytes for row `y` (no padding).
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        assert!(
            y < self.height,
            "row index {y} out of bounds (height: {})",
            self.height
        );
        let start = y as usize * self.stride;
        let len = self.width as usize * self.format.bytes_per_pixel();
        &mut self.data[start..start + len]
    }

    /// Mutable zero-copy view of a region. See [`PixelSlice::sub_view`].
    pub fn sub_view_mut(&mut self, x: u32, y: u32, w: u32, h: u32) -> PixelSliceMut<'_> {
        let range = window(x, y, w, h, self.stride, self.format);
        PixelSliceMut {
            data: &mut self.data[range],
            width: w,
            height: h,
            stride: self.stride,
            format: self.format,
        }
    }

    /// Set every pixel byte to `value`, leaving padding untouched.
    pub fn fill(&mut self, value: u8) {
        for y in 0..self.height {
            self.row_mut(y).fill(value);
        }
    }
}

impl fmt::Debug for PixelSliceMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PixelSliceMut({}x{}, {}, stride {})",
            self.width, self.height, self.format, self.stride
        )
    }
}

impl<'a, 'b> From<&'a PixelSliceMut<'b>> for PixelSlice<'a> {
    fn from(slice: &'a PixelSliceMut<'b>) -> Self {
        slice.as_slice()
    }
}

impl<'a, 'b> From<&'a mut PixelSliceMut<'b>> for PixelSliceMut<'a> {
    fn from(slice: &'a mut PixelSliceMut<'b>) -> Self {
        PixelSliceMut {
            data: &mut *slice.data,
            width: slice.width,
            height: slice.height,
            stride: slice.stride,
            format: slice.format,
        }
    }
}

// ---------------------------------------------------------------------------
// PixelBuffer (owned)
// ---------------------------------------------------------------------------

/// Owned pixel storage with format metadata.
///
/// Shape (width, height, format, stride) is fixed at construction; pixel
/// contents can be changed through [`row_mut`](Self::row_mut) or a mutable
/// view.
#[derive(Clone)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
}

impl PixelBuffer {
    /// Allocate a zero-filled buffer with the default word-aligned stride.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDimensions`] if the size overflows.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let stride = format
            .default_stride(width)
            .ok_or(Error::InvalidDimensions { width, height })?;
        Self::with_stride(width, height, format, stride)
    }

    /// Allocate a zero-filled buffer with an explicit stride.
    ///
    /// Exactly `stride * height` bytes are allocated.
    ///
    /// # Errors
    ///
    /// [`Error::StrideTooSmall`] or [`Error::InvalidDimensions`].
    pub fn with_stride(width: u32, height: u32, format: PixelFormat, stride: usize) -> Result<Self> {
        min_stride(width, height, stride, format)?;
        let total = stride
            .checked_mul(height as usize)
            .ok_or(Error::InvalidDimensions { width, height })?;
        Ok(Self {
            data: vec![0u8; total],
            width,
            height,
            stride,
            format,
        })
    }

    /// Wrap existing bytes.
    ///
    /// `stride` defaults to the word-aligned row length. `data` must hold at
    /// least `stride * (height - 1) + width * bpp` bytes; the last row need
    /// not be padded.
    ///
    /// # Errors
    ///
    /// [`Error::StrideTooSmall`], [`Error::InvalidDimensions`] or
    /// [`Error::InsufficientData`].
    pub fn from_vec(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        stride: Option<usize>,
    ) -> Result<Self> {
        let stride = match stride {
            Some(stride) => stride,
            None => format
                .default_stride(width)
                .ok_or(Error::InvalidDimensions { width, height })?,
        };
        check_layout(data.len(), width, height, stride, format)?;
        Ok(Self {
            data,
            width,
            height,
            stride,
            format,
        })
    }

    /// Copy tightly packed rows (`width * bpp` bytes each) into a new buffer
    /// with default stride.
    ///
    /// # Errors
    ///
    /// [`Error::InsufficientData`] if `packed` is short.
    pub fn from_packed(packed: &[u8], width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let row_bytes = width as usize * format.bytes_per_pixel();
        let src = PixelSlice::new(packed, width, height, row_bytes, format)?;
        src.to_buffer()
    }

    /// Consume the buffer and return its backing bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte distance between row starts.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Pixel format.
    #[inline]
    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    /// The whole backing region, padding included.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Borrow the whole image as a [`PixelSlice`].
    pub fn as_slice(&self) -> PixelSlice<'_> {
        PixelSlice {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
            format: self.format,
        }
    }

    /// Borrow the whole image as a [`PixelSliceMut`].
    pub fn as_slice_mut(&mut self) -> PixelSliceMut<'_> {
        PixelSliceMut {
            data: &mut self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
            format: self.format,
        }
    }

    /// Pixel bytes for row `y`. See [`PixelSlice::row`].
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        self.as_slice().row(y)
    }

    /// Pixel bytes for row `y`, or [`Error::RowOutOfBounds`].
    pub fn try_row(&self, y: u32) -> Result<&[u8]> {
        self.as_slice().try_row(y)
    }

    /// Mutable pixel bytes for row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        assert!(
            y < self.height,
            "row index {y} out of bounds (height: {})",
            self.height
        );
        let start = y as usize * self.stride;
        let len = self.width as usize * self.format.bytes_per_pixel();
        &mut self.data[start..start + len]
    }

    /// Zero-copy view of a region. See [`PixelSlice::sub_view`].
    pub fn sub_view(&self, x: u32, y: u32, w: u32, h: u32) -> PixelSlice<'_> {
        self.as_slice().sub_view(x, y, w, h)
    }

    /// Mutable zero-copy view of a region.
    pub fn sub_view_mut(&mut self, x: u32, y: u32, w: u32, h: u32) -> PixelSliceMut<'_> {
        let range = window(x, y, w, h, self.stride, self.format);
        PixelSliceMut {
            data: &mut self.data[range],
            width: w,
            height: h,
            stride: self.stride,
            format: self.format,
        }
    }

    /// Copy a region into a new buffer with default stride.
    pub fn crop_copy(&self, x: u32, y: u32, w: u32, h: u32) -> Result<PixelBuffer> {
        self.sub_view(x, y, w, h).to_buffer()
    }

    /// Clipped block copy into `target`. See [`PixelSlice::copy_to`].
    pub fn copy_to<'b>(&self, target: impl Into<PixelSliceMut<'b>>) -> Result<()> {
        self.as_slice().copy_to(target)
    }

    /// Exact pixel comparison. See [`PixelSlice::equal_pixels`].
    pub fn equal_pixels<'b>(&self, other: impl Into<PixelSlice<'b>>) -> bool {
        self.as_slice().equal_pixels(other)
    }

    /// Mean absolute channel difference. See [`PixelSlice::avg_channel_diff`].
    pub fn avg_channel_diff<'b>(&self, other: impl Into<PixelSlice<'b>>) -> f64 {
        self.as_slice().avg_channel_diff(other)
    }

    /// Pixel bytes with row padding removed.
    pub fn to_packed_vec(&self) -> Vec<u8> {
        self.as_slice().to_packed_vec()
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PixelBuffer({}x{}, {}, stride {})",
            self.width, self.height, self.format, self.stride
        )
    }
}

impl<'a> From<&'a PixelBuffer> for PixelSlice<'a> {
    fn from(buf: &'a PixelBuffer) -> Self {
        buf.as_slice()
    }
}

impl<'a> From<&'a mut PixelBuffer> for PixelSliceMut<'a> {
    fn from(buf: &'a mut PixelBuffer) -> Self {
        buf.as_slice_mut()
    }
}

// ---------------------------------------------------------------------------
// ImgRef → PixelSlice (zero-copy From impls)
// ---------------------------------------------------------------------------

macro_rules! impl_from_imgref {
    ($pixel:ty, $format:expr) => {
        impl<'a> From<ImgRef<'a, $pixel>> for PixelSlice<'a> {
            fn from(img: ImgRef<'a, $pixel>) -> Self {
                use rgb::ComponentBytes;
                let (width, height) = (img.width() as u32, img.height() as u32);
                let stride = img.stride() * core::mem::size_of::<$pixel>();
                PixelSlice {
                    data: img.into_buf().as_bytes(),
                    width,
                    height,
                    stride,
                    format: $format,
                }
            }
        }
    };
}

impl_from_imgref!(Rgb<u8>, PixelFormat::Rgb);
impl_from_imgref!(Rgba<u8>, PixelFormat::Rgba);
impl_from_imgref!(Rgb<u16>, PixelFormat::R16G16B16);
impl_from_imgref!(Rgba<u16>, PixelFormat::R16G16B16A16);

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

const MAX_CHANNEL_DIFF: f64 = 255.0;

/// Validate stride and return the packed row length.
fn min_stride(width: u32, height: u32, stride: usize, format: PixelFormat) -> Result<usize> {
    let min = (width as usize)
        .checked_mul(format.bytes_per_pixel())
        .ok_or(Error::InvalidDimensions { width, height })?;
    if stride < min {
        return Err(Error::StrideTooSmall { stride, min });
    }
    Ok(min)
}

/// Minimum bytes needed: `(height - 1) * stride + width * bpp`.
fn required_bytes(width: u32, height: u32, stride: usize, row_bytes: usize) -> Result<usize> {
    if height == 0 {
        return Ok(0);
    }
    (height as usize - 1)
        .checked_mul(stride)
        .and_then(|preceding| preceding.checked_add(row_bytes))
        .ok_or(Error::InvalidDimensions { width, height })
}

fn check_layout(
    len: usize,
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
) -> Result<()> {
    let row_bytes = min_stride(width, height, stride, format)?;
    let required = required_bytes(width, height, stride, row_bytes)?;
    if len < required {
        return Err(Error::InsufficientData { len, required });
    }
    Ok(())
}

/// Byte range covering a `w`×`h` region at `(x, y)`.
///
/// A zero-width region with rows still spans `(h - 1) * stride` bytes so
/// every row offset stays inside it.
fn window(
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    stride: usize,
    format: PixelFormat,
) -> core::ops::Range<usize> {
    if h == 0 {
        return 0..0;
    }
    let bpp = format.bytes_per_pixel();
    let start = y as usize * stride + x as usize * bpp;
    start..start + (h as usize - 1) * stride + w as usize * bpp
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
