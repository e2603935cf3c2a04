//! Routing of stat, decode and encode requests over a [`CodecCatalog`].
//!
//! Stat and decode know nothing about the input, so every codec is tried in
//! registration order and the first one that succeeds wins. Encode is keyed
//! by media type and negotiates the pixel format before the codec sees the
//! image.

use std::sync::Arc;

use crate::buffer::{PixelBuffer, PixelSlice};
use crate::catalog::CodecCatalog;
use crate::codec::{DecodeOptions, EncodeOptions, EncodeOutput, ImageStat};
use crate::convert::{ColorConvertOptions, ColorConverter};
use crate::error::{Error, Result};
use crate::negotiate::ensure_supported;

/// Front end over a codec catalog.
///
/// Cheap to clone; clones share the catalog and converter.
#[derive(Clone)]
pub struct Dispatcher {
    catalog: Arc<CodecCatalog>,
    converter: Arc<dyn ColorConverter>,
}

impl Dispatcher {
    /// Dispatch over `catalog`, converting with default luma weights.
    pub fn new(catalog: Arc<CodecCatalog>) -> Self {
        Self {
            catalog,
            converter: Arc::new(ColorConvertOptions::default()),
        }
    }

    /// Replace the converter used during encode negotiation and for
    /// [`DecodeOptions::pixel_format`] requests.
    pub fn with_converter(mut self, converter: Arc<dyn ColorConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// The catalog requests are routed over.
    pub fn catalog(&self) -> &CodecCatalog {
        &self.catalog
    }

    /// Header summary from the first codec that recognises `data`.
    ///
    /// Returns `None` when no codec does, including for an empty catalog.
    pub fn stat(&self, data: &[u8]) -> Option<ImageStat> {
        self.catalog.codecs().iter().find_map(|codec| {
            let header = codec.stat(data)?;
            Some(ImageStat::from_header(header, codec.media_type()))
        })
    }

    /// Decode with the first codec that succeeds.
    ///
    /// Individual codec failures are not reported; they only move dispatch
    /// on to the next codec.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedFormat`] when every codec failed or the catalog is
    /// empty.
    pub fn decode(&self, data: &[u8], options: &DecodeOptions) -> Result<PixelBuffer> {
        // layout conversion happens here so the configured converter applies
        let native = DecodeOptions {
            pixel_format: None,
            ..*options
        };
        let buffer = self
            .catalog
            .codecs()
            .iter()
            .find_map(|codec| match codec.decode(data, &native) {
                Ok(buffer) => {
                    tracing::debug!(
                        media_type = codec.media_type(),
                        width = buffer.width(),
                        height = buffer.height(),
                        pixel_format = %buffer.pixel_format(),
                        "decoded"
                    );
                    Some(buffer)
                }
                Err(err) => {
                    tracing::trace!(media_type = codec.media_type(), error = %err, "codec declined");
                    None
                }
            })
            .ok_or(Error::UnsupportedFormat)?;
        match options.pixel_format {
            Some(target) if target != buffer.pixel_format() => {
                self.converter.convert(buffer.as_slice(), target)
            }
            _ => Ok(buffer),
        }
    }

    /// Encode `image` with the codec registered for `media_type`.
    ///
    /// The image is converted first if the codec does not accept its pixel
    /// format; see [`ensure_supported`].
    ///
    /// # Errors
    ///
    /// [`Error::CodecUnavailable`] if no codec handles `media_type`,
    /// [`Error::NoEncodableFormat`] if it declares no formats, and the
    /// codec's own failure as [`Error::Codec`].
    pub fn encode<'a>(
        &self,
        media_type: &str,
        image: impl Into<PixelSlice<'a>>,
        options: &EncodeOptions,
    ) -> Result<EncodeOutput> {
        let codec = self
            .catalog
            .get(media_type)
            .ok_or_else(|| Error::CodecUnavailable(media_type.to_owned()))?;
        let negotiated = ensure_supported(image, codec.encodable_formats(), self.converter.as_ref())?;
        let image = negotiated.as_slice();
        let data = codec.encode(image, options)?;
        tracing::debug!(
            media_type = codec.media_type(),
            pixel_format = %image.pixel_format(),
            converted = negotiated.is_converted(),
            len = data.len(),
            "encoded"
        );
        Ok(EncodeOutput::new(data, codec.media_type(), image.pixel_format()))
    }

    /// Async form of [`decode`](Self::decode), run on the blocking pool.
    #[cfg(feature = "async")]
    pub async fn decode_async(
        &self,
        data: impl Into<bytes::Bytes>,
        options: DecodeOptions,
    ) -> Result<PixelBuffer> {
        let this = self.clone();
        let data = data.into();
        crate::blocking::run(move || this.decode(&data, &options)).await
    }

    /// Async form of [`stat`](Self::stat), run on the blocking pool.
    #[cfg(feature = "async")]
    pub async fn stat_async(&self, data: impl Into<bytes::Bytes>) -> Result<Option<ImageStat>> {
        let this = self.clone();
        let data = data.into();
        crate::blocking::run(move || Ok(this.stat(&data))).await
    }

    /// Async form of [`encode`](Self::encode), run on the blocking pool.
    #[cfg(feature = "async")]
    pub async fn encode_async(
        &self,
        media_type: &str,
        image: PixelBuffer,
        options: EncodeOptions,
    ) -> Result<EncodeOutput> {
        let this = self.clone();
        let media_type = media_type.to_owned();
        crate::blocking::run(move || this.encode(&media_type, &image, &options)).await
    }
}

impl Default for Dispatcher {
    /// Dispatch over [`CodecCatalog::builtin`].
    fn default() -> Self {
        Self::new(Arc::new(CodecCatalog::builtin()))
    }
}

impl core::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, ImageHeader};
    use crate::error::CodecError;
    use crate::pixel::PixelFormat;
    use std::sync::Mutex;

    /// Scripted codec that logs every call into a shared journal.
    struct Fake {
        media_type: &'static str,
        accepts: &'static [u8],
        formats: Vec<PixelFormat>,
        journal: Arc<Mutex<Vec<String>>>,
    }

    impl Fake {
        fn new(
            media_type: &'static str,
            accepts: &'static [u8],
            formats: &[PixelFormat],
            journal: &Arc<Mutex<Vec<String>>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                media_type,
                accepts,
                formats: formats.to_vec(),
                journal: Arc::clone(journal),
            })
        }

        fn log(&self, entry: String) {
            self.journal.lock().unwrap().push(entry);
        }
    }

    impl Codec for Fake {
        fn media_type(&self) -> &'static str {
            self.media_type
        }

        fn stat(&self, data: &[u8]) -> Option<ImageHeader> {
            self.log(format!("stat {}", self.media_type));
            data.starts_with(self.accepts)
                .then(|| ImageHeader::new(data.len() as u32, 1, PixelFormat::Grey))
        }

        fn decode(&self, data: &[u8], _options: &DecodeOptions) -> std::result::Result<PixelBuffer, CodecError> {
            self.log(format!("decode {}", self.media_type));
            if !data.starts_with(self.accepts) {
                return Err(CodecError::new("wrong magic"));
            }
            let width = self.accepts.len() as u32;
            Ok(PixelBuffer::from_packed(self.accepts, width, 1, PixelFormat::Grey).unwrap())
        }

        fn encode(
            &self,
            image: PixelSlice<'_>,
            _options: &EncodeOptions,
        ) -> std::result::Result<Vec<u8>, CodecError> {
            self.log(format!("encode {} {}", self.media_type, image.pixel_format()));
            if image.width() == 0 {
                return Err(CodecError::new("empty image"));
            }
            let mut out = self.accepts.to_vec();
            out.extend(image.to_packed_vec());
            Ok(out)
        }

        fn encodable_formats(&self) -> &[PixelFormat] {
            &self.formats
        }
    }

    fn journal() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    /// Converter that ignores its input and returns a zeroed buffer.
    struct Blank;

    impl ColorConverter for Blank {
        fn convert(&self, image: PixelSlice<'_>, target: PixelFormat) -> Result<PixelBuffer> {
            PixelBuffer::new(image.width(), image.height(), target)
        }
    }

    fn two_codecs(log: &Arc<Mutex<Vec<String>>>) -> Dispatcher {
        let catalog = CodecCatalog::empty()
            .with_codec(Fake::new("image/x-a", b"AA", &[PixelFormat::Grey], log))
            .with_codec(Fake::new("image/x-b", b"B", &[PixelFormat::Rgb, PixelFormat::Grey], log));
        Dispatcher::new(Arc::new(catalog))
    }

    #[test]
    fn stat_tries_in_order_and_stops() {
        let log = journal();
        let dispatcher = two_codecs(&log);
        let stat = dispatcher.stat(b"AAxx").unwrap();
        assert_eq!(stat.media_type, "image/x-a");
        assert_eq!(stat.width, 4);
        assert_eq!(*log.lock().unwrap(), ["stat image/x-a"]);
    }

    #[test]
    fn stat_falls_through_and_exhausts() {
        let log = journal();
        let dispatcher = two_codecs(&log);
        assert_eq!(dispatcher.stat(b"Bx").unwrap().media_type, "image/x-b");
        assert!(dispatcher.stat(b"zz").is_none());
        assert_eq!(log.lock().unwrap().len(), 4);
    }

    #[test]
    fn first_registered_codec_wins_overlap() {
        let log = journal();
        let catalog = CodecCatalog::empty()
            .with_codec(Fake::new("image/x-first", b"A", &[PixelFormat::Grey], &log))
            .with_codec(Fake::new("image/x-second", b"AA", &[PixelFormat::Grey], &log));
        let dispatcher = Dispatcher::new(Arc::new(catalog));
        assert_eq!(dispatcher.stat(b"AAA").unwrap().media_type, "image/x-first");
        let buf = dispatcher.decode(b"AAA", &DecodeOptions::default()).unwrap();
        assert_eq!(buf.width(), 1);
    }

    #[test]
    fn decode_swallows_codec_errors() {
        let log = journal();
        let dispatcher = two_codecs(&log);
        let buf = dispatcher.decode(b"B!", &DecodeOptions::default()).unwrap();
        assert_eq!(buf.row(0), b"B");
        assert_eq!(*log.lock().unwrap(), ["decode image/x-a", "decode image/x-b"]);
    }

    #[test]
    fn decode_exhaustion_is_unsupported() {
        let log = journal();
        let dispatcher = two_codecs(&log);
        let err = dispatcher.decode(b"??", &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat));
        assert_eq!(err.to_string(), "unsupported image file");
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn empty_catalog() {
        let dispatcher = Dispatcher::new(Arc::new(CodecCatalog::empty()));
        assert!(dispatcher.stat(b"anything").is_none());
        assert!(matches!(
            dispatcher.decode(b"anything", &DecodeOptions::default()),
            Err(Error::UnsupportedFormat)
        ));
        let buf = PixelBuffer::new(1, 1, PixelFormat::Rgb).unwrap();
        assert!(matches!(
            dispatcher.encode("image/png", &buf, &EncodeOptions::default()),
            Err(Error::CodecUnavailable(media)) if media == "image/png"
        ));
    }

    #[test]
    fn encode_native_format_passes_through() {
        let log = journal();
        let dispatcher = two_codecs(&log);
        let buf = PixelBuffer::from_packed(&[1, 2, 3], 1, 1, PixelFormat::Rgb).unwrap();
        let out = dispatcher.encode("image/x-b", &buf, &EncodeOptions::default()).unwrap();
        assert_eq!(out.bytes(), b"B\x01\x02\x03");
        assert_eq!(out.media_type(), "image/x-b");
        assert_eq!(out.pixel_format(), PixelFormat::Rgb);
    }

    #[test]
    fn encoder_only_sees_declared_formats() {
        let log = journal();
        let dispatcher = two_codecs(&log);
        for format in PixelFormat::ALL {
            let buf = PixelBuffer::new(2, 2, format).unwrap();
            let out = dispatcher.encode("image/x-b", &buf, &EncodeOptions::default()).unwrap();
            assert!([PixelFormat::Rgb, PixelFormat::Grey].contains(&out.pixel_format()));
        }
        for entry in log.lock().unwrap().iter() {
            assert!(
                entry == "encode image/x-b rgb" || entry == "encode image/x-b grey",
                "{entry}"
            );
        }
    }

    #[test]
    fn encode_converts_rgba_for_grey_codec() {
        let log = journal();
        let dispatcher = two_codecs(&log);
        let buf = PixelBuffer::from_packed(&[255, 255, 255, 7], 1, 1, PixelFormat::Rgba).unwrap();
        let out = dispatcher.encode("image/x-a", &buf, &EncodeOptions::default()).unwrap();
        assert_eq!(out.pixel_format(), PixelFormat::Grey);
        assert_eq!(out.bytes(), b"AA\xFF");
    }

    #[test]
    fn encode_codec_failure_is_passed_through() {
        let log = journal();
        let dispatcher = two_codecs(&log);
        let buf = PixelBuffer::new(0, 3, PixelFormat::Grey).unwrap();
        let err = dispatcher.encode("image/x-a", &buf, &EncodeOptions::default()).unwrap_err();
        assert!(matches!(&err, Error::Codec(inner) if inner.message() == "empty image"));
    }

    #[test]
    fn codec_with_no_formats() {
        let log = journal();
        let catalog = CodecCatalog::empty().with_codec(Fake::new("image/x-none", b"N", &[], &log));
        let dispatcher = Dispatcher::new(Arc::new(catalog));
        let buf = PixelBuffer::new(1, 1, PixelFormat::Rgb).unwrap();
        assert!(matches!(
            dispatcher.encode("image/x-none", &buf, &EncodeOptions::default()),
            Err(Error::NoEncodableFormat)
        ));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn custom_converter_is_used() {
        let log = journal();
        let dispatcher = two_codecs(&log).with_converter(Arc::new(Blank));
        let buf = PixelBuffer::from_packed(&[9, 9], 1, 1, PixelFormat::GreyA).unwrap();
        let out = dispatcher.encode("image/x-a", &buf, &EncodeOptions::default()).unwrap();
        assert_eq!(out.bytes(), b"AA\x00");
    }

    #[test]
    fn decode_layout_request_uses_configured_converter() {
        let log = journal();
        let dispatcher = two_codecs(&log).with_converter(Arc::new(Blank));
        let options = DecodeOptions::default().with_pixel_format(PixelFormat::Rgb);
        let buf = dispatcher.decode(b"AA", &options).unwrap();
        assert_eq!(buf.pixel_format(), PixelFormat::Rgb);
        assert_eq!(buf.row(0), &[0; 6]);

        let plain = two_codecs(&log).decode(b"AA", &options).unwrap();
        assert_eq!(plain.row(0), b"AAAAAA");
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn async_forms_match_blocking() {
        let log = journal();
        let dispatcher = two_codecs(&log);
        let blocking = dispatcher.decode(b"AA", &DecodeOptions::default()).unwrap();
        let suspended = dispatcher
            .decode_async(&b"AA"[..], DecodeOptions::default())
            .await
            .unwrap();
        assert!(blocking.equal_pixels(&suspended));

        assert_eq!(
            dispatcher.stat_async(&b"Bq"[..]).await.unwrap(),
            dispatcher.stat(b"Bq")
        );

        let buf = PixelBuffer::from_packed(&[4, 5, 6], 1, 1, PixelFormat::Rgb).unwrap();
        let sync_out = dispatcher.encode("image/x-a", &buf, &EncodeOptions::default()).unwrap();
        let async_out = dispatcher
            .encode_async("image/x-a", buf, EncodeOptions::default())
            .await
            .unwrap();
        assert_eq!(sync_out, async_out);

        let err = dispatcher
            .decode_async(Vec::new(), DecodeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat));
    }
}
