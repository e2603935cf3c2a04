//! Ordered codec registry.

use core::fmt;
use std::sync::Arc;

use crate::codec::Codec;

/// Codecs keyed by media type, in registration order.
///
/// Order matters: decode and stat dispatch try codecs front to back and the
/// first success wins. Build the catalog up front, then hand it to a
/// [`Dispatcher`](crate::Dispatcher) behind an `Arc`; it is never mutated
/// after that.
#[derive(Clone)]
pub struct CodecCatalog {
    entries: Vec<Arc<dyn Codec>>,
}

impl CodecCatalog {
    /// A catalog with no codecs.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Every back end compiled into this build, in the order png, jpeg,
    /// tiff, webp. Back ends whose cargo feature is off are absent.
    pub fn builtin() -> Self {
        #[allow(unused_mut)]
        let mut catalog = Self::empty();
        #[cfg(feature = "png")]
        catalog.register(Arc::new(crate::codecs::PngCodec));
        #[cfg(feature = "jpeg")]
        catalog.register(Arc::new(crate::codecs::JpegCodec));
        #[cfg(feature = "tiff")]
        catalog.register(Arc::new(crate::codecs::TiffCodec));
        #[cfg(feature = "webp")]
        catalog.register(Arc::new(crate::codecs::WebPCodec));
        catalog
    }

    /// Add a codec at the end, or replace in place the entry with the same
    /// media type.
    pub fn register(&mut self, codec: Arc<dyn Codec>) {
        let media_type = codec.media_type();
        match self.entries.iter_mut().find(|c| c.media_type() == media_type) {
            Some(slot) => {
                tracing::debug!(media_type, "replacing registered codec");
                *slot = codec;
            }
            None => self.entries.push(codec),
        }
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.register(codec);
        self
    }

    /// Codec registered for `media_type`.
    pub fn get(&self, media_type: &str) -> Option<&Arc<dyn Codec>> {
        self.entries.iter().find(|c| c.media_type() == media_type)
    }

    /// Whether a codec is registered for `media_type`.
    pub fn contains(&self, media_type: &str) -> bool {
        self.get(media_type).is_some()
    }

    /// Registered media types, in dispatch order.
    pub fn media_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|c| c.media_type())
    }

    /// Registered codecs, in dispatch order.
    pub fn codecs(&self) -> &[Arc<dyn Codec>] {
        &self.entries
    }

    /// Number of registered codecs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no codec is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CodecCatalog {
    /// Same as [`CodecCatalog::builtin`].
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for CodecCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.media_types()).finish()
    }
}
