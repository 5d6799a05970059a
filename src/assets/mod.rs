//! In-memory build assets and the post-build hash/rename emitter.

mod html_hash;

use indexmap::IndexMap;
use sha2::{Digest as _, Sha256};

pub use html_hash::{HtmlHashEmitter, HtmlHashOptions, RedirectManifest};

/// Output path to asset mapping owned by the host build, iterated in insertion order.
pub type AssetMap = IndexMap<String, Asset>;

/// A build output blob.
///
/// `size` normally equals the byte length of `source`, but an asset may report a different
/// size when the host needs to (see [`HtmlHashEmitter`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    source: Vec<u8>,
    size: usize,
}

impl Asset {
    /// Asset whose reported size is its byte length.
    pub fn new(source: impl Into<Vec<u8>>) -> Self {
        let source = source.into();
        let size = source.len();
        Self { source, size }
    }

    /// Asset that reports `size` regardless of its content length.
    pub fn with_reported_size(source: impl Into<Vec<u8>>, size: usize) -> Self {
        Self {
            source: source.into(),
            size,
        }
    }

    /// Asset content.
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Reported size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Lowercase hex SHA-256 of `content`, truncated to `length` characters.
pub fn content_digest(content: &[u8], length: usize) -> String {
    let mut digest = hex::encode(Sha256::digest(content));
    digest.truncate(length);
    digest
}
