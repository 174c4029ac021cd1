//! MD5 digest computation.
//!
//! The protocol's validation step hashes a file prefix incrementally, one
//! `hash_chunk_size`-sized read at a time, never holding the whole prefix
//! in memory. [`Hasher`] wraps the `md-5` crate's streaming API for that.

use digest::Digest;
use md5::Md5;

/// A 128-bit MD5 digest.
pub type Digest16 = [u8; 16];

/// Hash a byte slice in one call.
pub fn hash(data: &[u8]) -> Digest16 {
    Md5::digest(data).into()
}

/// Incremental MD5 hasher for data that arrives in pieces.
///
/// ```
/// use rft_checksum::Hasher;
/// let mut h = Hasher::new();
/// h.update(b"hello ");
/// h.update(b"world");
/// let digest = h.finalize();
/// assert_eq!(digest, rft_checksum::hash(b"hello world"));
/// ```
pub struct Hasher(Md5);

impl Hasher {
    pub fn new() -> Self {
        Self(Md5::new())
    }

    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    /// Consumes the hasher and returns the digest accumulated so far.
    pub fn finalize(self) -> Digest16 {
        self.0.finalize().into()
    }

    /// Returns the digest accumulated so far without consuming the hasher,
    /// so a running total can be read after every chunk without restarting
    /// the accumulation (the protocol's digest is always over the whole
    /// prefix from byte 0, never a per-chunk digest).
    pub fn finalize_clone(&self) -> Digest16 {
        self.0.clone().finalize().into()
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a digest the way it is written to hash logs and control lines:
/// lowercase hex, no separators.
pub fn to_hex(digest: &Digest16) -> String {
    hex::encode(digest)
}

/// Parse a digest back out of its hex form.
pub fn from_hex(s: &str) -> Result<Digest16, hex::FromHexError> {
    let bytes = hex::decode(s)?;
    bytes
        .try_into()
        .map_err(|_| hex::FromHexError::InvalidStringLength)
}
