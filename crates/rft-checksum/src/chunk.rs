//! The unit the hash pipeline passes from the producer task (reads and
//! hashes disk chunks) to the consumer task (exchanges one digest per
//! chunk over the control channel).

use crate::hasher::Digest16;

/// One chunk's worth of hashing progress.
///
/// `cumulative_bytes` is always the true file offset, measured from byte 0.
/// `digest` is the running MD5 of everything the producer has actually read
/// so far in this pipeline run, which is the whole prefix from byte 0 *only
/// when the pipeline started there* — a hash-log resume instead starts the
/// producer past an already-validated prefix (see `pipeline.rs`), in which
/// case `digest` covers just the unread suffix from that boundary onward.
/// The final record pushed by the producer is the sentinel
/// (`HashChunk::sentinel()`), which the consumer recognizes by its zero
/// size and stops on rather than exchanging it with the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashChunk {
    pub cumulative_bytes: u64,
    pub digest: Digest16,
}

impl HashChunk {
    pub fn new(cumulative_bytes: u64, digest: Digest16) -> Self {
        Self {
            cumulative_bytes,
            digest,
        }
    }

    /// The end-of-stream marker: zero bytes, zero digest. Never written to
    /// the hash log and never sent over the wire — it only tells the
    /// consumer task the producer has nothing left to hand it.
    pub fn sentinel() -> Self {
        Self {
            cumulative_bytes: 0,
            digest: [0u8; 16],
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.cumulative_bytes == 0 && self.digest == [0u8; 16]
    }
}
