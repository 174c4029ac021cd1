//! Running MD5 over a file prefix, and the `<file>.hashlog` side-file that
//! records digests at chunk boundaries so a resumed transfer does not have
//! to re-hash bytes it already validated in a previous session.

pub mod chunk;
pub mod hasher;
pub mod log;

pub use chunk::HashChunk;
pub use hasher::{from_hex, hash, to_hex, Hasher};
pub use log::HashLog;
