//! The `<file>.hashlog` side-file.
//!
//! Plain text, one record per validated chunk boundary:
//!
//! ```text
//! <cumulative_bytes>\t<hex_digest>\n
//! ```
//!
//! Records are strictly increasing and aligned to the chunk size the log
//! was written with. The final, possibly-short chunk of a file is never
//! logged — only full `hash_chunk_size` boundaries are, so a log can be
//! reused safely even if the source file later grows. A log that fails to
//! parse, or whose offsets are not a strictly increasing multiple of the
//! chunk size, is fatal: we never silently fall back to re-hashing, since
//! that would mask a log that has silently gone stale against a different
//! file.

use std::io::Write;
use std::path::{Path, PathBuf};

use rft_core::{Error, Result};

use crate::hasher::{from_hex, to_hex, Digest16};
use crate::chunk::HashChunk;

/// A fully-parsed hash log, ready to answer "what digest did we record at
/// byte offset N" without re-reading the file.
#[derive(Debug, Default, Clone)]
pub struct HashLog {
    records: Vec<HashChunk>,
}

impl HashLog {
    /// The side-file path for a given target file: `<file>.hashlog`.
    pub fn path_for(file: &Path) -> PathBuf {
        let mut name = file.as_os_str().to_os_string();
        name.push(".hashlog");
        PathBuf::from(name)
    }

    /// Read and validate an existing log. Returns an empty log if the file
    /// does not exist; any other read or parse failure is fatal.
    pub fn load(path: &Path, hash_chunk_size: u64) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };

        let mut records = Vec::new();
        let mut previous = 0u64;
        for (lineno, line) in text.lines().enumerate() {
            let record = parse_record(line)
                .ok_or_else(|| corrupt(path, lineno, "malformed record"))?;

            if record.cumulative_bytes % hash_chunk_size != 0 {
                return Err(corrupt(path, lineno, "offset is not chunk-aligned"));
            }
            if record.cumulative_bytes <= previous {
                return Err(corrupt(path, lineno, "offsets are not strictly increasing"));
            }
            previous = record.cumulative_bytes;
            records.push(record);
        }

        Ok(Self { records })
    }

    /// The digest recorded at `cumulative_bytes`, if any.
    pub fn digest_at(&self, cumulative_bytes: u64) -> Option<Digest16> {
        self.records
            .iter()
            .find(|r| r.cumulative_bytes == cumulative_bytes)
            .map(|r| r.digest)
    }

    /// How many validated bytes this log covers, i.e. the offset of its
    /// last record, or 0 if the log is empty.
    pub fn validated_bytes(&self) -> u64 {
        self.records.last().map(|r| r.cumulative_bytes).unwrap_or(0)
    }

    pub fn records(&self) -> &[HashChunk] {
        &self.records
    }

    /// Append one record to both the in-memory log and the on-disk file.
    /// Callers must never append the final short chunk of a file; this
    /// does not re-check chunk alignment itself, since it is only ever
    /// called from the hash pipeline which already enforces it.
    pub fn append(&mut self, path: &Path, record: HashChunk) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}\t{}", record.cumulative_bytes, to_hex(&record.digest))?;
        self.records.push(record);
        Ok(())
    }
}

fn parse_record(line: &str) -> Option<HashChunk> {
    let (offset, hex) = line.split_once('\t')?;
    let cumulative_bytes: u64 = offset.parse().ok()?;
    let digest = from_hex(hex).ok()?;
    Some(HashChunk::new(cumulative_bytes, digest))
}

fn corrupt(path: &Path, lineno: usize, reason: &str) -> Error {
    Error::HashLogCorrupt(path.to_path_buf(), format!("line {}: {}", lineno + 1, reason))
}
