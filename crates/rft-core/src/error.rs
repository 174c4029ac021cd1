//! The error type every `rft-*` library crate reports through.
//!
//! Library code returns `Error`; the `rft-cli` binary is the only place
//! that wraps these in `anyhow::Context` and turns them into an exit code.

use std::path::PathBuf;

/// Errors that can arise while establishing or running a transfer session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("connection closed while reading a control line")]
    UnexpectedEof,

    #[error("control line is not valid UTF-8")]
    InvalidUtf8,

    #[error("expected a decimal number on the control channel, got {0:?}")]
    NotANumber(String),

    #[error("verb {0:?} is not GET or PUT")]
    UnknownVerb(String),

    #[error("a control line may not contain '\\n'")]
    EmbeddedNewline,

    #[error("key does not match the configured secret")]
    AuthFailed,

    #[error("source file is missing on the sending side")]
    SourceMissing,

    #[error("peer advertised a non-positive size")]
    NonPositiveSize,

    #[error("peer replied with {expected:?} but sent {got:?}")]
    ProtocolMismatch { expected: String, got: String },

    #[error("remote size {remote} did not equal our negotiated exist size {ours}")]
    SizeMismatch { remote: u64, ours: u64 },

    #[error("connection closed before the tail transfer completed")]
    ConnectionClosed,

    #[error("hash log {0} is corrupt: {1}")]
    HashLogCorrupt(PathBuf, String),

    #[error("operator declined to overwrite mismatched data")]
    OverwriteDeclined,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
