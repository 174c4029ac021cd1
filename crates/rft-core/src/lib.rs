//! rft-core — shared types for the resumable file transfer protocol.
//!
//! Every other `rft-*` crate depends on this one for the wire framing
//! primitive, the session verb, the process-wide `Config`, and the error
//! type the rest of the stack reports through.

pub mod config;
pub mod error;
pub mod framing;
pub mod verb;

pub use config::Config;
pub use error::Error;
pub use verb::Verb;
