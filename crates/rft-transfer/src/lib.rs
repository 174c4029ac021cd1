//! `FileEndpoint`, `ResumeState`, the Hash Pipeline, and the Sender/Receiver
//! state machines that drive the resume negotiation and tail transfer once
//! a session's handshake has already established verb, filename, and
//! (for PUT) total size.

pub mod endpoint;
pub mod interact;
pub mod pipeline;
pub mod receiver;
pub mod resume;
pub mod sender;

pub use endpoint::FileEndpoint;
pub use receiver::get_file;
pub use resume::ResumeState;
pub use sender::send_file;
