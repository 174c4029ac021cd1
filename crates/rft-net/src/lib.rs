//! Session establishment (the key handshake and verb/filename exchange)
//! plus the two roles that drive a connection once established: the
//! long-lived [`Listener`] and the one-shot [`dial`].

pub mod dialer;
pub mod listener;
pub mod session;

pub use dialer::dial;
pub use listener::Listener;
pub use session::{client_handshake, server_handshake, HandshakeRequest};
