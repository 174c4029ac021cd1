//! The two session verbs. A session carries exactly one.

use crate::error::Error;

/// Which direction the requesting side wants the file to flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// The dialer wants to receive the file (dialer = Receiver, peer = Sender).
    Get,
    /// The dialer wants to send the file (dialer = Sender, peer = Receiver).
    Put,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Put => "PUT",
        }
    }
}

impl std::str::FromStr for Verb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Verb::Get),
            "PUT" => Ok(Verb::Put),
            other => Err(Error::UnknownVerb(other.to_string())),
        }
    }
}
