//! Session establishment: the key handshake and verb/filename exchange
//! that precedes every Sender/Receiver dispatch.
//!
//! Shared by both roles: the Listener performs [`server_handshake`], the
//! Dialer performs [`client_handshake`]. Both build on the same
//! newline-framing primitive the rest of the protocol uses.

use tokio::io::{AsyncRead, AsyncWrite};

use rft_core::framing::{read_line_i64, read_line_str, send_line, send_line_num};
use rft_core::{Error, Result, Verb};

/// What the client asked for, as observed by the server after handshake.
#[derive(Debug, Clone)]
pub struct HandshakeRequest {
    pub verb: Verb,
    pub filename: String,
    /// Present only for `PUT`, where the client is the data source and
    /// must advertise the total size up front.
    pub total_size: Option<i64>,
}

/// Server side of the handshake: read the key, authenticate, then read
/// verb + filename (+ total_size for PUT). Closes the caller's
/// responsibility on `Err(Error::AuthFailed)` — the `1\n` rejection line
/// has already been sent.
pub async fn server_handshake<R, W>(
    reader: &mut R,
    writer: &mut W,
    expected_key: &str,
) -> Result<HandshakeRequest>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let key = read_line_str(reader).await?;
    if key != expected_key {
        send_line_num(writer, 1).await?;
        return Err(Error::AuthFailed);
    }
    send_line_num(writer, 0).await?;

    let verb: Verb = read_line_str(reader).await?.parse()?;
    let filename = read_line_str(reader).await?;
    let total_size = match verb {
        Verb::Put => Some(read_line_i64(reader).await?),
        Verb::Get => None,
    };

    Ok(HandshakeRequest {
        verb,
        filename,
        total_size,
    })
}

/// Client side of the handshake: present the key, wait for acceptance,
/// then announce verb + filename (+ total_size for PUT).
pub async fn client_handshake<R, W>(
    reader: &mut R,
    writer: &mut W,
    key: &str,
    verb: Verb,
    filename: &str,
    total_size: Option<i64>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    send_line(writer, key).await?;
    let reply = read_line_str(reader).await?;
    if reply != "0" {
        return Err(Error::AuthFailed);
    }

    send_line(writer, verb.as_str()).await?;
    send_line(writer, filename).await?;
    if verb == Verb::Put {
        let total_size = total_size.expect("PUT requires a total_size");
        send_line_num(writer, total_size).await?;
    }

    Ok(())
}
