//! Newline-delimited control-line framing.
//!
//! Every control exchange in the protocol is one ASCII line terminated by
//! `\n` on the same TCP stream that later carries the raw tail bytes. There
//! is no length prefix: readers read one byte at a time until the
//! delimiter. This is the single primitive every handshake, resume
//! negotiation, and digest exchange step builds on.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Reads one line from `r`, stopping at (and consuming, but not returning)
/// `\n`. Returns `Error::UnexpectedEof` if the stream closes before any
/// `\n` is seen and at least one byte has not been read, matching the
/// "empty read = abort" rule for control lines.
pub async fn read_line<R: AsyncRead + Unpin>(r: &mut R) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let n = r.read(&mut byte).await?;
        if n == 0 {
            if line.is_empty() {
                return Err(Error::UnexpectedEof);
            }
            // A stream that closes mid-line is still an unexpected EOF —
            // the line was never terminated.
            return Err(Error::UnexpectedEof);
        }
        if byte[0] == b'\n' {
            return Ok(line);
        }
        line.push(byte[0]);
    }
}

/// Reads one line and decodes it as UTF-8.
pub async fn read_line_str<R: AsyncRead + Unpin>(r: &mut R) -> Result<String> {
    let bytes = read_line(r).await?;
    String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
}

/// Reads one line and parses it as a decimal integer (optionally signed,
/// to allow the sender's `-1` "file missing" sentinel).
pub async fn read_line_i64<R: AsyncRead + Unpin>(r: &mut R) -> Result<i64> {
    let s = read_line_str(r).await?;
    s.trim()
        .parse::<i64>()
        .map_err(|_| Error::NotANumber(s))
}

/// Writes `line` followed by `\n`. Asserts the line does not itself embed
/// a newline, which would desynchronize the peer's line reader.
pub async fn send_line<W: AsyncWrite + Unpin>(w: &mut W, line: impl AsRef<[u8]>) -> Result<()> {
    let line = line.as_ref();
    if line.contains(&b'\n') {
        return Err(Error::EmbeddedNewline);
    }
    w.write_all(line).await?;
    w.write_all(b"\n").await?;
    w.flush().await?;
    Ok(())
}

/// Convenience wrapper for numeric lines.
pub async fn send_line_num<W: AsyncWrite + Unpin>(w: &mut W, n: i64) -> Result<()> {
    send_line(w, n.to_string()).await
}
