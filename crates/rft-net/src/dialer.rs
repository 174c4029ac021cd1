//! The one-shot client side: connect, present the key, issue GET or PUT,
//! then act as Receiver or Sender respectively.

use std::net::SocketAddr;
use std::path::Path;

use tokio::net::TcpStream;

use rft_core::{Config, Result, Verb};
use rft_transfer::interact::{OverwritePrompt, ProgressSink};
use rft_transfer::{get_file, send_file, FileEndpoint};

use crate::session::client_handshake;

/// Connect to `addr` and run one GET or PUT against `path`.
///
/// For `PUT`, `path` must already exist locally — its size is read and
/// sent as `total_size` during the handshake before the dialer acts as
/// Sender.
pub async fn dial(
    addr: SocketAddr,
    key: &str,
    verb: Verb,
    filename: &str,
    path: &Path,
    config: &Config,
    prompt: &mut dyn OverwritePrompt,
    progress: &mut dyn ProgressSink,
) -> Result<()> {
    let stream = TcpStream::connect(addr).await?;
    tracing::debug!(%addr, verb = verb.as_str(), "connected");

    let total_size = match verb {
        Verb::Put => Some(FileEndpoint::probe_size(path).await?.map(|s| s as i64).unwrap_or(-1)),
        Verb::Get => None,
    };

    let (read_half, write_half) = tokio::io::split(stream);
    let mut reader = read_half;
    let mut writer = write_half;

    client_handshake(&mut reader, &mut writer, key, verb, filename, total_size).await?;
    tracing::info!(%addr, verb = verb.as_str(), filename, "handshake complete");

    match verb {
        // We asked to GET: the peer is Sender, we are Receiver.
        Verb::Get => {
            let peer_size = rft_core::framing::read_line_i64(&mut reader).await?;
            get_file(
                &mut reader,
                &mut writer,
                path,
                peer_size,
                config.hash_chunk_size,
                config.transfer_chunk_size,
                config.hash_log_enabled,
                prompt,
                progress,
            )
            .await
        }
        // We asked to PUT: we are Sender, the peer is Receiver.
        Verb::Put => {
            send_file(
                &mut reader,
                &mut writer,
                path,
                config.hash_chunk_size,
                config.transfer_chunk_size,
                config.hash_log_enabled,
                prompt,
                progress,
            )
            .await
        }
    }
}
