//! The long-lived TCP acceptor. One connection at a time, serially: each
//! session runs to completion before the next is accepted, so the hash
//! log and file handles are never shared across sessions for the same
//! path.

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::net::{TcpListener, TcpStream};

use rft_core::{Config, Error, Result, Verb};
use rft_transfer::interact::{FixedAnswer, NullProgress, OverwritePrompt, ProgressSink, StdinPrompt};
use rft_transfer::{get_file, send_file};

use crate::session::server_handshake;

/// A TCP acceptor bound to one address, authenticating every connection
/// against a single pre-shared key.
pub struct Listener {
    inner: TcpListener,
    key: String,
}

impl Listener {
    pub async fn bind(addr: SocketAddr, key: impl Into<String>) -> Result<Self> {
        let inner = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "listening");
        Ok(Self {
            inner,
            key: key.into(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.inner.local_addr()?)
    }

    /// Accept and fully service connections forever, one at a time.
    /// Per-session errors are logged and do not stop the listener; a
    /// failure to accept at all is fatal.
    pub async fn run(&self, config: &Config) -> Result<()> {
        loop {
            let (stream, peer_addr) = self.inner.accept().await?;
            tracing::debug!(%peer_addr, "accepted connection");

            if let Err(e) = self.serve(stream, peer_addr, config).await {
                tracing::warn!(%peer_addr, error = %e, "session ended with error");
            }
        }
    }

    /// Handshake and dispatch exactly one accepted connection.
    async fn serve(&self, stream: TcpStream, peer_addr: SocketAddr, config: &Config) -> Result<()> {
        let (read_half, write_half) = tokio::io::split(stream);
        let mut reader = read_half;
        let mut writer = write_half;

        let request = match server_handshake(&mut reader, &mut writer, &self.key).await {
            Ok(request) => request,
            Err(Error::AuthFailed) => {
                tracing::warn!(%peer_addr, "rejected: bad key");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        tracing::info!(%peer_addr, verb = request.verb.as_str(), filename = %request.filename, "dispatching");

        let path = PathBuf::from(&request.filename);
        let mut prompt = StdinPrompt;
        let mut progress = NullProgress;

        match request.verb {
            // Client GET: we hold the file, we are the Sender.
            Verb::Get => {
                send_file(
                    &mut reader,
                    &mut writer,
                    &path,
                    config.hash_chunk_size,
                    config.transfer_chunk_size,
                    config.hash_log_enabled,
                    &mut prompt,
                    &mut progress,
                )
                .await
            }
            // Client PUT: client holds the file, we are the Receiver.
            Verb::Put => {
                let total_size = request.total_size.unwrap_or(-1);
                get_file(
                    &mut reader,
                    &mut writer,
                    &path,
                    total_size,
                    config.hash_chunk_size,
                    config.transfer_chunk_size,
                    config.hash_log_enabled,
                    &mut prompt,
                    &mut progress,
                )
                .await
            }
        }?;

        tracing::info!(%peer_addr, "session completed");
        Ok(())
    }
}

/// Non-interactive variant used by tests: same dispatch, but overwrite
/// prompts are answered with a fixed `y`/`n` instead of blocking on stdin.
#[doc(hidden)]
pub async fn serve_once_for_test(
    stream: TcpStream,
    key: &str,
    config: &Config,
    overwrite_answer: bool,
) -> Result<()> {
    let (read_half, write_half) = tokio::io::split(stream);
    let mut reader = read_half;
    let mut writer = write_half;

    let request = server_handshake(&mut reader, &mut writer, key).await?;
    let path = PathBuf::from(&request.filename);
    let mut prompt = FixedAnswer(overwrite_answer);
    let mut progress: Box<dyn ProgressSink> = Box::new(NullProgress);

    match request.verb {
        Verb::Get => {
            send_file(
                &mut reader,
                &mut writer,
                &path,
                config.hash_chunk_size,
                config.transfer_chunk_size,
                config.hash_log_enabled,
                &mut prompt,
                progress.as_mut(),
            )
            .await
        }
        Verb::Put => {
            let total_size = request.total_size.unwrap_or(-1);
            get_file(
                &mut reader,
                &mut writer,
                &path,
                total_size,
                config.hash_chunk_size,
                config.transfer_chunk_size,
                config.hash_log_enabled,
                &mut prompt,
                progress.as_mut(),
            )
            .await
        }
    }
}
