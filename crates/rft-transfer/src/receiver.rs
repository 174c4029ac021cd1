//! The copy-owning side of a transfer: drives the resume negotiation and
//! materializes the file locally.

use std::path::Path;

use tokio::io::{AsyncRead, AsyncWrite};

use rft_core::framing::{read_line_str, send_line, send_line_num};
use rft_core::{Error, Result};

use crate::endpoint::FileEndpoint;
use crate::interact::{OverwritePrompt, ProgressSink};
use crate::pipeline::{run_pipeline, ChunkOutcome};
use rft_checksum::HashLog;

/// Receive `path` from the peer reachable through `reader`/`writer`, with
/// resume support. `total_size` is what the peer already advertised before
/// this call (the Sender's size line, already read by the caller as part
/// of verb dispatch — see rft-net).
pub async fn get_file<R, W>(
    reader: &mut R,
    writer: &mut W,
    path: &Path,
    total_size: i64,
    hash_chunk_size: u64,
    transfer_chunk_size: u64,
    hash_log_enabled: bool,
    prompt: &mut dyn OverwritePrompt,
    progress: &mut dyn ProgressSink,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    // Only the `-1` sentinel means "source missing". A zero-byte source
    // is a valid, empty-file advertisement that proceeds to a clean
    // short-circuit below (see DESIGN.md for why this reads `< 0`).
    if total_size < 0 {
        return Err(Error::SourceMissing);
    }
    let total_size = total_size as u64;

    let exist_file_size = match FileEndpoint::probe_size(path).await? {
        None => 0,
        Some(local_size) => {
            if local_size > total_size && !prompt.confirm_overwrite()? {
                return Err(Error::OverwriteDeclined);
            }

            send_line(writer, "CHECK").await?;
            send_line_num(writer, local_size as i64).await?;

            let limit = local_size.min(total_size);
            let endpoint = FileEndpoint::open_read(path).await?;

            let log_path = HashLog::path_for(path);
            let existing_log = if hash_log_enabled {
                Some(HashLog::load(&log_path, hash_chunk_size)?)
            } else {
                None
            };
            let mut write_log = existing_log.clone();

            let mut reader_local = &mut *reader;
            let mut writer_local = &mut *writer;
            let (_endpoint, outcome) = run_pipeline(
                endpoint,
                limit,
                hash_chunk_size,
                existing_log,
                None,
                |chunk| {
                    progress.on_progress(chunk.cumulative_bytes, limit);
                    let reader = &mut *reader_local;
                    let writer = &mut *writer_local;
                    let log_path = &log_path;
                    let write_log = &mut write_log;
                    async move {
                        let local_digest = rft_checksum::to_hex(&chunk.digest);
                        send_line(writer, &local_digest).await?;
                        let reply = read_line_str(reader).await?;
                        if reply == "0" {
                            if hash_log_enabled && chunk.cumulative_bytes % hash_chunk_size == 0 {
                                if let Some(log) = write_log.as_mut() {
                                    log.append(log_path, chunk)?;
                                }
                            }
                            Ok(ChunkOutcome::Match)
                        } else {
                            Ok(ChunkOutcome::Mismatch)
                        }
                    }
                },
            )
            .await?;

            if !outcome.validated && !prompt.confirm_overwrite()? {
                return Err(Error::OverwriteDeclined);
            }

            outcome.validated_size
        }
    };

    send_line(writer, "START").await?;
    send_line_num(writer, exist_file_size as i64).await?;

    if exist_file_size == total_size {
        return Ok(());
    }

    let mut endpoint = FileEndpoint::open_read_write(path).await?;
    endpoint.seek(exist_file_size).await?;

    let mut received = 0u64;
    let remaining = total_size - exist_file_size;
    let mut buf = vec![0u8; transfer_chunk_size as usize];
    while received < remaining {
        let want = (remaining - received).min(transfer_chunk_size) as usize;
        let n = read_some(reader, &mut buf[..want]).await?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        endpoint.write_all(&buf[..n]).await?;
        received += n as u64;
        progress.on_progress(exist_file_size + received, total_size);
    }
    endpoint.flush().await?;

    Ok(())
}

async fn read_some<R: AsyncRead + Unpin>(r: &mut R, buf: &mut [u8]) -> Result<usize> {
    use tokio::io::AsyncReadExt;
    Ok(r.read(buf).await?)
}
