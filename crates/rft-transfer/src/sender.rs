//! The authoritative side of a transfer: owns the file on disk, answers
//! resume queries, and streams whatever tail the peer still needs.

use std::path::Path;

use tokio::io::{AsyncRead, AsyncWrite};

use rft_core::framing::{read_line_i64, read_line_str, send_line, send_line_num};
use rft_core::{Error, Result};

use crate::endpoint::FileEndpoint;
use crate::interact::{OverwritePrompt, ProgressSink};
use crate::pipeline::{run_pipeline, ChunkOutcome};
use rft_checksum::HashLog;

/// Send `path` to the peer reachable through `reader`/`writer`, with resume
/// support. Returns `Ok(())` whether or not any bytes end up transferred —
/// a missing source file, an operator-declined overwrite, and a full
/// transfer are all successful completions of this side's half of the
/// session; only a protocol or I/O fault is an `Err`.
pub async fn send_file<R, W>(
    reader: &mut R,
    writer: &mut W,
    path: &Path,
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
    let file_size = match FileEndpoint::probe_size(path).await? {
        None => {
            send_line_num(writer, -1).await?;
            return Ok(());
        }
        Some(size) => size,
    };
    send_line_num(writer, file_size as i64).await?;

    let mode = read_line_str(reader).await?;
    let exist_file_size = match mode.as_str() {
        "CHECK" => {
            let remote_exist_size = read_line_i64(reader).await?;
            if remote_exist_size < 0 {
                return Err(Error::NonPositiveSize);
            }
            let remote_exist_size = remote_exist_size as u64;
            let limit = remote_exist_size.min(file_size);

            let endpoint = FileEndpoint::open_read(path).await?;
            let (existing_log, log_sink) = if hash_log_enabled {
                let log_path = HashLog::path_for(path);
                let log = HashLog::load(&log_path, hash_chunk_size)?;
                (Some(log.clone()), Some((log_path, log)))
            } else {
                (None, None)
            };

            let mut reader_local = &mut *reader;
            let mut writer_local = &mut *writer;
            let (_endpoint, outcome) = run_pipeline(
                endpoint,
                limit,
                hash_chunk_size,
                existing_log,
                log_sink,
                |chunk| {
                    progress.on_progress(chunk.cumulative_bytes, limit);
                    let reader = &mut *reader_local;
                    let writer = &mut *writer_local;
                    async move {
                        let peer_digest = read_line_str(reader).await?;
                        let local_digest = rft_checksum::to_hex(&chunk.digest);
                        if peer_digest == local_digest {
                            send_line(writer, "0").await?;
                            Ok(ChunkOutcome::Match)
                        } else {
                            send_line(writer, "1").await?;
                            Ok(ChunkOutcome::Mismatch)
                        }
                    }
                },
            )
            .await?;

            if !outcome.validated && !prompt.confirm_overwrite()? {
                return Err(Error::OverwriteDeclined);
            }

            let next = read_line_str(reader).await?;
            if next != "START" {
                return Err(Error::ProtocolMismatch {
                    expected: "START".to_string(),
                    got: next,
                });
            }
            outcome.validated_size
        }
        "START" => 0,
        other => {
            return Err(Error::ProtocolMismatch {
                expected: "CHECK or START".to_string(),
                got: other.to_string(),
            })
        }
    };

    let remote_exist_size = read_line_i64(reader).await?;
    if remote_exist_size as u64 != exist_file_size {
        return Err(Error::SizeMismatch {
            remote: remote_exist_size as u64,
            ours: exist_file_size,
        });
    }

    if exist_file_size == file_size {
        return Ok(());
    }

    let mut endpoint = FileEndpoint::open_read(path).await?;
    endpoint.seek(exist_file_size).await?;

    let mut sent = 0u64;
    let remaining = file_size - exist_file_size;
    let mut buf = vec![0u8; transfer_chunk_size as usize];
    while sent < remaining {
        let want = (remaining - sent).min(transfer_chunk_size) as usize;
        let n = endpoint.read_chunk(&mut buf[..want]).await?;
        if n == 0 {
            break;
        }
        use tokio::io::AsyncWriteExt;
        writer.write_all(&buf[..n]).await?;
        sent += n as u64;
        progress.on_progress(exist_file_size + sent, file_size);
    }
    writer.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interact::{FixedAnswer, NullProgress};
    use crate::receiver::get_file;
    use rft_core::framing::read_line_i64;
    use tempfile::tempdir;
    use tokio::io::duplex;

    /// Wires a `Sender` and a `Receiver` together over an in-memory duplex
    /// pair, exactly the shape a real TCP connection has from each side's
    /// point of view, without a socket. `chunk` is used for both hash and
    /// transfer chunk size, matching the protocol invariant that both must
    /// agree between peers.
    async fn run_get(
        src_contents: &[u8],
        dst_preexisting: Option<&[u8]>,
        chunk: u64,
        overwrite_answer: bool,
    ) -> (Result<()>, Result<()>, Vec<u8>) {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.bin");
        tokio::fs::write(&src, src_contents).await.unwrap();
        let dst = dir.path().join("dst.bin");
        if let Some(existing) = dst_preexisting {
            tokio::fs::write(&dst, existing).await.unwrap();
        }

        let (client_side, server_side) = duplex(1 << 20);
        let (mut client_r, mut client_w) = tokio::io::split(client_side);
        let (mut server_r, mut server_w) = tokio::io::split(server_side);

        let sender = tokio::spawn(async move {
            send_file(
                &mut server_r,
                &mut server_w,
                &src,
                chunk,
                chunk,
                false,
                &mut FixedAnswer(overwrite_answer),
                &mut NullProgress,
            )
            .await
        });

        let receiver = tokio::spawn(async move {
            // Mirrors what `rft-net`'s dialer does for GET: the Sender's
            // size advertisement is the first line on the wire, read
            // before dispatching into `get_file`.
            let total = read_line_i64(&mut client_r).await?;
            get_file(
                &mut client_r,
                &mut client_w,
                &dst,
                total,
                chunk,
                chunk,
                false,
                &mut FixedAnswer(overwrite_answer),
                &mut NullProgress,
            )
            .await
        });

        let (sender_res, receiver_res) = join_with_timeout(sender, receiver).await;
        let contents = tokio::fs::read(&dst).await.unwrap_or_default();
        (sender_res, receiver_res, contents)
    }

    /// Joins both sides with a generous timeout so a protocol deadlock
    /// fails the test instead of hanging the test binary forever.
    pub(crate) async fn join_with_timeout(
        sender: tokio::task::JoinHandle<Result<()>>,
        receiver: tokio::task::JoinHandle<Result<()>>,
    ) -> (Result<()>, Result<()>) {
        let (sender_res, receiver_res) =
            tokio::time::timeout(std::time::Duration::from_secs(5), async {
                tokio::join!(sender, receiver)
            })
            .await
            .expect("sender/receiver did not complete within timeout");
        (sender_res.unwrap(), receiver_res.unwrap())
    }

    #[tokio::test]
    async fn fresh_get_no_partial_transfers_whole_file() {
        let data: Vec<u8> = (0u32..25).map(|i| i as u8).collect();
        let (sender_res, receiver_res, got) = run_get(&data, None, 10, true).await;
        sender_res.unwrap();
        receiver_res.unwrap();
        assert_eq!(got, data);
    }

    #[tokio::test]
    async fn zero_byte_file_short_circuits() {
        let (sender_res, receiver_res, got) = run_get(&[], None, 10, true).await;
        sender_res.unwrap();
        receiver_res.unwrap();
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn resume_with_matching_partial_only_sends_tail() {
        let data: Vec<u8> = (0u32..25).map(|i| i as u8).collect();
        // 17-byte partial: one full chunk (0..10) plus a short one (10..17),
        // both identical to the source.
        let partial = &data[..17];
        let (sender_res, receiver_res, got) = run_get(&data, Some(partial), 10, true).await;
        sender_res.unwrap();
        receiver_res.unwrap();
        assert_eq!(got, data);
    }

    #[tokio::test]
    async fn resume_with_mismatch_overwrites_from_validated_boundary() {
        let data: Vec<u8> = (0u32..25).map(|i| i as u8).collect();
        let mut partial = data[..17].to_vec();
        // Corrupt a byte inside the second chunk (offset 10..17); the
        // first chunk (0..10) still matches.
        partial[12] = partial[12].wrapping_add(1);

        let (sender_res, receiver_res, got) = run_get(&data, Some(&partial), 10, true).await;
        sender_res.unwrap();
        receiver_res.unwrap();
        // The mismatching chunk is re-sent and the final file is correct
        // regardless: validated_size stopped at the 10-byte boundary, and
        // the tail stream overwrites everything from there on.
        assert_eq!(got, data);
    }

    #[tokio::test]
    async fn resume_with_mismatch_declined_overwrite_aborts() {
        let data: Vec<u8> = (0u32..25).map(|i| i as u8).collect();
        let mut partial = data[..17].to_vec();
        partial[12] = partial[12].wrapping_add(1);

        let (sender_res, receiver_res, _got) = run_get(&data, Some(&partial), 10, false).await;
        assert!(sender_res.is_err());
        assert!(receiver_res.is_err());
    }

    #[tokio::test]
    async fn missing_source_file_is_reported_without_touching_local_copy() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("does-not-exist.bin");
        let dst = dir.path().join("dst.bin");

        let (client_side, server_side) = duplex(1 << 16);
        let (mut client_r, mut client_w) = tokio::io::split(client_side);
        let (mut server_r, mut server_w) = tokio::io::split(server_side);

        let sender = tokio::spawn(async move {
            send_file(
                &mut server_r,
                &mut server_w,
                &src,
                10,
                10,
                false,
                &mut FixedAnswer(true),
                &mut NullProgress,
            )
            .await
        });
        let receiver = tokio::spawn(async move {
            let total = read_line_i64(&mut client_r).await?;
            get_file(
                &mut client_r,
                &mut client_w,
                &dst,
                total,
                10,
                10,
                false,
                &mut FixedAnswer(true),
                &mut NullProgress,
            )
            .await
        });

        let (sender_res, receiver_res) = join_with_timeout(sender, receiver).await;
        sender_res.unwrap();
        assert!(matches!(receiver_res, Err(Error::SourceMissing)));
        assert!(!dst.exists());
    }
}
