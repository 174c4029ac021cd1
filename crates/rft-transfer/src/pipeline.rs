//! The Hash Pipeline: a producer task that reads and hashes a file prefix,
//! and a consumer task that exchanges one digest per chunk with the peer,
//! overlapping local disk I/O with network round-trips while preserving
//! strict ordering between the two.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use rft_checksum::{HashChunk, HashLog, Hasher};
use rft_core::{Error, Result};

use crate::endpoint::FileEndpoint;
use crate::resume::ResumeState;
use std::path::PathBuf;

/// Bounded channel capacity between producer and consumer. The reference
/// project's chunk manager uses 100 for a daemon fanning out across many
/// concurrent sessions; a single in-progress transfer only ever needs
/// enough slots to keep the pipeline from stalling on a slow peer, so this
/// is scaled down accordingly.
const PIPELINE_CHANNEL_CAPACITY: usize = 16;

/// Result of exchanging one chunk's digest with the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    Match,
    Mismatch,
}

/// What the pipeline determined once it finished (or was cancelled).
#[derive(Debug, Clone, Copy)]
pub struct PipelineOutcome {
    pub validated_size: u64,
    pub validated: bool,
}

/// Reads `endpoint` from `start_offset` in `hash_chunk_size` slices, up to
/// `limit` total bytes, sending one `HashChunk` per slice on `tx`, followed
/// by a sentinel, then returns the endpoint to its caller.
///
/// `start_offset` is always either 0 or a hash log boundary. When it is
/// nonzero, the bytes below it are never read back off disk at all — the
/// cursor seeks straight past them and hashing starts fresh from there, the
/// same trick the prefix-hash log exists for (see `rft-checksum/src/log.rs`
/// and SPEC_FULL.md's hash log section). The digest a chunk carries past
/// `start_offset` is therefore the running MD5 of the *unread* suffix, not
/// of the whole file from byte 0; `run_pipeline` accounts for the skipped
/// prefix separately so `validated_size` still comes out right, and two
/// peers that agree on where their logs end keep comparing apples to
/// apples, since both compute the suffix digest the same way.
///
/// `log_sink`, when present, is written to as soon as a chunk boundary is
/// hashed — the Sender side of the protocol records a chunk once it has
/// locally finished hashing it, with no dependency on the peer's ack
/// (unlike the Receiver, which only logs after confirmation; see
/// `run_consumer`'s caller in `receiver.rs`).
async fn run_producer(
    mut endpoint: FileEndpoint,
    start_offset: u64,
    limit: u64,
    hash_chunk_size: u64,
    tx: mpsc::Sender<HashChunk>,
    cancel: Arc<AtomicBool>,
    mut log_sink: Option<(PathBuf, HashLog)>,
) -> Result<FileEndpoint> {
    let mut hasher = Hasher::new();
    let mut cumulative = start_offset;
    let mut buf = vec![0u8; hash_chunk_size as usize];

    endpoint.seek(start_offset).await?;

    while cumulative < limit {
        if cancel.load(Ordering::SeqCst) {
            break;
        }
        let want = (limit - cumulative).min(hash_chunk_size) as usize;
        let n = endpoint.read_chunk(&mut buf[..want]).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        cumulative += n as u64;

        let digest = hasher.finalize_clone();
        let chunk = HashChunk::new(cumulative, digest);

        if cumulative % hash_chunk_size == 0 {
            if let Some((path, log)) = log_sink.as_mut() {
                log.append(path, chunk)?;
            }
        }

        if tx.send(chunk).await.is_err() {
            break;
        }
    }

    let _ = tx.send(HashChunk::sentinel()).await;
    Ok(endpoint)
}

/// Dequeues `HashChunk`s in order — every one of them already past
/// `initial_validated`, see `run_pipeline` — and exchanges each with the
/// peer via `exchange`. Stops at the sentinel or the first mismatch,
/// setting `cancel` so the producer stops early too.
async fn run_consumer<F, Fut>(
    mut rx: mpsc::Receiver<HashChunk>,
    initial_validated: u64,
    cancel: Arc<AtomicBool>,
    mut exchange: F,
) -> Result<PipelineOutcome>
where
    F: FnMut(HashChunk) -> Fut,
    Fut: Future<Output = Result<ChunkOutcome>>,
{
    let mut state = ResumeState::new(u64::MAX);
    state.advance_hashed(initial_validated);
    state.confirm_match(initial_validated);

    while let Some(chunk) = rx.recv().await {
        if chunk.is_sentinel() {
            break;
        }

        let outcome = exchange(chunk).await?;

        match outcome {
            ChunkOutcome::Match => {
                let delta = chunk.cumulative_bytes - state.validated_size();
                state.advance_hashed(delta);
                state.confirm_match(delta);
            }
            ChunkOutcome::Mismatch => {
                state.confirm_mismatch();
                cancel.store(true, Ordering::SeqCst);
                break;
            }
        }
    }

    Ok(PipelineOutcome {
        validated_size: state.validated_size(),
        validated: state.validated(),
    })
}

/// Runs the full pipeline: spawns the producer, drives the consumer on the
/// current task, and joins both. Returns the file endpoint (so the caller
/// can resume streaming or writing from wherever the producer left the
/// cursor) alongside the validation outcome.
///
/// `hash_log`, when present, seeds both sides of the split: the producer
/// seeks straight past `hash_log.validated_bytes()` instead of hashing it
/// again from disk, and the consumer credits that same span to
/// `validated_size` up front, without ever exchanging it with the peer —
/// the log only ever records digests a peer previously confirmed.
/// `producer_log_sink`, when the caller is the Sender, is the same log
/// written to as the producer hashes past that point (see `run_producer`);
/// the Receiver instead logs from inside its own `exchange` closure, after
/// each ack, and passes `None` here.
pub async fn run_pipeline<F, Fut>(
    endpoint: FileEndpoint,
    limit: u64,
    hash_chunk_size: u64,
    hash_log: Option<HashLog>,
    producer_log_sink: Option<(PathBuf, HashLog)>,
    exchange: F,
) -> Result<(FileEndpoint, PipelineOutcome)>
where
    F: FnMut(HashChunk) -> Fut,
    Fut: Future<Output = Result<ChunkOutcome>>,
{
    let start_offset = hash_log
        .as_ref()
        .map(|log| log.validated_bytes())
        .unwrap_or(0)
        .min(limit);

    let cancel = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel(PIPELINE_CHANNEL_CAPACITY);

    let producer_cancel = cancel.clone();
    let producer = tokio::spawn(run_producer(
        endpoint,
        start_offset,
        limit,
        hash_chunk_size,
        tx,
        producer_cancel,
        producer_log_sink,
    ));

    let outcome = run_consumer(rx, start_offset, cancel, exchange).await?;
    let endpoint = producer
        .await
        .map_err(|_| Error::ConnectionClosed)??;

    Ok((endpoint, outcome))
}
