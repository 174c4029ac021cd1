//! The local file a transfer reads from or writes to.

use std::path::{Path, PathBuf};

use rft_core::{Error, Result};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt, SeekFrom};

/// The local file side of a session: a path plus whatever handle is
/// currently open on it. Opened once verb dispatch has decided which role
/// this side plays, closed when the transfer completes or errors.
pub struct FileEndpoint {
    path: PathBuf,
    file: File,
}

impl FileEndpoint {
    /// Size of the file at `path`, or `None` if it does not exist.
    pub async fn probe_size(path: &Path) -> Result<Option<u64>> {
        match tokio::fs::metadata(path).await {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Open an existing file read-only. Used by the Sender, which never
    /// writes to its authoritative copy.
    pub async fn open_read(path: &Path) -> Result<Self> {
        let file = File::open(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Open (creating if necessary) a file for read+write. Used by the
    /// Receiver, which both hashes an existing partial and appends the
    /// tail to the same handle.
    pub async fn open_read_write(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .await?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn seek(&mut self, offset: u64) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset)).await?;
        Ok(())
    }

    /// Read up to `buf.len()` bytes, returning the number actually read
    /// (0 at EOF).
    pub async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.file.read(buf).await?)
    }

    pub async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.file.write_all(buf).await?;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.file.flush().await?;
        Ok(())
    }
}
