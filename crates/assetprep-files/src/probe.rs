//! Filesystem capability used to compute file metadata.
//!
//! The probe is injected into [`crate::FileContext`] rather than reached through
//! process-wide state, so tests can substitute a counting or failing probe.

use std::path::Path;

use async_trait::async_trait;
use md5::{Digest, Md5};
use tokio::io::AsyncReadExt;

use crate::error::{FileError, FileResult};
use crate::mime::SNIFF_LEN;

const READ_CHUNK: usize = 64 * 1024;

/// Computes size, digest, and content type for a local file.
#[async_trait]
pub trait MetadataProbe: Send + Sync {
    /// Size in bytes as reported by the filesystem.
    async fn size(&self, path: &Path) -> FileResult<u64>;

    /// Lowercase hex MD5 digest of the file content.
    async fn md5(&self, path: &Path) -> FileResult<String>;

    /// Content type identified from the leading bytes, if any signature matches.
    async fn sniff_mime(&self, path: &Path) -> FileResult<Option<String>>;
}

/// [`MetadataProbe`] backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsProbe;

#[async_trait]
impl MetadataProbe for FsProbe {
    async fn size(&self, path: &Path) -> FileResult<u64> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|source| FileError::io("probe.stat", path, source))?;
        Ok(metadata.len())
    }

    async fn md5(&self, path: &Path) -> FileResult<String> {
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|source| FileError::io("probe.md5.open", path, source))?;
        let mut hasher = Md5::new();
        let mut buffer = vec![0_u8; READ_CHUNK];
        loop {
            let read = file
                .read(&mut buffer)
                .await
                .map_err(|source| FileError::io("probe.md5.read", path, source))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        Ok(hex::encode(hasher.finalize()))
    }

    async fn sniff_mime(&self, path: &Path) -> FileResult<Option<String>> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|source| FileError::io("probe.sniff.open", path, source))?;
        let mut head = Vec::with_capacity(SNIFF_LEN);
        file.take(SNIFF_LEN as u64)
            .read_to_end(&mut head)
            .await
            .map_err(|source| FileError::io("probe.sniff.read", path, source))?;
        Ok(crate::mime::sniff(&head).map(str::to_string))
    }
}

/// Lowercase hex MD5 digest of an in-memory buffer.
#[must_use]
pub fn md5_hex(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}
