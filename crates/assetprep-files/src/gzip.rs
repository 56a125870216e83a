//! Gzip derivation of files, run as jobs on the context's queue.

use std::io::{self, Write};
use std::sync::Arc;

use assetprep_jobs::JobHandle;
use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::debug;

use crate::error::{FileError, FileResult};
use crate::file::{CONTENT_TYPE, File, FileAttributes, FileContext};
use crate::mime::GZIP_MIME;
use crate::probe::md5_hex;

/// Encoding recorded on gzip-derived files.
pub const GZIP_ENCODING: &str = "gzip";

/// Produce a ready, gzip-compressed derivative of `source`.
///
/// The derivative keeps the source's logical path, holds the compressed
/// bytes in memory, and reports size and MD5 of the compressed bytes.
pub(crate) async fn derive(context: &FileContext, source: &File) -> FileResult<File> {
    let attributes = source.attributes();
    let path = attributes.path.clone();
    let handle: JobHandle<FileAttributes, FileError> = context
        .queue()
        .push(move || async move { compress(attributes).await });
    debug!(path = %path, job_id = handle.id(), "gzip scheduled");

    handle
        .await
        .map(File::resolved)
        .map_err(|outcome| FileError::from_job("strategy.gzip", path, outcome))
}

async fn compress(source: FileAttributes) -> FileResult<FileAttributes> {
    let raw: Arc<[u8]> = match (&source.content, &source.local_path) {
        (Some(content), _) => Arc::clone(content),
        (None, Some(local_path)) => tokio::fs::read(local_path)
            .await
            .map_err(|err| FileError::io("strategy.gzip.read", local_path, err))?
            .into(),
        (None, None) => Arc::from(Vec::new()),
    };

    let compressed = tokio::task::spawn_blocking(move || encode(&raw))
        .await
        .map_err(|join_err| FileError::compression(source.path.as_str(), io::Error::other(join_err)))?
        .map_err(|err| FileError::compression(source.path.as_str(), err))?;

    let mut headers = source.headers;
    headers.remove(CONTENT_TYPE);
    Ok(FileAttributes {
        local_path: None,
        path: source.path,
        size: Some(compressed.len() as u64),
        mime: Some(GZIP_MIME.to_string()),
        md5: Some(md5_hex(&compressed)),
        headers,
        encoding: Some(GZIP_ENCODING.to_string()),
        source_mime: source.mime,
        content: Some(compressed.into()),
    })
}

fn encode(raw: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(raw.len() / 2), Compression::default());
    encoder.write_all(raw)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use assetprep_jobs::{JobQueue, Worker};
    use flate2::read::GzDecoder;

    #[tokio::test]
    async fn derives_compressed_in_memory_file() -> anyhow::Result<()> {
        let queue = JobQueue::new();
        let _worker = Worker::spawn(&queue);
        let context = FileContext::with_fs_probe(queue);

        let mut attributes = FileAttributes::new("app.js")
            .with_mime("application/javascript")
            .with_header("Cache-Control", "max-age=60");
        attributes.content = Some(Arc::from(&b"console.log('hi')"[..]));
        let source = File::resolved(attributes);

        let derived = derive(&context, &source).await?;
        assert!(derived.local_path().is_none());
        assert_eq!(derived.path(), "app.js");
        assert_eq!(derived.mime().as_deref(), Some(GZIP_MIME));
        assert_eq!(derived.encoding().as_deref(), Some(GZIP_ENCODING));
        assert_eq!(
            derived.attributes().source_mime.as_deref(),
            Some("application/javascript")
        );
        let headers = derived.headers();
        assert_eq!(headers.get(CONTENT_TYPE).map(String::as_str), Some(GZIP_MIME));
        assert_eq!(headers.get("Cache-Control").map(String::as_str), Some("max-age=60"));

        let content = derived
            .content()
            .ok_or_else(|| anyhow::anyhow!("derived file has no content"))?;
        assert_eq!(derived.size(), Some(content.len() as u64));
        assert_eq!(derived.md5(), Some(md5_hex(&content)));

        let mut decoded = String::new();
        GzDecoder::new(&content[..]).read_to_string(&mut decoded)?;
        assert_eq!(decoded, "console.log('hi')");
        Ok(())
    }

    #[tokio::test]
    async fn missing_local_source_fails_with_io_context() -> anyhow::Result<()> {
        let queue = JobQueue::new();
        let _worker = Worker::spawn(&queue);
        let context = FileContext::with_fs_probe(queue);
        let temp = tempfile::Builder::new().prefix("assetprep-gzip-").tempdir()?;

        let source = File::resolved(
            FileAttributes::new("gone.txt")
                .with_local_path(temp.path().join("gone.txt"))
                .with_mime("text/plain")
                .with_md5("x")
                .with_size(1),
        );
        let err = derive(&context, &source)
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected gzip failure"))?;
        assert!(matches!(
            err,
            FileError::Io {
                operation: "strategy.gzip.read",
                ..
            }
        ));
        Ok(())
    }
}
