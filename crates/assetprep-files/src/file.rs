//! A single asset plus its lazily computed metadata.
//!
//! # Design
//! - [`File`] is a cheap handle; cloning it shares the same underlying entry.
//!   [`File::duplicate`] produces an independent, already-ready copy.
//! - Missing metadata is computed once, in a job on the context's [`JobQueue`],
//!   and published through the file's [`Readiness`].
//! - `Content-Type` in the headers always mirrors the MIME type.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use assetprep_jobs::{JobHandle, JobQueue};
use serde::{Serialize, Serializer};
use tracing::{debug, error, warn};

use crate::error::{FileError, FileResult};
use crate::mime::{self, FALLBACK_MIME};
use crate::probe::{FsProbe, MetadataProbe};
use crate::readiness::Readiness;

/// Header that mirrors a file's MIME type.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Plain attribute values of a [`File`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileAttributes {
    /// Source on the local filesystem; absent for derived files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    /// Logical destination path, `/` separated.
    pub path: String,
    /// Size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Content type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    /// Lowercase hex MD5 digest of the content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    /// HTTP-style headers derived from the metadata.
    pub headers: BTreeMap<String, String>,
    /// Content encoding hint for derived files (`gzip`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Content type of the content before encoding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_mime: Option<String>,
    /// In-memory content for derived files.
    #[serde(skip)]
    pub content: Option<Arc<[u8]>>,
}

impl FileAttributes {
    /// Attributes for a logical path with nothing else known.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set the local source path.
    #[must_use]
    pub fn with_local_path(mut self, local_path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(local_path.into());
        self
    }

    /// Supply the size up front.
    #[must_use]
    pub const fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Supply the MIME type up front.
    #[must_use]
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Supply the MD5 digest up front.
    #[must_use]
    pub fn with_md5(mut self, md5: impl Into<String>) -> Self {
        self.md5 = Some(md5.into());
        self
    }

    /// Add a header. `Content-Type` always follows the MIME type: it is
    /// overwritten when one is known and dropped when none is.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    fn missing_metadata(&self) -> Option<MissingMetadata> {
        self.local_path.as_ref()?;
        let missing = MissingMetadata {
            size: self.size.is_none(),
            md5: self.md5.is_none(),
            mime: self.mime.is_none(),
        };
        (missing.size || missing.md5 || missing.mime).then_some(missing)
    }

    fn sync_content_type(&mut self) {
        match &self.mime {
            Some(mime) => {
                self.headers.insert(CONTENT_TYPE.to_string(), mime.clone());
            }
            None => {
                self.headers.remove(CONTENT_TYPE);
            }
        }
    }
}

/// Capabilities a [`File`] uses for background metadata work.
#[derive(Clone)]
pub struct FileContext {
    queue: JobQueue,
    probe: Arc<dyn MetadataProbe>,
}

impl FileContext {
    /// Build a context from a queue and a probe.
    #[must_use]
    pub fn new(queue: JobQueue, probe: Arc<dyn MetadataProbe>) -> Self {
        Self { queue, probe }
    }

    /// Build a context that probes the local filesystem.
    #[must_use]
    pub fn with_fs_probe(queue: JobQueue) -> Self {
        Self::new(queue, Arc::new(FsProbe))
    }

    /// Queue that runs metadata and compression jobs.
    #[must_use]
    pub const fn queue(&self) -> &JobQueue {
        &self.queue
    }

    /// Probe that reads metadata from the filesystem.
    #[must_use]
    pub fn probe(&self) -> &dyn MetadataProbe {
        self.probe.as_ref()
    }
}

impl fmt::Debug for FileContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FileContext")
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy)]
struct MissingMetadata {
    size: bool,
    md5: bool,
    mime: bool,
}

#[derive(Debug, Default)]
struct ProbedMetadata {
    size: Option<u64>,
    md5: Option<String>,
    mime: Option<String>,
}

struct FileInner {
    attributes: Mutex<FileAttributes>,
    readiness: Readiness,
}

/// Handle to a single asset and its readiness signal.
#[derive(Clone)]
pub struct File {
    inner: Arc<FileInner>,
}

impl File {
    /// Construct a file, scheduling background work for any missing metadata.
    ///
    /// Work is scheduled only when `local_path` is set and at least one of
    /// size, MD5, or MIME type was not supplied. Otherwise the file is ready
    /// immediately.
    ///
    /// # Panics
    ///
    /// Panics when background work is needed and no Tokio runtime is running.
    #[must_use]
    pub fn new(context: &FileContext, attributes: FileAttributes) -> Self {
        match attributes.missing_metadata() {
            Some(missing) => {
                let file = Self::from_parts(attributes, Readiness::pending());
                file.schedule_metadata(context, missing);
                file
            }
            None => Self::resolved(attributes),
        }
    }

    /// Construct a file that is ready immediately, with no background work.
    #[must_use]
    pub fn resolved(attributes: FileAttributes) -> Self {
        Self::from_parts(attributes, Readiness::resolved())
    }

    fn from_parts(mut attributes: FileAttributes, readiness: Readiness) -> Self {
        attributes.sync_content_type();
        Self {
            inner: Arc::new(FileInner {
                attributes: Mutex::new(attributes),
                readiness,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FileAttributes> {
        match self.inner.attributes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("file attributes mutex poisoned; continuing with recovered guard");
                poisoned.into_inner()
            }
        }
    }

    fn schedule_metadata(&self, context: &FileContext, missing: MissingMetadata) {
        let (local_path, path) = {
            let attributes = self.lock();
            (attributes.local_path.clone(), attributes.path.clone())
        };
        let Some(local_path) = local_path else {
            self.inner.readiness.resolve();
            return;
        };

        let probe = Arc::clone(&context.probe);
        let handle: JobHandle<ProbedMetadata, FileError> = context
            .queue
            .push(move || async move { probe_missing(probe.as_ref(), &local_path, missing).await });
        debug!(path = %path, job_id = handle.id(), "file metadata scheduled");

        let file = self.clone();
        tokio::spawn(async move {
            match handle.await {
                Ok(probed) => {
                    file.apply_probed(probed);
                    file.inner.readiness.resolve();
                    debug!(path = %path, "file metadata ready");
                }
                Err(outcome) => {
                    let err = FileError::from_job("file.metadata", path.as_str(), outcome);
                    warn!(path = %path, error = %err, "file metadata failed");
                    file.inner.readiness.fail(err);
                }
            }
        });
    }

    fn apply_probed(&self, probed: ProbedMetadata) {
        {
            let mut attributes = self.lock();
            if let Some(size) = probed.size {
                attributes.size = Some(size);
            }
            if let Some(md5) = probed.md5 {
                attributes.md5 = Some(md5);
            }
        }
        if let Some(candidate) = probed.mime {
            self.set_mime(&candidate);
        }
    }

    /// Set the MIME type without downgrading a concrete one.
    ///
    /// A concrete candidate always replaces the current value. The generic
    /// fallback never replaces a concrete value; when there is none, a type
    /// guessed from the path is used instead. `Content-Type` is synchronized
    /// with the result.
    pub fn set_mime(&self, candidate: &str) {
        let mut attributes = self.lock();
        let current_is_concrete = attributes.mime.as_deref().is_some_and(mime::is_concrete);
        if mime::is_concrete(candidate) {
            attributes.mime = Some(candidate.to_string());
        } else if !current_is_concrete {
            attributes.mime = Some(guess_for(&attributes).to_string());
        }
        attributes.sync_content_type();
    }

    /// Wait for background metadata work, then return this handle.
    ///
    /// # Errors
    ///
    /// Returns the failure recorded by the background work. Every waiter
    /// observes the same failure.
    pub async fn ready(&self) -> FileResult<Self> {
        self.inner.readiness.wait().await?;
        Ok(self.clone())
    }

    /// The file's readiness signal.
    #[must_use]
    pub fn readiness(&self) -> &Readiness {
        &self.inner.readiness
    }

    /// Independent copy carrying the same attribute values, ready immediately.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self::resolved(self.attributes())
    }

    /// Whether both handles refer to the same file.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Snapshot of all attribute values.
    #[must_use]
    pub fn attributes(&self) -> FileAttributes {
        self.lock().clone()
    }

    /// Logical destination path.
    #[must_use]
    pub fn path(&self) -> String {
        self.lock().path.clone()
    }

    /// Local source path, if any.
    #[must_use]
    pub fn local_path(&self) -> Option<PathBuf> {
        self.lock().local_path.clone()
    }

    /// Size in bytes, once known.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        self.lock().size
    }

    /// MIME type, once known.
    #[must_use]
    pub fn mime(&self) -> Option<String> {
        self.lock().mime.clone()
    }

    /// MD5 digest, once known.
    #[must_use]
    pub fn md5(&self) -> Option<String> {
        self.lock().md5.clone()
    }

    /// Headers, including `Content-Type` once the MIME type is known.
    #[must_use]
    pub fn headers(&self) -> BTreeMap<String, String> {
        self.lock().headers.clone()
    }

    /// Content encoding hint for derived files.
    #[must_use]
    pub fn encoding(&self) -> Option<String> {
        self.lock().encoding.clone()
    }

    /// In-memory content for derived files.
    #[must_use]
    pub fn content(&self) -> Option<Arc<[u8]>> {
        self.lock().content.clone()
    }
}

fn guess_for(attributes: &FileAttributes) -> &'static str {
    if !attributes.path.is_empty() {
        return mime::guess_from_path(&attributes.path);
    }
    attributes
        .local_path
        .as_deref()
        .map_or(FALLBACK_MIME, |local| {
            mime::guess_from_path(&local.to_string_lossy())
        })
}

async fn probe_missing(
    probe: &dyn MetadataProbe,
    local_path: &Path,
    missing: MissingMetadata,
) -> FileResult<ProbedMetadata> {
    let mut probed = ProbedMetadata::default();
    if missing.size {
        probed.size = Some(probe.size(local_path).await?);
    }
    if missing.md5 {
        probed.md5 = Some(probe.md5(local_path).await?);
    }
    if missing.mime {
        let sniffed = probe
            .sniff_mime(local_path)
            .await?
            .filter(|candidate| mime::is_concrete(candidate));
        probed.mime = Some(sniffed.unwrap_or_else(|| {
            mime::guess_from_path(&local_path.to_string_lossy()).to_string()
        }));
    }
    Ok(probed)
}

impl fmt::Debug for File {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("File")
            .field("path", &self.path())
            .field("readiness", &self.inner.readiness)
            .finish_non_exhaustive()
    }
}

impl Serialize for File {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.attributes().serialize(serializer)
    }
}
