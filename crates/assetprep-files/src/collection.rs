//! Ordered file sets, strategies, and directory discovery.
//!
//! # Design
//! - A collection owns its members and is never mutated by a strategy; every
//!   strategy returns a new, ready collection.
//! - Readiness is all-or-nothing: the first member failure fails the whole
//!   collection.
//! - Multiple strategies are applied to the original members independently
//!   and their results unioned, then stably sorted by path.

use std::io;
use std::path::{Path, PathBuf};

use futures_util::future::try_join_all;
use futures_util::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::{FileError, FileResult};
use crate::file::{File, FileAttributes, FileContext};
use crate::gzip;
use crate::strategy::{Strategy, StrategySelector};

/// Default bound on concurrent stat operations during discovery.
pub const DEFAULT_STAT_CONCURRENCY: usize = 100;

/// Suffix appended by the gzip-suffix strategy.
pub const GZIP_SUFFIX: &str = ".gz";

/// Knobs for [`FileCollection::from_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Maximum stat operations in flight at once.
    pub stat_concurrency: usize,
    /// Whether entries whose name starts with `.` are discovered.
    pub include_hidden: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            stat_concurrency: DEFAULT_STAT_CONCURRENCY,
            include_hidden: false,
        }
    }
}

/// Ordered set of files keyed by logical path.
#[derive(Debug, Clone)]
pub struct FileCollection {
    context: FileContext,
    files: Vec<File>,
}

impl FileCollection {
    /// Wrap existing files. Order is preserved.
    #[must_use]
    pub const fn new(context: FileContext, files: Vec<File>) -> Self {
        Self { context, files }
    }

    /// An empty collection.
    #[must_use]
    pub const fn empty(context: FileContext) -> Self {
        Self::new(context, Vec::new())
    }

    /// Members in order.
    #[must_use]
    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// Iterate over members in order.
    pub fn iter(&self) -> std::slice::Iter<'_, File> {
        self.files.iter()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the collection has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Member at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&File> {
        self.files.get(index)
    }

    /// Context shared with derived collections.
    #[must_use]
    pub const fn context(&self) -> &FileContext {
        &self.context
    }

    /// Consume the collection, returning its members.
    #[must_use]
    pub fn into_files(self) -> Vec<File> {
        self.files
    }

    /// Wait until every member is ready.
    ///
    /// # Errors
    ///
    /// Fails with the first member failure observed. Other members' work is
    /// not cancelled.
    pub async fn ready(&self) -> FileResult<&Self> {
        try_join_all(self.files.iter().map(File::ready)).await?;
        Ok(self)
    }

    /// Position of the first member whose logical path equals `path`.
    #[must_use]
    pub fn index_of(&self, path: &str) -> Option<usize> {
        self.files.iter().position(|file| file.path() == path)
    }

    /// Position of `file` itself (identity, not path equality).
    #[must_use]
    pub fn position_of(&self, file: &File) -> Option<usize> {
        self.files.iter().position(|member| member.ptr_eq(file))
    }

    /// Independent copies of every member, in the same order.
    ///
    /// # Errors
    ///
    /// Fails when this collection is not ready.
    pub async fn apply_clone_strategy(&self) -> FileResult<Self> {
        self.ready().await?;
        let files = self.files.iter().map(File::duplicate).collect();
        Ok(self.derived(files))
    }

    /// Gzip-compressed derivatives of every member under unchanged paths.
    ///
    /// # Errors
    ///
    /// Fails when this collection is not ready or any compression fails.
    pub async fn apply_gzip_strategy(&self) -> FileResult<Self> {
        self.ready().await?;
        let files =
            try_join_all(self.files.iter().map(|file| gzip::derive(&self.context, file))).await?;
        Ok(self.derived(files))
    }

    /// Gzip derivatives with `.gz` appended to any path not already containing it.
    ///
    /// # Errors
    ///
    /// Fails when this collection is not ready or any compression fails.
    pub async fn apply_gzip_suffix_strategy(&self) -> FileResult<Self> {
        let compressed = self.apply_gzip_strategy().await?;
        let files = compressed
            .files
            .into_iter()
            .map(|file| {
                let attributes = file.attributes();
                if attributes.path.contains(GZIP_SUFFIX) {
                    return file;
                }
                let path = format!("{}{GZIP_SUFFIX}", attributes.path);
                File::resolved(FileAttributes { path, ..attributes })
            })
            .collect();
        Ok(self.derived(files))
    }

    /// Apply one or more strategies and union the results.
    ///
    /// Each strategy runs against this collection, not against the previous
    /// strategy's output. The union is stably sorted by path and returned
    /// once every member is ready.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::Validation`] for an empty selector or an unknown
    /// name before any work starts, otherwise the first strategy failure.
    pub async fn apply_strategy(
        &self,
        selector: impl Into<StrategySelector>,
    ) -> FileResult<Self> {
        let strategies = selector.into().resolve()?;
        debug!(
            strategies = ?strategies.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            members = self.len(),
            "applying strategies"
        );

        let lists = try_join_all(strategies.iter().map(|strategy| self.apply(*strategy))).await?;
        let mut files: Vec<File> = lists.into_iter().flat_map(Self::into_files).collect();
        files.sort_by_cached_key(File::path);

        let union = self.derived(files);
        union.ready().await?;
        Ok(union)
    }

    async fn apply(&self, strategy: Strategy) -> FileResult<Self> {
        match strategy {
            Strategy::Clone => self.apply_clone_strategy().await,
            Strategy::Gzip => self.apply_gzip_strategy().await,
            Strategy::GzipSuffix => self.apply_gzip_suffix_strategy().await,
        }
    }

    fn derived(&self, files: Vec<File>) -> Self {
        Self::new(self.context.clone(), files)
    }

    /// Discover every non-directory entry under `dir`.
    ///
    /// Each entry becomes a [`File`] with `local_path` set to its absolute
    /// location and `path` set to its `/`-separated path relative to `dir`. Entries
    /// are stat-ed with at most `options.stat_concurrency` operations in
    /// flight; the result is returned once every file is ready, sorted by
    /// path.
    ///
    /// # Errors
    ///
    /// Fails when `dir` is not a readable directory, when traversal or any
    /// stat fails, or when any file's metadata cannot be computed.
    pub async fn from_path(
        context: &FileContext,
        dir: impl AsRef<Path>,
        options: &DiscoveryOptions,
    ) -> FileResult<Self> {
        let root = std::path::absolute(dir.as_ref())
            .map_err(|source| FileError::io("discover.absolute", dir.as_ref(), source))?;
        let metadata = tokio::fs::metadata(&root)
            .await
            .map_err(|source| FileError::io("discover.root", &root, source))?;
        if !metadata.is_dir() {
            return Err(FileError::validation(
                "dir",
                "not a directory",
                Some(root.display().to_string()),
            ));
        }

        let include_hidden = options.include_hidden;
        let walk_root = root.clone();
        let entries = tokio::task::spawn_blocking(move || walk(&walk_root, include_hidden))
            .await
            .map_err(|join_err| {
                FileError::io("discover.walk", &root, io::Error::other(join_err))
            })??;
        info!(root = %root.display(), entries = entries.len(), "discovered files");

        let mut files: Vec<File> = stream::iter(entries)
            .map(|entry| stat_and_wait(context, entry))
            .buffer_unordered(options.stat_concurrency.max(1))
            .try_collect()
            .await?;
        files.sort_by_cached_key(File::path);
        Ok(Self::new(context.clone(), files))
    }
}

impl<'a> IntoIterator for &'a FileCollection {
    type Item = &'a File;
    type IntoIter = std::slice::Iter<'a, File>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

#[derive(Debug)]
struct Discovered {
    local_path: PathBuf,
    path: String,
}

async fn stat_and_wait(context: &FileContext, entry: Discovered) -> FileResult<File> {
    let size = context.probe().size(&entry.local_path).await?;
    let attributes = FileAttributes::new(entry.path)
        .with_local_path(entry.local_path)
        .with_size(size);
    File::new(context, attributes).ready().await
}

fn walk(root: &Path, include_hidden: bool) -> FileResult<Vec<Discovered>> {
    let mut entries = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| include_hidden || !is_hidden(entry));
    for entry in walker {
        let entry = entry.map_err(|source| FileError::walkdir("discover.walk", root, source))?;
        if entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir()) {
            continue;
        }
        let relative = entry.path().strip_prefix(root).map_err(|_| {
            FileError::validation(
                "local_path",
                "outside discovery root",
                Some(entry.path().display().to_string()),
            )
        })?;
        entries.push(Discovered {
            path: logical_path(relative),
            local_path: entry.into_path(),
        });
    }
    Ok(entries)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn logical_path(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_paths_use_forward_slashes() {
        let relative = Path::new("sub").join("deeper").join("b.txt");
        assert_eq!(logical_path(&relative), "sub/deeper/b.txt");
    }

    #[test]
    fn default_options_bound_stats_at_one_hundred() {
        let options = DiscoveryOptions::default();
        assert_eq!(options.stat_concurrency, 100);
        assert!(!options.include_hidden);
    }
}
