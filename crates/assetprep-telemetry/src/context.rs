//! Process-wide span carrying the running command.
//!
//! Every event emitted while the guard is alive is nested under a `run` span
//! with the command name, the build identifier, and (once known) the asset
//! root being processed.

use std::path::Path;

use tracing::field::{Empty, display};
use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Keeps the `run` span entered until dropped.
pub struct GlobalContextGuard {
    span: &'static Span,
    _entered: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the `run` span for `command`.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        let command = command.into();
        let span: &'static Span = Box::leak(Box::new(tracing::info_span!(
            "run",
            command = %command,
            build_sha = %build_sha(),
            root = Empty,
        )));
        Self {
            span,
            _entered: span.enter(),
        }
    }

    /// Record the asset root once the command has resolved it.
    pub fn record_root(&self, root: &Path) {
        self.span.record("root", display(root.display()));
    }

    /// The entered span.
    #[must_use]
    pub const fn span(&self) -> &'static Span {
        self.span
    }
}

impl std::fmt::Debug for GlobalContextGuard {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("GlobalContextGuard")
            .field("span", self.span)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_enters_run_span_and_records_root() {
        let guard = GlobalContextGuard::new("plan");
        guard.record_root(Path::new("/srv/site"));
        if let Some(metadata) = guard.span().metadata() {
            assert_eq!(metadata.name(), "run");
            assert!(metadata.fields().field("root").is_some());
        }
        drop(guard);
    }
}
