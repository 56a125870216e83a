//! Validated pairing of a file (or bare path) with transport intents.

use serde::Serialize;

use crate::error::{FileError, FileResult};
use crate::file::File;

/// What the transport should do with a path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Intents {
    /// Upload the file content.
    pub upload: bool,
    /// Update the remote headers.
    pub headers: bool,
    /// Delete the remote object.
    pub delete: bool,
}

/// A (file or path, intents) pairing handed to the transport.
#[derive(Debug, Clone, Serialize)]
pub struct Action {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<File>,
    do_upload: bool,
    do_headers: bool,
    do_delete: bool,
}

impl Action {
    /// Validate and build an action.
    ///
    /// The path is taken from `file` when one is given, otherwise from
    /// `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::Validation`] when a delete has no path, or when
    /// an upload or header update has no file.
    pub fn new(file: Option<File>, path: Option<&str>, intents: Intents) -> FileResult<Self> {
        let path = file
            .as_ref()
            .map(File::path)
            .filter(|path| !path.is_empty())
            .or_else(|| path.map(str::to_string))
            .unwrap_or_default();

        if intents.delete && path.is_empty() {
            return Err(FileError::validation(
                "path",
                "delete requires a path",
                None,
            ));
        }
        if file.is_none() {
            if intents.upload {
                return Err(FileError::validation(
                    "file",
                    "upload requires a file",
                    Some(path),
                ));
            }
            if intents.headers {
                return Err(FileError::validation(
                    "file",
                    "header update requires a file",
                    Some(path),
                ));
            }
        }

        Ok(Self {
            path,
            file,
            do_upload: intents.upload,
            do_headers: intents.headers,
            do_delete: intents.delete,
        })
    }

    /// Upload `file`.
    ///
    /// # Errors
    ///
    /// Never fails in practice; routed through [`Action::new`] for uniformity.
    pub fn upload(file: File) -> FileResult<Self> {
        Self::new(
            Some(file),
            None,
            Intents {
                upload: true,
                ..Intents::default()
            },
        )
    }

    /// Update the remote headers of `file`.
    ///
    /// # Errors
    ///
    /// Never fails in practice; routed through [`Action::new`] for uniformity.
    pub fn update_headers(file: File) -> FileResult<Self> {
        Self::new(
            Some(file),
            None,
            Intents {
                headers: true,
                ..Intents::default()
            },
        )
    }

    /// Delete the remote object at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::Validation`] when `path` is empty.
    pub fn delete(path: &str) -> FileResult<Self> {
        Self::new(
            None,
            Some(path),
            Intents {
                delete: true,
                ..Intents::default()
            },
        )
    }

    /// Logical path the action applies to.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Associated file, if any.
    #[must_use]
    pub const fn file(&self) -> Option<&File> {
        self.file.as_ref()
    }

    /// Requested intents.
    #[must_use]
    pub const fn intents(&self) -> Intents {
        Intents {
            upload: self.do_upload,
            headers: self.do_headers,
            delete: self.do_delete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileAttributes;

    fn sample() -> File {
        File::resolved(FileAttributes::new("css/site.css").with_mime("text/css"))
    }

    #[test]
    fn path_is_taken_from_file() -> anyhow::Result<()> {
        let action = Action::new(
            Some(sample()),
            Some("ignored.txt"),
            Intents {
                upload: true,
                headers: true,
                delete: false,
            },
        )?;
        assert_eq!(action.path(), "css/site.css");
        assert!(action.file().is_some());
        assert!(action.intents().upload && action.intents().headers);
        Ok(())
    }

    #[test]
    fn delete_needs_a_path() {
        assert!(Action::delete("").is_err_and(|err| err.is_validation()));
        assert!(
            Action::new(
                None,
                None,
                Intents {
                    delete: true,
                    ..Intents::default()
                }
            )
            .is_err()
        );
    }

    #[test]
    fn upload_and_headers_need_a_file() {
        for intents in [
            Intents {
                upload: true,
                ..Intents::default()
            },
            Intents {
                headers: true,
                ..Intents::default()
            },
        ] {
            let outcome = Action::new(None, Some("a.txt"), intents);
            assert!(matches!(
                outcome,
                Err(FileError::Validation { field: "file", .. })
            ));
        }
    }

    #[test]
    fn delete_only_and_empty_actions_are_valid() -> anyhow::Result<()> {
        let delete = Action::delete("old/page.html")?;
        assert_eq!(delete.path(), "old/page.html");
        assert!(delete.file().is_none());

        let noop = Action::new(None, None, Intents::default())?;
        assert_eq!(noop.path(), "");
        Ok(())
    }

    #[test]
    fn serializes_for_transport() -> anyhow::Result<()> {
        let value = serde_json::to_value(Action::upload(sample())?)?;
        assert_eq!(value["path"], "css/site.css");
        assert_eq!(value["do_upload"], true);
        assert_eq!(value["do_delete"], false);
        assert_eq!(value["file"]["mime"], "text/css");

        let delete = serde_json::to_value(Action::delete("gone.txt")?)?;
        assert!(delete.get("file").is_none());
        Ok(())
    }
}
