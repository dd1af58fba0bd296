//! Scoped, failure-atomic document writes.
//!
//! A format pass never mutates text directly. It opens a [`Transaction`] on
//! the caller's [`Document`], stages the corrected text and commits. A
//! transaction that is dropped without committing discards what it staged,
//! so an error or panic between staging and commit leaves the document
//! untouched.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Errors raised while writing a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Reading the backing file failed.
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing the backing file failed.
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Commit was requested with nothing staged.
    #[error("Nothing staged to commit")]
    NothingStaged,
}

/// A text buffer that supports staged replacement.
pub trait Document {
    /// Current, committed text.
    fn text(&self) -> &str;

    /// Stages replacement text without making it visible.
    fn stage_text(&mut self, text: String);

    /// Makes the staged text visible. Either everything is applied or
    /// nothing is.
    fn commit_staged(&mut self) -> Result<(), DocumentError>;

    /// Drops the staged text.
    fn discard_staged(&mut self);
}

/// Write transaction on a document.
///
/// Dropping the transaction without calling [`commit`](Self::commit)
/// discards the staged text.
pub struct Transaction<'a, D: Document + ?Sized> {
    document: &'a mut D,
    finished: bool,
}

impl<'a, D: Document + ?Sized> Transaction<'a, D> {
    /// Starts a transaction.
    pub fn begin(document: &'a mut D) -> Self {
        document.discard_staged();
        Self {
            document,
            finished: false,
        }
    }

    /// Stages the full replacement text.
    pub fn replace_text(&mut self, text: impl Into<String>) {
        self.document.stage_text(text.into());
    }

    /// Commits the staged text.
    ///
    /// A failed commit discards the staged text as well.
    pub fn commit(mut self) -> Result<(), DocumentError> {
        self.finished = true;
        let result = self.document.commit_staged();
        if result.is_err() {
            self.document.discard_staged();
        }
        result
    }
}

impl<D: Document + ?Sized> Drop for Transaction<'_, D> {
    fn drop(&mut self) {
        if !self.finished {
            self.document.discard_staged();
        }
    }
}

/// In-memory document, used by editors and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryDocument {
    text: String,
    staged: Option<String>,
}

impl MemoryDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            staged: None,
        }
    }

    /// Whether a transaction left text staged.
    pub fn has_staged(&self) -> bool {
        self.staged.is_some()
    }
}

impl Document for MemoryDocument {
    fn text(&self) -> &str {
        &self.text
    }

    fn stage_text(&mut self, text: String) {
        self.staged = Some(text);
    }

    fn commit_staged(&mut self) -> Result<(), DocumentError> {
        let staged = self.staged.take().ok_or(DocumentError::NothingStaged)?;
        self.text = staged;
        Ok(())
    }

    fn discard_staged(&mut self) {
        self.staged = None;
    }
}

/// Document backed by a file on disk.
///
/// Commits write to a temporary file in the same directory and rename it
/// over the original.
#[derive(Debug)]
pub struct FileDocument {
    path: PathBuf,
    text: String,
    staged: Option<String>,
}

impl FileDocument {
    /// Reads a file into a document.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let path = path.into();
        let text = fs::read_to_string(&path).map_err(|source| DocumentError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            text,
            staged: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, text: &str) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(text.as_bytes())?;
        tmp.as_file().sync_all()?;

        if let Ok(metadata) = fs::metadata(&self.path) {
            fs::set_permissions(tmp.path(), metadata.permissions())?;
        }

        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Document for FileDocument {
    fn text(&self) -> &str {
        &self.text
    }

    fn stage_text(&mut self, text: String) {
        self.staged = Some(text);
    }

    fn commit_staged(&mut self) -> Result<(), DocumentError> {
        let staged = self.staged.take().ok_or(DocumentError::NothingStaged)?;

        if staged == self.text {
            debug!("{} unchanged, skipping write", self.path.display());
            return Ok(());
        }

        self.persist(&staged).map_err(|source| DocumentError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.text = staged;
        Ok(())
    }

    fn discard_staged(&mut self) {
        self.staged = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_commit_replaces_text() {
        let mut doc = MemoryDocument::new("val x=1");

        let mut tx = Transaction::begin(&mut doc);
        tx.replace_text("val x = 1");
        tx.commit().unwrap();

        assert_eq!(doc.text(), "val x = 1");
        assert!(!doc.has_staged());
    }

    #[test]
    fn test_drop_discards_staged_text() {
        let mut doc = MemoryDocument::new("val x=1");

        {
            let mut tx = Transaction::begin(&mut doc);
            tx.replace_text("val x = 1");
        }

        assert_eq!(doc.text(), "val x=1");
        assert!(!doc.has_staged());
    }

    #[test]
    fn test_commit_without_staging_fails() {
        let mut doc = MemoryDocument::new("val x=1");

        let err = Transaction::begin(&mut doc).commit().unwrap_err();
        assert!(matches!(err, DocumentError::NothingStaged));
        assert_eq!(doc.text(), "val x=1");
    }

    #[test]
    fn test_begin_clears_leftover_staging() {
        let mut doc = MemoryDocument::new("a");
        doc.stage_text("b".to_string());

        let tx = Transaction::begin(&mut doc);
        drop(tx);
        assert!(!doc.has_staged());
    }

    #[test]
    fn test_file_document_commit_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Main.kt");
        fs::write(&path, "fun main(){}\n").unwrap();

        let mut doc = FileDocument::open(&path).unwrap();
        assert_eq!(doc.text(), "fun main(){}\n");

        let mut tx = Transaction::begin(&mut doc);
        tx.replace_text("fun main() {}\n");
        tx.commit().unwrap();

        assert_eq!(doc.text(), "fun main() {}\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "fun main() {}\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_file_document_drop_leaves_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Main.kt");
        fs::write(&path, "fun main(){}\n").unwrap();

        let mut doc = FileDocument::open(&path).unwrap();
        {
            let mut tx = Transaction::begin(&mut doc);
            tx.replace_text("fun main() {}\n");
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "fun main(){}\n");
    }

    #[test]
    fn test_file_document_failed_commit_keeps_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Main.kt");
        fs::write(&path, "fun main(){}\n").unwrap();

        let mut doc = FileDocument::open(&path).unwrap();
        dir.close().unwrap();

        let mut tx = Transaction::begin(&mut doc);
        tx.replace_text("fun main() {}\n");
        let err = tx.commit().unwrap_err();

        assert!(matches!(err, DocumentError::Write { .. }));
        assert_eq!(doc.text(), "fun main(){}\n");
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempdir().unwrap();
        let err = FileDocument::open(dir.path().join("Missing.kt")).unwrap_err();
        assert!(matches!(err, DocumentError::Read { .. }));
    }
}
