use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tempfile::NamedTempFile;

use crate::comments::{self, MarkdownComment};
use crate::error::{Error, Result};
use crate::pipeline::{DocumentPipeline, RenderedDocument};

/// Source of comment timestamps.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// One open document and the edits made to it.
///
/// Every mutation reads the file, rewrites it atomically and reloads it from
/// disk. Mutations take `&mut self`, so edits through one model never
/// interleave.
#[derive(Debug)]
pub struct Model {
    pipeline: DocumentPipeline,
    clock: Arc<dyn Clock>,
    /// Path to the source file
    file_path: Option<PathBuf>,
    /// Latest render of `file_path`
    document: RenderedDocument,
}

impl Model {
    pub fn new(pipeline: DocumentPipeline) -> Self {
        Self {
            pipeline,
            clock: Arc::new(SystemClock),
            file_path: None,
            document: RenderedDocument::default(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub const fn document(&self) -> &RenderedDocument {
        &self.document
    }

    /// Open `path`; an unreadable file shows as an error document.
    pub fn load_file(&mut self, path: impl Into<PathBuf>) -> &RenderedDocument {
        let path = path.into();
        self.document = self.pipeline_for(&path).load_file(&path);
        self.file_path = Some(path);
        &self.document
    }

    /// Render the current file again from disk.
    ///
    /// # Errors
    /// Returns [`Error::NoDocument`] if no file is open.
    pub fn reload_from_disk(&mut self) -> Result<&RenderedDocument> {
        let path = self.current_path()?;
        self.document = self.pipeline_for(&path).load_file(&path);
        Ok(&self.document)
    }

    /// Anchor a new comment to bytes `start..end` of the file.
    ///
    /// # Errors
    /// Fails without touching the file when no document is open, the range
    /// is invalid, or the file cannot be read. Write failures leave the
    /// current document as it was.
    pub fn add_comment(&mut self, start: usize, end: usize, body: &str) -> Result<MarkdownComment> {
        let path = self.current_path()?;
        let source = read_source(&path)?;
        let added = comments::add_comment(&source, start, end, body, self.now())?;
        write_atomic(&path, &added.source)?;
        tracing::info!(path = %path.display(), id = %added.comment.id, "comment added");
        self.reload_from_disk()?;
        Ok(added.comment)
    }

    /// Replace the body of comment `id`.
    ///
    /// # Errors
    /// Returns [`Error::CommentNotFound`] if no start marker carries `id`.
    pub fn update_comment(&mut self, id: &str, body: &str) -> Result<()> {
        let path = self.current_path()?;
        let source = read_source(&path)?;
        let updated = comments::update_comment(&source, id, body, self.now())?
            .ok_or_else(|| Error::CommentNotFound(id.to_string()))?;
        write_atomic(&path, &updated)?;
        tracing::info!(path = %path.display(), id, "comment updated");
        self.reload_from_disk()?;
        Ok(())
    }

    /// Remove comment `id`. Returns `false` and writes nothing if it is absent.
    ///
    /// # Errors
    /// Fails when no document is open or the file cannot be read or written.
    pub fn delete_comment(&mut self, id: &str) -> Result<bool> {
        let path = self.current_path()?;
        let source = read_source(&path)?;
        let Some(remaining) = comments::delete_comment(&source, id) else {
            tracing::debug!(id, "delete of unknown comment ignored");
            return Ok(false);
        };
        write_atomic(&path, &remaining)?;
        tracing::info!(path = %path.display(), id, "comment deleted");
        self.reload_from_disk()?;
        Ok(true)
    }

    fn current_path(&self) -> Result<PathBuf> {
        self.file_path.clone().ok_or(Error::NoDocument)
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(0)
    }

    /// Relative images resolve against the document's directory unless a
    /// base was configured.
    fn pipeline_for(&self, path: &Path) -> DocumentPipeline {
        if self.pipeline.options().image_base.is_some() {
            return self.pipeline.clone();
        }
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf);
        self.pipeline.with_image_base(dir)
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| Error::io(path, err))
}

/// Write through a temp file in the same directory, then rename over `path`.
///
/// A symlink is followed so the link survives, and the file keeps the
/// permissions it had before.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let dir = target
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir).map_err(|err| Error::io(dir, err))?;
    file.write_all(contents.as_bytes())
        .map_err(|err| Error::io(&target, err))?;
    if let Ok(metadata) = fs::metadata(&target) {
        file.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|err| Error::io(&target, err))?;
    }
    file.as_file()
        .sync_all()
        .map_err(|err| Error::io(&target, err))?;
    file.persist(&target)
        .map_err(|err| Error::io(&target, err.error))?;
    Ok(())
}
