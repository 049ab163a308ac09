//! Document sessions and the state shared between them.
//!
//! - [`App`]: opens documents and keeps the recent-files list
//! - [`Model`]: one open document, its render and its comment edits
//! - [`Clock`]: where comment timestamps come from

mod model;

pub use model::{Clock, Model, SystemClock};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::pipeline::{DocumentPipeline, RenderOptions};
use crate::store::{RecentFiles, SettingsStore};

/// Entry point that hands out a [`Model`] per opened document.
#[derive(Debug)]
pub struct App<S> {
    pipeline: DocumentPipeline,
    recent: RecentFiles<S>,
    clock: Arc<dyn Clock>,
}

impl<S: SettingsStore> App<S> {
    /// Create an application that renders with `options` and records opened
    /// files in `recent`.
    pub fn new(options: RenderOptions, recent: RecentFiles<S>) -> Self {
        Self {
            pipeline: DocumentPipeline::new(options),
            recent,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` for comment timestamps in every model opened afterwards.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub const fn pipeline(&self) -> &DocumentPipeline {
        &self.pipeline
    }

    /// Open `path` and record it as most recently used.
    ///
    /// A file that cannot be read still yields a model showing the error; it
    /// is not added to the recent list. Failing to persist the list is logged
    /// and does not prevent opening.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Model {
        let path = path.as_ref();
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let mut model = Model::new(self.pipeline.clone()).with_clock(Arc::clone(&self.clock));
        model.load_file(&path);
        if path.is_file() {
            if let Err(err) = self.recent.record(&path) {
                tracing::warn!(path = %path.display(), %err, "failed to update recent files");
            }
        }
        model
    }

    /// Opened documents, most recent first.
    pub fn recent_files(&self) -> &[PathBuf] {
        self.recent.entries()
    }

    pub fn recent_mut(&mut self) -> &mut RecentFiles<S> {
        &mut self.recent
    }
}
