// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. comments::CommentSpan)
    clippy::module_name_repetitions
)]

//! # Markview
//!
//! A markdown-to-HTML renderer for review tools.
//!
//! Markview renders markdown into an HTML fragment with:
//! - Byte offsets into the source on every text leaf
//! - Unique heading anchors and a table-of-contents outline
//! - A key/value table for `---` front matter
//! - Review comments stored as HTML-comment markers in the source itself
//!
//! ## Architecture
//!
//! Rendering is a pure pipeline: front matter is split off, the rest is
//! parsed with comrak into an owned tree and rendered in one recursive walk.
//! Comment edits are plain text transformations; [`app::Model`] applies them
//! to a file and reloads the result.
//!
//! ## Modules
//!
//! - [`document`]: Parsing, rendering, slugs and source offsets
//! - [`comments`]: Comment marker format, scanning and editing
//! - [`pipeline`]: Source text to rendered document
//! - [`app`]: Open documents and their comment edits
//! - [`store`]: Persisted settings and recent files
//! - [`config`]: Command-line defaults
//! - [`perf`]: Timing scopes

pub mod app;
pub mod comments;
pub mod config;
pub mod document;
mod error;
pub mod perf;
pub mod pipeline;
pub mod store;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Model};
    pub use crate::comments::MarkdownComment;
    pub use crate::document::OutlineItem;
    pub use crate::pipeline::{DocumentPipeline, RenderOptions, RenderedDocument};
}
