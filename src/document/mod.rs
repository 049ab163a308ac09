//! Markdown document parsing and rendering.
//!
//! This module handles:
//! - Splitting off front matter
//! - Parsing markdown with comrak into an owned tree
//! - Rendering that tree to HTML with source offsets and heading anchors

mod front_matter;
mod images;
mod parser;
mod render;
mod slug;
mod source_map;
mod tree;
mod types;

pub use front_matter::{front_matter_html, parse_front_matter};
pub use images::{DEFAULT_LOCAL_SCHEME, ImageResolver};
pub use parser::parse;
pub use render::{MarkdownRenderer, TEXT_END_ATTR, TEXT_START_ATTR, escape};
pub use slug::{HeadingSlugger, slugify};
pub use source_map::SourceMapper;
pub use tree::{ListKind, Node, NodeKind};
pub use types::{FrontMatterInfo, OutlineItem, RenderedMarkdown, normalize_outline};
