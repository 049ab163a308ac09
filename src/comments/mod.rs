//! Ranged comments persisted as HTML-comment markers in the markdown source.
//!
//! A comment over `text` is stored as
//!
//! ```text
//! <!-- MV-COMMENT-START {"id":"COM-1",...} -->text<!-- MV-COMMENT-END COM-1 -->
//! ```
//!
//! Markdown renderers ignore HTML comments, so the file stays readable
//! elsewhere, and reloading the file is enough to recover every comment.

mod codec;
mod editor;
mod markers;

pub use codec::{CommentPayload, decode, encode};
pub use editor::{AddedComment, add_comment, delete_comment, next_comment_id, update_comment};
pub use markers::{CommentSpan, MarkerKind, MarkerToken, scan, scan_comments};

use chrono::{DateTime, Utc};

/// Opening text of a start marker, followed by the JSON payload.
pub const START_MARKER_PREFIX: &str = "<!-- MV-COMMENT-START ";
/// Opening text of an end marker, followed by the comment id.
pub const END_MARKER_PREFIX: &str = "<!-- MV-COMMENT-END ";
/// Closing text shared by both markers.
pub const MARKER_SUFFIX: &str = " -->";
/// Signature identifying the guard line.
pub const HEADER_SIGNATURE: &str = "MV-COMMENTS-HEADER";
/// Guard text opening the header line, before its id high-water mark.
pub const HEADER_PREFIX: &str = "<!-- MV-COMMENTS-HEADER: comment markers below are managed by markview. Do not edit them by hand.";
/// Key in the header line that records the highest id ever allocated.
pub const HEADER_LAST_ID_KEY: &str = "last-id:";

const ID_PREFIX: &str = "COM-";

/// True when raw HTML carries a comment marker or the guard line.
///
/// Only such HTML survives rendering; everything else is dropped.
pub fn contains_marker_signature(html: &str) -> bool {
    html.contains("MV-COMMENT-START")
        || html.contains("MV-COMMENT-END")
        || html.contains(HEADER_SIGNATURE)
}

/// A user comment anchored to a range of the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownComment {
    /// `COM-<N>`
    pub id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub body: String,
}

impl MarkdownComment {
    /// A fresh comment numbered `numeric_id`, created and updated at `now`.
    pub fn new(numeric_id: u64, body: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: format_comment_id(numeric_id),
            created: now,
            updated: now,
            body: body.into(),
        }
    }

    /// The `<N>` of `COM-<N>`.
    pub fn numeric_id(&self) -> Option<u64> {
        parse_comment_id(&self.id)
    }
}

pub fn format_comment_id(numeric_id: u64) -> String {
    format!("{ID_PREFIX}{numeric_id}")
}

/// Parse `COM-<digits>` into its number.
pub fn parse_comment_id(id: &str) -> Option<u64> {
    let digits = id.strip_prefix(ID_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Guard line inserted once, before the first comment is added.
///
/// It carries `last_id` so numbers of deleted comments are not handed out
/// again.
pub fn header_line(last_id: u64) -> String {
    format!("{HEADER_PREFIX} {HEADER_LAST_ID_KEY} {last_id}{MARKER_SUFFIX}")
}

pub(crate) fn start_marker(payload: &str) -> String {
    format!("{START_MARKER_PREFIX}{payload}{MARKER_SUFFIX}")
}

pub(crate) fn end_marker(id: &str) -> String {
    format!("{END_MARKER_PREFIX}{id}{MARKER_SUFFIX}")
}
