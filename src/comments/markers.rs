//! Structured scan for comment markers in markdown source.
//!
//! Markers are located by walking `<!--` openings and checking the exact
//! prefixes; a marker never spans lines. Byte ranges cover the whole marker
//! text so edits can splice around it without touching neighbouring bytes.

use std::ops::Range;

use super::{
    END_MARKER_PREFIX, HEADER_LAST_ID_KEY, HEADER_SIGNATURE, MARKER_SUFFIX, MarkdownComment,
    START_MARKER_PREFIX, decode, parse_comment_id,
};

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// What a marker token says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerKind {
    /// Guard line with the highest id it has recorded, if any.
    Header { last_id: Option<u64> },
    /// Start marker with its undecoded JSON payload.
    Start { payload: String },
    End { id: String },
}

/// One marker found in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerToken {
    pub kind: MarkerKind,
    /// Byte range of the full marker text.
    pub range: Range<usize>,
}

impl MarkerToken {
    /// True when `offset` sits strictly between the marker's first and last byte.
    pub fn contains_strictly(&self, offset: usize) -> bool {
        self.range.start < offset && offset < self.range.end
    }
}

/// A decoded comment together with where its markers sit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentSpan {
    pub comment: MarkdownComment,
    pub start_marker: Range<usize>,
    pub end_marker: Range<usize>,
}

impl CommentSpan {
    /// Bytes between the two markers: the commented text.
    pub const fn anchored_range(&self) -> Range<usize> {
        self.start_marker.end..self.end_marker.start
    }
}

/// Find every marker token in `source`, in order.
pub fn scan(source: &str) -> Vec<MarkerToken> {
    let mut tokens = Vec::new();
    let mut cursor = 0;
    while let Some(found) = source[cursor..].find(COMMENT_OPEN) {
        let start = cursor + found;
        match classify(&source[start..]) {
            Some((kind, len)) => {
                tokens.push(MarkerToken {
                    kind,
                    range: start..start + len,
                });
                cursor = start + len;
            }
            None => cursor = start + COMMENT_OPEN.len(),
        }
    }
    tokens
}

/// Recognize a marker at the start of `rest`, returning it and its byte length.
fn classify(rest: &str) -> Option<(MarkerKind, usize)> {
    let line = rest.split('\n').next().unwrap_or(rest);

    if let Some(after) = line.strip_prefix(START_MARKER_PREFIX) {
        let end = after.find(MARKER_SUFFIX)?;
        let payload = after[..end].to_string();
        return Some((
            MarkerKind::Start { payload },
            START_MARKER_PREFIX.len() + end + MARKER_SUFFIX.len(),
        ));
    }

    if let Some(after) = line.strip_prefix(END_MARKER_PREFIX) {
        let end = after.find(MARKER_SUFFIX)?;
        let id = after[..end].trim();
        if id.is_empty() || id.contains(char::is_whitespace) {
            return None;
        }
        return Some((
            MarkerKind::End { id: id.to_string() },
            END_MARKER_PREFIX.len() + end + MARKER_SUFFIX.len(),
        ));
    }

    let after_open = line[COMMENT_OPEN.len()..].trim_start();
    if after_open.starts_with(HEADER_SIGNATURE) {
        let end = line.find(COMMENT_CLOSE)?;
        let last_id = line[..end]
            .split_once(HEADER_LAST_ID_KEY)
            .and_then(|(_, digits)| digits.trim().parse().ok());
        return Some((MarkerKind::Header { last_id }, end + COMMENT_CLOSE.len()));
    }
    None
}

/// Decode every start marker that has a matching end marker after it.
///
/// Malformed payloads and unmatched starts are skipped. The result is sorted
/// by numeric id.
pub fn scan_comments(source: &str) -> Vec<CommentSpan> {
    let tokens = scan(source);
    let mut spans = Vec::new();
    for (idx, token) in tokens.iter().enumerate() {
        let MarkerKind::Start { payload } = &token.kind else {
            continue;
        };
        let Some(comment) = decode(payload) else {
            tracing::debug!(offset = token.range.start, "skipping undecodable comment marker");
            continue;
        };
        let end = tokens[idx + 1..]
            .iter()
            .find(|t| matches!(&t.kind, MarkerKind::End { id } if *id == comment.id));
        let Some(end) = end else {
            tracing::debug!(id = %comment.id, "skipping comment without end marker");
            continue;
        };
        spans.push(CommentSpan {
            start_marker: token.range.clone(),
            end_marker: end.range.clone(),
            comment,
        });
    }
    spans.sort_by_key(|span| span.comment.numeric_id().unwrap_or(u64::MAX));
    spans
}

/// Every numeric id mentioned by a decodable start marker, an end marker or
/// the header's high-water mark.
pub(crate) fn known_ids(tokens: &[MarkerToken]) -> impl Iterator<Item = u64> + '_ {
    tokens.iter().filter_map(|token| match &token.kind {
        MarkerKind::Start { payload } => decode(payload).and_then(|c| c.numeric_id()),
        MarkerKind::End { id } => parse_comment_id(id),
        MarkerKind::Header { last_id } => *last_id,
    })
}
