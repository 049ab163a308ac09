//! JSON payload carried by start markers.
//!
//! The body is base64 encoded so newlines, quotes and `-->` inside a comment
//! can never terminate the surrounding HTML comment.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{MarkdownComment, parse_comment_id};
use crate::error::{Error, Result};

/// Wire form of a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPayload {
    pub id: String,
    /// RFC 3339 / ISO-8601 timestamp
    pub created: String,
    /// RFC 3339 / ISO-8601 timestamp
    pub updated: String,
    pub body_b64: String,
}

impl From<&MarkdownComment> for CommentPayload {
    fn from(comment: &MarkdownComment) -> Self {
        Self {
            id: comment.id.clone(),
            created: format_timestamp(comment.created),
            updated: format_timestamp(comment.updated),
            body_b64: STANDARD.encode(comment.body.as_bytes()),
        }
    }
}

impl CommentPayload {
    /// Decode the payload fields; `None` if any of them is invalid.
    pub fn into_comment(self) -> Option<MarkdownComment> {
        parse_comment_id(&self.id)?;
        let created = parse_timestamp(&self.created)?;
        let updated = parse_timestamp(&self.updated)?;
        let bytes = STANDARD.decode(self.body_b64.as_bytes()).ok()?;
        let body = String::from_utf8(bytes).ok()?;
        Some(MarkdownComment {
            id: self.id,
            created,
            updated,
            body,
        })
    }
}

/// Encode a comment as compact JSON: `{"id","created","updated","bodyB64"}`.
///
/// # Errors
/// Returns [`Error::Encode`] if serialization fails.
pub fn encode(comment: &MarkdownComment) -> Result<String> {
    serde_json::to_string(&CommentPayload::from(comment)).map_err(|source| Error::Encode {
        id: comment.id.clone(),
        source,
    })
}

/// Decode a JSON payload. Malformed JSON, ids, timestamps or base64 yield `None`.
pub fn decode(json: &str) -> Option<MarkdownComment> {
    let payload: CommentPayload = serde_json::from_str(json).ok()?;
    payload.into_comment()
}

/// Whole seconds print without a fraction; anything finer prints exactly.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
