//! Text operations that insert, rewrite and remove comment markers.
//!
//! Each function takes the full current source and returns the new source;
//! reading and writing the file is the caller's job. Arguments are validated
//! before anything is built, so a rejected call leaves nothing half-done.

use chrono::{DateTime, Utc};

use super::markers::{MarkerKind, MarkerToken, known_ids, scan};
use super::{MarkdownComment, decode, encode, end_marker, header_line, start_marker};
use crate::document::parse_front_matter;
use crate::error::{Error, Result};

/// Outcome of [`add_comment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedComment {
    /// The new source text
    pub source: String,
    pub comment: MarkdownComment,
}

/// Next free numeric id: one past the largest id present or recorded in the
/// header, or 1.
///
/// # Errors
/// Returns [`Error::IdsExhausted`] when the largest id is `u64::MAX`.
pub fn next_comment_id(source: &str) -> Result<u64> {
    match known_ids(&scan(source)).max() {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or(Error::IdsExhausted { max }),
    }
}

/// Wrap the byte range `start..end` of `source` in a new comment.
///
/// The guard line is inserted after the front matter the first time a
/// comment is added; offsets at or past that point shift with it. Later adds
/// raise the id mark it records.
///
/// # Errors
/// Rejects empty or reversed ranges, offsets past the end of the source,
/// offsets that split a UTF-8 character and offsets inside existing markers.
/// Fails with [`Error::IdsExhausted`] when no id is left.
pub fn add_comment(
    source: &str,
    start: usize,
    end: usize,
    body: &str,
    now: DateTime<Utc>,
) -> Result<AddedComment> {
    if start >= end {
        return Err(Error::InvalidRange { start, end });
    }
    let tokens = scan(source);
    for offset in [start, end] {
        validate_offset(source, &tokens, offset)?;
    }

    let numeric_id = next_comment_id(source)?;
    let has_header = tokens
        .iter()
        .any(|t| matches!(t.kind, MarkerKind::Header { .. }));

    let mut text = String::with_capacity(source.len() + 512);
    let (mut start, mut end) = (start, end);
    if has_header {
        text.push_str(source);
    } else {
        let insert_at = parse_front_matter(source).content_start_offset;
        let mut header = String::new();
        if insert_at > 0 && !source[..insert_at].ends_with('\n') {
            header.push('\n');
        }
        header.push_str(&header_line(numeric_id));
        header.push('\n');

        text.push_str(&source[..insert_at]);
        text.push_str(&header);
        text.push_str(&source[insert_at..]);
        if start >= insert_at {
            start += header.len();
        }
        if end >= insert_at {
            end += header.len();
        }
        tracing::debug!(insert_at, bytes = header.len(), "inserted comment header");
    }

    let comment = MarkdownComment::new(numeric_id, body, now);
    let start_text = start_marker(&encode(&comment)?);
    let end_text = end_marker(&comment.id);
    text.insert_str(end, &end_text);
    text.insert_str(start, &start_text);
    if has_header {
        record_last_id(&mut text, numeric_id);
    }

    tracing::debug!(id = %comment.id, start, end, "added comment markers");
    Ok(AddedComment {
        source: text,
        comment,
    })
}

/// Replace the body of comment `id`, stamping `updated` with `now`.
///
/// Only the start marker's payload changes. Returns `Ok(None)` when no
/// start marker carries `id`.
///
/// # Errors
/// Returns [`Error::Encode`] if the new payload cannot be serialized.
pub fn update_comment(
    source: &str,
    id: &str,
    body: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>> {
    let tokens = scan(source);
    let Some((token, existing)) = find_start(&tokens, id) else {
        return Ok(None);
    };
    let updated = MarkdownComment {
        body: body.to_string(),
        updated: now,
        ..existing
    };
    let mut text = source.to_string();
    text.replace_range(token.range.clone(), &start_marker(&encode(&updated)?));
    tracing::debug!(id, "updated comment payload");
    Ok(Some(text))
}

/// Remove both markers of comment `id`, leaving the commented text in place.
///
/// Returns `None` when no start marker carries `id`.
pub fn delete_comment(source: &str, id: &str) -> Option<String> {
    let tokens = scan(source);
    let (start_token, _) = find_start(&tokens, id)?;
    let is_end = |t: &&MarkerToken| matches!(&t.kind, MarkerKind::End { id: end_id } if end_id == id);
    let end_range = tokens
        .iter()
        .filter(|t| t.range.start >= start_token.range.end)
        .find(is_end)
        .or_else(|| tokens.iter().find(is_end))
        .map(|t| t.range.clone());

    let mut text = source.to_string();
    let mut ranges = vec![start_token.range.clone()];
    ranges.extend(end_range);
    ranges.sort_by_key(|r| std::cmp::Reverse(r.start));
    for range in ranges {
        text.replace_range(range, "");
    }
    tracing::debug!(id, "deleted comment markers");
    Some(text)
}

/// Rewrite the first header line so it records `last_id`.
fn record_last_id(text: &mut String, last_id: u64) {
    let header = scan(text)
        .into_iter()
        .find(|t| matches!(t.kind, MarkerKind::Header { .. }));
    if let Some(token) = header {
        text.replace_range(token.range, &header_line(last_id));
    }
}

fn find_start<'t>(tokens: &'t [MarkerToken], id: &str) -> Option<(&'t MarkerToken, MarkdownComment)> {
    tokens.iter().find_map(|token| match &token.kind {
        MarkerKind::Start { payload } => decode(payload)
            .filter(|comment| comment.id == id)
            .map(|comment| (token, comment)),
        _ => None,
    })
}

fn validate_offset(source: &str, tokens: &[MarkerToken], offset: usize) -> Result<()> {
    if offset > source.len() {
        return Err(Error::OffsetOutOfBounds {
            offset,
            len: source.len(),
        });
    }
    if !source.is_char_boundary(offset) {
        return Err(Error::NotCharBoundary { offset });
    }
    if tokens.iter().any(|t| t.contains_strictly(offset)) {
        return Err(Error::OffsetInsideMarker { offset });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::{END_MARKER_PREFIX, HEADER_SIGNATURE, START_MARKER_PREFIX, scan_comments};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn t1() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_first_comment_inserts_header_at_top() {
        let source = "Hello world";
        let added = add_comment(source, 6, 11, "note", t0()).unwrap();
        assert!(added.source.starts_with(&header_line(1)));
        assert_eq!(added.comment.id, "COM-1");
        let spans = scan_comments(&added.source);
        assert_eq!(spans.len(), 1);
        assert_eq!(&added.source[spans[0].anchored_range()], "world");
        assert!(added.source.ends_with("<!-- MV-COMMENT-END COM-1 -->"));
    }

    #[test]
    fn test_header_goes_after_front_matter() {
        let source = "---\ntitle: T\n---\nBody text";
        let start = source.find("text").unwrap();
        let added = add_comment(source, start, start + 4, "c", t0()).unwrap();
        let expected_prefix = format!("---\ntitle: T\n---\n{}\nBody ", header_line(1));
        assert!(added.source.starts_with(&expected_prefix));
        let spans = scan_comments(&added.source);
        assert_eq!(&added.source[spans[0].anchored_range()], "text");
    }

    #[test]
    fn test_offsets_in_front_matter_are_not_shifted() {
        let source = "---\ntitle: Draft\n---\nBody";
        let start = source.find("Draft").unwrap();
        let added = add_comment(source, start, start + 5, "rename", t0()).unwrap();
        let spans = scan_comments(&added.source);
        assert_eq!(&added.source[spans[0].anchored_range()], "Draft");
        assert!(added.source.contains(&format!("---\n{}\nBody", header_line(1))));
    }

    #[test]
    fn test_header_after_unterminated_delimiter_line() {
        let source = "---\nk: v\n---";
        let added = add_comment(source, 4, 8, "c", t0()).unwrap();
        assert!(added.source.contains(&format!("---\n{}\n", header_line(1))));
    }

    #[test]
    fn test_header_inserted_only_once() {
        let first = add_comment("one two", 0, 3, "a", t0()).unwrap().source;
        let start = first.rfind("two").unwrap();
        let second = add_comment(&first, start, start + 3, "b", t0()).unwrap();
        assert_eq!(second.source.matches(HEADER_SIGNATURE).count(), 1);
        assert!(second.source.starts_with(&header_line(2)));
        assert_eq!(second.comment.id, "COM-2");
        let spans = scan_comments(&second.source);
        assert_eq!(&second.source[spans[0].anchored_range()], "one");
        assert_eq!(&second.source[spans[1].anchored_range()], "two");
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut text = "a b c".to_string();
        for (n, word) in ["a", "b", "c"].iter().enumerate() {
            let start = text.rfind(word).unwrap();
            let added = add_comment(&text, start, start + 1, "x", t0()).unwrap();
            assert_eq!(added.comment.numeric_id(), Some(n as u64 + 1));
            text = added.source;
        }
        let text = delete_comment(&text, "COM-2").unwrap();
        assert_eq!(next_comment_id(&text).unwrap(), 4);
        let text = delete_comment(&text, "COM-3").unwrap();
        assert_eq!(next_comment_id(&text).unwrap(), 4);

        let start = text.rfind('c').unwrap();
        let added = add_comment(&text, start, start + 1, "again", t0()).unwrap();
        assert_eq!(added.comment.id, "COM-4");
    }

    #[test]
    fn test_legacy_header_gains_last_id() {
        let source = "<!-- MV-COMMENTS-HEADER: hand written -->\nalpha beta";
        let start = source.find("beta").unwrap();
        let added = add_comment(source, start, start + 4, "x", t0()).unwrap();
        assert_eq!(added.comment.id, "COM-1");
        assert!(added.source.starts_with(&format!("{}\nalpha ", header_line(1))));
        let spans = scan_comments(&added.source);
        assert_eq!(&added.source[spans[0].anchored_range()], "beta");
    }

    #[test]
    fn test_exhausted_ids_are_an_error() {
        let source = format!("text{}", end_marker(&format!("COM-{}", u64::MAX)));
        assert!(matches!(
            next_comment_id(&source),
            Err(Error::IdsExhausted { max: u64::MAX })
        ));
        assert!(matches!(
            add_comment(&source, 0, 4, "x", t0()),
            Err(Error::IdsExhausted { .. })
        ));
    }

    #[test]
    fn test_rejects_invalid_ranges() {
        let source = "caf\u{e9} au lait";
        assert!(matches!(
            add_comment(source, 3, 3, "x", t0()),
            Err(Error::InvalidRange { .. })
        ));
        assert!(matches!(
            add_comment(source, 5, 2, "x", t0()),
            Err(Error::InvalidRange { .. })
        ));
        assert!(matches!(
            add_comment(source, 0, 99, "x", t0()),
            Err(Error::OffsetOutOfBounds { offset: 99, .. })
        ));
        assert!(matches!(
            add_comment(source, 0, 4, "x", t0()),
            Err(Error::NotCharBoundary { offset: 4 })
        ));
    }

    #[test]
    fn test_rejects_offsets_inside_markers() {
        let added = add_comment("alpha beta", 0, 5, "x", t0()).unwrap();
        let inside = added.source.find(START_MARKER_PREFIX).unwrap() + 3;
        let err = add_comment(&added.source, inside, added.source.len(), "y", t0());
        assert!(matches!(err, Err(Error::OffsetInsideMarker { .. })));
    }

    #[test]
    fn test_nested_comments_are_allowed() {
        let outer = add_comment("one two three", 0, 13, "outer", t0()).unwrap();
        let start = outer.source.find("two").unwrap();
        let inner = add_comment(&outer.source, start, start + 3, "inner", t0()).unwrap();
        let spans = scan_comments(&inner.source);
        assert_eq!(spans.len(), 2);
        assert_eq!(&inner.source[spans[1].anchored_range()], "two");
    }

    #[test]
    fn test_update_rewrites_only_payload() {
        let added = add_comment("keep this text", 5, 9, "old", t0()).unwrap();
        let updated = update_comment(&added.source, "COM-1", "new body", t1())
            .unwrap()
            .unwrap();
        let spans = scan_comments(&updated);
        assert_eq!(spans[0].comment.body, "new body");
        assert_eq!(spans[0].comment.created, t0());
        assert_eq!(spans[0].comment.updated, t1());
        let end_at = updated.find(END_MARKER_PREFIX).unwrap();
        let old_end_at = added.source.find(END_MARKER_PREFIX).unwrap();
        assert_eq!(&updated[end_at..], &added.source[old_end_at..]);
        assert_eq!(&updated[spans[0].anchored_range()], "this");
    }

    #[test]
    fn test_update_unknown_id_is_none() {
        let added = add_comment("text", 0, 4, "x", t0()).unwrap();
        assert_eq!(update_comment(&added.source, "COM-9", "y", t1()).unwrap(), None);
    }

    #[test]
    fn test_delete_restores_text_and_keeps_others() {
        let first = add_comment("one two", 0, 3, "a", t0()).unwrap().source;
        let start = first.rfind("two").unwrap();
        let both = add_comment(&first, start, start + 3, "b", t0()).unwrap().source;

        let remaining = delete_comment(&both, "COM-1").unwrap();
        let spans = scan_comments(&remaining);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].comment.id, "COM-2");
        assert!(!remaining.contains("COM-1 "));
        assert!(remaining.contains("one "));

        let cleared = delete_comment(&remaining, "COM-2").unwrap();
        assert_eq!(cleared, format!("{}\none two", header_line(2)));
    }

    #[test]
    fn test_delete_unknown_id_is_none() {
        assert_eq!(delete_comment("plain text", "COM-1"), None);
    }
}
