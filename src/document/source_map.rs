//! Mapping parser line/column positions back to byte offsets.

use comrak::nodes::{LineColumn, Sourcepos};

/// Byte offsets of every line start in one source string.
///
/// Columns are interpreted as 1-based UTF-8 byte columns, which is what
/// comrak reports, so the result is a byte offset into the same string.
#[derive(Debug, Clone)]
pub struct SourceMapper {
    line_starts: Vec<usize>,
    len: usize,
}

impl SourceMapper {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(idx, _)| idx + 1),
        );
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Number of lines known to the mapper (a trailing newline opens one more).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset of a 1-based `(line, column)` pair.
    ///
    /// Returns `None` when the line does not exist.
    pub fn offset(&self, line: usize, column: usize) -> Option<usize> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        Some(start + column.saturating_sub(1))
    }

    /// Byte offset of a parser position.
    pub fn offset_of(&self, pos: LineColumn) -> Option<usize> {
        self.offset(pos.line, pos.column)
    }

    /// Half-open byte range covered by an inclusive parser source position.
    ///
    /// Ranges that do not resolve, or that run past the end of the source,
    /// yield `None` so callers can fall back to unannotated output.
    pub fn byte_range(&self, pos: Sourcepos) -> Option<std::ops::Range<usize>> {
        let start = self.offset_of(pos.start)?;
        let end = self.offset_of(pos.end)? + 1;
        (start < end && end <= self.len).then_some(start..end)
    }
}
