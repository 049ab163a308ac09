//! Leading `---` metadata blocks.

use super::types::FrontMatterInfo;

const DELIMITER: &str = "---";

/// Split a leading `key: value` block off `markdown`.
///
/// Without an opening `---` line, or without a closing one, the whole text is
/// content and both offsets are zero. Lines inside the block that have no
/// colon are skipped.
pub fn parse_front_matter(markdown: &str) -> FrontMatterInfo {
    let mut lines = split_lines(markdown);
    let Some((_, first)) = lines.next() else {
        return FrontMatterInfo::without_front_matter(markdown);
    };
    if trim_line_ending(first) != DELIMITER {
        return FrontMatterInfo::without_front_matter(markdown);
    }

    let mut items = Vec::new();
    for (start, line) in lines {
        let line = trim_line_ending(line);
        if line == DELIMITER {
            let content_start = start + line_length(&markdown[start..]);
            return FrontMatterInfo {
                items,
                content: markdown[content_start..].to_string(),
                content_start_offset: content_start,
                front_matter_end_offset: content_start,
            };
        }
        match line.split_once(':') {
            Some((key, value)) => items.push((key.trim().to_string(), value.trim().to_string())),
            None => tracing::debug!(line, "skipping front matter line without a colon"),
        }
    }

    FrontMatterInfo::without_front_matter(markdown)
}

/// Render front matter items as a key/value table, or nothing when empty.
pub fn front_matter_html(items: &[(String, String)]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let mut html = String::from("<table class=\"front-matter\"><tbody>");
    for (key, value) in items {
        html.push_str(&format!(
            "<tr><th>{}</th><td>{}</td></tr>",
            super::render::escape(key),
            super::render::escape(value)
        ));
    }
    html.push_str("</tbody></table>\n");
    html
}

/// Lines with their starting byte offsets, line endings included.
fn split_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_inclusive('\n').scan(0, |offset, line| {
        let start = *offset;
        *offset += line.len();
        Some((start, line))
    })
}

fn line_length(rest: &str) -> usize {
    rest.find('\n').map_or(rest.len(), |idx| idx + 1)
}

fn trim_line_ending(line: &str) -> &str {
    line.trim_end_matches('\n').trim_end_matches('\r')
}
