//! Core document types.

/// One navigable heading in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineItem {
    /// Plain-text heading title
    pub title: String,
    /// Heading level, 1-6
    pub level: u8,
    /// The heading's `id` attribute
    pub anchor_id: String,
}

/// Result of one render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedMarkdown {
    /// Body HTML fragment
    pub html: String,
    /// Headings in document order
    pub outline: Vec<OutlineItem>,
}

impl RenderedMarkdown {
    /// Treat a lone level-1 heading as the document title.
    ///
    /// When exactly one H1 exists it is removed from the outline and every
    /// other entry moves up one level (never above 1).
    pub fn normalize_outline(&mut self) {
        normalize_outline(&mut self.outline);
    }
}

/// See [`RenderedMarkdown::normalize_outline`].
pub fn normalize_outline(outline: &mut Vec<OutlineItem>) {
    if outline.iter().filter(|item| item.level == 1).count() != 1 {
        return;
    }
    outline.retain(|item| item.level != 1);
    for item in outline.iter_mut() {
        item.level = item.level.saturating_sub(1).max(1);
    }
}

/// Front matter split off the top of a source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatterInfo {
    /// `key: value` pairs in file order
    pub items: Vec<(String, String)>,
    /// Everything after the closing delimiter line
    pub content: String,
    /// Byte offset of `content` within the original source
    pub content_start_offset: usize,
    /// Byte offset just past the closing delimiter line
    pub front_matter_end_offset: usize,
}

impl FrontMatterInfo {
    pub(crate) fn without_front_matter(markdown: &str) -> Self {
        Self {
            items: Vec::new(),
            content: markdown.to_string(),
            content_start_offset: 0,
            front_matter_end_offset: 0,
        }
    }

    pub fn has_front_matter(&self) -> bool {
        self.front_matter_end_offset > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, level: u8) -> OutlineItem {
        OutlineItem {
            title: title.to_string(),
            level,
            anchor_id: title.to_lowercase(),
        }
    }

    #[test]
    fn test_lone_h1_is_dropped_and_levels_shift() {
        let mut outline = vec![
            item("Title", 1),
            item("Section", 2),
            item("Section", 2),
            item("Sub", 3),
        ];
        normalize_outline(&mut outline);
        let titles: Vec<_> = outline.iter().map(|i| i.title.as_str()).collect();
        let levels: Vec<_> = outline.iter().map(|i| i.level).collect();
        assert_eq!(titles, ["Section", "Section", "Sub"]);
        assert_eq!(levels, [1, 1, 2]);
    }

    #[test]
    fn test_multiple_h1_are_kept() {
        let mut outline = vec![item("A", 1), item("B", 2), item("C", 1)];
        let before = outline.clone();
        normalize_outline(&mut outline);
        assert_eq!(outline, before);
    }

    #[test]
    fn test_no_h1_is_untouched() {
        let mut outline = vec![item("A", 2), item("B", 3)];
        let before = outline.clone();
        normalize_outline(&mut outline);
        assert_eq!(outline, before);
    }

    #[test]
    fn test_only_h1_leaves_empty_outline() {
        let mut outline = vec![item("Title", 1)];
        normalize_outline(&mut outline);
        assert!(outline.is_empty());
    }
}
