//! Heading anchor generation.

use std::collections::HashMap;

/// Base key used when a heading slugifies to nothing.
const EMPTY_SLUG: &str = "section";

/// Generates unique anchor ids for the headings of one document.
///
/// Call [`HeadingSlugger::slug`] once per heading in document order. Titles
/// that reduce to the same key are disambiguated with a `-N` suffix, where
/// `N` counts earlier occurrences of that key.
#[derive(Debug, Default, Clone)]
pub struct HeadingSlugger {
    seen: HashMap<String, usize>,
}

impl HeadingSlugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the anchor id for `title`, registering it as used.
    pub fn slug(&mut self, title: &str) -> String {
        let base = slugify(title);
        let count = self.seen.entry(base.clone()).or_insert(0);
        let id = if *count == 0 {
            base
        } else {
            format!("{base}-{count}")
        };
        *count += 1;
        id
    }

    /// Forget every key seen so far.
    pub fn reset(&mut self) {
        self.seen.clear();
    }
}

/// Reduce a title to lowercase ASCII letters and digits joined by single hyphens.
///
/// Every other scalar, including non-ASCII letters, acts as a separator.
/// Returns `"section"` when nothing survives.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for ch in title.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug
    }
}
