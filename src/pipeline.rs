//! Source text to renderable document: front matter, parse, render, comments.

use std::path::{Path, PathBuf};

use crate::comments::{MarkdownComment, scan_comments};
use crate::document::{
    ImageResolver, MarkdownRenderer, OutlineItem, escape, front_matter_html, parse,
    parse_front_matter,
};
use crate::perf;

/// Options fixed when a pipeline is built.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Directory relative image paths resolve against
    pub image_base: Option<PathBuf>,
    /// URI scheme for local images
    pub image_scheme: String,
    /// Prepend a key/value table for front matter
    pub show_front_matter: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            image_base: None,
            image_scheme: crate::document::DEFAULT_LOCAL_SCHEME.to_string(),
            show_front_matter: true,
        }
    }
}

/// Everything a viewer needs to show one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDocument {
    pub html: String,
    pub outline: Vec<OutlineItem>,
    /// Comments sorted by numeric id
    pub comments: Vec<MarkdownComment>,
}

impl RenderedDocument {
    /// A document that only shows `message`.
    pub fn error(message: &str) -> Self {
        Self {
            html: format!("<div class=\"mv-error\"><p>{}</p></div>\n", escape(message)),
            outline: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn comment(&self, id: &str) -> Option<&MarkdownComment> {
        self.comments.iter().find(|c| c.id == id)
    }
}

/// Turns markdown source into a [`RenderedDocument`].
#[derive(Debug, Clone, Default)]
pub struct DocumentPipeline {
    options: RenderOptions,
}

impl DocumentPipeline {
    pub const fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub const fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Copy of this pipeline resolving images against `dir`.
    #[must_use]
    pub fn with_image_base(&self, dir: Option<PathBuf>) -> Self {
        let mut options = self.options.clone();
        options.image_base = dir;
        Self { options }
    }

    /// Render `source`.
    ///
    /// Text offsets in the HTML and comment ranges refer to `source` as given,
    /// front matter included.
    pub fn load(&self, source: &str) -> RenderedDocument {
        let _scope = perf::scope("pipeline.load");
        let front_matter = parse_front_matter(source);
        let tree = parse(&front_matter.content);

        let images = ImageResolver::new(self.options.image_base.clone())
            .with_scheme(self.options.image_scheme.clone());
        let mut rendered = MarkdownRenderer::new(images).render(
            &tree,
            &front_matter.content,
            front_matter.content_start_offset,
        );

        if self.options.show_front_matter {
            let table = front_matter_html(&front_matter.items);
            if !table.is_empty() {
                rendered.html.insert_str(0, &table);
            }
        }
        rendered.normalize_outline();

        let comments = scan_comments(source)
            .into_iter()
            .map(|span| span.comment)
            .collect::<Vec<_>>();

        tracing::debug!(
            bytes = source.len(),
            headings = rendered.outline.len(),
            comments = comments.len(),
            "rendered document"
        );
        RenderedDocument {
            html: rendered.html,
            outline: rendered.outline,
            comments,
        }
    }

    /// Read and render `path`; read failures become an error document.
    pub fn load_file(&self, path: &Path) -> RenderedDocument {
        match std::fs::read(path) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(source) => self.load(&source),
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "source is not UTF-8");
                    RenderedDocument::error(&format!(
                        "{} is not valid UTF-8 text: {err}",
                        path.display()
                    ))
                }
            },
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "failed to read source");
                RenderedDocument::error(&format!("Could not open {}: {err}", path.display()))
            }
        }
    }
}
