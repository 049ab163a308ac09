//! HTML rendering of the document tree.
//!
//! Text leaves are wrapped in spans carrying their source byte range so that
//! a DOM selection can be mapped back to the markdown it came from.

use std::borrow::Cow;

use super::images::ImageResolver;
use super::parser::parse;
use super::slug::HeadingSlugger;
use super::source_map::SourceMapper;
use super::tree::{ListKind, Node, NodeKind};
use super::types::{OutlineItem, RenderedMarkdown};
use crate::comments::{contains_marker_signature, scan};

/// Attribute holding a text leaf's first source byte.
pub const TEXT_START_ATTR: &str = "data-mv-text-start";
/// Attribute holding the source byte one past a text leaf's last byte.
pub const TEXT_END_ATTR: &str = "data-mv-text-end";

/// Escape `&`, `<`, `>` and `"`.
pub fn escape(text: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(text)
}

/// Renders parsed trees to HTML fragments.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    images: ImageResolver,
}

/// State threaded through one recursive walk.
struct RenderContext<'a> {
    html: String,
    outline: Vec<OutlineItem>,
    slugger: HeadingSlugger,
    mapper: Option<&'a SourceMapper>,
    source: &'a str,
    offset_base: usize,
    images: &'a ImageResolver,
}

impl MarkdownRenderer {
    pub const fn new(images: ImageResolver) -> Self {
        Self { images }
    }

    /// Render `tree`, annotating text with offsets into the original file.
    ///
    /// `source` is the exact text the tree was parsed from and `offset_base`
    /// is where that text starts within the original file.
    pub fn render(&self, tree: &Node, source: &str, offset_base: usize) -> RenderedMarkdown {
        let mapper = SourceMapper::new(source);
        self.render_with(tree, Some(&mapper), source, offset_base)
    }

    /// Render `tree` with no offset annotations.
    pub fn render_plain(&self, tree: &Node) -> RenderedMarkdown {
        self.render_with(tree, None, "", 0)
    }

    fn render_with(
        &self,
        tree: &Node,
        mapper: Option<&SourceMapper>,
        source: &str,
        offset_base: usize,
    ) -> RenderedMarkdown {
        let mut ctx = RenderContext {
            html: String::new(),
            outline: Vec::new(),
            slugger: HeadingSlugger::new(),
            mapper,
            source,
            offset_base,
            images: &self.images,
        };
        render_node(tree, &mut ctx);
        RenderedMarkdown {
            html: ctx.html,
            outline: ctx.outline,
        }
    }
}

fn render_children(node: &Node, ctx: &mut RenderContext<'_>) {
    for child in &node.children {
        render_node(child, ctx);
    }
}

fn render_wrapped(node: &Node, ctx: &mut RenderContext<'_>, open: &str, close: &str) {
    ctx.html.push_str(open);
    render_children(node, ctx);
    ctx.html.push_str(close);
}

fn render_node(node: &Node, ctx: &mut RenderContext<'_>) {
    match &node.kind {
        NodeKind::Document | NodeKind::Other => render_children(node, ctx),

        NodeKind::Heading { level } => {
            let title = node.plain_text();
            let title = title.trim();
            let anchor_id = ctx.slugger.slug(title);
            if !title.is_empty() {
                ctx.outline.push(OutlineItem {
                    title: title.to_string(),
                    level: *level,
                    anchor_id: anchor_id.clone(),
                });
            }
            ctx.html
                .push_str(&format!("<h{level} id=\"{}\">", escape(&anchor_id)));
            render_children(node, ctx);
            ctx.html.push_str(&format!("</h{level}>\n"));
        }

        NodeKind::Paragraph => render_wrapped(node, ctx, "<p>", "</p>\n"),

        NodeKind::Text(text) => render_text(node, text, ctx),

        NodeKind::Emphasis => render_wrapped(node, ctx, "<em>", "</em>"),
        NodeKind::Strong => render_wrapped(node, ctx, "<strong>", "</strong>"),
        NodeKind::Strikethrough => render_wrapped(node, ctx, "<del>", "</del>"),

        NodeKind::InlineCode(literal) => {
            ctx.html.push_str(&format!("<code>{}</code>", escape(literal)));
        }

        NodeKind::CodeBlock { info, literal } => {
            let language = info.split_whitespace().next().unwrap_or("");
            ctx.html.push_str(&format!(
                "<pre><code class=\"language-{}\">{}</code></pre>\n",
                escape(language),
                escape(literal)
            ));
        }

        NodeKind::Link { url, title } => {
            ctx.html.push_str(&format!("<a href=\"{}\"", escape(url)));
            push_title(title, ctx);
            ctx.html.push('>');
            render_children(node, ctx);
            ctx.html.push_str("</a>");
        }

        NodeKind::Image { url, title } => {
            let src = ctx.images.resolve(url);
            ctx.html.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\"",
                escape(&src),
                escape(&node.plain_text())
            ));
            push_title(title, ctx);
            ctx.html.push('>');
        }

        NodeKind::List(ListKind::Bullet) => render_wrapped(node, ctx, "<ul>\n", "</ul>\n"),
        NodeKind::List(ListKind::Ordered { start }) => {
            if *start == 1 {
                ctx.html.push_str("<ol>\n");
            } else {
                ctx.html.push_str(&format!("<ol start=\"{start}\">\n"));
            }
            render_children(node, ctx);
            ctx.html.push_str("</ol>\n");
        }
        NodeKind::ListItem => render_wrapped(node, ctx, "<li>", "</li>\n"),
        NodeKind::TaskItem { checked } => {
            ctx.html.push_str("<li class=\"task-list-item\"><input type=\"checkbox\" disabled=\"\"");
            if *checked {
                ctx.html.push_str(" checked=\"\"");
            }
            ctx.html.push_str("> ");
            render_children(node, ctx);
            ctx.html.push_str("</li>\n");
        }

        NodeKind::BlockQuote => render_wrapped(node, ctx, "<blockquote>\n", "</blockquote>\n"),

        NodeKind::Table => render_table(node, ctx),
        // Rows and cells outside a table are rendered by `render_table` only.
        NodeKind::TableRow { .. } | NodeKind::TableCell => render_children(node, ctx),

        NodeKind::ThematicBreak => ctx.html.push_str("<hr>\n"),
        NodeKind::SoftBreak => ctx.html.push(' '),
        NodeKind::LineBreak => ctx.html.push_str("<br>\n"),

        NodeKind::HtmlInline(html) => render_raw_html(node, html, false, ctx),
        NodeKind::HtmlBlock(html) => render_raw_html(node, html, true, ctx),

        NodeKind::FootnoteReference { name } => {
            let name = escape(name);
            ctx.html.push_str(&format!(
                "<sup class=\"footnote-ref\"><a href=\"#fn-{name}\" id=\"fnref-{name}\">{name}</a></sup>"
            ));
        }
        NodeKind::FootnoteDefinition { name } => {
            ctx.html
                .push_str(&format!("<div class=\"footnote\" id=\"fn-{}\">\n", escape(name)));
            render_children(node, ctx);
            ctx.html.push_str("</div>\n");
        }
    }
}

fn render_text(node: &Node, text: &str, ctx: &mut RenderContext<'_>) {
    let range = ctx
        .mapper
        .zip(node.sourcepos)
        .and_then(|(mapper, pos)| mapper.byte_range(pos))
        .filter(|r| ctx.source.is_char_boundary(r.start) && ctx.source.is_char_boundary(r.end));
    match range {
        Some(range) => {
            ctx.html.push_str(&format!(
                "<span {TEXT_START_ATTR}=\"{}\" {TEXT_END_ATTR}=\"{}\">{}</span>",
                ctx.offset_base + range.start,
                ctx.offset_base + range.end,
                escape(text)
            ));
        }
        None => ctx.html.push_str(&escape(text)),
    }
}

fn push_title(title: &str, ctx: &mut RenderContext<'_>) {
    if !title.is_empty() {
        ctx.html.push_str(&format!(" title=\"{}\"", escape(title)));
    }
}

/// Raw HTML survives only as the comment markers it contains.
///
/// A marker at the start of a line turns the whole line into an HTML block.
/// The markers leading such a block pass through and the rest of the line is
/// rendered as markdown again, with offsets continuing from the marker end.
fn render_raw_html(node: &Node, html: &str, block: bool, ctx: &mut RenderContext<'_>) {
    if !contains_marker_signature(html) {
        tracing::trace!(len = html.len(), "suppressing raw html");
        return;
    }
    let tokens = scan(html);
    let mut lead = 0;
    if block {
        for token in &tokens {
            if !html[lead..token.range.start].trim().is_empty() {
                break;
            }
            lead = token.range.end;
        }
    }
    if lead == 0 {
        for token in &tokens {
            ctx.html.push_str(&html[token.range.clone()]);
        }
        return;
    }

    ctx.html.push_str(html[..lead].trim_start());
    if html[lead..].trim().is_empty() {
        ctx.html.push('\n');
        return;
    }
    render_fragment(node, html, lead, ctx);
}

/// Render `literal[lead..]` as markdown into the current output.
///
/// Headings keep sharing the slugger and outline of the surrounding document.
fn render_fragment(node: &Node, literal: &str, lead: usize, ctx: &mut RenderContext<'_>) {
    let rest = &literal[lead..];
    let tree = parse(rest);
    let base = literal_offset(node, literal, ctx).map(|start| ctx.offset_base + start + lead);
    let mapper = base.map(|_| SourceMapper::new(rest));

    let mut inner = RenderContext {
        html: std::mem::take(&mut ctx.html),
        outline: std::mem::take(&mut ctx.outline),
        slugger: std::mem::take(&mut ctx.slugger),
        mapper: mapper.as_ref(),
        source: rest,
        offset_base: base.unwrap_or(0),
        images: ctx.images,
    };
    render_node(&tree, &mut inner);
    ctx.html = inner.html;
    ctx.outline = inner.outline;
    ctx.slugger = inner.slugger;
}

/// Where `literal` starts in the current source, if it is a verbatim slice.
fn literal_offset(node: &Node, literal: &str, ctx: &RenderContext<'_>) -> Option<usize> {
    let start = ctx.mapper?.offset_of(node.sourcepos?.start)?;
    let end = start.checked_add(literal.len())?;
    (ctx.source.get(start..end) == Some(literal)).then_some(start)
}

fn render_table(node: &Node, ctx: &mut RenderContext<'_>) {
    let (head, body): (Vec<&Node>, Vec<&Node>) = node
        .children
        .iter()
        .filter(|row| matches!(row.kind, NodeKind::TableRow { .. }))
        .partition(|row| matches!(row.kind, NodeKind::TableRow { header: true }));

    ctx.html.push_str("<table>\n");
    if !head.is_empty() {
        ctx.html.push_str("<thead>\n");
        for row in head {
            render_table_row(row, "th", ctx);
        }
        ctx.html.push_str("</thead>\n");
    }
    if !body.is_empty() {
        ctx.html.push_str("<tbody>\n");
        for row in body {
            render_table_row(row, "td", ctx);
        }
        ctx.html.push_str("</tbody>\n");
    }
    ctx.html.push_str("</table>\n");
}

fn render_table_row(row: &Node, cell_tag: &str, ctx: &mut RenderContext<'_>) {
    ctx.html.push_str("<tr>");
    for cell in &row.children {
        ctx.html.push_str(&format!("<{cell_tag}>"));
        render_children(cell, ctx);
        ctx.html.push_str(&format!("</{cell_tag}>"));
    }
    ctx.html.push_str("</tr>\n");
}
