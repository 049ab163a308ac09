//! Markdown parsing with comrak.

use comrak::nodes::{AstNode, ListType, NodeValue};
use comrak::{Arena, Options, parse_document};

use super::tree::{ListKind, Node, NodeKind};

/// Parse markdown source into an owned [`Node`] tree.
///
/// Source positions on the returned nodes refer to `source` itself; callers
/// that parsed a slice of a larger file add their own base offset.
///
/// # Example
///
/// ```
/// use markview::document::{NodeKind, parse};
///
/// let doc = parse("# Hello\n\nWorld");
/// assert_eq!(doc.kind, NodeKind::Document);
/// assert_eq!(doc.children.len(), 2);
/// ```
pub fn parse(source: &str) -> Node {
    let arena = Arena::new();
    let mut options = Options::default();
    configure_extensions(&mut options);
    let root = parse_document(&arena, source, &options);
    convert(root)
}

fn configure_extensions(options: &mut Options) {
    // GFM extensions. Autolink stays off: it splits text nodes without
    // updating their source positions.
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
}

fn convert<'a>(node: &'a AstNode<'a>) -> Node {
    let ast = node.data.borrow();
    let kind = match &ast.value {
        NodeValue::Document => NodeKind::Document,
        NodeValue::Heading(heading) => NodeKind::Heading {
            level: heading.level,
        },
        NodeValue::Paragraph => NodeKind::Paragraph,
        NodeValue::Text(t) => NodeKind::Text(t.clone()),
        NodeValue::Emph => NodeKind::Emphasis,
        NodeValue::Strong => NodeKind::Strong,
        NodeValue::Strikethrough => NodeKind::Strikethrough,
        NodeValue::Code(code) => NodeKind::InlineCode(code.literal.clone()),
        NodeValue::CodeBlock(block) => NodeKind::CodeBlock {
            info: block.info.clone(),
            literal: block.literal.clone(),
        },
        NodeValue::Link(link) => NodeKind::Link {
            url: link.url.clone(),
            title: link.title.clone(),
        },
        NodeValue::Image(image) => NodeKind::Image {
            url: image.url.clone(),
            title: image.title.clone(),
        },
        NodeValue::List(list) => NodeKind::List(match list.list_type {
            ListType::Bullet => ListKind::Bullet,
            ListType::Ordered => ListKind::Ordered { start: list.start },
        }),
        NodeValue::Item(_) => NodeKind::ListItem,
        NodeValue::TaskItem(symbol) => NodeKind::TaskItem {
            checked: symbol.is_some(),
        },
        NodeValue::BlockQuote => NodeKind::BlockQuote,
        NodeValue::Table(_) => NodeKind::Table,
        NodeValue::TableRow(header) => NodeKind::TableRow { header: *header },
        NodeValue::TableCell => NodeKind::TableCell,
        NodeValue::ThematicBreak => NodeKind::ThematicBreak,
        NodeValue::SoftBreak => NodeKind::SoftBreak,
        NodeValue::LineBreak => NodeKind::LineBreak,
        NodeValue::HtmlInline(html) => NodeKind::HtmlInline(html.clone()),
        NodeValue::HtmlBlock(block) => NodeKind::HtmlBlock(block.literal.clone()),
        NodeValue::FootnoteReference(reference) => NodeKind::FootnoteReference {
            name: reference.name.clone(),
        },
        NodeValue::FootnoteDefinition(def) => NodeKind::FootnoteDefinition {
            name: def.name.clone(),
        },
        _ => NodeKind::Other,
    };
    let sourcepos = ast.sourcepos;
    drop(ast);

    let children = node.children().map(convert).collect();
    Node::new(kind)
        .with_sourcepos(sourcepos)
        .with_children(children)
}
