//! Owned document tree handed from the parser to the renderer.
//!
//! Every node kind the renderer understands is a variant of [`NodeKind`];
//! anything else arrives as [`NodeKind::Other`] and is rendered through its
//! children only.

use comrak::nodes::Sourcepos;

/// List flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Ordered { start: usize },
}

/// A parsed markdown node with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Inclusive parser position, when the parser supplied a usable one.
    pub sourcepos: Option<Sourcepos>,
    pub children: Vec<Node>,
}

/// The closed set of node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Heading { level: u8 },
    Paragraph,
    Text(String),
    Emphasis,
    Strong,
    Strikethrough,
    InlineCode(String),
    CodeBlock { info: String, literal: String },
    Link { url: String, title: String },
    Image { url: String, title: String },
    List(ListKind),
    ListItem,
    TaskItem { checked: bool },
    BlockQuote,
    Table,
    TableRow { header: bool },
    TableCell,
    ThematicBreak,
    SoftBreak,
    LineBreak,
    HtmlInline(String),
    HtmlBlock(String),
    FootnoteReference { name: String },
    FootnoteDefinition { name: String },
    Other,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            sourcepos: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Self>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn with_sourcepos(mut self, sourcepos: Sourcepos) -> Self {
        self.sourcepos = Some(sourcepos);
        self
    }

    /// Concatenated text of the node's descendants, without markup.
    ///
    /// Breaks contribute a single space; inline code contributes its literal.
    pub fn plain_text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, text: &mut String) {
        match &self.kind {
            NodeKind::Text(t) | NodeKind::InlineCode(t) => text.push_str(t),
            NodeKind::SoftBreak | NodeKind::LineBreak => text.push(' '),
            _ => {
                for child in &self.children {
                    child.collect_text(text);
                }
            }
        }
    }

    /// Depth-first iterator over this node and its descendants.
    pub fn descendants(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Node {
        Node::new(NodeKind::Text(s.to_string()))
    }

    #[test]
    fn test_plain_text_flattens_inline_markup() {
        let heading = Node::new(NodeKind::Heading { level: 2 }).with_children(vec![
            text("Using "),
            Node::new(NodeKind::InlineCode("cargo".to_string())),
            Node::new(NodeKind::Emphasis).with_children(vec![text(" fast")]),
        ]);
        assert_eq!(heading.plain_text(), "Using cargo fast");
    }

    #[test]
    fn test_plain_text_turns_breaks_into_spaces() {
        let para = Node::new(NodeKind::Paragraph).with_children(vec![
            text("one"),
            Node::new(NodeKind::SoftBreak),
            text("two"),
        ]);
        assert_eq!(para.plain_text(), "one two");
    }

    #[test]
    fn test_descendants_are_in_document_order() {
        let doc = Node::new(NodeKind::Document).with_children(vec![
            Node::new(NodeKind::Paragraph).with_children(vec![text("a"), text("b")]),
            Node::new(NodeKind::ThematicBreak),
        ]);
        let kinds: Vec<_> = doc.descendants().map(|n| n.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Document,
                NodeKind::Paragraph,
                NodeKind::Text("a".to_string()),
                NodeKind::Text("b".to_string()),
                NodeKind::ThematicBreak,
            ]
        );
    }
}
