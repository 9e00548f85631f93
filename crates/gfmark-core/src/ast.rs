//! Markdown Abstract Syntax Tree
//!
//! This module defines the nodes produced by the parser and consumed by every
//! renderer. A document is a single-owner tree rooted at a
//! [`NodeValue::Document`] node; renderers only ever borrow it.

use std::collections::HashMap;
use std::fmt;

use crate::options::Extension;

/// A 1-based line and column pair.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

impl LineColumn {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Source range covered by a node, inclusive on both ends.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sourcepos {
    pub start: LineColumn,
    pub end: LineColumn,
}

impl Sourcepos {
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start: LineColumn::new(start_line, start_column),
            end: LineColumn::new(end_line, end_column),
        }
    }
}

impl fmt::Display for Sourcepos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

/// Fieldless discriminant of [`NodeValue`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    BlockQuote,
    List,
    Item,
    CodeBlock,
    Html,
    Paragraph,
    Heading,
    ThematicBreak,
    Table,
    TableRow,
    TableCell,
    Text,
    SoftBreak,
    LineBreak,
    Code,
    Emphasis,
    Strong,
    Strikethrough,
    Link,
    Image,
    RawInline,
    AutoLink,
    TaskListMarker,
    FootnoteDefinition,
    FootnoteReference,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListType {
    #[default]
    Bullet,
    Ordered,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListDelimType {
    #[default]
    Period,
    Paren,
}

/// Shared by `List` and `Item` nodes.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeList {
    pub list_type: ListType,
    /// Columns of indentation before the marker
    pub marker_offset: usize,
    /// Marker width plus the spaces that follow it
    pub padding: usize,
    pub start: usize,
    pub delimiter: ListDelimType,
    pub bullet_char: u8,
    /// Set once when the list is closed; loose lists wrap items in paragraphs
    pub tight: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeHeading {
    pub level: u8,
    pub setext: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeCodeBlock {
    pub fenced: bool,
    pub fence_char: u8,
    pub fence_length: usize,
    pub fence_offset: usize,
    pub info: String,
    pub literal: String,
}

impl NodeCodeBlock {
    /// First word of the info string, if any.
    pub fn language(&self) -> Option<&str> {
        self.info.split_whitespace().next()
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeHtmlBlock {
    /// CommonMark HTML block start condition (1-7)
    pub block_type: u8,
    pub literal: String,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableAlignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

impl TableAlignment {
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            TableAlignment::None => None,
            TableAlignment::Left => Some("left"),
            TableAlignment::Center => Some("center"),
            TableAlignment::Right => Some("right"),
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeTable {
    /// One entry per column; fixes the column count for every row
    pub alignments: Vec<TableAlignment>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeLink {
    pub url: String,
    pub title: String,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeCode {
    pub literal: String,
    pub num_backticks: usize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoLinkKind {
    /// `<scheme:...>` or a bare `http(s)://` URL
    Uri,
    /// `<user@host>` or a bare e-mail address
    Email,
    /// Bare `www.` domain
    Www,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAutoLink {
    pub url: String,
    pub label: String,
    pub kind: AutoLinkKind,
}

/// A `[^label]:` block. Definitions that are referenced end up, in order
/// of first reference, at the end of the document; the rest are dropped.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeFootnoteDefinition {
    pub name: String,
    /// How many references point here
    pub total_references: usize,
}

/// A `[^label]` reference to a footnote definition
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeFootnoteReference {
    pub name: String,
    /// 1-based count of references to the same definition up to this one
    pub ref_num: usize,
    /// 1-based number of the definition, shown as the reference text
    pub ix: usize,
}

/// Kind-specific payload of a [`Node`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValue {
    Document,
    BlockQuote,
    List(NodeList),
    Item(NodeList),
    CodeBlock(NodeCodeBlock),
    Html(NodeHtmlBlock),
    Paragraph,
    Heading(NodeHeading),
    ThematicBreak,
    Table(NodeTable),
    /// `true` for the header row
    TableRow(bool),
    TableCell,
    Text(String),
    SoftBreak,
    LineBreak,
    Code(NodeCode),
    Emphasis,
    Strong,
    Strikethrough,
    Link(NodeLink),
    Image(NodeLink),
    RawInline(String),
    AutoLink(NodeAutoLink),
    /// `true` when checked
    TaskListMarker(bool),
    FootnoteDefinition(NodeFootnoteDefinition),
    FootnoteReference(NodeFootnoteReference),
}

impl NodeValue {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeValue::Document => NodeKind::Document,
            NodeValue::BlockQuote => NodeKind::BlockQuote,
            NodeValue::List(_) => NodeKind::List,
            NodeValue::Item(_) => NodeKind::Item,
            NodeValue::CodeBlock(_) => NodeKind::CodeBlock,
            NodeValue::Html(_) => NodeKind::Html,
            NodeValue::Paragraph => NodeKind::Paragraph,
            NodeValue::Heading(_) => NodeKind::Heading,
            NodeValue::ThematicBreak => NodeKind::ThematicBreak,
            NodeValue::Table(_) => NodeKind::Table,
            NodeValue::TableRow(_) => NodeKind::TableRow,
            NodeValue::TableCell => NodeKind::TableCell,
            NodeValue::Text(_) => NodeKind::Text,
            NodeValue::SoftBreak => NodeKind::SoftBreak,
            NodeValue::LineBreak => NodeKind::LineBreak,
            NodeValue::Code(_) => NodeKind::Code,
            NodeValue::Emphasis => NodeKind::Emphasis,
            NodeValue::Strong => NodeKind::Strong,
            NodeValue::Strikethrough => NodeKind::Strikethrough,
            NodeValue::Link(_) => NodeKind::Link,
            NodeValue::Image(_) => NodeKind::Image,
            NodeValue::RawInline(_) => NodeKind::RawInline,
            NodeValue::AutoLink(_) => NodeKind::AutoLink,
            NodeValue::TaskListMarker(_) => NodeKind::TaskListMarker,
            NodeValue::FootnoteDefinition(_) => NodeKind::FootnoteDefinition,
            NodeValue::FootnoteReference(_) => NodeKind::FootnoteReference,
        }
    }

    /// Block-level nodes; everything else lives inside a paragraph,
    /// heading, or table cell.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            NodeValue::Document
                | NodeValue::BlockQuote
                | NodeValue::List(_)
                | NodeValue::Item(_)
                | NodeValue::CodeBlock(_)
                | NodeValue::Html(_)
                | NodeValue::Paragraph
                | NodeValue::Heading(_)
                | NodeValue::ThematicBreak
                | NodeValue::Table(_)
                | NodeValue::TableRow(_)
                | NodeValue::TableCell
                | NodeValue::FootnoteDefinition(_)
        )
    }

    /// Kinds that may carry children.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeValue::Document
                | NodeValue::BlockQuote
                | NodeValue::List(_)
                | NodeValue::Item(_)
                | NodeValue::FootnoteDefinition(_)
                | NodeValue::Paragraph
                | NodeValue::Heading(_)
                | NodeValue::Table(_)
                | NodeValue::TableRow(_)
                | NodeValue::TableCell
                | NodeValue::Emphasis
                | NodeValue::Strong
                | NodeValue::Strikethrough
                | NodeValue::Link(_)
                | NodeValue::Image(_)
        )
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            NodeValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// One element of the tree.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub value: NodeValue,
    pub sourcepos: Sourcepos,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(value: NodeValue, sourcepos: Sourcepos) -> Self {
        Self {
            value,
            sourcepos,
            children: Vec::new(),
        }
    }

    pub fn with_children(value: NodeValue, sourcepos: Sourcepos, children: Vec<Node>) -> Self {
        Self {
            value,
            sourcepos,
            children,
        }
    }

    pub fn text(text: impl Into<String>, sourcepos: Sourcepos) -> Self {
        Self::new(NodeValue::Text(text.into()), sourcepos)
    }

    pub fn kind(&self) -> NodeKind {
        self.value.kind()
    }

    /// Pre-order iterator over this node and all of its descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Plain text content: literals, inline HTML included, are concatenated
    /// and both kinds of line break contribute a single space.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Check if this node renders to nothing visible
    pub fn is_blank(&self) -> bool {
        match &self.value {
            NodeValue::Text(text) => text.trim().is_empty(),
            NodeValue::ThematicBreak
            | NodeValue::Image(_)
            | NodeValue::LineBreak
            | NodeValue::TaskListMarker(_)
            | NodeValue::FootnoteReference(_) => false,
            NodeValue::CodeBlock(code) => code.literal.trim().is_empty(),
            NodeValue::Html(html) => html.literal.trim().is_empty(),
            NodeValue::Code(code) => code.literal.is_empty(),
            NodeValue::RawInline(html) => html.trim().is_empty(),
            NodeValue::AutoLink(_) => false,
            _ => self.children.iter().all(Node::is_blank),
        }
    }
}

fn collect_text(node: &Node, out: &mut String) {
    match &node.value {
        NodeValue::Text(text) => out.push_str(text),
        NodeValue::Code(code) => out.push_str(&code.literal),
        NodeValue::RawInline(html) => out.push_str(html),
        NodeValue::AutoLink(link) => out.push_str(&link.label),
        NodeValue::SoftBreak | NodeValue::LineBreak => out.push(' '),
        _ => {
            for child in &node.children {
                collect_text(child, out);
            }
        }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A parsed document: the root node plus the extensions that shaped it.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Node,
    pub extensions: Vec<Extension>,
}

impl Document {
    pub fn new(root: Node, extensions: Vec<Extension>) -> Self {
        Self { root, extensions }
    }

    pub fn has_extension(&self, extension: Extension) -> bool {
        self.extensions.contains(&extension)
    }

    /// Every link destination and title in document order. Autolinks report
    /// an empty title.
    pub fn links(&self) -> Vec<(String, String)> {
        self.root
            .descendants()
            .filter_map(|node| match &node.value {
                NodeValue::Link(link) => Some((link.url.clone(), link.title.clone())),
                NodeValue::AutoLink(link) => Some((link.url.clone(), String::new())),
                _ => None,
            })
            .collect()
    }

    /// Rewrite link and autolink destinations found in `replacements`,
    /// returning how many changed. An autolink showing its old URL shows the
    /// new one. Images are left alone.
    pub fn update_links(&mut self, replacements: &HashMap<String, String>) -> usize {
        let mut updated = 0;
        let mut stack = vec![&mut self.root];
        while let Some(node) = stack.pop() {
            match &mut node.value {
                NodeValue::Link(link) => {
                    if let Some(url) = replacements.get(&link.url) {
                        link.url.clone_from(url);
                        updated += 1;
                    }
                }
                NodeValue::AutoLink(link) => {
                    if let Some(url) = replacements.get(&link.url) {
                        if link.label == link.url {
                            link.label.clone_from(url);
                        }
                        link.url.clone_from(url);
                        // The label no longer derives the destination
                        link.kind = AutoLinkKind::Uri;
                        updated += 1;
                    }
                }
                _ => {}
            }
            stack.extend(node.children.iter_mut());
        }
        updated
    }

    /// Plain text of the first level 1 or 2 heading.
    pub fn title(&self) -> Option<String> {
        self.root
            .descendants()
            .find(|node| matches!(&node.value, NodeValue::Heading(h) if h.level <= 2))
            .map(Node::text_content)
    }

    /// Plain text of the first paragraph.
    pub fn excerpt(&self) -> Option<String> {
        self.root
            .descendants()
            .find(|node| node.kind() == NodeKind::Paragraph)
            .map(Node::text_content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> Sourcepos {
        Sourcepos::new(1, 1, 1, 1)
    }

    fn link(url: &str, label: &str) -> Node {
        Node::with_children(
            NodeValue::Link(NodeLink {
                url: url.to_string(),
                title: String::new(),
            }),
            pos(),
            vec![Node::text(label, pos())],
        )
    }

    fn sample() -> Document {
        let heading = Node::with_children(
            NodeValue::Heading(NodeHeading {
                level: 2,
                setext: false,
            }),
            pos(),
            vec![
                Node::text("Hello ", pos()),
                Node::with_children(NodeValue::Emphasis, pos(), vec![Node::text("World", pos())]),
            ],
        );
        let paragraph = Node::with_children(
            NodeValue::Paragraph,
            pos(),
            vec![
                Node::text("See", pos()),
                Node::new(NodeValue::SoftBreak, pos()),
                link("a.html", "here"),
                Node::text(" and ", pos()),
                link("b.html", "there"),
            ],
        );
        Document::new(
            Node::with_children(NodeValue::Document, pos(), vec![heading, paragraph]),
            Vec::new(),
        )
    }

    #[test]
    fn test_descendants_preorder() {
        let doc = sample();
        let kinds: Vec<NodeKind> = doc.root.descendants().map(Node::kind).take(5).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Document,
                NodeKind::Heading,
                NodeKind::Text,
                NodeKind::Emphasis,
                NodeKind::Text
            ]
        );
    }

    #[test]
    fn test_title_and_excerpt() {
        let doc = sample();
        assert_eq!(doc.title().as_deref(), Some("Hello World"));
        assert_eq!(doc.excerpt().as_deref(), Some("See here and there"));
    }

    #[test]
    fn test_links_and_update() {
        let mut doc = sample();
        assert_eq!(
            doc.links(),
            vec![
                ("a.html".to_string(), String::new()),
                ("b.html".to_string(), String::new())
            ]
        );

        let mut map = HashMap::new();
        map.insert("b.html".to_string(), "/b/".to_string());
        assert_eq!(doc.update_links(&map), 1);
        assert_eq!(doc.links()[1].0, "/b/");
        assert_eq!(doc.links()[0].0, "a.html");
    }

    #[test]
    fn test_update_autolinks() {
        let autolink = |url: &str, label: &str, kind| {
            Node::new(
                NodeValue::AutoLink(NodeAutoLink {
                    url: url.to_string(),
                    label: label.to_string(),
                    kind,
                }),
                pos(),
            )
        };
        let paragraph = Node::with_children(
            NodeValue::Paragraph,
            pos(),
            vec![
                autolink("http://old.example", "http://old.example", AutoLinkKind::Uri),
                autolink("http://www.old.example", "www.old.example", AutoLinkKind::Www),
            ],
        );
        let mut doc = Document::new(
            Node::with_children(NodeValue::Document, pos(), vec![paragraph]),
            Vec::new(),
        );

        let mut map = HashMap::new();
        map.insert("http://old.example".to_string(), "https://new.example".to_string());
        map.insert("http://www.old.example".to_string(), "https://www.new.example".to_string());
        assert_eq!(doc.update_links(&map), 2);

        let links: Vec<&NodeAutoLink> = doc
            .root
            .descendants()
            .filter_map(|node| match &node.value {
                NodeValue::AutoLink(link) => Some(link),
                _ => None,
            })
            .collect();
        assert_eq!(links[0].url, "https://new.example");
        assert_eq!(links[0].label, "https://new.example");
        assert_eq!(links[1].url, "https://www.new.example");
        assert_eq!(links[1].label, "www.old.example");
        assert_eq!(links[1].kind, AutoLinkKind::Uri);
    }

    #[test]
    fn test_text_content_keeps_inline_html() {
        let paragraph = Node::with_children(
            NodeValue::Paragraph,
            pos(),
            vec![
                Node::text("a ", pos()),
                Node::new(NodeValue::RawInline("<kbd>".to_string()), pos()),
                Node::text("b", pos()),
                Node::new(NodeValue::RawInline("</kbd>".to_string()), pos()),
            ],
        );
        assert_eq!(paragraph.text_content(), "a <kbd>b</kbd>");
    }

    #[test]
    fn test_container_kinds() {
        assert!(NodeValue::Strong.is_container());
        assert!(!NodeValue::Text(String::new()).is_container());
        assert!(!NodeValue::TaskListMarker(true).is_container());
        assert!(NodeValue::TableCell.is_block());
        assert!(!NodeValue::SoftBreak.is_block());

        let definition = NodeValue::FootnoteDefinition(NodeFootnoteDefinition::default());
        assert!(definition.is_block() && definition.is_container());
        let reference = NodeValue::FootnoteReference(NodeFootnoteReference::default());
        assert!(!reference.is_block() && !reference.is_container());
    }

    #[test]
    fn test_sourcepos_display() {
        assert_eq!(Sourcepos::new(1, 2, 3, 4).to_string(), "1:2-3:4");
    }
}
