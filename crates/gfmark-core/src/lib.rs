//! gfmark-core - Markdown AST and renderers
//!
//! This crate provides the document model produced by the `gfmark` parser and
//! the tree-walking renderers that turn it back into text.
//!
//! # Architecture
//!
//! ```text
//!                          ┌──────────────┐ ──html────▶ HTML String
//! gfmark::parse ─────────▶ │ Markdown AST │ ──cmark───▶ CommonMark String
//!                          └──────────────┘ ──text────▶ Plain text
//! ```
//!
//! # Example
//!
//! ```rust
//! use gfmark_core::{render, Document, Format, Node, NodeValue, RenderOptions, Sourcepos};
//!
//! let pos = Sourcepos::default();
//! let root = Node::with_children(
//!     NodeValue::Document,
//!     pos,
//!     vec![Node::with_children(
//!         NodeValue::Paragraph,
//!         pos,
//!         vec![
//!             Node::text("This is ", pos),
//!             Node::with_children(NodeValue::Strong, pos, vec![Node::text("bold", pos)]),
//!         ],
//!     )],
//! );
//!
//! let doc = Document::new(root, Vec::new());
//! let html = render(&doc, Format::Html, &RenderOptions::default());
//! assert_eq!(html, "<p>This is <strong>bold</strong></p>\n");
//! ```

pub mod ast;
mod escape;
mod options;
pub mod render;

pub use ast::{
    AutoLinkKind, Document, LineColumn, ListDelimType, ListType, Node, NodeAutoLink, NodeCode,
    NodeCodeBlock, NodeFootnoteDefinition, NodeFootnoteReference, NodeHeading, NodeHtmlBlock,
    NodeKind, NodeLink, NodeList, NodeTable, NodeValue, Sourcepos, TableAlignment,
};
pub use escape::{escape_attribute, escape_href, escape_html};
pub use options::{Extension, Format, RenderOptions};
pub use render::render;

/// Error type for gfmark operations
///
/// There is deliberately no syntax error: every byte sequence parses to
/// some document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid UTF-8 at byte offset {offset}")]
    Encoding { offset: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
