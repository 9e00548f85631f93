//! # gfmark
//!
//! Parse CommonMark with the GitHub Flavored Markdown extensions.
//!
//! The parser turns any byte sequence into a [`Document`]: there are no
//! syntax errors in Markdown, only text that did not turn out to be markup.
//! Rendering lives in `gfmark-core` and is re-exported here.
//!
//! ## Design
//!
//! Parsing runs in two phases:
//!
//! - **Blocks**: lines are fed one at a time into a tree of open containers
//!   (block quotes, list items) and leaves (paragraphs, code, tables).
//!   Link reference definitions are collected as paragraphs close.
//! - **Inlines**: once the block tree is complete, the text of every
//!   paragraph, heading and table cell is parsed for emphasis, links, code
//!   spans and the rest, with all definitions already known.
//!
//! GFM extensions plug into fixed points of both phases and are enabled per
//! [`Parser`] through [`ParseOptions::extensions`].
//!
//! ## Example
//!
//! ```rust
//! use gfmark::{markdown_to_html, ParseOptions, RenderOptions};
//!
//! let html = markdown_to_html(
//!     "Hello *world*",
//!     &ParseOptions::default(),
//!     &RenderOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(html, "<p>Hello <em>world</em></p>\n");
//! ```
//!
//! ## Example (GFM)
//!
//! ```rust
//! use gfmark::{Format, Parser, RenderOptions};
//!
//! let parser = Parser::gfm();
//! let doc = parser.parse_str("- [x] done ~~maybe~~");
//! let html = gfmark::render(&doc, Format::Html, &RenderOptions::default());
//! assert!(html.contains("<input type=\"checkbox\" checked=\"\" disabled=\"\" />"));
//! assert!(html.contains("<del>maybe</del>"));
//! ```

mod blocks;
mod extensions;
mod inlines;
mod options;
mod parser;
pub mod references;
pub mod scanner;

pub use gfmark_core::{
    ast, escape_attribute, escape_href, escape_html, render, AutoLinkKind, Document, Error,
    Extension, Format, LineColumn, ListDelimType, ListType, Node, NodeAutoLink, NodeCode,
    NodeCodeBlock, NodeHeading, NodeHtmlBlock, NodeKind, NodeLink, NodeList, NodeTable, NodeValue,
    RenderOptions, Result, Sourcepos, TableAlignment,
};
pub use options::ParseOptions;
pub use parser::Parser;

/// Parse a document with the given options.
///
/// Input is taken as bytes; invalid UTF-8 is replaced unless
/// [`ParseOptions::strict_utf8`] is set.
pub fn parse(input: impl AsRef<[u8]>, options: &ParseOptions) -> Result<Document> {
    Parser::new(options.clone())?.parse(input.as_ref())
}

/// Parse `input` and render it to HTML
pub fn markdown_to_html(
    input: &str,
    options: &ParseOptions,
    render_options: &RenderOptions,
) -> Result<String> {
    let doc = Parser::new(options.clone())?.parse_str(input);
    Ok(render(&doc, Format::Html, render_options))
}

/// Parse `input` and render it back to normalised CommonMark
pub fn markdown_to_commonmark(
    input: &str,
    options: &ParseOptions,
    render_options: &RenderOptions,
) -> Result<String> {
    let doc = Parser::new(options.clone())?.parse_str(input);
    Ok(render(&doc, Format::CommonMark, render_options))
}
