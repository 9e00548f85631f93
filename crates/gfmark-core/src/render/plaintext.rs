//! Plain text renderer
//!
//! Strips all markup, keeping the text content with block structure
//! expressed through line breaks and list markers. Raw HTML is dropped.

use crate::ast::{Document, ListDelimType, ListType, Node, NodeValue};
use crate::options::RenderOptions;
use crate::render::Writer;

/// Render a document as plain text
pub fn render_plaintext(doc: &Document, options: &RenderOptions) -> String {
    let mut renderer = PlainTextRenderer {
        w: Writer::new(),
        options,
        footnote_ix: 0,
    };
    renderer.render_blocks(&doc.root.children, false);
    renderer.w.finish()
}

struct PlainTextRenderer<'a> {
    w: Writer,
    options: &'a RenderOptions,
    footnote_ix: usize,
}

impl PlainTextRenderer<'_> {
    fn render_blocks(&mut self, blocks: &[Node], tight: bool) {
        for block in blocks {
            self.w.cr(if tight { 1 } else { 2 });
            self.render_block(block);
        }
    }

    fn render_block(&mut self, node: &Node) {
        match &node.value {
            NodeValue::Document | NodeValue::BlockQuote => {
                self.render_blocks(&node.children, false)
            }

            NodeValue::Paragraph | NodeValue::Heading(_) => self.render_inlines(node),

            NodeValue::CodeBlock(code) => self.w.write(code.literal.trim_end_matches('\n')),

            NodeValue::Html(_) | NodeValue::ThematicBreak => {}

            NodeValue::List(list) => {
                for (i, item) in node.children.iter().enumerate() {
                    if i > 0 {
                        self.w.cr(if list.tight { 1 } else { 2 });
                    }
                    let marker = match list.list_type {
                        ListType::Bullet => "-".to_string(),
                        ListType::Ordered => {
                            let delimiter = match list.delimiter {
                                ListDelimType::Period => '.',
                                ListDelimType::Paren => ')',
                            };
                            format!("{}{}", list.start + i, delimiter)
                        }
                    };
                    self.w.write(&marker);
                    self.w.write(" ");
                    let saved = self.w.push_prefix(&" ".repeat(marker.len() + 1));
                    self.w.item_start = true;
                    self.render_blocks(&item.children, list.tight);
                    self.w.restore_prefix(saved);
                    self.w.item_start = false;
                }
            }

            NodeValue::Table(_) => {
                for (r, row) in node.children.iter().enumerate() {
                    if r > 0 {
                        self.w.line_break();
                    }
                    for (c, cell) in row.children.iter().enumerate() {
                        if c > 0 {
                            self.w.write(" | ");
                        }
                        self.render_inlines(cell);
                    }
                }
            }

            // Numbered the way its references show, e.g. `[1] text`
            NodeValue::FootnoteDefinition(_) => {
                self.footnote_ix += 1;
                let marker = format!("[{}]", self.footnote_ix);
                self.w.write(&marker);
                self.w.write(" ");
                let saved = self.w.push_prefix(&" ".repeat(marker.len() + 1));
                self.w.item_start = true;
                self.render_blocks(&node.children, false);
                self.w.restore_prefix(saved);
                self.w.item_start = false;
            }

            _ => self.render_inline(node),
        }
    }

    fn render_inlines(&mut self, node: &Node) {
        for child in &node.children {
            self.render_inline(child);
        }
    }

    fn render_inline(&mut self, node: &Node) {
        match &node.value {
            NodeValue::Text(text) => self.w.write(text),
            NodeValue::Code(code) => self.w.write(&code.literal),
            NodeValue::AutoLink(link) => self.w.write(&link.label),
            NodeValue::SoftBreak => {
                if self.options.soft_break_as_space {
                    self.w.write_char(' ');
                } else {
                    self.w.line_break();
                }
            }
            NodeValue::LineBreak => self.w.line_break(),
            NodeValue::RawInline(_) => {}
            NodeValue::TaskListMarker(checked) => {
                self.w.write(if *checked { "[x] " } else { "[ ] " });
                self.w.item_start = true;
            }
            NodeValue::FootnoteReference(reference) => {
                self.w.write(&format!("[{}]", reference.ix));
            }
            _ => self.render_inlines(node),
        }
    }
}
