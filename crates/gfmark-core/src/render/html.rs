//! HTML renderer
//!
//! Output follows the reference CommonMark/GFM HTML conventions: one block
//! element per line, `<hr />` and `<br />` self-closing tags, and paragraph
//! tags omitted inside tight list items.

use crate::ast::{
    Document, ListType, Node, NodeCodeBlock, NodeFootnoteDefinition, NodeLink, NodeValue,
    TableAlignment,
};
use crate::escape::{filter_tags, push_escaped_href, push_escaped_html};
use crate::options::{Extension, RenderOptions};

/// Render a document to HTML
pub fn render_html(doc: &Document, options: &RenderOptions) -> String {
    let mut renderer = HtmlRenderer {
        out: String::with_capacity(4096),
        options,
        tagfilter: doc.has_extension(Extension::TagFilter),
        footnote_ix: 0,
    };
    renderer.render_block(&doc.root, false);
    renderer.out
}

struct HtmlRenderer<'a> {
    out: String,
    options: &'a RenderOptions,
    tagfilter: bool,
    /// Footnote definitions rendered so far; the section is open when set
    footnote_ix: usize,
}

impl HtmlRenderer<'_> {
    fn cr(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn text(&mut self, text: &str) {
        push_escaped_html(&mut self.out, text, false);
    }

    fn attr(&mut self, text: &str) {
        push_escaped_html(&mut self.out, text, true);
    }

    fn sourcepos(&mut self, node: &Node) {
        if self.options.sourcepos {
            self.out.push_str(" data-sourcepos=\"");
            self.out.push_str(&node.sourcepos.to_string());
            self.out.push('"');
        }
    }

    fn raw_html(&mut self, html: &str) {
        if !self.options.unsafe_raw_html {
            self.text(html);
        } else if self.tagfilter {
            self.out.push_str(&filter_tags(html));
        } else {
            self.out.push_str(html);
        }
    }

    fn render_children(&mut self, node: &Node, tight: bool) {
        for child in &node.children {
            self.render_block(child, tight);
        }
    }

    /// `tight` is set for the children of an item in a tight list.
    fn render_block(&mut self, node: &Node, tight: bool) {
        match &node.value {
            NodeValue::Document => {
                self.render_children(node, false);
                if self.footnote_ix > 0 {
                    self.out.push_str("</ol>\n</section>\n");
                }
            }

            NodeValue::BlockQuote => {
                self.cr();
                self.out.push_str("<blockquote");
                self.sourcepos(node);
                self.out.push_str(">\n");
                self.render_children(node, false);
                self.cr();
                self.out.push_str("</blockquote>\n");
            }

            NodeValue::List(list) => {
                let tag = match list.list_type {
                    ListType::Bullet => "ul",
                    ListType::Ordered => "ol",
                };
                self.cr();
                self.out.push('<');
                self.out.push_str(tag);
                if tag == "ol" && list.start != 1 {
                    self.out.push_str(&format!(" start=\"{}\"", list.start));
                }
                self.sourcepos(node);
                self.out.push_str(">\n");
                self.render_children(node, list.tight);
                self.cr();
                self.out.push_str("</");
                self.out.push_str(tag);
                self.out.push_str(">\n");
            }

            NodeValue::Item(_) => {
                self.cr();
                self.out.push_str("<li");
                self.sourcepos(node);
                self.out.push('>');
                self.render_children(node, tight);
                self.out.push_str("</li>\n");
            }

            NodeValue::CodeBlock(code) => self.render_code_block(node, code),

            NodeValue::Html(html) => {
                self.cr();
                self.raw_html(&html.literal);
                self.cr();
            }

            NodeValue::Paragraph => {
                if tight {
                    self.render_inlines(node);
                } else {
                    self.cr();
                    self.out.push_str("<p");
                    self.sourcepos(node);
                    self.out.push('>');
                    self.render_inlines(node);
                    self.out.push_str("</p>\n");
                }
            }

            NodeValue::Heading(heading) => {
                self.cr();
                self.out.push_str(&format!("<h{}", heading.level));
                self.sourcepos(node);
                self.out.push('>');
                self.render_inlines(node);
                self.out.push_str(&format!("</h{}>\n", heading.level));
            }

            NodeValue::ThematicBreak => {
                self.cr();
                self.out.push_str("<hr");
                self.sourcepos(node);
                self.out.push_str(" />\n");
            }

            NodeValue::Table(table) => self.render_table(node, &table.alignments),

            NodeValue::FootnoteDefinition(def) => self.render_footnote_definition(node, def),

            // Rows and cells only appear under a table; anything else is inline
            _ => self.render_inline(node),
        }
    }

    fn render_code_block(&mut self, node: &Node, code: &NodeCodeBlock) {
        self.cr();
        self.out.push_str("<pre");
        self.sourcepos(node);
        self.out.push_str("><code");
        let info = code.info.trim();
        if let Some(lang) = info.split_whitespace().next() {
            self.out.push_str(" class=\"language-");
            self.attr(lang);
            self.out.push('"');
            let meta = info[lang.len()..].trim();
            if self.options.full_info_string && !meta.is_empty() {
                self.out.push_str(" data-meta=\"");
                self.attr(meta);
                self.out.push('"');
            }
        }
        self.out.push('>');
        self.text(&code.literal);
        self.out.push_str("</code></pre>\n");
    }

    fn render_table(&mut self, node: &Node, alignments: &[TableAlignment]) {
        self.cr();
        self.out.push_str("<table");
        self.sourcepos(node);
        self.out.push_str(">\n");

        let mut in_body = false;
        for row in &node.children {
            let header = matches!(row.value, NodeValue::TableRow(true));
            if header {
                self.out.push_str("<thead>\n");
            } else if !in_body {
                self.out.push_str("<tbody>\n");
                in_body = true;
            }

            self.out.push_str("<tr");
            self.sourcepos(row);
            self.out.push_str(">\n");
            let tag = if header { "th" } else { "td" };
            for (column, cell) in row.children.iter().enumerate() {
                self.out.push('<');
                self.out.push_str(tag);
                let align = alignments.get(column).and_then(TableAlignment::as_str);
                if let Some(align) = align {
                    if self.options.table_prefer_style_attributes {
                        self.out.push_str(&format!(" style=\"text-align: {align}\""));
                    } else {
                        self.out.push_str(&format!(" align=\"{align}\""));
                    }
                }
                self.sourcepos(cell);
                self.out.push('>');
                self.render_inlines(cell);
                self.out.push_str("</");
                self.out.push_str(tag);
                self.out.push_str(">\n");
            }
            self.out.push_str("</tr>\n");

            if header {
                self.out.push_str("</thead>\n");
            }
        }

        if in_body {
            self.out.push_str("</tbody>\n");
        }
        self.out.push_str("</table>\n");
    }

    fn render_footnote_definition(&mut self, node: &Node, def: &NodeFootnoteDefinition) {
        self.cr();
        if self.footnote_ix == 0 {
            self.out
                .push_str("<section class=\"footnotes\" data-footnotes>\n<ol>\n");
        }
        self.footnote_ix += 1;
        let ix = self.footnote_ix;

        self.out.push_str("<li id=\"fn-");
        push_escaped_href(&mut self.out, &def.name);
        self.out.push('"');
        self.sourcepos(node);
        self.out.push_str(">\n");

        // Backlinks go at the end of a trailing paragraph, else on their own line
        match node.children.split_last() {
            Some((last, rest)) if matches!(last.value, NodeValue::Paragraph) => {
                for child in rest {
                    self.render_block(child, false);
                }
                self.cr();
                self.out.push_str("<p");
                self.sourcepos(last);
                self.out.push('>');
                self.render_inlines(last);
                self.out.push(' ');
                self.footnote_backrefs(def, ix);
                self.out.push_str("</p>\n");
            }
            _ => {
                self.render_children(node, false);
                self.cr();
                self.footnote_backrefs(def, ix);
                self.out.push('\n');
            }
        }
        self.out.push_str("</li>\n");
    }

    fn footnote_backrefs(&mut self, def: &NodeFootnoteDefinition, ix: usize) {
        for ref_num in 1..=def.total_references.max(1) {
            let suffix = if ref_num > 1 {
                format!("-{ref_num}")
            } else {
                String::new()
            };
            if ref_num > 1 {
                self.out.push(' ');
            }
            self.out.push_str("<a href=\"#fnref-");
            push_escaped_href(&mut self.out, &def.name);
            self.out.push_str(&format!(
                "{suffix}\" class=\"footnote-backref\" data-footnote-backref \
                 data-footnote-backref-idx=\"{ix}{suffix}\" \
                 aria-label=\"Back to reference {ix}{suffix}\">\u{21a9}"
            ));
            if ref_num > 1 {
                self.out
                    .push_str(&format!("<sup class=\"footnote-ref\">{ref_num}</sup>"));
            }
            self.out.push_str("</a>");
        }
    }

    fn render_inlines(&mut self, node: &Node) {
        for child in &node.children {
            self.render_inline(child);
        }
    }

    fn render_inline(&mut self, node: &Node) {
        match &node.value {
            NodeValue::Text(text) => self.text(text),

            NodeValue::SoftBreak => {
                if self.options.soft_break_as_space {
                    self.out.push(' ');
                } else {
                    self.out.push('\n');
                }
            }

            NodeValue::LineBreak => self.out.push_str("<br />\n"),

            NodeValue::Code(code) => {
                self.out.push_str("<code>");
                self.text(&code.literal);
                self.out.push_str("</code>");
            }

            NodeValue::Emphasis => self.wrap_inlines(node, "em"),
            NodeValue::Strong => self.wrap_inlines(node, "strong"),
            NodeValue::Strikethrough => self.wrap_inlines(node, "del"),

            NodeValue::Link(link) => {
                self.out.push_str("<a href=\"");
                push_escaped_href(&mut self.out, &link.url);
                self.out.push('"');
                self.title(link);
                self.out.push('>');
                self.render_inlines(node);
                self.out.push_str("</a>");
            }

            NodeValue::Image(link) => {
                self.out.push_str("<img src=\"");
                push_escaped_href(&mut self.out, &link.url);
                self.out.push_str("\" alt=\"");
                self.attr(&node.text_content());
                self.out.push('"');
                self.title(link);
                self.out.push_str(" />");
            }

            NodeValue::RawInline(html) => self.raw_html(html),

            NodeValue::AutoLink(link) => {
                self.out.push_str("<a href=\"");
                push_escaped_href(&mut self.out, &link.url);
                self.out.push_str("\">");
                self.text(&link.label);
                self.out.push_str("</a>");
            }

            NodeValue::TaskListMarker(checked) => {
                if *checked {
                    self.out
                        .push_str("<input type=\"checkbox\" checked=\"\" disabled=\"\" /> ");
                } else {
                    self.out.push_str("<input type=\"checkbox\" disabled=\"\" /> ");
                }
            }

            NodeValue::FootnoteReference(reference) => {
                self.out.push_str("<sup class=\"footnote-ref\"><a href=\"#fn-");
                push_escaped_href(&mut self.out, &reference.name);
                self.out.push_str("\" id=\"fnref-");
                push_escaped_href(&mut self.out, &reference.name);
                if reference.ref_num > 1 {
                    self.out.push_str(&format!("-{}", reference.ref_num));
                }
                self.out
                    .push_str(&format!("\" data-footnote-ref>{}</a></sup>", reference.ix));
            }

            _ => self.render_inlines(node),
        }
    }

    fn wrap_inlines(&mut self, node: &Node, tag: &str) {
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push('>');
        self.render_inlines(node);
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }

    fn title(&mut self, link: &NodeLink) {
        if !link.title.is_empty() {
            self.out.push_str(" title=\"");
            self.attr(&link.title);
            self.out.push('"');
        }
    }
}
