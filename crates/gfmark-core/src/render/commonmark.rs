//! CommonMark serialization
//!
//! Converts a document back into normalised Markdown text. The output is
//! chosen so that parsing it again yields the same tree: code blocks are
//! always fenced, headings are always ATX, and every character that could
//! start a construct is backslash-escaped.

use crate::ast::{
    AutoLinkKind, Document, ListDelimType, ListType, Node, NodeCode, NodeCodeBlock, NodeLink,
    NodeList, NodeValue, TableAlignment,
};
use crate::options::{Extension, RenderOptions};
use crate::render::Writer;

/// Serialize a document to CommonMark
pub fn render_commonmark(doc: &Document, options: &RenderOptions) -> String {
    let mut renderer = CommonMarkRenderer {
        w: Writer::new(),
        options,
        escape_pipes: doc.has_extension(Extension::Table),
        in_table: false,
        in_heading: false,
        enclosing: None,
    };
    renderer.render_blocks(&doc.root.children, false);
    renderer.w.finish()
}

struct CommonMarkRenderer<'a> {
    w: Writer,
    options: &'a RenderOptions,
    escape_pipes: bool,
    in_table: bool,
    in_heading: bool,
    /// Set while rendering the children of an emphasis
    enclosing: Option<Enclosing>,
}

/// Delimiter chosen for one emphasis node
#[derive(Clone, Copy)]
struct Delimiter {
    ch: char,
    /// An alphanumeric sits right before the opening run
    open_alnum: bool,
    /// An alphanumeric sits right after the closing run
    close_alnum: bool,
}

/// The emphasis around the inlines being rendered. Children touching one of
/// its runs must use the other character where the outside allows it.
#[derive(Clone, Copy)]
struct Enclosing {
    ch: char,
    at_start: bool,
    at_end: bool,
}

impl CommonMarkRenderer<'_> {
    fn render_blocks(&mut self, blocks: &[Node], tight: bool) {
        let mut previous: Option<&Node> = None;
        for block in blocks {
            // Two adjacent lists of the same type would merge; vary the marker
            let alternate = match (previous.map(|p| &p.value), &block.value) {
                (Some(NodeValue::List(a)), NodeValue::List(b)) => a.list_type == b.list_type,
                _ => false,
            };
            self.w.cr(if tight { 1 } else { 2 });
            self.render_block(block, alternate);
            previous = Some(block);
        }
    }

    fn render_block(&mut self, node: &Node, alternate: bool) {
        match &node.value {
            NodeValue::Document => self.render_blocks(&node.children, false),

            NodeValue::Paragraph => self.render_inlines(&node.children),

            NodeValue::Heading(heading) => {
                self.w.write(&"#".repeat(heading.level as usize));
                if !node.children.is_empty() {
                    self.w.write(" ");
                    self.in_heading = true;
                    self.render_inlines(&node.children);
                    self.in_heading = false;
                }
            }

            NodeValue::ThematicBreak => self.w.write("___"),

            NodeValue::CodeBlock(code) => self.render_code_block(code),

            NodeValue::Html(html) => self.w.write(html.literal.trim_end_matches('\n')),

            NodeValue::BlockQuote => {
                if node.children.is_empty() {
                    self.w.write(">");
                    return;
                }
                self.w.write("> ");
                let saved = self.w.push_prefix("> ");
                self.w.item_start = true;
                self.render_blocks(&node.children, false);
                self.w.restore_prefix(saved);
                self.w.item_start = false;
            }

            NodeValue::List(list) => self.render_list(node, list, alternate),

            NodeValue::Table(table) => self.render_table(node, &table.alignments),

            NodeValue::FootnoteDefinition(def) => {
                self.w.write("[^");
                self.w.write(&def.name);
                self.w.write("]:");
                if node.children.is_empty() {
                    return;
                }
                self.w.write(" ");
                let saved = self.w.push_prefix("    ");
                self.w.item_start = true;
                self.render_blocks(&node.children, false);
                self.w.restore_prefix(saved);
                self.w.item_start = false;
            }

            // Inline content in block position, e.g. a lone task marker
            _ => self.render_inline(node),
        }
    }

    fn render_list(&mut self, node: &Node, list: &NodeList, alternate: bool) {
        let tight = list.tight;
        let bullet = if alternate { '*' } else { '-' };
        let delimiter = match (list.delimiter, alternate) {
            (ListDelimType::Period, false) | (ListDelimType::Paren, true) => '.',
            _ => ')',
        };

        for (i, item) in node.children.iter().enumerate() {
            if i > 0 {
                self.w.cr(if tight { 1 } else { 2 });
            }
            let marker = match list.list_type {
                ListType::Bullet => bullet.to_string(),
                ListType::Ordered => format!("{}{}", list.start + i, delimiter),
            };

            if item.children.is_empty() {
                self.w.write(&marker);
                continue;
            }

            self.w.write(&marker);
            self.w.write(" ");
            let saved = self.w.push_prefix(&" ".repeat(marker.len() + 1));
            self.w.item_start = true;

            let mut children = item.children.as_slice();
            if let Some((first, rest)) = children.split_first() {
                if let NodeValue::TaskListMarker(checked) = first.value {
                    self.w.write(if checked { "[x] " } else { "[ ] " });
                    self.w.item_start = true;
                    children = rest;
                }
            }
            self.render_blocks(children, tight);

            self.w.restore_prefix(saved);
            self.w.item_start = false;
        }
    }

    fn render_code_block(&mut self, code: &NodeCodeBlock) {
        let info = code.info.trim();
        let fence_char = if info.contains('`') { '~' } else { '`' };
        let longest = longest_run(&code.literal, fence_char);
        let fence = fence_char.to_string().repeat((longest + 1).max(3));

        self.w.write(&fence);
        self.w.write(info);
        self.w.line_break();
        if !code.literal.is_empty() {
            self.w.write(&code.literal);
            if !code.literal.ends_with('\n') {
                self.w.line_break();
            }
        }
        self.w.write(&fence);
    }

    fn render_table(&mut self, node: &Node, alignments: &[TableAlignment]) {
        let col_count = alignments.len();
        if col_count == 0 {
            return;
        }

        let mut rows: Vec<Vec<String>> = Vec::with_capacity(node.children.len());
        for row in &node.children {
            let mut cells = Vec::with_capacity(col_count);
            for cell in row.children.iter().take(col_count) {
                cells.push(self.render_cell(cell));
            }
            cells.resize(col_count, String::new());
            rows.push(cells);
        }

        // Minimum width of 3 for the delimiter row
        let mut widths = vec![3usize; col_count];
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        for (r, row) in rows.iter().enumerate() {
            if r > 0 {
                self.w.line_break();
            }
            self.write_row(row, &widths);
            if r == 0 {
                self.w.line_break();
                let delimiters: Vec<String> = alignments
                    .iter()
                    .zip(&widths)
                    .map(|(align, &width)| delimiter_cell(*align, width))
                    .collect();
                self.write_row(&delimiters, &widths);
            }
        }
    }

    fn write_row(&mut self, cells: &[String], widths: &[usize]) {
        let mut line = String::from("|");
        for (cell, &width) in cells.iter().zip(widths) {
            line.push(' ');
            line.push_str(cell);
            let padding = width.saturating_sub(cell.chars().count());
            line.extend(std::iter::repeat(' ').take(padding));
            line.push_str(" |");
        }
        self.w.write(&line);
    }

    fn render_cell(&mut self, cell: &Node) -> String {
        let saved = std::mem::replace(&mut self.w, Writer::new());
        self.in_table = true;
        self.render_inlines(&cell.children);
        self.in_table = false;
        std::mem::replace(&mut self.w, saved).into_inner()
    }

    fn render_inlines(&mut self, inlines: &[Node]) {
        let enclosing = self.enclosing.take();
        let mut run: Vec<Delimiter> = Vec::new();

        for (i, inline) in inlines.iter().enumerate() {
            match &inline.value {
                NodeValue::Text(text) => {
                    let next_is_bracket = matches!(
                        inlines.get(i + 1).map(|n| &n.value),
                        Some(NodeValue::Link(_))
                            | Some(NodeValue::Image(_))
                            | Some(NodeValue::FootnoteReference(_))
                    );
                    self.write_text(text, next_is_bracket);
                }
                NodeValue::Emphasis | NodeValue::Strong => {
                    if run.is_empty() {
                        run = self.emphasis_run(inlines, i, enclosing);
                        run.reverse();
                    }
                    let delimiter = run.pop().unwrap_or(Delimiter {
                        ch: '*',
                        open_alnum: false,
                        close_alnum: false,
                    });
                    self.wrap_emphasis(inline, delimiter);
                }
                _ => self.render_inline(inline),
            }
        }
    }

    /// Pick `*` or `_` for each node in the run of adjacent emphasis nodes
    /// starting at `start`.
    ///
    /// Neighbours alternate so their delimiter runs never merge, `_` stays
    /// away from alphanumerics where it could neither open nor close, and a
    /// run touching the enclosing emphasis avoids its character. Nodes that
    /// themselves start or end with emphasis take `_` when they can, leaving
    /// `*` free for their children.
    fn emphasis_run(
        &self,
        inlines: &[Node],
        start: usize,
        enclosing: Option<Enclosing>,
    ) -> Vec<Delimiter> {
        let len = inlines[start..].iter().take_while(|n| is_emphasis(n)).count();
        let end = start + len;
        let nodes = &inlines[start..end];

        let before_alnum = self.w.last_char().is_some_and(char::is_alphanumeric);
        let after_alnum = inlines[end..]
            .iter()
            .find(|n| !matches!(&n.value, NodeValue::Text(t) if t.is_empty()))
            .and_then(|n| match &n.value {
                NodeValue::Text(t) => t.chars().next(),
                _ => None,
            })
            .is_some_and(char::is_alphanumeric);
        let avoid_first = enclosing.filter(|e| e.at_start && start == 0).map(|e| e.ch);
        let avoid_last = enclosing
            .filter(|e| e.at_end && end == inlines.len())
            .map(|e| e.ch);

        let alternate = |first: char| -> Vec<char> {
            let second = if first == '*' { '_' } else { '*' };
            (0..len).map(|i| if i % 2 == 0 { first } else { second }).collect()
        };
        let flanks = |chars: &[char]| {
            !(chars[0] == '_' && before_alnum) && !(chars[len - 1] == '_' && after_alnum)
        };
        let clears_enclosing =
            |chars: &[char]| avoid_first != Some(chars[0]) && avoid_last != Some(chars[len - 1]);
        let underscored = |chars: &[char]| {
            nodes
                .iter()
                .zip(chars)
                .filter(|(node, &ch)| ch == '_' && has_emphasis_edge(node))
                .count()
        };

        let candidates = [alternate('*'), alternate('_')];
        let mut best: Option<&Vec<char>> = None;
        for chars in candidates
            .iter()
            .filter(|c| flanks(c.as_slice()) && clears_enclosing(c.as_slice()))
        {
            if best.map_or(true, |b| underscored(chars.as_slice()) > underscored(b.as_slice())) {
                best = Some(chars);
            }
        }
        // Between two alphanumerics the runs have to share `*` and merge
        let merged = vec!['*'; len];
        let chars = best
            .or_else(|| candidates.iter().find(|c| flanks(c.as_slice())))
            .unwrap_or(&merged);

        chars
            .iter()
            .enumerate()
            .map(|(i, &ch)| Delimiter {
                ch,
                open_alnum: i == 0 && before_alnum,
                close_alnum: i == len - 1 && after_alnum,
            })
            .collect()
    }

    fn wrap_emphasis(&mut self, node: &Node, delimiter: Delimiter) {
        let width = if matches!(node.value, NodeValue::Strong) { 2 } else { 1 };
        let run = delimiter.ch.to_string().repeat(width);
        if node.children.iter().all(Node::is_blank) {
            self.render_inlines(&node.children);
            return;
        }
        self.w.write(&run);
        self.enclosing = Some(Enclosing {
            ch: delimiter.ch,
            at_start: !delimiter.open_alnum,
            at_end: !delimiter.close_alnum,
        });
        self.render_inlines(&node.children);
        self.w.write(&run);
    }

    fn render_inline(&mut self, node: &Node) {
        match &node.value {
            NodeValue::Text(text) => self.write_text(text, false),

            NodeValue::SoftBreak => {
                if self.in_heading || self.in_table || self.options.soft_break_as_space {
                    self.w.write(" ");
                } else {
                    self.w.line_break();
                }
            }

            NodeValue::LineBreak => {
                if self.in_heading || self.in_table {
                    self.w.write(" ");
                } else {
                    self.w.write("\\");
                    self.w.line_break();
                }
            }

            NodeValue::Code(code) => self.write_code(code),

            NodeValue::Emphasis | NodeValue::Strong => {
                self.render_inlines(std::slice::from_ref(node))
            }
            NodeValue::Strikethrough => self.wrap_inlines(node, "~~"),

            NodeValue::Link(link) => {
                self.w.write("[");
                self.render_inlines(&node.children);
                self.w.write("](");
                self.write_link_target(link);
                self.w.write(")");
            }

            NodeValue::Image(link) => {
                self.w.write("![");
                self.render_inlines(&node.children);
                self.w.write("](");
                self.write_link_target(link);
                self.w.write(")");
            }

            NodeValue::RawInline(html) => self.w.write(html),

            NodeValue::AutoLink(link) => {
                self.w.write("<");
                match link.kind {
                    AutoLinkKind::Email => self.w.write(&link.label),
                    AutoLinkKind::Uri | AutoLinkKind::Www => self.w.write(&link.url),
                }
                self.w.write(">");
            }

            NodeValue::TaskListMarker(checked) => {
                self.w.write(if *checked { "[x] " } else { "[ ] " });
            }

            NodeValue::FootnoteReference(reference) => {
                self.w.write("[^");
                self.w.write(&reference.name);
                self.w.write("]");
            }

            _ => self.render_inlines(&node.children),
        }
    }

    fn wrap_inlines(&mut self, node: &Node, delimiter: &str) {
        if node.children.iter().all(Node::is_blank) {
            self.render_inlines(&node.children);
            return;
        }
        self.w.write(delimiter);
        self.render_inlines(&node.children);
        self.w.write(delimiter);
    }

    fn write_text(&mut self, text: &str, next_is_bracket: bool) {
        let mut out = String::with_capacity(text.len() + 8);
        let bytes = text.as_bytes();
        let mut rest = text;

        if self.w.at_line_start() && !self.in_table {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            match bytes.first() {
                Some(b'-') | Some(b'+') | Some(b'=') => out.push('\\'),
                // A continuation line such as `:-` would read back as a table
                // delimiter row once the header's pipes are escaped
                Some(b':') if self.escape_pipes && is_delimiter_row(text) => out.push('\\'),
                Some(b'0'..=b'9') if matches!(bytes.get(digits), Some(b'.') | Some(b')')) => {
                    out.push_str(&text[..digits]);
                    out.push('\\');
                    rest = &text[digits..];
                }
                _ => {}
            }
        }

        let line_start = out.is_empty() && self.w.at_line_start();
        let mut prev: Option<char> = None;
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            let next = chars.peek().copied();
            let escape = match c {
                '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '~' => true,
                '|' => self.escape_pipes || self.in_table,
                '>' => prev.is_none() && line_start,
                '#' => prev.map_or(true, char::is_whitespace),
                '!' => next.is_none() && next_is_bracket || next == Some('['),
                '&' => next.is_some_and(|n| n.is_ascii_alphanumeric() || n == '#'),
                _ => false,
            };
            match c {
                '\n' => out.push_str("&#10;"),
                '\r' => out.push_str("&#13;"),
                _ => {
                    if escape {
                        out.push('\\');
                    }
                    out.push(c);
                }
            }
            prev = Some(c);
        }
        self.w.write(&out);
    }

    fn write_code(&mut self, code: &NodeCode) {
        let literal = if self.in_table {
            code.literal.replace('|', "\\|")
        } else {
            code.literal.clone()
        };
        let ticks = "`".repeat(longest_run(&literal, '`') + 1);
        let pad = literal.starts_with('`')
            || literal.ends_with('`')
            || (literal.starts_with(' ')
                && literal.ends_with(' ')
                && !literal.bytes().all(|b| b == b' '));
        self.w.write(&ticks);
        if pad {
            self.w.write(" ");
        }
        self.w.write(&literal);
        if pad {
            self.w.write(" ");
        }
        self.w.write(&ticks);
    }

    fn write_link_target(&mut self, link: &NodeLink) {
        let url = &link.url;
        let needs_angle = url.is_empty()
            || url
                .chars()
                .any(|c| c == ' ' || c == '<' || c == '>' || c.is_control())
            || !parens_balanced(url);

        let mut out = String::with_capacity(url.len() + 4);
        if needs_angle {
            out.push('<');
        }
        for c in url.chars() {
            match c {
                '\\' | '&' => out.push('\\'),
                '<' | '>' if needs_angle => out.push('\\'),
                _ => {}
            }
            match c {
                '\n' => out.push_str("%0A"),
                _ => out.push(c),
            }
        }
        if needs_angle {
            out.push('>');
        }

        if !link.title.is_empty() {
            out.push_str(" \"");
            for c in link.title.chars() {
                if matches!(c, '"' | '\\' | '&') {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('"');
        }
        self.w.write(&out);
    }
}

fn delimiter_cell(align: TableAlignment, width: usize) -> String {
    let dashes = |n: usize| "-".repeat(n);
    match align {
        TableAlignment::None => dashes(width),
        TableAlignment::Left => format!(":{}", dashes(width - 1)),
        TableAlignment::Right => format!("{}:", dashes(width - 1)),
        TableAlignment::Center => format!(":{}:", dashes(width - 2)),
    }
}

fn is_emphasis(node: &Node) -> bool {
    matches!(node.value, NodeValue::Emphasis | NodeValue::Strong)
}

/// Emphasis whose content starts or ends with another emphasis
fn has_emphasis_edge(node: &Node) -> bool {
    node.children.first().is_some_and(is_emphasis) || node.children.last().is_some_and(is_emphasis)
}

fn is_delimiter_row(text: &str) -> bool {
    text.contains('-') && text.chars().all(|c| matches!(c, '|' | ':' | '-' | ' ' | '\t'))
}

fn longest_run(s: &str, ch: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in s.chars() {
        if c == ch {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn parens_balanced(url: &str) -> bool {
    let mut depth = 0usize;
    for c in url.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        NodeFootnoteDefinition, NodeFootnoteReference, NodeHeading, NodeTable, Sourcepos,
    };
    use pretty_assertions::assert_eq;

    fn pos() -> Sourcepos {
        Sourcepos::default()
    }

    fn node(value: NodeValue, children: Vec<Node>) -> Node {
        Node::with_children(value, pos(), children)
    }

    fn text(s: &str) -> Node {
        Node::text(s, pos())
    }

    fn para(children: Vec<Node>) -> Node {
        node(NodeValue::Paragraph, children)
    }

    fn serialize(blocks: Vec<Node>) -> String {
        let doc = Document::new(node(NodeValue::Document, blocks), Vec::new());
        render_commonmark(&doc, &RenderOptions::default())
    }

    fn list(list_type: ListType, tight: bool, items: Vec<Vec<Node>>) -> Node {
        let data = NodeList {
            list_type,
            marker_offset: 0,
            padding: 2,
            start: 1,
            delimiter: ListDelimType::Period,
            bullet_char: b'-',
            tight,
        };
        let items = items
            .into_iter()
            .map(|children| node(NodeValue::Item(data.clone()), children))
            .collect();
        node(NodeValue::List(data), items)
    }

    #[test]
    fn test_paragraphs() {
        let out = serialize(vec![para(vec![text("Hello World")]), para(vec![text("Two")])]);
        assert_eq!(out, "Hello World\n\nTwo\n");
    }

    #[test]
    fn test_heading_atx() {
        let heading = node(
            NodeValue::Heading(NodeHeading {
                level: 3,
                setext: true,
            }),
            vec![text("Section")],
        );
        assert_eq!(serialize(vec![heading]), "### Section\n");
    }

    #[test]
    fn test_strong_and_emphasis() {
        let out = serialize(vec![para(vec![
            node(NodeValue::Strong, vec![text("bold")]),
            text(" and "),
            node(NodeValue::Emphasis, vec![text("italic")]),
        ])]);
        assert_eq!(out, "**bold** and *italic*\n");
    }

    #[test]
    fn test_adjacent_emphasis_alternates_delimiters() {
        let em = |s: &str| node(NodeValue::Emphasis, vec![text(s)]);
        let strong = |s: &str| node(NodeValue::Strong, vec![text(s)]);

        assert_eq!(serialize(vec![para(vec![em("a"), em("b")])]), "*a*_b_\n");
        assert_eq!(
            serialize(vec![para(vec![strong("a"), strong("b"), em("c")])]),
            "**a**__b__*c*\n"
        );
        // `_` cannot close right before a letter
        assert_eq!(
            serialize(vec![para(vec![em("a"), em("b"), text("c")])]),
            "_a_*b*c\n"
        );
        assert_eq!(
            serialize(vec![para(vec![text("x"), em("a"), text(" "), em("b")])]),
            "x*a* *b*\n"
        );
    }

    #[test]
    fn test_nested_emphasis_uses_other_delimiter() {
        let em = |children: Vec<Node>| node(NodeValue::Emphasis, children);
        let strong = |children: Vec<Node>| node(NodeValue::Strong, children);

        // `**x**` would read back as strong emphasis
        let sole = em(vec![em(vec![text("x")])]);
        assert_eq!(serialize(vec![para(vec![sole])]), "_*x*_\n");

        let leading = em(vec![em(vec![text("a")]), text("b")]);
        assert_eq!(serialize(vec![para(vec![leading])]), "_*a*b_\n");

        // After a letter only `*` can open, so the runs share it
        let after_letter = vec![
            text("x"),
            em(vec![strong(vec![text("a")]), text(" b")]),
        ];
        assert_eq!(serialize(vec![para(after_letter)]), "x***a** b*\n");
    }

    #[test]
    fn test_delimiter_row_continuation_escaped() {
        let paragraph = para(vec![
            text("a|b"),
            Node::new(NodeValue::SoftBreak, pos()),
            text(":-"),
        ]);
        let doc = Document::new(
            node(NodeValue::Document, vec![paragraph]),
            vec![Extension::Table],
        );
        assert_eq!(
            render_commonmark(&doc, &RenderOptions::default()),
            "a\\|b\n\\:-\n"
        );

        // Without tables the colon is left alone
        let paragraph = para(vec![text(":-")]);
        assert_eq!(serialize(vec![paragraph]), ":-\n");
    }

    #[test]
    fn test_text_escaping() {
        let out = serialize(vec![para(vec![text("1. not *a* list [x] <b>")])]);
        assert_eq!(out, "1\\. not \\*a\\* list \\[x\\] \\<b>\n");

        let out = serialize(vec![para(vec![text("- dash, C# & co")])]);
        assert_eq!(out, "\\- dash, C# & co\n");
    }

    #[test]
    fn test_inline_code() {
        let code = |s: &str| {
            node(
                NodeValue::Code(NodeCode {
                    literal: s.to_string(),
                    num_backticks: 1,
                }),
                vec![],
            )
        };
        assert_eq!(serialize(vec![para(vec![code("code")])]), "`code`\n");
        assert_eq!(serialize(vec![para(vec![code("a`b")])]), "``a`b``\n");
        assert_eq!(serialize(vec![para(vec![code("`x")])]), "`` `x ``\n");
    }

    #[test]
    fn test_link_and_image() {
        let link = |url: &str, title: &str| NodeLink {
            url: url.to_string(),
            title: title.to_string(),
        };
        let out = serialize(vec![para(vec![
            node(NodeValue::Link(link("https://example.com", "")), vec![text("Example")]),
            text(" "),
            node(NodeValue::Image(link("a b.png", "T")), vec![text("Alt")]),
        ])]);
        assert_eq!(out, "[Example](https://example.com) ![Alt](<a b.png> \"T\")\n");
    }

    #[test]
    fn test_code_block_fenced() {
        let code = NodeCodeBlock {
            fenced: false,
            fence_char: 0,
            fence_length: 0,
            fence_offset: 0,
            info: "rust".to_string(),
            literal: "let x = 1;\n```\n".to_string(),
        };
        let out = serialize(vec![node(NodeValue::CodeBlock(code), vec![])]);
        assert_eq!(out, "````rust\nlet x = 1;\n```\n````\n");
    }

    #[test]
    fn test_blockquote() {
        let out = serialize(vec![node(
            NodeValue::BlockQuote,
            vec![para(vec![text("Quote")]), para(vec![text("More")])],
        )]);
        assert_eq!(out, "> Quote\n>\n> More\n");
    }

    #[test]
    fn test_tight_and_loose_lists() {
        let tight = list(
            ListType::Bullet,
            true,
            vec![vec![para(vec![text("One")])], vec![para(vec![text("Two")])]],
        );
        assert_eq!(serialize(vec![tight]), "- One\n- Two\n");

        let loose = list(
            ListType::Ordered,
            false,
            vec![vec![para(vec![text("First")])], vec![para(vec![text("Second")])]],
        );
        assert_eq!(serialize(vec![loose]), "1. First\n\n2. Second\n");
    }

    #[test]
    fn test_nested_list_and_task() {
        let inner = list(ListType::Bullet, true, vec![vec![para(vec![text("b")])]]);
        let outer = list(
            ListType::Bullet,
            true,
            vec![vec![
                Node::new(NodeValue::TaskListMarker(true), pos()),
                para(vec![text("a")]),
                inner,
            ]],
        );
        assert_eq!(serialize(vec![outer]), "- [x] a\n  - b\n");
    }

    #[test]
    fn test_adjacent_lists_alternate_marker() {
        let a = list(ListType::Bullet, true, vec![vec![para(vec![text("a")])]]);
        let b = list(ListType::Bullet, true, vec![vec![para(vec![text("b")])]]);
        assert_eq!(serialize(vec![a, b]), "- a\n\n* b\n");
    }

    #[test]
    fn test_table() {
        let cell = |s: &str| node(NodeValue::TableCell, vec![text(s)]);
        let table = node(
            NodeValue::Table(NodeTable {
                alignments: vec![TableAlignment::None, TableAlignment::Center],
            }),
            vec![
                node(NodeValue::TableRow(true), vec![cell("A"), cell("B")]),
                node(NodeValue::TableRow(false), vec![cell("1")]),
            ],
        );
        assert_eq!(
            serialize(vec![table]),
            "| A   | B   |\n| --- | :-: |\n| 1   |     |\n"
        );
    }

    #[test]
    fn test_hard_break() {
        let out = serialize(vec![para(vec![
            text("a"),
            Node::new(NodeValue::LineBreak, pos()),
            text("b"),
        ])]);
        assert_eq!(out, "a\\\nb\n");
    }

    #[test]
    fn test_footnotes() {
        let reference = node(
            NodeValue::FootnoteReference(NodeFootnoteReference {
                name: "Note".to_string(),
                ref_num: 1,
                ix: 1,
            }),
            vec![],
        );
        let definition = node(
            NodeValue::FootnoteDefinition(NodeFootnoteDefinition {
                name: "Note".to_string(),
                total_references: 1,
            }),
            vec![para(vec![text("one")]), para(vec![text("two")])],
        );
        assert_eq!(
            serialize(vec![para(vec![text("see!"), reference]), definition]),
            "see\\![^Note]\n\n[^Note]: one\n\n    two\n"
        );
    }
}
