//! Inline parser
//!
//! Resolves the raw text of a paragraph, heading or table cell into inline
//! nodes. Scanning produces a flat list of items (finished nodes and
//! delimiter runs); emphasis is matched on the delimiter stack afterwards and
//! the flat list is folded into a tree.

pub(crate) mod delimiters;
pub(crate) mod entities;
mod html;
pub(crate) mod links;
mod smart;

use std::collections::HashMap;

use tracing::warn;

use gfmark_core::{
    AutoLinkKind, LineColumn, Node, NodeAutoLink, NodeCode, NodeFootnoteReference, NodeLink,
    NodeValue, Sourcepos,
};

use crate::extensions::{ExtensionRegistry, InlineDelimiter};
use crate::options::ParseOptions;
use crate::references::ReferenceMap;
use crate::scanner::{position_at, ContentLine};

use delimiters::{can_open_close, DelimRun, DelimiterStack};
use entities::match_entity;
use links::{parse_link_destination, parse_link_title, scan_link_label, skip_spnl};

pub(crate) use html::{CLOSE_TAG, OPEN_TAG};

/// Everything the inline parser reads but never changes, shared by all
/// blocks of one document
pub(crate) struct InlineContext<'a> {
    pub refmap: &'a ReferenceMap,
    pub registry: &'a ExtensionRegistry,
    pub options: &'a ParseOptions,
    special: [bool; 128],
}

impl<'a> InlineContext<'a> {
    pub fn new(
        refmap: &'a ReferenceMap,
        registry: &'a ExtensionRegistry,
        options: &'a ParseOptions,
    ) -> Self {
        let mut special = [false; 128];
        for &b in b"\n\\`*_[]!<&" {
            special[b as usize] = true;
        }
        if options.smart {
            for &b in b"'\".-" {
                special[b as usize] = true;
            }
        }
        for b in registry.delimiter_chars() {
            if b.is_ascii() {
                special[b as usize] = true;
            }
        }
        Self {
            refmap,
            registry,
            options,
            special,
        }
    }

    fn is_special(&self, b: u8) -> bool {
        b.is_ascii() && self.special[b as usize]
    }
}

/// Parse block content into inline nodes. `line_map` locates `content` in
/// the source.
pub(crate) fn parse_inlines(
    ctx: &InlineContext<'_>,
    content: &str,
    line_map: &[ContentLine],
) -> Vec<Node> {
    let trimmed_start = content.trim_start_matches([' ', '\t', '\n']);
    let base = content.len() - trimmed_start.len();
    let subject = trimmed_start.trim_end_matches([' ', '\t', '\n']);
    if subject.is_empty() {
        return Vec::new();
    }

    let mut nodes = Subject::new(ctx, subject, base, line_map).parse();
    for postprocess in ctx.registry.postprocessors() {
        postprocess(&mut nodes);
    }
    nodes
}

enum Item {
    Node(Node),
    Delim(usize),
}

struct Bracket {
    /// Index of the `[` or `![` text item
    item: usize,
    image: bool,
    active: bool,
    /// Top of the delimiter stack when the bracket was pushed
    previous_delimiter: Option<usize>,
    /// Offset of the bracket itself
    start: usize,
    /// Offset just past the bracket
    label_start: usize,
    bracket_after: bool,
}

struct Subject<'s, 'c> {
    ctx: &'c InlineContext<'c>,
    input: &'s str,
    bytes: &'s [u8],
    base: usize,
    line_map: &'s [ContentLine],
    pos: usize,
    items: Vec<Item>,
    delimiters: DelimiterStack<'c>,
    brackets: Vec<Bracket>,
    /// Start offsets of backtick runs by length, built on first use
    backticks: Option<HashMap<usize, Vec<usize>>>,
    capped: bool,
}

impl<'s, 'c> Subject<'s, 'c> {
    fn new(
        ctx: &'c InlineContext<'c>,
        input: &'s str,
        base: usize,
        line_map: &'s [ContentLine],
    ) -> Self {
        Self {
            ctx,
            input,
            bytes: input.as_bytes(),
            base,
            line_map,
            pos: 0,
            items: Vec::new(),
            delimiters: DelimiterStack::new(),
            brackets: Vec::new(),
            backticks: None,
            capped: false,
        }
    }

    fn parse(mut self) -> Vec<Node> {
        while self.pos < self.bytes.len() {
            let c = self.bytes[self.pos];
            match c {
                b'\n' => self.handle_newline(),
                b'\\' => self.handle_backslash(),
                b'`' => self.handle_backticks(),
                b'*' | b'_' => self.handle_delimiter_run(c, None),
                b'[' => {
                    self.pos += 1;
                    self.push_bracket(self.pos - 1, false);
                }
                b'!' if self.bytes.get(self.pos + 1) == Some(&b'[') => {
                    self.pos += 2;
                    self.push_bracket(self.pos - 2, true);
                }
                b']' => self.handle_close_bracket(),
                b'<' => self.handle_pointy_brace(),
                b'&' => self.handle_entity(),
                b'\'' | b'"' if self.ctx.options.smart => self.handle_quote(c),
                b'-' if self.ctx.options.smart => self.handle_hyphens(),
                b'.' if self.ctx.options.smart => self.handle_period(),
                _ => match self.ctx.registry.delimiter(c) {
                    Some(delimiter) => self.handle_delimiter_run(c, Some(delimiter)),
                    None => self.handle_text(),
                },
            }
        }

        self.delimiters.process_emphasis(None);
        let items = std::mem::take(&mut self.items);
        self.build(items)
    }

    fn position(&self, offset: usize) -> LineColumn {
        position_at(self.line_map, self.base + offset)
    }

    /// Source span of subject bytes `start..end`
    fn span(&self, start: usize, end: usize) -> Sourcepos {
        Sourcepos {
            start: self.position(start),
            end: self.position(end.max(start + 1) - 1),
        }
    }

    fn push_node(&mut self, value: NodeValue, start: usize, end: usize) {
        let node = Node::new(value, self.span(start, end));
        self.items.push(Item::Node(node));
    }

    fn push_text(&mut self, text: impl Into<String>, start: usize, end: usize) {
        self.push_node(NodeValue::Text(text.into()), start, end);
    }

    fn char_before(&self, offset: usize) -> Option<char> {
        self.input[..offset].chars().next_back()
    }

    fn char_after(&self, offset: usize) -> Option<char> {
        self.input[offset..].chars().next()
    }

    fn handle_text(&mut self) {
        let start = self.pos;
        let end = self.bytes[start + 1..]
            .iter()
            .position(|&b| self.ctx.is_special(b))
            .map_or(self.bytes.len(), |p| start + 1 + p);
        self.pos = end;
        self.push_text(&self.input[start..end], start, end);
    }

    fn handle_newline(&mut self) {
        let newline = self.pos;
        self.pos += 1;

        let trailing = self.bytes[..newline]
            .iter()
            .rev()
            .take_while(|&&b| b == b' ')
            .count();
        if trailing > 0 {
            if let Some(Item::Node(Node {
                value: NodeValue::Text(text),
                sourcepos,
                ..
            })) = self.items.last_mut()
            {
                let keep = text.trim_end_matches(' ').len();
                let removed = text.len() - keep;
                text.truncate(keep);
                sourcepos.end.column = sourcepos.end.column.saturating_sub(removed);
            }
            if matches!(self.items.last(), Some(Item::Node(n)) if n.value.text() == Some("")) {
                self.items.pop();
            }
        }

        let value = if trailing >= 2 {
            NodeValue::LineBreak
        } else {
            NodeValue::SoftBreak
        };
        self.push_node(value, newline - trailing, newline + 1);
        self.skip_line_start();
    }

    fn skip_line_start(&mut self) {
        while matches!(self.bytes.get(self.pos), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    fn handle_backslash(&mut self) {
        let start = self.pos;
        match self.bytes.get(start + 1) {
            Some(b'\n') => {
                self.pos += 2;
                self.push_node(NodeValue::LineBreak, start, start + 2);
                self.skip_line_start();
            }
            Some(&c) if c.is_ascii_punctuation() => {
                self.pos += 2;
                self.push_text((c as char).to_string(), start, start + 2);
            }
            _ => {
                self.pos += 1;
                self.push_text("\\", start, start + 1);
            }
        }
    }

    fn run_length(&self, start: usize, ch: u8) -> usize {
        self.bytes[start..].iter().take_while(|&&b| b == ch).count()
    }

    /// Start of the first backtick run of exactly `len` at or after `from`
    fn find_backtick_run(&mut self, len: usize, from: usize) -> Option<usize> {
        let bytes = self.bytes;
        let runs = self.backticks.get_or_insert_with(|| {
            let mut runs: HashMap<usize, Vec<usize>> = HashMap::new();
            let mut i = 0;
            while i < bytes.len() {
                if bytes[i] == b'`' {
                    let start = i;
                    while i < bytes.len() && bytes[i] == b'`' {
                        i += 1;
                    }
                    runs.entry(i - start).or_default().push(start);
                } else {
                    i += 1;
                }
            }
            runs
        });
        let starts = runs.get(&len)?;
        let idx = starts.partition_point(|&s| s < from);
        starts.get(idx).copied()
    }

    fn handle_backticks(&mut self) {
        let start = self.pos;
        let len = self.run_length(start, b'`');
        let after_open = start + len;

        match self.find_backtick_run(len, after_open) {
            Some(close) => {
                let mut literal = self.input[after_open..close].replace('\n', " ");
                if literal.len() >= 2
                    && literal.starts_with(' ')
                    && literal.ends_with(' ')
                    && literal.bytes().any(|b| b != b' ')
                {
                    literal = literal[1..literal.len() - 1].to_string();
                }
                self.pos = close + len;
                self.push_node(
                    NodeValue::Code(NodeCode {
                        literal,
                        num_backticks: len,
                    }),
                    start,
                    self.pos,
                );
            }
            None => {
                self.pos = after_open;
                self.push_text(&self.input[start..after_open], start, after_open);
            }
        }
    }

    fn depth_exceeded(&mut self, depth: usize) -> bool {
        if depth < self.ctx.options.max_delimiter_depth {
            return false;
        }
        if !self.capped {
            self.capped = true;
            warn!(
                limit = self.ctx.options.max_delimiter_depth,
                "delimiter depth limit reached; treating further delimiters as text"
            );
        }
        true
    }

    fn handle_delimiter_run(&mut self, ch: u8, ext: Option<&'c InlineDelimiter>) {
        let start = self.pos;
        let len = self.run_length(start, ch);
        self.pos = start + len;

        if let Some(delimiter) = ext {
            if len < delimiter.min_run || len > delimiter.max_run {
                self.push_text(&self.input[start..self.pos], start, self.pos);
                return;
            }
        }

        let (mut can_open, can_close) =
            can_open_close(ch, self.char_before(start), self.char_after(self.pos));
        if can_open && self.depth_exceeded(self.delimiters.len()) {
            can_open = false;
        }
        if !can_open && !can_close {
            self.push_text(&self.input[start..self.pos], start, self.pos);
            return;
        }
        let flags = (can_open, can_close);

        let id = self
            .delimiters
            .push(DelimRun::new(ch, start, len, flags, ext));
        self.items.push(Item::Delim(id));
    }

    fn push_bracket(&mut self, start: usize, image: bool) {
        let end = self.pos;
        if self.depth_exceeded(self.brackets.len()) {
            self.push_text(&self.input[start..end], start, end);
            return;
        }
        if let Some(last) = self.brackets.last_mut() {
            last.bracket_after = true;
        }
        self.brackets.push(Bracket {
            item: self.items.len(),
            image,
            active: true,
            previous_delimiter: self.delimiters.top(),
            start,
            label_start: end,
            bracket_after: false,
        });
        self.push_text(&self.input[start..end], start, end);
    }

    fn handle_close_bracket(&mut self) {
        let close = self.pos;
        self.pos += 1;

        let Some(opener) = self.brackets.last() else {
            self.push_text("]", close, close + 1);
            return;
        };
        if !opener.active {
            self.brackets.pop();
            self.push_text("]", close, close + 1);
            return;
        }

        let (image, label_start, bracket_after) =
            (opener.image, opener.label_start, opener.bracket_after);

        match self.match_link_target(label_start, close, bracket_after) {
            Some(link) => {
                let Some(opener) = self.brackets.pop() else {
                    return;
                };
                self.delimiters.process_emphasis(opener.previous_delimiter);
                let inner = self.items.split_off(opener.item + 1);
                self.items.truncate(opener.item);
                let children = self.build(inner);

                let value = if image {
                    NodeValue::Image(link)
                } else {
                    NodeValue::Link(link)
                };
                let node = Node::with_children(value, self.span(opener.start, self.pos), children);
                self.items.push(Item::Node(node));

                if !image {
                    for bracket in self.brackets.iter_mut().filter(|b| !b.image) {
                        bracket.active = false;
                    }
                }
            }
            None if !image && self.is_footnote_reference(label_start, close) => {
                let Some(opener) = self.brackets.pop() else {
                    return;
                };
                self.pos = close + 1;
                self.delimiters.process_emphasis(opener.previous_delimiter);
                self.items.truncate(opener.item);
                let reference = NodeFootnoteReference {
                    name: self.input[label_start + 1..close].to_string(),
                    ..NodeFootnoteReference::default()
                };
                self.push_node(NodeValue::FootnoteReference(reference), opener.start, self.pos);
            }
            None => {
                self.brackets.pop();
                self.pos = close + 1;
                self.push_text("]", close, close + 1);
            }
        }
    }

    /// `[^label]` naming a defined footnote; numbered once the document is
    /// complete
    fn is_footnote_reference(&self, label_start: usize, close: usize) -> bool {
        self.input[label_start..close]
            .strip_prefix('^')
            .is_some_and(|label| self.ctx.refmap.has_footnote(label))
    }

    /// Inline `(dest "title")`, full `[label]`, collapsed `[]` or shortcut
    /// reference following the `]` at `close`. Advances past what matched.
    fn match_link_target(
        &mut self,
        label_start: usize,
        close: usize,
        bracket_after: bool,
    ) -> Option<NodeLink> {
        let after = close + 1;

        if self.bytes.get(after) == Some(&b'(') {
            if let Some((link, end)) = self.parse_inline_link(after + 1) {
                self.pos = end;
                return Some(link);
            }
        }

        let (label, end) = match scan_link_label(self.input, after) {
            Some(end) if end - after > 2 => (&self.input[after + 1..end - 1], end),
            Some(end) if !bracket_after => (&self.input[label_start..close], end),
            None if !bracket_after => (&self.input[label_start..close], after),
            _ => return None,
        };

        let reference = self.ctx.refmap.get(label)?;
        self.pos = end;
        Some(NodeLink {
            url: reference.url.clone(),
            title: reference.title.clone(),
        })
    }

    fn parse_inline_link(&self, start: usize) -> Option<(NodeLink, usize)> {
        let input = self.input;
        let mut pos = skip_spnl(input, start);

        let url = match parse_link_destination(input, pos) {
            Some((url, end)) => {
                pos = end;
                url
            }
            None if self.bytes.get(pos) == Some(&b')') => String::new(),
            None => return None,
        };

        let mut title = String::new();
        let before_title = pos;
        pos = skip_spnl(input, pos);
        if pos > before_title {
            if let Some((parsed, end)) = parse_link_title(input, pos) {
                title = parsed;
                pos = skip_spnl(input, end);
            }
        }

        if self.bytes.get(pos) != Some(&b')') {
            return None;
        }
        Some((NodeLink { url, title }, pos + 1))
    }

    fn handle_pointy_brace(&mut self) {
        let start = self.pos;
        let rest = &self.input[start..];

        if let Some(len) = html::scan_uri_autolink(rest) {
            let label = rest[1..len - 1].to_string();
            self.pos = start + len;
            let link = NodeAutoLink {
                url: label.clone(),
                label,
                kind: AutoLinkKind::Uri,
            };
            self.push_node(NodeValue::AutoLink(link), start, self.pos);
        } else if let Some(len) = html::scan_email_autolink(rest) {
            let label = rest[1..len - 1].to_string();
            self.pos = start + len;
            let link = NodeAutoLink {
                url: format!("mailto:{label}"),
                label,
                kind: AutoLinkKind::Email,
            };
            self.push_node(NodeValue::AutoLink(link), start, self.pos);
        } else if let Some(len) = html::scan_raw_html(rest) {
            self.pos = start + len;
            self.push_node(NodeValue::RawInline(rest[..len].to_string()), start, self.pos);
        } else {
            self.pos += 1;
            self.push_text("<", start, start + 1);
        }
    }

    fn handle_entity(&mut self) {
        let start = self.pos;
        match match_entity(&self.input[start..]) {
            Some((len, text)) => {
                self.pos += len;
                self.push_text(text, start, self.pos);
            }
            None => {
                self.pos += 1;
                self.push_text("&", start, start + 1);
            }
        }
    }

    fn handle_quote(&mut self, ch: u8) {
        let start = self.pos;
        self.pos += 1;
        let text = smart::quote(ch, self.char_before(start), self.char_after(self.pos));
        self.push_text(text, start, self.pos);
    }

    fn handle_hyphens(&mut self) {
        let start = self.pos;
        let len = self.run_length(start, b'-');
        self.pos += len;
        if len == 1 {
            self.push_text("-", start, self.pos);
        } else {
            self.push_text(smart::dashes(len), start, self.pos);
        }
    }

    fn handle_period(&mut self) {
        let start = self.pos;
        if self.bytes[start..].starts_with(b"...") {
            self.pos += 3;
            self.push_text(smart::ELLIPSIS, start, self.pos);
        } else {
            self.pos += 1;
            self.push_text(".", start, self.pos);
        }
    }

    /// Fold a flat item list into a tree, expanding delimiter runs into the
    /// emphasis nodes they opened and closed
    fn build(&self, items: Vec<Item>) -> Vec<Node> {
        let mut root = Vec::new();
        let mut frames: Vec<(NodeValue, LineColumn, Vec<Node>)> = Vec::new();

        for item in items {
            match item {
                Item::Node(node) => append(current(&mut root, &mut frames), node),
                Item::Delim(id) => {
                    let run = &self.delimiters.runs[id];
                    for &end in &run.closes {
                        if let Some((value, start, children)) = frames.pop() {
                            let sourcepos = Sourcepos {
                                start,
                                end: self.position(end),
                            };
                            let node = Node::with_children(value, sourcepos, children);
                            append(current(&mut root, &mut frames), node);
                        }
                    }

                    let (lit_start, lit_end) = run.literal_range();
                    if lit_start < lit_end {
                        let text = Node::text(
                            &self.input[lit_start..lit_end],
                            self.span(lit_start, lit_end),
                        );
                        append(current(&mut root, &mut frames), text);
                    }

                    for (value, start) in run.opens.iter().rev() {
                        frames.push((value.clone(), self.position(*start), Vec::new()));
                    }
                }
            }
        }

        // Emphasis always closes inside the span that opened it; anything
        // left here keeps its children in place
        while let Some((_, _, children)) = frames.pop() {
            let parent = current(&mut root, &mut frames);
            for child in children {
                append(parent, child);
            }
        }
        root
    }
}

fn current<'x>(
    root: &'x mut Vec<Node>,
    frames: &'x mut [(NodeValue, LineColumn, Vec<Node>)],
) -> &'x mut Vec<Node> {
    match frames.last_mut() {
        Some((_, _, children)) => children,
        None => root,
    }
}

/// Append a node, merging adjacent text
fn append(children: &mut Vec<Node>, node: Node) {
    if let NodeValue::Text(text) = &node.value {
        if let Some(Node {
            value: NodeValue::Text(prev),
            sourcepos,
            ..
        }) = children.last_mut()
        {
            prev.push_str(text);
            sourcepos.end = node.sourcepos.end;
            return;
        }
    }
    children.push(node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfmark_core::Extension;
    use pretty_assertions::assert_eq;

    fn parse_with(input: &str, options: &ParseOptions, refmap: &ReferenceMap) -> Vec<Node> {
        let registry = ExtensionRegistry::new(&options.extensions);
        let ctx = InlineContext::new(refmap, &registry, options);
        let map = [ContentLine {
            offset: 0,
            line: 1,
            column: 1,
        }];
        parse_inlines(&ctx, input, &map)
    }

    fn parse(input: &str) -> Vec<Node> {
        parse_with(input, &ParseOptions::default(), &ReferenceMap::new())
    }

    /// Compact structural dump: `Kind(children)` or `"text"`
    fn dump(nodes: &[Node]) -> String {
        nodes
            .iter()
            .map(|node| match &node.value {
                NodeValue::Text(text) => format!("{text:?}"),
                NodeValue::Code(code) => format!("Code({:?})", code.literal),
                NodeValue::Link(link) => format!("Link[{}]({})", link.url, dump(&node.children)),
                NodeValue::Image(link) => {
                    format!("Image[{}]({})", link.url, dump(&node.children))
                }
                NodeValue::AutoLink(link) => format!("AutoLink[{}]", link.url),
                NodeValue::RawInline(html) => format!("Raw({html:?})"),
                NodeValue::FootnoteReference(reference) => format!("Footnote[{}]", reference.name),
                other if node.children.is_empty() => format!("{:?}", other.kind()),
                other => format!("{:?}({})", other.kind(), dump(&node.children)),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(dump(&parse("hello world")), "\"hello world\"");
        assert!(parse("   ").is_empty());
    }

    #[test]
    fn test_emphasis_nesting() {
        assert_eq!(
            dump(&parse("**foo*bar***")),
            "Strong(\"foo\", Emphasis(\"bar\"))"
        );
        assert_eq!(dump(&parse("*foo**bar*")), "Emphasis(\"foo**bar\")");
        assert_eq!(dump(&parse("_foo_bar_")), "Emphasis(\"foo_bar\")");
        assert_eq!(dump(&parse("snake_case_name")), "\"snake_case_name\"");
        assert_eq!(dump(&parse("***a***")), "Emphasis(Strong(\"a\"))");
    }

    #[test]
    fn test_unmatched_delimiters_are_text() {
        assert_eq!(dump(&parse("*foo")), "\"*foo\"");
        assert_eq!(dump(&parse("foo]")), "\"foo]\"");
        assert_eq!(dump(&parse("[foo")), "\"[foo\"");
    }

    #[test]
    fn test_code_spans() {
        assert_eq!(dump(&parse("`a*b*`")), "Code(\"a*b*\")");
        assert_eq!(dump(&parse("`` ` ``")), "Code(\"`\")");
        assert_eq!(dump(&parse("`  `")), "Code(\"  \")");
        assert_eq!(dump(&parse("``a`")), "\"``a`\"");
        assert_eq!(dump(&parse("`a\nb`")), "Code(\"a b\")");
    }

    #[test]
    fn test_breaks() {
        assert_eq!(dump(&parse("a  \nb")), "\"a\", LineBreak, \"b\"");
        assert_eq!(dump(&parse("a \nb")), "\"a\", SoftBreak, \"b\"");
        assert_eq!(dump(&parse("a\\\nb")), "\"a\", LineBreak, \"b\"");
    }

    #[test]
    fn test_escapes_and_entities() {
        assert_eq!(dump(&parse("\\*not\\*")), "\"*not*\"");
        assert_eq!(dump(&parse("a\\b")), "\"a\\\\b\"");
        assert_eq!(dump(&parse("&copy; &#65; &bogus;")), "\"© A &bogus;\"");
    }

    #[test]
    fn test_inline_links() {
        assert_eq!(
            dump(&parse("[a *b*](/u \"t\")")),
            "Link[/u](\"a \", Emphasis(\"b\"))"
        );
        assert_eq!(dump(&parse("![alt](i.png)")), "Image[i.png](\"alt\")");
        assert_eq!(dump(&parse("[a]()")), "Link[](\"a\")");
        assert_eq!(dump(&parse("[a](<b c>)")), "Link[b c](\"a\")");
        assert_eq!(dump(&parse("[a](b c)")), "\"[a](b c)\"");
    }

    #[test]
    fn test_link_title() {
        let nodes = parse("[a](/u 'title')");
        match &nodes[0].value {
            NodeValue::Link(link) => assert_eq!(link.title, "title"),
            other => panic!("expected link, got {other:?}"),
        }
    }

    #[test]
    fn test_no_links_in_links() {
        assert_eq!(
            dump(&parse("[a [b](/in)](/out)")),
            "\"[a \", Link[/in](\"b\"), \"](/out)\""
        );
    }

    #[test]
    fn test_reference_links() {
        let mut refmap = ReferenceMap::new();
        refmap.insert(
            "Foo",
            crate::references::LinkReference {
                url: "/foo".into(),
                title: String::new(),
            },
        );
        let options = ParseOptions::default();
        assert_eq!(
            dump(&parse_with("[foo] [x][foo] [FOO][] [nope]", &options, &refmap)),
            "Link[/foo](\"foo\"), \" \", Link[/foo](\"x\"), \" \", Link[/foo](\"FOO\"), \" [nope]\""
        );
    }

    #[test]
    fn test_footnote_references() {
        let mut refmap = ReferenceMap::new();
        refmap.insert_footnote("note");
        let options = ParseOptions::default();
        assert_eq!(
            dump(&parse_with("a[^Note] [^missing] ![^note] [^*x*]", &options, &refmap)),
            "\"a\", Footnote[Note], \" [^missing] ![^note] [^\", Emphasis(\"x\"), \"]\""
        );
    }

    #[test]
    fn test_autolinks_and_raw_html() {
        assert_eq!(
            dump(&parse("<https://a.b> <me@x.org>")),
            "AutoLink[https://a.b], \" \", AutoLink[mailto:me@x.org]"
        );
        assert_eq!(
            dump(&parse("a <b>c</b> < d")),
            "\"a \", Raw(\"<b>\"), \"c\", Raw(\"</b>\"), \" < d\""
        );
    }

    #[test]
    fn test_strikethrough_extension() {
        let options = ParseOptions {
            extensions: vec![Extension::Strikethrough],
            ..ParseOptions::default()
        };
        let refmap = ReferenceMap::new();
        assert_eq!(
            dump(&parse_with("~~gone~~ ~one~ ~~~no~~~", &options, &refmap)),
            "Strikethrough(\"gone\"), \" \", Strikethrough(\"one\"), \" ~~~no~~~\""
        );
        assert_eq!(dump(&parse("~~kept~~")), "\"~~kept~~\"");
    }

    #[test]
    fn test_smart_punctuation() {
        let options = ParseOptions {
            smart: true,
            ..ParseOptions::default()
        };
        let refmap = ReferenceMap::new();
        assert_eq!(
            dump(&parse_with("\"Hi\" -- it's... ---", &options, &refmap)),
            "\"\u{201C}Hi\u{201D} \u{2013} it\u{2019}s\u{2026} \u{2014}\""
        );
    }

    #[test]
    fn test_delimiter_cap() {
        let options = ParseOptions {
            max_delimiter_depth: 2,
            ..ParseOptions::default()
        };
        let refmap = ReferenceMap::new();
        // The third opener is over the limit and stays literal
        assert_eq!(
            dump(&parse_with("*a *b *c d* e* f*", &options, &refmap)),
            "Emphasis(\"a \", Emphasis(\"b *c d\"), \" e\"), \" f*\""
        );
    }

    #[test]
    fn test_sourcepos() {
        let nodes = parse("ab *cd*");
        assert_eq!(nodes[1].sourcepos, Sourcepos::new(1, 4, 1, 7));
        assert_eq!(nodes[1].children[0].sourcepos, Sourcepos::new(1, 5, 1, 6));
    }
}
