//! Block structure parser
//!
//! Lines are fed one at a time. Each line first walks the chain of open
//! blocks, checking whether it continues each of them; then looks for new
//! block starts; then adds whatever is left to the innermost block as text.
//! Blocks live in an arena and are converted to [`Node`]s once the whole
//! document is read, at which point leaf text is handed to the inline parser.

mod scanners;

use tracing::trace;

use gfmark_core::{
    LineColumn, ListDelimType, ListType, Node, NodeCodeBlock, NodeHeading, NodeHtmlBlock,
    NodeList, NodeValue, Sourcepos,
};

use crate::extensions::{BlockStart, ExtensionRegistry, Slot};
use crate::inlines::entities::unescape_string;
use crate::inlines::{parse_inlines, InlineContext};
use crate::options::ParseOptions;
use crate::references::{parse_definitions, ReferenceMap};
use crate::scanner::{position_at, ContentLine};

/// Columns of indentation that make a line indented code
const CODE_INDENT: usize = 4;

/// Block quotes and list items nested deeper than this are not opened; the
/// marker is kept as text instead
pub(crate) const MAX_BLOCK_DEPTH: usize = 128;

const ROOT: usize = 0;

/// A block under construction
#[derive(Debug, Clone)]
pub(crate) struct Block {
    pub value: NodeValue,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub open: bool,
    pub last_line_blank: bool,
    pub start: LineColumn,
    pub end: LineColumn,
    /// Raw text of leaf blocks, one `\n`-terminated line per added line
    pub content: String,
    pub line_map: Vec<ContentLine>,
    /// Task-list state of an item and the position of its marker
    pub task: Option<(bool, LineColumn)>,
}

impl Block {
    fn new(value: NodeValue, parent: Option<usize>, start: LineColumn) -> Self {
        Self {
            value,
            parent,
            children: Vec::new(),
            open: true,
            last_line_blank: false,
            start,
            end: start,
            content: String::new(),
            line_map: Vec::new(),
            task: None,
        }
    }

    fn accepts_lines(&self) -> bool {
        matches!(
            self.value,
            NodeValue::Paragraph | NodeValue::CodeBlock(_) | NodeValue::Html(_)
        )
    }

    fn can_contain(&self, child: &NodeValue) -> bool {
        let is_item = matches!(child, NodeValue::Item(_));
        match self.value {
            NodeValue::Document
            | NodeValue::BlockQuote
            | NodeValue::Item(_)
            | NodeValue::FootnoteDefinition(_) => !is_item,
            NodeValue::List(_) => is_item,
            _ => false,
        }
    }
}

enum Continuation {
    Matched,
    Unmatched,
    /// The line was consumed entirely (closing code fence)
    Finished,
}

pub(crate) struct BlockParser<'a> {
    blocks: Vec<Block>,
    tip: usize,
    oldtip: usize,
    last_matched: usize,
    all_closed: bool,

    line: &'a str,
    line_number: usize,
    offset: usize,
    column: usize,
    next_nonspace: usize,
    next_nonspace_column: usize,
    indent: usize,
    indented: bool,
    blank: bool,
    partially_consumed_tab: bool,
    last_line_length: usize,

    pub refmap: ReferenceMap,
    registry: &'a ExtensionRegistry,
    options: &'a ParseOptions,
}

impl<'a> BlockParser<'a> {
    pub fn new(registry: &'a ExtensionRegistry, options: &'a ParseOptions) -> Self {
        let root = Block::new(NodeValue::Document, None, LineColumn::new(1, 1));
        Self {
            blocks: vec![root],
            tip: ROOT,
            oldtip: ROOT,
            last_matched: ROOT,
            all_closed: true,
            line: "",
            line_number: 0,
            offset: 0,
            column: 0,
            next_nonspace: 0,
            next_nonspace_column: 0,
            indent: 0,
            indented: false,
            blank: false,
            partially_consumed_tab: false,
            last_line_length: 0,
            refmap: ReferenceMap::new(),
            registry,
            options,
        }
    }

    // Accessors used by extensions

    pub fn block(&self, id: usize) -> &Block {
        &self.blocks[id]
    }

    pub fn block_mut(&mut self, id: usize) -> &mut Block {
        &mut self.blocks[id]
    }

    pub fn line(&self) -> &'a str {
        self.line
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// The line from its first non-space character on
    pub fn rest(&self) -> &'a str {
        &self.line[self.next_nonspace..]
    }

    pub fn next_nonspace(&self) -> usize {
        self.next_nonspace
    }

    pub fn is_blank(&self) -> bool {
        self.blank
    }

    pub fn is_indented(&self) -> bool {
        self.indented
    }

    /// Skip the remainder of the current line
    pub fn consume_line(&mut self) {
        self.advance_offset(self.line.len().saturating_sub(self.offset), false);
    }

    /// Feed one line, without its line ending
    pub fn feed(&mut self, line: &'a str, line_number: usize) {
        self.line = line;
        self.line_number = line_number;
        self.offset = 0;
        self.column = 0;
        self.blank = false;
        self.partially_consumed_tab = false;
        self.oldtip = self.tip;

        let mut container = ROOT;
        while let Some(&last) = self.blocks[container].children.last() {
            if !self.blocks[last].open {
                break;
            }
            container = last;
            self.find_next_nonspace();

            match self.continues(container) {
                Continuation::Matched => {}
                Continuation::Unmatched => {
                    container = self.blocks[container].parent.unwrap_or(ROOT);
                    break;
                }
                Continuation::Finished => {
                    self.last_line_length = line.len();
                    return;
                }
            }
        }

        self.all_closed = container == self.oldtip;
        self.last_matched = container;

        let mut matched_leaf = self.blocks[container].accepts_lines()
            && !matches!(self.blocks[container].value, NodeValue::Paragraph);

        while !matched_leaf {
            self.find_next_nonspace();
            match self.try_block_starts(container) {
                BlockStart::None => {
                    self.advance_next_nonspace();
                    break;
                }
                BlockStart::Container => container = self.tip,
                BlockStart::Leaf => {
                    container = self.tip;
                    matched_leaf = true;
                }
            }
        }

        self.update_last_line_blank(container);

        if !self.all_closed
            && !self.blank
            && matches!(self.blocks[self.tip].value, NodeValue::Paragraph)
        {
            // Lazy continuation
            self.advance_next_nonspace();
            self.add_line();
        } else {
            self.close_unmatched();
            self.add_text(container);
        }
        self.last_line_length = line.len();
    }

    /// Close everything and build the document tree
    pub fn finish(mut self, line_count: usize) -> Node {
        self.line_number = line_count;
        loop {
            let tip = self.tip;
            self.finalize(tip, line_count);
            if tip == ROOT {
                break;
            }
        }

        let ctx = InlineContext::new(&self.refmap, self.registry, self.options);
        let mut root = self.to_node(ROOT, &ctx);
        for postprocess in self.registry.document_postprocessors() {
            postprocess(&mut root);
        }
        root
    }

    fn find_next_nonspace(&mut self) {
        let bytes = self.line.as_bytes();
        let mut i = self.offset;
        let mut cols = self.column;
        while let Some(&b) = bytes.get(i) {
            match b {
                b' ' => cols += 1,
                b'\t' => cols += self.options.tab_width - cols % self.options.tab_width,
                _ => break,
            }
            i += 1;
        }
        self.blank = i >= bytes.len();
        self.next_nonspace = i;
        self.next_nonspace_column = cols;
        self.indent = cols - self.column;
        self.indented = self.indent >= CODE_INDENT;
    }

    pub fn advance_next_nonspace(&mut self) {
        self.offset = self.next_nonspace;
        self.column = self.next_nonspace_column;
        self.partially_consumed_tab = false;
    }

    /// Move forward `count` characters, or `count` columns when `columns` is
    /// set, in which case a tab may be consumed partially
    pub fn advance_offset(&mut self, mut count: usize, columns: bool) {
        let tab_width = self.options.tab_width;
        while count > 0 {
            let Some(c) = self.line[self.offset..].chars().next() else {
                break;
            };
            if c == '\t' {
                let to_tab = tab_width - self.column % tab_width;
                if columns {
                    self.partially_consumed_tab = to_tab > count;
                    let advance = to_tab.min(count);
                    self.column += advance;
                    if !self.partially_consumed_tab {
                        self.offset += 1;
                    }
                    count -= advance;
                } else {
                    self.partially_consumed_tab = false;
                    self.column += to_tab;
                    self.offset += 1;
                    count -= 1;
                }
            } else {
                self.partially_consumed_tab = false;
                self.offset += c.len_utf8();
                self.column += 1;
                count -= 1;
            }
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.line.as_bytes().get(offset).copied()
    }

    /// Number of ancestors of a block
    pub fn depth(&self, mut id: usize) -> usize {
        let mut depth = 0;
        while let Some(parent) = self.blocks[id].parent {
            depth += 1;
            id = parent;
        }
        depth
    }

    fn continues(&mut self, id: usize) -> Continuation {
        let registry = self.registry;
        for hook in registry.continues() {
            if let Some(matched) = hook(self, id) {
                return if matched {
                    Continuation::Matched
                } else {
                    Continuation::Unmatched
                };
            }
        }

        match &self.blocks[id].value {
            NodeValue::Document | NodeValue::List(_) => Continuation::Matched,
            NodeValue::BlockQuote => {
                if !self.indented && self.peek(self.next_nonspace) == Some(b'>') {
                    self.advance_next_nonspace();
                    self.advance_offset(1, false);
                    if matches!(self.peek(self.offset), Some(b' ' | b'\t')) {
                        self.advance_offset(1, true);
                    }
                    Continuation::Matched
                } else {
                    Continuation::Unmatched
                }
            }
            NodeValue::Item(list) => {
                let width = list.marker_offset + list.padding;
                if self.blank {
                    if self.blocks[id].children.is_empty() {
                        return Continuation::Unmatched;
                    }
                    self.advance_next_nonspace();
                } else if self.indent >= width {
                    self.advance_offset(width, true);
                } else {
                    return Continuation::Unmatched;
                }
                Continuation::Matched
            }
            NodeValue::CodeBlock(code) if code.fenced => {
                let (fence_char, fence_length, fence_offset) =
                    (code.fence_char, code.fence_length, code.fence_offset);
                if self.indent <= 3
                    && scanners::close_code_fence(self.rest(), fence_char, fence_length)
                {
                    self.last_line_length = self.line.len();
                    self.finalize(id, self.line_number);
                    return Continuation::Finished;
                }
                let mut skip = fence_offset;
                while skip > 0 && matches!(self.peek(self.offset), Some(b' ' | b'\t')) {
                    self.advance_offset(1, true);
                    skip -= 1;
                }
                Continuation::Matched
            }
            NodeValue::CodeBlock(_) => {
                if self.indent >= CODE_INDENT {
                    self.advance_offset(CODE_INDENT, true);
                    Continuation::Matched
                } else if self.blank {
                    self.advance_next_nonspace();
                    Continuation::Matched
                } else {
                    Continuation::Unmatched
                }
            }
            NodeValue::Html(html) => {
                if self.blank && html.block_type >= 6 {
                    Continuation::Unmatched
                } else {
                    Continuation::Matched
                }
            }
            NodeValue::Paragraph => {
                if self.blank {
                    Continuation::Unmatched
                } else {
                    Continuation::Matched
                }
            }
            _ => Continuation::Unmatched,
        }
    }

    fn try_block_starts(&mut self, container: usize) -> BlockStart {
        let registry = self.registry;
        for start in registry.block_starts(Slot::BeforeCore) {
            let result = start(self, container);
            if result != BlockStart::None {
                return result;
            }
        }

        let core: [fn(&mut Self, usize) -> BlockStart; 8] = [
            Self::start_block_quote,
            Self::start_atx_heading,
            Self::start_fenced_code,
            Self::start_html_block,
            Self::start_setext_heading,
            Self::start_thematic_break,
            Self::start_list_item,
            Self::start_indented_code,
        ];
        for start in core {
            let result = start(self, container);
            if result != BlockStart::None {
                return result;
            }
        }

        for start in registry.block_starts(Slot::AfterCore) {
            let result = start(self, container);
            if result != BlockStart::None {
                return result;
            }
        }
        BlockStart::None
    }

    fn start_block_quote(&mut self, container: usize) -> BlockStart {
        if self.indented
            || self.peek(self.next_nonspace) != Some(b'>')
            || self.depth(container) >= MAX_BLOCK_DEPTH
        {
            return BlockStart::None;
        }
        let start = self.next_nonspace;
        self.advance_next_nonspace();
        self.advance_offset(1, false);
        if matches!(self.peek(self.offset), Some(b' ' | b'\t')) {
            self.advance_offset(1, true);
        }
        self.close_unmatched();
        self.add_child(NodeValue::BlockQuote, start);
        BlockStart::Container
    }

    fn start_atx_heading(&mut self, _container: usize) -> BlockStart {
        if self.indented {
            return BlockStart::None;
        }
        let Some((level, content_start)) = scanners::atx_heading_start(self.rest()) else {
            return BlockStart::None;
        };
        let start = self.next_nonspace;
        self.advance_next_nonspace();
        self.advance_offset(content_start, false);
        self.close_unmatched();

        let id = self.add_child(NodeValue::Heading(NodeHeading { level, setext: false }), start);
        let content = scanners::atx_heading_content(&self.line[self.offset..]);
        let block = &mut self.blocks[id];
        block.content = content.to_string();
        block.line_map.push(ContentLine {
            offset: 0,
            line: self.line_number,
            column: self.offset + 1,
        });
        self.consume_line();
        BlockStart::Leaf
    }

    fn start_fenced_code(&mut self, _container: usize) -> BlockStart {
        if self.indented {
            return BlockStart::None;
        }
        let Some((fence_char, fence_length)) = scanners::open_code_fence(self.rest()) else {
            return BlockStart::None;
        };
        let start = self.next_nonspace;
        self.close_unmatched();
        let code = NodeCodeBlock {
            fenced: true,
            fence_char,
            fence_length,
            fence_offset: self.indent,
            ..NodeCodeBlock::default()
        };
        self.add_child(NodeValue::CodeBlock(code), start);
        self.advance_next_nonspace();
        self.advance_offset(fence_length, false);
        BlockStart::Leaf
    }

    fn start_html_block(&mut self, container: usize) -> BlockStart {
        if self.indented || self.peek(self.next_nonspace) != Some(b'<') {
            return BlockStart::None;
        }
        let lazy_paragraph = !self.all_closed
            && !self.blank
            && matches!(self.blocks[self.tip].value, NodeValue::Paragraph);
        let allow_type7 =
            !matches!(self.blocks[container].value, NodeValue::Paragraph) && !lazy_paragraph;
        let Some(block_type) = scanners::html_block_start(self.rest(), allow_type7) else {
            return BlockStart::None;
        };
        self.close_unmatched();
        let html = NodeHtmlBlock {
            block_type,
            literal: String::new(),
        };
        self.add_child(NodeValue::Html(html), self.offset);
        BlockStart::Leaf
    }

    fn start_setext_heading(&mut self, container: usize) -> BlockStart {
        if self.indented || !matches!(self.blocks[container].value, NodeValue::Paragraph) {
            return BlockStart::None;
        }
        let Some(level) = scanners::setext_heading_line(self.rest()) else {
            return BlockStart::None;
        };
        self.close_unmatched();
        if !self.resolve_reference_definitions(container) {
            return BlockStart::None;
        }
        self.blocks[container].value = NodeValue::Heading(NodeHeading { level, setext: true });
        self.consume_line();
        BlockStart::Leaf
    }

    fn start_thematic_break(&mut self, _container: usize) -> BlockStart {
        if self.indented || !scanners::thematic_break(self.rest()) {
            return BlockStart::None;
        }
        let start = self.next_nonspace;
        self.close_unmatched();
        self.add_child(NodeValue::ThematicBreak, start);
        self.consume_line();
        BlockStart::Leaf
    }

    fn start_list_item(&mut self, container: usize) -> BlockStart {
        let in_list = matches!(self.blocks[container].value, NodeValue::List(_));
        if (self.indented && !in_list) || self.depth(container) >= MAX_BLOCK_DEPTH {
            return BlockStart::None;
        }
        let start = self.next_nonspace;
        let Some(data) = self.parse_list_marker(container) else {
            return BlockStart::None;
        };
        self.close_unmatched();

        let continues_list = match &self.blocks[self.tip].value {
            NodeValue::List(list) => lists_match(list, &data),
            _ => false,
        };
        if !continues_list {
            self.add_child(NodeValue::List(data.clone()), start);
        }
        self.add_child(NodeValue::Item(data), start);
        BlockStart::Container
    }

    fn start_indented_code(&mut self, _container: usize) -> BlockStart {
        if !self.indented
            || self.blank
            || matches!(self.blocks[self.tip].value, NodeValue::Paragraph)
        {
            return BlockStart::None;
        }
        self.advance_offset(CODE_INDENT, true);
        self.close_unmatched();
        self.add_child(NodeValue::CodeBlock(NodeCodeBlock::default()), self.offset);
        BlockStart::Leaf
    }

    /// Parse a bullet or ordered list marker at the next non-space
    /// character, advancing past it and the spaces that follow
    fn parse_list_marker(&mut self, container: usize) -> Option<NodeList> {
        if self.indent >= CODE_INDENT {
            return None;
        }
        let rest = self.rest().as_bytes();
        let interrupts_paragraph = matches!(self.blocks[container].value, NodeValue::Paragraph);

        let mut data = NodeList {
            marker_offset: self.indent,
            tight: true,
            ..NodeList::default()
        };
        let marker_len = match *rest.first()? {
            c @ (b'*' | b'+' | b'-') => {
                data.list_type = ListType::Bullet;
                data.bullet_char = c;
                1
            }
            b'0'..=b'9' => {
                let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
                if digits > 9 {
                    return None;
                }
                let delimiter = match rest.get(digits) {
                    Some(b'.') => ListDelimType::Period,
                    Some(b')') => ListDelimType::Paren,
                    _ => return None,
                };
                let start: usize = std::str::from_utf8(&rest[..digits])
                    .ok()
                    .and_then(|s| s.parse().ok())?;
                if interrupts_paragraph && start != 1 {
                    return None;
                }
                data.list_type = ListType::Ordered;
                data.start = start;
                data.delimiter = delimiter;
                digits + 1
            }
            _ => return None,
        };

        match rest.get(marker_len) {
            None | Some(b' ' | b'\t') => {}
            Some(_) => return None,
        }
        if interrupts_paragraph
            && rest[marker_len..]
                .iter()
                .all(|&b| b == b' ' || b == b'\t')
        {
            return None;
        }

        self.advance_next_nonspace();
        self.advance_offset(marker_len, true);
        let spaces_start_column = self.column;
        let spaces_start_offset = self.offset;
        loop {
            self.advance_offset(1, true);
            let next = self.peek(self.offset);
            if self.column - spaces_start_column >= 5 || !matches!(next, Some(b' ' | b'\t')) {
                break;
            }
        }
        let blank_item = self.peek(self.offset).is_none();
        let spaces_after_marker = self.column - spaces_start_column;
        if spaces_after_marker >= 5 || spaces_after_marker < 1 || blank_item {
            data.padding = marker_len + 1;
            self.column = spaces_start_column;
            self.offset = spaces_start_offset;
            self.partially_consumed_tab = false;
            if matches!(self.peek(self.offset), Some(b' ' | b'\t')) {
                self.advance_offset(1, true);
            }
        } else {
            data.padding = marker_len + spaces_after_marker;
        }
        Some(data)
    }

    fn update_last_line_blank(&mut self, container: usize) {
        if self.blank {
            if let Some(&last) = self.blocks[container].children.last() {
                self.blocks[last].last_line_blank = true;
            }
        }

        let block = &self.blocks[container];
        let exempt = match &block.value {
            NodeValue::BlockQuote | NodeValue::Heading(_) | NodeValue::ThematicBreak => true,
            NodeValue::CodeBlock(code) => code.fenced,
            NodeValue::Item(_) => {
                block.children.is_empty() && block.start.line == self.line_number
            }
            _ => false,
        };
        self.blocks[container].last_line_blank = self.blank && !exempt;

        let mut ancestor = self.blocks[container].parent;
        while let Some(id) = ancestor {
            self.blocks[id].last_line_blank = false;
            ancestor = self.blocks[id].parent;
        }
    }

    fn add_text(&mut self, container: usize) {
        match &self.blocks[container].value {
            NodeValue::CodeBlock(_) => self.add_line(),
            NodeValue::Html(html) => {
                let block_type = html.block_type;
                self.add_line();
                let rest = &self.line[self.offset.min(self.line.len())..];
                if scanners::html_block_end(block_type, rest) {
                    self.last_line_length = self.line.len();
                    self.finalize(container, self.line_number);
                }
            }
            _ if self.blank => {}
            NodeValue::Paragraph => {
                self.advance_next_nonspace();
                self.add_line();
            }
            _ => {
                // Blocks that consumed the line leave the offset at its end
                if self.offset < self.line.len() {
                    let start = self.next_nonspace;
                    self.add_child(NodeValue::Paragraph, start);
                    self.advance_next_nonspace();
                    self.add_line();
                }
            }
        }
    }

    /// Append the rest of the current line to the tip's content
    fn add_line(&mut self) {
        let mut text = String::new();
        if self.partially_consumed_tab {
            self.offset += 1;
            let to_tab = self.options.tab_width - self.column % self.options.tab_width;
            text.extend(std::iter::repeat(' ').take(to_tab));
        }
        let offset = self.offset.min(self.line.len());
        text.push_str(&self.line[offset..]);
        text.push('\n');

        let line_number = self.line_number;
        let block = &mut self.blocks[self.tip];
        block.line_map.push(ContentLine {
            offset: block.content.len(),
            line: line_number,
            column: offset + 1,
        });
        block.content.push_str(&text);
    }

    /// Add a block as the last child of the tip, closing blocks that cannot
    /// hold it. `offset` is where it starts on the current line.
    pub fn add_child(&mut self, value: NodeValue, offset: usize) -> usize {
        while !self.blocks[self.tip].can_contain(&value) {
            let tip = self.tip;
            self.finalize(tip, self.line_number.saturating_sub(1));
        }
        let start = LineColumn::new(self.line_number, offset + 1);
        let id = self.push_block(self.tip, value, start);
        self.tip = id;
        id
    }

    /// Append a block to `parent` without making it the tip
    pub fn push_block(&mut self, parent: usize, value: NodeValue, start: LineColumn) -> usize {
        let id = self.blocks.len();
        self.blocks.push(Block::new(value, Some(parent), start));
        self.blocks[parent].children.push(id);
        id
    }

    /// Detach a block from its parent; it is dropped from the output
    pub fn unlink(&mut self, id: usize) {
        if let Some(parent) = self.blocks[id].parent {
            self.blocks[parent].children.retain(|&child| child != id);
        }
        if self.tip == id {
            self.tip = self.blocks[id].parent.unwrap_or(ROOT);
        }
    }

    /// Finalize the blocks left open by the previous line that this line
    /// did not continue
    pub fn close_unmatched(&mut self) {
        if self.all_closed {
            return;
        }
        while self.oldtip != self.last_matched {
            let oldtip = self.oldtip;
            let parent = self.blocks[oldtip].parent.unwrap_or(ROOT);
            self.finalize(oldtip, self.line_number.saturating_sub(1));
            self.oldtip = parent;
        }
        self.all_closed = true;
    }

    /// Close a block that ends on `line`; the tip moves to its parent
    pub fn finalize(&mut self, id: usize, line: usize) {
        let block = &mut self.blocks[id];
        let parent = block.parent;
        if !block.open {
            if self.tip == id {
                self.tip = parent.unwrap_or(ROOT);
            }
            return;
        }
        block.open = false;
        block.end = LineColumn::new(line, self.last_line_length);

        match &self.blocks[id].value {
            NodeValue::Paragraph => {
                if !self.resolve_reference_definitions(id) {
                    self.unlink(id);
                }
            }
            NodeValue::CodeBlock(code) => {
                let fenced = code.fenced;
                self.finalize_code_block(id, fenced);
            }
            NodeValue::Html(_) => {
                let block = &mut self.blocks[id];
                let literal = std::mem::take(&mut block.content);
                if let NodeValue::Html(html) = &mut block.value {
                    html.literal = literal;
                }
            }
            NodeValue::List(_) => {
                let tight = self.list_is_tight(id);
                if let NodeValue::List(list) = &mut self.blocks[id].value {
                    list.tight = tight;
                }
            }
            _ => {}
        }

        let registry = self.registry;
        for finalize in registry.finalizers() {
            finalize(self, id);
        }

        trace!(kind = ?self.blocks[id].value.kind(), line, "closed block");
        self.tip = parent.unwrap_or(ROOT);
    }

    /// Move leading link reference definitions of a paragraph into the
    /// reference map. Returns whether any content is left.
    fn resolve_reference_definitions(&mut self, id: usize) -> bool {
        let block = &mut self.blocks[id];
        let (consumed, definitions) = parse_definitions(&block.content);
        if consumed > 0 {
            block.content.drain(..consumed);
            crate::scanner::drop_prefix(&mut block.line_map, consumed);
            if !block.line_map.is_empty() {
                block.start = position_at(&block.line_map, 0);
            }
        }
        let has_content = block.content.bytes().any(|b| !b.is_ascii_whitespace());
        for definition in definitions {
            self.refmap.insert(&definition.label, definition.reference);
        }
        has_content
    }

    fn finalize_code_block(&mut self, id: usize, fenced: bool) {
        let block = &mut self.blocks[id];
        let content = std::mem::take(&mut block.content);
        let NodeValue::CodeBlock(code) = &mut block.value else {
            return;
        };

        if fenced {
            let (first, rest) = content.split_once('\n').unwrap_or((&content, ""));
            code.info = unescape_string(first.trim()).into_owned();
            code.literal = rest.to_string();
        } else {
            let mut lines: Vec<&str> = content.split('\n').collect();
            while lines
                .last()
                .is_some_and(|line| line.bytes().all(|b| b == b' ' || b == b'\t'))
            {
                lines.pop();
            }
            let mut literal = lines.join("\n");
            if !literal.is_empty() {
                literal.push('\n');
            }
            code.literal = literal;
        }
    }

    fn ends_with_blank_line(&self, mut id: usize) -> bool {
        loop {
            let block = &self.blocks[id];
            if block.last_line_blank {
                return true;
            }
            match (&block.value, block.children.last()) {
                (NodeValue::List(_) | NodeValue::Item(_), Some(&last)) => id = last,
                _ => return false,
            }
        }
    }

    fn list_is_tight(&self, id: usize) -> bool {
        let items = &self.blocks[id].children;
        for (i, &item) in items.iter().enumerate() {
            let has_next_item = i + 1 < items.len();
            if self.blocks[item].last_line_blank && has_next_item {
                return false;
            }
            let subitems = &self.blocks[item].children;
            for (j, &sub) in subitems.iter().enumerate() {
                let has_next = has_next_item || j + 1 < subitems.len();
                if has_next && self.ends_with_blank_line(sub) {
                    return false;
                }
            }
        }
        true
    }

    fn to_node(&self, id: usize, ctx: &InlineContext<'_>) -> Node {
        let block = &self.blocks[id];
        let sourcepos = Sourcepos {
            start: block.start,
            end: block.end,
        };
        let mut children = match &block.value {
            NodeValue::Paragraph | NodeValue::Heading(_) | NodeValue::TableCell => {
                parse_inlines(ctx, &block.content, &block.line_map)
            }
            _ => block
                .children
                .iter()
                .map(|&child| self.to_node(child, ctx))
                .collect(),
        };

        if let Some((checked, at)) = block.task {
            let marker = Sourcepos {
                start: at,
                end: LineColumn::new(at.line, at.column + 2),
            };
            children.insert(0, Node::new(NodeValue::TaskListMarker(checked), marker));
        }
        Node::with_children(block.value.clone(), sourcepos, children)
    }
}

fn lists_match(list: &NodeList, item: &NodeList) -> bool {
    list.list_type == item.list_type
        && list.delimiter == item.delimiter
        && list.bullet_char == item.bullet_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfmark_core::{Extension, NodeKind};
    use pretty_assertions::assert_eq;

    fn parse_with(input: &str, options: &ParseOptions) -> Node {
        let registry = ExtensionRegistry::new(&options.extensions);
        let mut parser = BlockParser::new(&registry, options);
        let lines: Vec<&str> = input.lines().collect();
        for (i, line) in lines.iter().enumerate() {
            parser.feed(line, i + 1);
        }
        parser.finish(lines.len())
    }

    fn parse(input: &str) -> Node {
        parse_with(input, &ParseOptions::default())
    }

    /// Block kinds in document order, indented by depth
    fn outline(node: &Node) -> Vec<String> {
        fn walk(node: &Node, depth: usize, out: &mut Vec<String>) {
            if !node.value.is_block() {
                return;
            }
            out.push(format!("{}{:?}", "  ".repeat(depth), node.kind()));
            for child in &node.children {
                walk(child, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        for child in &node.children {
            walk(child, 0, &mut out);
        }
        out
    }

    #[test]
    fn test_paragraphs_and_headings() {
        let doc = parse("# Title\n\nSome *text*\nmore\n\nSetext\n===");
        assert_eq!(outline(&doc), vec!["Heading", "Paragraph", "Heading"]);
        assert_eq!(doc.children[0].text_content(), "Title");
        match &doc.children[2].value {
            NodeValue::Heading(heading) => {
                assert_eq!(heading.level, 1);
                assert!(heading.setext);
            }
            other => panic!("expected heading, got {other:?}"),
        }
    }

    #[test]
    fn test_block_quote_lazy_continuation() {
        let doc = parse("> a\nb\n\nc");
        assert_eq!(outline(&doc), vec!["BlockQuote", "  Paragraph", "Paragraph"]);
        assert_eq!(doc.children[0].text_content(), "a b");
    }

    #[test]
    fn test_fenced_code() {
        let doc = parse("```rust extra\nfn main() {}\n\n```\nafter");
        match &doc.children[0].value {
            NodeValue::CodeBlock(code) => {
                assert!(code.fenced);
                assert_eq!(code.info, "rust extra");
                assert_eq!(code.literal, "fn main() {}\n\n");
            }
            other => panic!("expected code block, got {other:?}"),
        }
        assert_eq!(doc.children[0].sourcepos, Sourcepos::new(1, 1, 4, 3));
        assert_eq!(doc.children[1].kind(), NodeKind::Paragraph);
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let doc = parse("  ~~~\n  a\n b\nc");
        match &doc.children[0].value {
            NodeValue::CodeBlock(code) => assert_eq!(code.literal, "a\nb\nc\n"),
            other => panic!("expected code block, got {other:?}"),
        }
    }

    #[test]
    fn test_indented_code() {
        let doc = parse("    a\n\n    b\n\n\nc");
        match &doc.children[0].value {
            NodeValue::CodeBlock(code) => {
                assert!(!code.fenced);
                assert_eq!(code.literal, "a\n\nb\n");
            }
            other => panic!("expected code block, got {other:?}"),
        }
        // Indented text cannot interrupt a paragraph
        let doc = parse("a\n    b");
        assert_eq!(outline(&doc), vec!["Paragraph"]);
    }

    #[test]
    fn test_tab_indented_code() {
        let doc = parse("\tcode");
        match &doc.children[0].value {
            NodeValue::CodeBlock(code) => assert_eq!(code.literal, "code\n"),
            other => panic!("expected code block, got {other:?}"),
        }
    }

    #[test]
    fn test_lists_tight_and_loose() {
        let doc = parse("- a\n- b\n\n1. x\n\n2. y");
        assert_eq!(
            outline(&doc),
            vec!["List", "  Item", "    Paragraph", "  Item", "    Paragraph", "List", "  Item",
                 "    Paragraph", "  Item", "    Paragraph"]
        );
        let tight: Vec<bool> = doc
            .children
            .iter()
            .map(|list| match &list.value {
                NodeValue::List(list) => list.tight,
                _ => false,
            })
            .collect();
        assert_eq!(tight, vec![true, false]);
    }

    #[test]
    fn test_list_type_change_starts_new_list() {
        let doc = parse("- a\n+ b\n1) c");
        assert_eq!(doc.children.len(), 3);
    }

    #[test]
    fn test_nested_list_item() {
        let doc = parse("- a\n  - b\n\n    c");
        assert_eq!(
            outline(&doc),
            vec!["List", "  Item", "    Paragraph", "    List", "      Item", "        Paragraph",
                 "        Paragraph"]
        );
    }

    #[test]
    fn test_ordered_list_interrupting_paragraph() {
        assert_eq!(outline(&parse("a\n2. b")), vec!["Paragraph"]);
        assert_eq!(
            outline(&parse("a\n1. b")),
            vec!["Paragraph", "List", "  Item", "    Paragraph"]
        );
    }

    #[test]
    fn test_html_blocks() {
        let doc = parse("<div>\n*a*\n\n*b*");
        assert_eq!(outline(&doc), vec!["Html", "Paragraph"]);
        match &doc.children[0].value {
            NodeValue::Html(html) => assert_eq!(html.literal, "<div>\n*a*\n"),
            other => panic!("expected html, got {other:?}"),
        }

        let doc = parse("<!-- a\nb -->\nc");
        assert_eq!(outline(&doc), vec!["Html", "Paragraph"]);
    }

    #[test]
    fn test_reference_definitions() {
        let doc = parse("[foo]: /url \"t\"\n\n[foo]");
        assert_eq!(outline(&doc), vec!["Paragraph"]);
        match &doc.children[0].children[0].value {
            NodeValue::Link(link) => {
                assert_eq!(link.url, "/url");
                assert_eq!(link.title, "t");
            }
            other => panic!("expected link, got {other:?}"),
        }
    }

    #[test]
    fn test_thematic_break_and_setext() {
        assert_eq!(outline(&parse("a\n---")), vec!["Heading"]);
        assert_eq!(outline(&parse("a\n\n---")), vec!["Paragraph", "ThematicBreak"]);
        assert_eq!(outline(&parse("- - -")), vec!["ThematicBreak"]);
    }

    #[test]
    fn test_sourcepos() {
        let doc = parse("> # hi\n> there");
        assert_eq!(doc.children[0].sourcepos, Sourcepos::new(1, 1, 2, 7));
        assert_eq!(doc.children[0].children[0].sourcepos, Sourcepos::new(1, 3, 1, 6));
        assert_eq!(doc.children[0].children[1].sourcepos, Sourcepos::new(2, 3, 2, 7));
    }

    #[test]
    fn test_block_depth_limit() {
        let input = ">".repeat(MAX_BLOCK_DEPTH + 10);
        let doc = parse(&input);
        let mut depth = 0;
        let mut node = &doc;
        while let Some(child) = node.children.first() {
            if child.kind() != NodeKind::BlockQuote {
                break;
            }
            depth += 1;
            node = child;
        }
        assert_eq!(depth, MAX_BLOCK_DEPTH);
    }

    #[test]
    fn test_tables_with_extension() {
        let options = ParseOptions {
            extensions: vec![Extension::Table],
            ..ParseOptions::default()
        };
        let doc = parse_with("intro\n| a | b |\n|---|:-:|\n| 1 | 2 | 3 |\n| 4 |\n\nafter", &options);
        assert_eq!(
            outline(&doc),
            vec!["Paragraph", "Table", "  TableRow", "    TableCell", "    TableCell",
                 "  TableRow", "    TableCell", "    TableCell", "  TableRow", "    TableCell",
                 "    TableCell", "Paragraph"]
        );
        assert_eq!(doc.children[0].text_content(), "intro");
    }
}
