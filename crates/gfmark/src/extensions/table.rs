//! Pipe tables
//!
//! A table starts when a paragraph's last line is followed by a delimiter
//! row with the same number of cells. Every following non-blank line is a
//! body row, padded or truncated to the header's width.

use gfmark_core::{LineColumn, NodeTable, NodeValue, TableAlignment};
use tracing::trace;

use crate::blocks::BlockParser;
use crate::references::parse_definitions;
use crate::scanner::{drop_prefix, position_at, ContentLine};

use super::{BlockStart, BlockStartHook, ExtensionHooks, Slot};

pub(super) fn hooks() -> ExtensionHooks {
    ExtensionHooks {
        block_starts: vec![BlockStartHook {
            slot: Slot::AfterCore,
            start: try_opening_table,
        }],
        continues: Some(table_continues),
        ..ExtensionHooks::default()
    }
}

/// One cell of a split row
#[derive(Debug, Clone, PartialEq, Eq)]
struct Cell {
    /// Byte offset of the trimmed cell text in the row
    offset: usize,
    text: String,
}

/// Split a row on unescaped pipes. A leading and a trailing pipe are
/// optional; `\|` stands for a literal pipe inside a cell.
fn split_row(row: &str) -> Vec<Cell> {
    let row = row.trim_end_matches([' ', '\t']);
    let mut cells = Vec::new();
    let mut chars = row.char_indices().peekable();

    let leading = row.len() - row.trim_start_matches([' ', '\t']).len();
    let mut start = leading;
    if row[leading..].starts_with('|') {
        start += 1;
    }
    while chars.peek().is_some_and(|&(i, _)| i < start) {
        chars.next();
    }

    let mut text = String::new();
    let mut cell_start = start;
    let mut ended_with_pipe = false;
    while let Some((i, c)) = chars.next() {
        ended_with_pipe = false;
        match c {
            '\\' if chars.peek().is_some_and(|&(_, next)| next == '|') => {
                chars.next();
                text.push('|');
            }
            '|' => {
                cells.push(finish_cell(&text, cell_start, row));
                text.clear();
                cell_start = i + 1;
                ended_with_pipe = true;
            }
            _ => text.push(c),
        }
    }
    if !ended_with_pipe {
        cells.push(finish_cell(&text, cell_start, row));
    }
    if cells.len() == 1 && cells[0].text.is_empty() && !row.contains('|') {
        cells.clear();
    }
    cells
}

fn finish_cell(text: &str, start: usize, row: &str) -> Cell {
    let leading = row[start..]
        .bytes()
        .take_while(|&b| b == b' ' || b == b'\t')
        .count();
    Cell {
        offset: start + leading,
        text: text.trim_matches([' ', '\t']).to_string(),
    }
}

/// Column alignments if `row` is a delimiter row
fn parse_delimiter_row(row: &str) -> Option<Vec<TableAlignment>> {
    if !row
        .bytes()
        .all(|b| matches!(b, b'|' | b'-' | b':' | b' ' | b'\t'))
    {
        return None;
    }
    let cells = split_row(row);
    if cells.is_empty() {
        return None;
    }
    cells
        .iter()
        .map(|cell| {
            let text = cell.text.as_str();
            let left = text.starts_with(':');
            let right = text.len() > 1 && text.ends_with(':');
            let dashes = &text[usize::from(left)..text.len() - usize::from(right)];
            if dashes.is_empty() || !dashes.bytes().all(|b| b == b'-') {
                return None;
            }
            Some(match (left, right) {
                (true, true) => TableAlignment::Center,
                (true, false) => TableAlignment::Left,
                (false, true) => TableAlignment::Right,
                (false, false) => TableAlignment::None,
            })
        })
        .collect()
}

fn table_continues(parser: &mut BlockParser<'_>, id: usize) -> Option<bool> {
    match parser.block(id).value {
        NodeValue::Table(_) => Some(!parser.is_blank()),
        _ => None,
    }
}

fn try_opening_table(parser: &mut BlockParser<'_>, container: usize) -> BlockStart {
    if parser.is_indented() || parser.is_blank() {
        return BlockStart::None;
    }
    match &parser.block(container).value {
        NodeValue::Table(table) => {
            let columns = table.alignments.len();
            add_body_row(parser, container, columns);
            parser.consume_line();
            BlockStart::Leaf
        }
        NodeValue::Paragraph => try_opening_header(parser, container),
        _ => BlockStart::None,
    }
}

fn try_opening_header(parser: &mut BlockParser<'_>, paragraph: usize) -> BlockStart {
    let delimiter_row = parser.rest();
    let Some(alignments) = parse_delimiter_row(delimiter_row) else {
        return BlockStart::None;
    };

    let block = parser.block(paragraph);
    let body = block.content.trim_end_matches('\n');
    let header_start = body.rfind('\n').map_or(0, |i| i + 1);
    let header = &body[header_start..];
    if !header.contains('|') && !delimiter_row.contains('|') {
        return BlockStart::None;
    }
    let header_cells = split_row(header);
    if header_cells.len() != alignments.len() {
        return BlockStart::None;
    }
    let header_len = header.len();

    let (consumed, definitions) = parse_definitions(&body[..header_start]);
    let leading = body[consumed..header_start].to_string();
    let header_pos = position_at(&block.line_map, header_start);
    let leading_end = header_start
        .checked_sub(2)
        .map(|last| position_at(&block.line_map, last));

    parser.close_unmatched();
    for definition in definitions {
        parser.refmap.insert(&definition.label, definition.reference);
    }

    if leading.trim().is_empty() {
        parser.unlink(paragraph);
    } else {
        let block = parser.block_mut(paragraph);
        block.content = leading;
        drop_prefix(&mut block.line_map, consumed);
        let kept = block.content.len();
        block.line_map.retain(|entry| entry.offset < kept);
        if consumed > 0 {
            block.start = position_at(&block.line_map, 0);
        }
        let line = parser.line_number().saturating_sub(2);
        parser.finalize(paragraph, line);
        if let Some(end) = leading_end {
            parser.block_mut(paragraph).end = end;
        }
    }

    let table = parser.add_child(
        NodeValue::Table(NodeTable {
            alignments: alignments.clone(),
        }),
        header_pos.column.saturating_sub(1),
    );
    parser.block_mut(table).start = header_pos;
    trace!(columns = alignments.len(), line = header_pos.line, "opened table");

    let header_end = LineColumn::new(
        header_pos.line,
        header_pos.column + header_len.saturating_sub(1),
    );
    let row = parser.push_block(table, NodeValue::TableRow(true), header_pos);
    fill_row(parser, row, &header_cells, header_pos, alignments.len());
    close(parser, row, header_end);

    parser.consume_line();
    BlockStart::Leaf
}

fn add_body_row(parser: &mut BlockParser<'_>, table: usize, columns: usize) {
    let line = parser.line_number();
    let offset = parser.next_nonspace();
    let text = parser.rest();
    let cells = split_row(text);

    let start = LineColumn::new(line, offset + 1);
    let end = LineColumn::new(line, parser.line().len());
    let row = parser.push_block(table, NodeValue::TableRow(false), start);
    fill_row(parser, row, &cells, start, columns);
    close(parser, row, end);
}

/// Add exactly `columns` cells to `row`, padding with empty cells
fn fill_row(
    parser: &mut BlockParser<'_>,
    row: usize,
    cells: &[Cell],
    row_start: LineColumn,
    columns: usize,
) {
    let mut last_end = row_start;
    for i in 0..columns {
        let (start, text) = match cells.get(i) {
            Some(cell) => (
                LineColumn::new(row_start.line, row_start.column + cell.offset),
                cell.text.as_str(),
            ),
            None => (last_end, ""),
        };
        let end = LineColumn::new(start.line, start.column + text.len().saturating_sub(1));
        let cell = parser.push_block(row, NodeValue::TableCell, start);
        let block = parser.block_mut(cell);
        block.content = text.to_string();
        block.line_map.push(ContentLine {
            offset: 0,
            line: start.line,
            column: start.column,
        });
        close(parser, cell, end);
        last_end = end;
    }
}

fn close(parser: &mut BlockParser<'_>, id: usize, end: LineColumn) {
    let block = parser.block_mut(id);
    block.open = false;
    block.end = end;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(row: &str) -> Vec<String> {
        split_row(row).into_iter().map(|cell| cell.text).collect()
    }

    #[test]
    fn test_split_row() {
        assert_eq!(texts("| a | b |"), vec!["a", "b"]);
        assert_eq!(texts("a | b"), vec!["a", "b"]);
        assert_eq!(texts("| a |  |"), vec!["a", ""]);
        assert_eq!(texts("a \\| b | c"), vec!["a | b", "c"]);
        assert_eq!(texts("`x` | **y**"), vec!["`x`", "**y**"]);
        assert!(texts("").is_empty());
    }

    #[test]
    fn test_cell_offsets() {
        let cells = split_row("| ab |  cd |");
        assert_eq!(cells[0].offset, 2);
        assert_eq!(cells[1].offset, 8);
    }

    #[test]
    fn test_delimiter_row() {
        assert_eq!(
            parse_delimiter_row("| --- | :-- | --: | :-: |"),
            Some(vec![
                TableAlignment::None,
                TableAlignment::Left,
                TableAlignment::Right,
                TableAlignment::Center,
            ])
        );
        assert_eq!(parse_delimiter_row("-|-"), Some(vec![TableAlignment::None; 2]));
        assert_eq!(parse_delimiter_row("| a |"), None);
        assert_eq!(parse_delimiter_row("| : |"), None);
        assert_eq!(parse_delimiter_row("|"), None);
    }
}
