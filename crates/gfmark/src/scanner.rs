//! Source buffer and line scanner
//!
//! Turns raw input bytes into decoded text split into logical lines. Line
//! endings (`\n`, `\r\n`, `\r`) are removed from each line; the block parser
//! treats the end of a line as an implicit newline. Tabs are kept as-is and
//! expanded lazily by the block parser, which knows the current column.

use gfmark_core::{Error, LineColumn, Result};
use tracing::warn;

const REPLACEMENT: char = '\u{FFFD}';

/// Decoded input plus the byte spans of its lines
#[derive(Debug, Clone, Default)]
pub struct SourceBuffer {
    text: String,
    spans: Vec<(usize, usize)>,
    /// Offsets in `text` where invalid input was replaced
    replaced: Vec<usize>,
}

/// One logical line, without its line ending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub text: &'a str,
    /// Byte offset of the line in the decoded text
    pub start_offset: usize,
    /// 1-based line number
    pub number: usize,
}

impl SourceBuffer {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn replacements(&self) -> &[usize] {
        &self.replaced
    }

    pub fn lines(&self) -> impl Iterator<Item = Line<'_>> + '_ {
        self.spans
            .iter()
            .enumerate()
            .map(move |(i, &(start, end))| Line {
                text: &self.text[start..end],
                start_offset: start,
                number: i + 1,
            })
    }
}

/// Decode `bytes` and split them into lines.
///
/// Invalid UTF-8 is replaced with U+FFFD unless `strict` is set, in which
/// case the first invalid byte fails with [`Error::Encoding`].
pub fn scan(bytes: &[u8], strict: bool) -> Result<SourceBuffer> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let (text, replaced) = decode(bytes, strict)?;
    Ok(buffer(text, replaced))
}

/// Split text that is already valid UTF-8 into lines
pub fn scan_str(input: &str) -> SourceBuffer {
    let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    let mut text = String::with_capacity(input.len());
    let mut replaced = Vec::new();
    push_text(&mut text, input, &mut replaced);
    buffer(text, replaced)
}

fn buffer(text: String, replaced: Vec<usize>) -> SourceBuffer {
    if !replaced.is_empty() {
        warn!(count = replaced.len(), "replaced invalid input with U+FFFD");
    }

    let spans = split_lines(&text);
    SourceBuffer {
        text,
        spans,
        replaced,
    }
}

fn decode(bytes: &[u8], strict: bool) -> Result<(String, Vec<usize>)> {
    let mut text = String::with_capacity(bytes.len());
    let mut replaced = Vec::new();
    let mut rest = bytes;
    let mut consumed = 0;

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                push_text(&mut text, valid, &mut replaced);
                return Ok((text, replaced));
            }
            Err(err) => {
                let valid_up_to = err.valid_up_to();
                if strict {
                    return Err(Error::Encoding {
                        offset: consumed + valid_up_to,
                    });
                }
                if let Ok(valid) = std::str::from_utf8(&rest[..valid_up_to]) {
                    push_text(&mut text, valid, &mut replaced);
                }
                replaced.push(text.len());
                text.push(REPLACEMENT);

                let skip = valid_up_to + err.error_len().unwrap_or(rest.len() - valid_up_to);
                consumed += skip;
                rest = &rest[skip..];
            }
        }
    }
}

/// Append decoded text, replacing NUL characters
fn push_text(text: &mut String, chunk: &str, replaced: &mut Vec<usize>) {
    for (i, part) in chunk.split('\0').enumerate() {
        if i > 0 {
            replaced.push(text.len());
            text.push(REPLACEMENT);
        }
        text.push_str(part);
    }
}

fn split_lines(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                spans.push((start, i));
                i += 1;
                start = i;
            }
            b'\r' => {
                spans.push((start, i));
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        spans.push((start, bytes.len()));
    }
    spans
}

/// Where a run of block content came from.
///
/// Block content is stored as one string per block with the container
/// prefixes stripped; every added line records the content offset it starts
/// at and the source position of that byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ContentLine {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// Source position of byte `offset` of some block content
pub(crate) fn position_at(map: &[ContentLine], offset: usize) -> LineColumn {
    let idx = map.partition_point(|entry| entry.offset <= offset);
    match idx.checked_sub(1).and_then(|i| map.get(i)) {
        Some(entry) => LineColumn::new(entry.line, entry.column + (offset - entry.offset)),
        None => map
            .first()
            .map(|entry| LineColumn::new(entry.line, entry.column))
            .unwrap_or_default(),
    }
}

/// Adjust a line map after `n` bytes were removed from the front of the
/// content it describes
pub(crate) fn drop_prefix(map: &mut Vec<ContentLine>, n: usize) {
    if n == 0 {
        return;
    }
    let first_kept = map.partition_point(|entry| entry.offset <= n).saturating_sub(1);
    map.drain(..first_kept);
    for entry in map.iter_mut() {
        if entry.offset <= n {
            entry.column += n - entry.offset;
            entry.offset = 0;
        } else {
            entry.offset -= n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(input: &[u8]) -> Vec<String> {
        scan(input, false)
            .unwrap()
            .lines()
            .map(|l| l.text.to_string())
            .collect()
    }

    #[test]
    fn test_line_endings() {
        assert_eq!(lines(b"a\nb\r\nc\rd"), vec!["a", "b", "c", "d"]);
        assert_eq!(lines(b"a\n\nb\n"), vec!["a", "", "b"]);
        assert!(lines(b"").is_empty());
    }

    #[test]
    fn test_bom_and_nul() {
        let buf = scan(b"\xEF\xBB\xBFx\0y", false).unwrap();
        assert_eq!(buf.text(), "x\u{FFFD}y");
        assert_eq!(buf.replacements(), &[1]);
    }

    #[test]
    fn test_lossy_decoding() {
        let buf = scan(b"ok \xFF\xFE done", false).unwrap();
        assert_eq!(buf.text(), "ok \u{FFFD}\u{FFFD} done");
        assert_eq!(buf.replacements().len(), 2);
    }

    #[test]
    fn test_strict_decoding_reports_offset() {
        let err = scan(b"abc\xC3", true).unwrap_err();
        assert_eq!(err, Error::Encoding { offset: 3 });
    }

    #[test]
    fn test_scan_str_matches_scan() {
        let input = "\u{FEFF}a\0b\r\nc";
        let from_str = scan_str(input);
        let from_bytes = scan(input.as_bytes(), true).unwrap();
        assert_eq!(from_str.text(), from_bytes.text());
        assert_eq!(from_str.replacements(), from_bytes.replacements());
        assert_eq!(from_str.len(), 2);
    }

    #[test]
    fn test_line_offsets() {
        let buf = scan(b"ab\r\ncd", false).unwrap();
        let all: Vec<Line<'_>> = buf.lines().collect();
        assert_eq!(all[1].start_offset, 4);
        assert_eq!(all[1].number, 2);
    }

    #[test]
    fn test_position_at_and_drop_prefix() {
        let mut map = vec![
            ContentLine {
                offset: 0,
                line: 1,
                column: 3,
            },
            ContentLine {
                offset: 6,
                line: 2,
                column: 1,
            },
        ];
        assert_eq!(position_at(&map, 2), LineColumn::new(1, 5));
        assert_eq!(position_at(&map, 7), LineColumn::new(2, 2));

        drop_prefix(&mut map, 7);
        assert_eq!(map.len(), 1);
        assert_eq!(position_at(&map, 0), LineColumn::new(2, 2));
    }
}
