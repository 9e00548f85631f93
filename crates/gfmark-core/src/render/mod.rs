//! Tree-walking renderers
//!
//! Every renderer borrows the document read-only and produces a `String`.
//! Rendering is total: any well-formed tree renders in every [`Format`].

mod commonmark;
mod html;
mod plaintext;

use tracing::debug;

use crate::ast::Document;
use crate::options::{Format, RenderOptions};

pub use commonmark::render_commonmark;
pub use html::render_html;
pub use plaintext::render_plaintext;

/// Render a document in the requested format
pub fn render(doc: &Document, format: Format, options: &RenderOptions) -> String {
    let output = match format {
        Format::Html => render_html(doc, options),
        Format::CommonMark => render_commonmark(doc, options),
        Format::PlainText => render_plaintext(doc, options),
    };
    debug!(%format, bytes = output.len(), "rendered document");
    output
}

/// Line-oriented output buffer with a container prefix stack.
///
/// Blocks ask for a number of line endings before their content with
/// [`Writer::cr`]; the endings are only materialised when the next content
/// arrives, so containers never emit trailing blank lines. Blank lines carry
/// the current prefix with its trailing whitespace removed.
pub(crate) struct Writer {
    out: String,
    prefix: String,
    /// Line endings requested before the next content
    pending: usize,
    /// Line endings written since the last content
    newlines: usize,
    at_line_start: bool,
    /// Set right after a list marker: the first child block continues on
    /// the marker's line
    pub(crate) item_start: bool,
}

impl Writer {
    pub(crate) fn new() -> Self {
        Self {
            out: String::with_capacity(4096),
            prefix: String::new(),
            pending: 0,
            newlines: 0,
            at_line_start: true,
            item_start: false,
        }
    }

    /// Request `n` line endings (1 = new line, 2 = blank line) before the
    /// next content.
    pub(crate) fn cr(&mut self, n: usize) {
        if !self.item_start {
            self.pending = self.pending.max(n);
        }
    }

    /// True when the next content starts a line of output
    pub(crate) fn at_line_start(&self) -> bool {
        self.item_start || self.at_line_start || self.pending > 0
    }

    /// Last character written on the current line, if any
    pub(crate) fn last_char(&self) -> Option<char> {
        if self.at_line_start() {
            return None;
        }
        self.out.chars().next_back()
    }

    pub(crate) fn push_prefix(&mut self, s: &str) -> usize {
        let len = self.prefix.len();
        self.prefix.push_str(s);
        len
    }

    pub(crate) fn restore_prefix(&mut self, len: usize) {
        self.prefix.truncate(len);
    }

    fn newline(&mut self) {
        if self.at_line_start {
            let trimmed_len = self.prefix.trim_end().len();
            self.out.push_str(&self.prefix[..trimmed_len]);
        }
        self.out.push('\n');
        self.newlines += 1;
        self.at_line_start = true;
    }

    fn flush_pending(&mut self) {
        if self.pending == 0 {
            return;
        }
        if self.out.is_empty() {
            self.pending = 0;
            return;
        }
        while self.newlines < self.pending {
            self.newline();
        }
        self.pending = 0;
    }

    /// Write content; embedded newlines start new prefixed lines.
    pub(crate) fn write(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        self.flush_pending();
        for (i, line) in s.split('\n').enumerate() {
            if i > 0 {
                self.newline();
            }
            if !line.is_empty() {
                if self.at_line_start {
                    self.out.push_str(&self.prefix);
                    self.at_line_start = false;
                }
                self.out.push_str(line);
                self.newlines = 0;
            }
        }
        self.item_start = false;
    }

    pub(crate) fn write_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.write(c.encode_utf8(&mut buf));
    }

    /// End the current line unconditionally
    pub(crate) fn line_break(&mut self) {
        self.flush_pending();
        self.newline();
        self.item_start = false;
    }

    /// Finish output with exactly one trailing newline
    pub(crate) fn finish(mut self) -> String {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out
    }

    /// Take the raw buffer for single-line fragments such as table cells
    pub(crate) fn into_inner(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_blank_lines_use_trimmed_prefix() {
        let mut w = Writer::new();
        let saved = w.push_prefix("> ");
        w.write("a");
        w.cr(2);
        w.write("b");
        w.restore_prefix(saved);
        w.cr(2);
        w.write("c");
        assert_eq!(w.finish(), "> a\n>\n> b\n\nc\n");
    }

    #[test]
    fn test_writer_ignores_leading_breaks() {
        let mut w = Writer::new();
        w.cr(2);
        w.write("x");
        assert_eq!(w.finish(), "x\n");
    }

    #[test]
    fn test_writer_last_char() {
        let mut w = Writer::new();
        assert_eq!(w.last_char(), None);
        w.write("ab");
        assert_eq!(w.last_char(), Some('b'));
        w.line_break();
        assert_eq!(w.last_char(), None);
    }

    #[test]
    fn test_writer_item_start_keeps_line() {
        let mut w = Writer::new();
        w.write("- ");
        let saved = w.push_prefix("  ");
        w.item_start = true;
        w.cr(2);
        w.write("one\ntwo");
        w.restore_prefix(saved);
        assert_eq!(w.finish(), "- one\n  two\n");
    }
}
