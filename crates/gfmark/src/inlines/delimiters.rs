//! Delimiter runs and the emphasis matching algorithm
//!
//! The delimiter stack is a doubly linked list threaded through an
//! index-addressed `Vec` of runs. Runs are never moved or freed while a span
//! is being parsed; leaving the stack only unlinks them, so the tree builder
//! can still read what each run opened and closed.

use std::collections::HashMap;

use gfmark_core::NodeValue;

use crate::extensions::InlineDelimiter;

/// One run of `*`, `_` or an extension delimiter character
#[derive(Debug, Clone)]
pub(crate) struct DelimRun<'c> {
    pub ch: u8,
    /// Byte offset of the first character in the subject
    pub start: usize,
    /// Length as scanned
    pub orig: usize,
    /// Characters consumed from the left by closing matches
    pub left_used: usize,
    /// Characters consumed from the right by opening matches
    pub right_used: usize,
    pub can_open: bool,
    pub can_close: bool,
    pub ext: Option<&'c InlineDelimiter>,
    /// Nodes opened here, innermost first, with the offset of their first
    /// delimiter character
    pub opens: Vec<(NodeValue, usize)>,
    /// Offsets of the last delimiter character of each node closed here,
    /// innermost first
    pub closes: Vec<usize>,
    prev: Option<usize>,
    next: Option<usize>,
    in_stack: bool,
}

impl<'c> DelimRun<'c> {
    pub fn new(
        ch: u8,
        start: usize,
        orig: usize,
        (can_open, can_close): (bool, bool),
        ext: Option<&'c InlineDelimiter>,
    ) -> Self {
        Self {
            ch,
            start,
            orig,
            left_used: 0,
            right_used: 0,
            can_open,
            can_close,
            ext,
            opens: Vec::new(),
            closes: Vec::new(),
            prev: None,
            next: None,
            in_stack: false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.orig - self.left_used - self.right_used
    }

    /// Byte range of the characters left over as literal text
    pub fn literal_range(&self) -> (usize, usize) {
        (
            self.start + self.left_used,
            self.start + self.orig - self.right_used,
        )
    }
}

#[derive(Debug, Default)]
pub(crate) struct DelimiterStack<'c> {
    pub runs: Vec<DelimRun<'c>>,
    top: Option<usize>,
    len: usize,
}

impl<'c> DelimiterStack<'c> {
    pub fn new() -> Self {
        Self {
            runs: Vec::new(),
            top: None,
            len: 0,
        }
    }

    pub fn top(&self) -> Option<usize> {
        self.top
    }

    /// Number of runs currently on the stack
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn push(&mut self, mut run: DelimRun<'c>) -> usize {
        let id = self.runs.len();
        run.prev = self.top;
        run.next = None;
        run.in_stack = true;
        if let Some(top) = self.top {
            self.runs[top].next = Some(id);
        }
        self.runs.push(run);
        self.top = Some(id);
        self.len += 1;
        id
    }

    fn remove(&mut self, id: usize) {
        if !self.runs[id].in_stack {
            return;
        }
        let (prev, next) = (self.runs[id].prev, self.runs[id].next);
        if let Some(p) = prev {
            self.runs[p].next = next;
        }
        match next {
            Some(n) => self.runs[n].prev = prev,
            None => self.top = prev,
        }
        let run = &mut self.runs[id];
        run.prev = None;
        run.next = None;
        run.in_stack = false;
        self.len -= 1;
    }

    /// Whether `opener` may pair with `closer`; both have the same character
    fn compatible(&self, opener: usize, closer: usize) -> bool {
        let (o, c) = (&self.runs[opener], &self.runs[closer]);
        match c.ext {
            Some(delimiter) => !delimiter.same_length || o.remaining() == c.remaining(),
            None => {
                // A run that can both open and close only pairs when the
                // combined length is not a multiple of three, unless both are
                let odd_match = (o.can_close || c.can_open)
                    && c.orig % 3 != 0
                    && (o.orig + c.orig) % 3 == 0;
                !odd_match
            }
        }
    }

    /// Pair openers with closers above `bottom`, then drop every run above
    /// `bottom` from the stack.
    pub fn process_emphasis(&mut self, bottom: Option<usize>) {
        let mut openers_bottom: HashMap<(u8, bool, usize), Option<usize>> = HashMap::new();

        let mut closer = self.top;
        while let Some(c) = closer {
            if self.runs[c].prev == bottom {
                break;
            }
            closer = self.runs[c].prev;
        }

        while let Some(c) = closer {
            if !self.runs[c].can_close {
                closer = self.runs[c].next;
                continue;
            }

            let run = &self.runs[c];
            let key = (
                run.ch,
                run.can_open,
                if run.ext.is_some() { 0 } else { run.orig % 3 },
            );
            let floor = openers_bottom.get(&key).copied().unwrap_or(bottom);

            let mut opener = run.prev;
            let mut found = None;
            while let Some(o) = opener {
                if Some(o) == bottom || Some(o) == floor {
                    break;
                }
                let candidate = &self.runs[o];
                if candidate.ch == self.runs[c].ch
                    && candidate.can_open
                    && self.compatible(o, c)
                {
                    found = Some(o);
                    break;
                }
                opener = candidate.prev;
            }

            let Some(o) = found else {
                openers_bottom.insert(key, self.runs[c].prev);
                let next = self.runs[c].next;
                if !self.runs[c].can_open {
                    self.remove(c);
                }
                closer = next;
                continue;
            };

            let (o_rem, c_rem) = (self.runs[o].remaining(), self.runs[c].remaining());
            let (value, used) = match self.runs[c].ext {
                Some(delimiter) => (delimiter.value.clone(), o_rem.min(c_rem)),
                None if o_rem >= 2 && c_rem >= 2 => (NodeValue::Strong, 2),
                None => (NodeValue::Emphasis, 1),
            };

            let open_run = &mut self.runs[o];
            let open_at = open_run.start + open_run.orig - open_run.right_used - used;
            open_run.right_used += used;
            open_run.opens.push((value, open_at));

            let close_run = &mut self.runs[c];
            let close_at = close_run.start + close_run.left_used + used - 1;
            close_run.left_used += used;
            close_run.closes.push(close_at);

            let mut between = self.runs[o].next;
            while let Some(b) = between {
                if b == c {
                    break;
                }
                between = self.runs[b].next;
                self.remove(b);
            }

            if self.runs[o].remaining() == 0 {
                self.remove(o);
            }
            if self.runs[c].remaining() == 0 {
                let next = self.runs[c].next;
                self.remove(c);
                closer = next;
            }
        }

        while let Some(top) = self.top {
            if Some(top) == bottom {
                break;
            }
            self.remove(top);
        }
    }
}

/// Whether a character counts as Unicode punctuation for flanking purposes
pub(crate) fn is_punctuation(c: char) -> bool {
    if c.is_ascii() {
        c.is_ascii_punctuation()
    } else {
        !c.is_alphanumeric() && !c.is_whitespace() && !c.is_control()
    }
}

/// `(left_flanking, right_flanking)` for a run between `before` and `after`;
/// the start and end of the subject count as whitespace
pub(crate) fn flanking(before: Option<char>, after: Option<char>) -> (bool, bool) {
    let before = before.unwrap_or('\n');
    let after = after.unwrap_or('\n');
    let (before_ws, after_ws) = (before.is_whitespace(), after.is_whitespace());
    let (before_punct, after_punct) = (is_punctuation(before), is_punctuation(after));

    let left = !after_ws && (!after_punct || before_ws || before_punct);
    let right = !before_ws && (!before_punct || after_ws || after_punct);
    (left, right)
}

/// `(can_open, can_close)` for a run of `ch`
pub(crate) fn can_open_close(ch: u8, before: Option<char>, after: Option<char>) -> (bool, bool) {
    let (left, right) = flanking(before, after);
    if ch == b'_' {
        let before_punct = before.is_some_and(is_punctuation);
        let after_punct = after.is_some_and(is_punctuation);
        (
            left && (!right || before_punct),
            right && (!left || after_punct),
        )
    } else {
        (left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(stack: &mut DelimiterStack<'_>, start: usize, len: usize, flags: (bool, bool)) -> usize {
        stack.push(DelimRun::new(b'*', start, len, flags, None))
    }

    #[test]
    fn test_flanking() {
        assert_eq!(can_open_close(b'*', None, Some('a')), (true, false));
        assert_eq!(can_open_close(b'*', Some('a'), None), (false, true));
        assert_eq!(can_open_close(b'*', Some('a'), Some('b')), (true, true));
        assert_eq!(can_open_close(b'_', Some('a'), Some('b')), (false, false));
        assert_eq!(can_open_close(b'*', Some(' '), Some(' ')), (false, false));
        assert_eq!(can_open_close(b'*', Some('"'), Some('a')), (true, false));
    }

    #[test]
    fn test_strong_then_emphasis() {
        // **foo*bar***
        let mut stack = DelimiterStack::new();
        let a = push(&mut stack, 0, 2, (true, false));
        let b = push(&mut stack, 5, 1, (true, true));
        let c = push(&mut stack, 9, 3, (false, true));
        stack.process_emphasis(None);

        assert_eq!(stack.runs[b].opens.len(), 1);
        assert!(matches!(stack.runs[b].opens[0].0, NodeValue::Emphasis));
        assert!(matches!(stack.runs[a].opens[0].0, NodeValue::Strong));
        assert_eq!(stack.runs[c].closes, vec![9, 11]);
        assert_eq!(stack.runs[c].remaining(), 0);
        assert_eq!(stack.len(), 0);
    }

    #[test]
    fn test_rule_of_three() {
        // *foo**bar*: the inner run cannot close the single opener
        let mut stack = DelimiterStack::new();
        let a = push(&mut stack, 0, 1, (true, false));
        let b = push(&mut stack, 4, 2, (true, true));
        let c = push(&mut stack, 9, 1, (false, true));
        stack.process_emphasis(None);

        assert!(stack.runs[b].opens.is_empty());
        assert!(stack.runs[b].closes.is_empty());
        assert_eq!(stack.runs[a].opens.len(), 1);
        assert_eq!(stack.runs[c].closes, vec![9]);
    }

    #[test]
    fn test_bottom_is_respected() {
        let mut stack = DelimiterStack::new();
        let a = push(&mut stack, 0, 1, (true, false));
        let b = push(&mut stack, 3, 1, (false, true));
        stack.process_emphasis(Some(a));
        assert!(stack.runs[a].opens.is_empty());
        assert!(stack.runs[b].closes.is_empty());
        assert_eq!(stack.top(), Some(a));
    }

    #[test]
    fn test_same_length_extension_runs() {
        let tilde = InlineDelimiter {
            ch: b'~',
            min_run: 1,
            max_run: 2,
            same_length: true,
            value: NodeValue::Strikethrough,
        };
        let mut stack = DelimiterStack::new();
        let a = stack.push(DelimRun::new(b'~', 0, 2, (true, false), Some(&tilde)));
        let b = stack.push(DelimRun::new(b'~', 4, 1, (false, true), Some(&tilde)));
        stack.process_emphasis(None);
        assert!(stack.runs[a].opens.is_empty());
        assert!(stack.runs[b].closes.is_empty());

        let mut stack = DelimiterStack::new();
        let a = stack.push(DelimRun::new(b'~', 0, 2, (true, false), Some(&tilde)));
        let b = stack.push(DelimRun::new(b'~', 4, 2, (false, true), Some(&tilde)));
        stack.process_emphasis(None);
        assert!(matches!(stack.runs[a].opens[0].0, NodeValue::Strikethrough));
        assert_eq!(stack.runs[b].closes, vec![5]);
    }
}
