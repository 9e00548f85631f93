//! Link labels, destinations and titles
//!
//! Shared by inline links and link reference definitions. Every scanner
//! takes the subject and a byte position and returns the position just past
//! what it consumed.

use super::entities::unescape_string;

/// Labels longer than this many characters never match
pub(crate) const MAX_LABEL_LENGTH: usize = 999;

/// Nesting limit for unescaped parentheses in a bare destination
const MAX_PAREN_DEPTH: usize = 32;

/// Skip spaces and tabs, at most one line ending, then spaces and tabs again
pub(crate) fn skip_spnl(s: &str, pos: usize) -> usize {
    let bytes = s.as_bytes();
    let mut i = skip_spaces(bytes, pos);
    if bytes.get(i) == Some(&b'\n') {
        i = skip_spaces(bytes, i + 1);
    }
    i
}

pub(crate) fn skip_spaces(bytes: &[u8], mut i: usize) -> usize {
    while matches!(bytes.get(i), Some(b' ' | b'\t')) {
        i += 1;
    }
    i
}

/// If a line ends at `pos` (after optional spaces), the position past the
/// line ending
pub(crate) fn line_end(s: &str, pos: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let i = skip_spaces(bytes, pos);
    match bytes.get(i) {
        None => Some(i),
        Some(b'\n') => Some(i + 1),
        Some(_) => None,
    }
}

/// Scan `[label]` at `pos`, returning the position after the closing bracket
pub(crate) fn scan_link_label(s: &str, pos: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.get(pos) != Some(&b'[') {
        return None;
    }

    let mut chars = s[pos + 1..].char_indices();
    let mut count = 0;
    while let Some((i, c)) = chars.next() {
        match c {
            ']' => return Some(pos + 1 + i + 1),
            '[' => return None,
            '\\' => {
                chars.next()?;
            }
            _ => {}
        }
        count += 1;
        if count > MAX_LABEL_LENGTH {
            return None;
        }
    }
    None
}

/// Parse a link destination at `pos`, either `<...>` or a bare run with
/// balanced parentheses. Escapes and entities are resolved.
pub(crate) fn parse_link_destination(s: &str, pos: usize) -> Option<(String, usize)> {
    let bytes = s.as_bytes();

    if bytes.get(pos) == Some(&b'<') {
        let mut i = pos + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'>' => return Some((unescape_string(&s[pos + 1..i]).into_owned(), i + 1)),
                b'\\' if i + 1 < bytes.len() => i += 2,
                b'<' | b'\n' => return None,
                _ => i += 1,
            }
        }
        return None;
    }

    let mut i = pos;
    let mut depth = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if bytes.get(i + 1).is_some_and(u8::is_ascii_punctuation) => i += 2,
            b'(' => {
                depth += 1;
                if depth > MAX_PAREN_DEPTH {
                    return None;
                }
                i += 1;
            }
            b')' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                i += 1;
            }
            c if c == b' ' || c.is_ascii_control() => break,
            _ => i += 1,
        }
    }

    if (i == pos && bytes.get(i) != Some(&b')')) || depth != 0 {
        return None;
    }
    Some((unescape_string(&s[pos..i]).into_owned(), i))
}

/// Parse a `"title"`, `'title'` or `(title)` at `pos`
pub(crate) fn parse_link_title(s: &str, pos: usize) -> Option<(String, usize)> {
    let bytes = s.as_bytes();
    let close = match bytes.get(pos)? {
        b'"' => b'"',
        b'\'' => b'\'',
        b'(' => b')',
        _ => return None,
    };

    let mut i = pos + 1;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'\\' && i + 1 < bytes.len() {
            i += 2;
            continue;
        }
        if c == close {
            return Some((unescape_string(&s[pos + 1..i]).into_owned(), i + 1));
        }
        if close == b')' && c == b'(' {
            return None;
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_link_label() {
        assert_eq!(scan_link_label("[foo] bar", 0), Some(5));
        assert_eq!(scan_link_label(r"[a\]b]", 0), Some(6));
        assert_eq!(scan_link_label("[a[b]", 0), None);
        assert_eq!(scan_link_label("[open", 0), None);
        let long = format!("[{}]", "x".repeat(1000));
        assert_eq!(scan_link_label(&long, 0), None);
    }

    #[test]
    fn test_destinations() {
        assert_eq!(
            parse_link_destination("<a b>)", 0),
            Some(("a b".to_string(), 5))
        );
        assert_eq!(
            parse_link_destination("/url(x) \"t\"", 0),
            Some(("/url(x)".to_string(), 7))
        );
        assert_eq!(parse_link_destination(")", 0), Some((String::new(), 0)));
        assert_eq!(parse_link_destination("(open", 0), None);
        assert_eq!(parse_link_destination("<a\nb>", 0), None);
        assert_eq!(
            parse_link_destination(r"a\_b&amp;c", 0),
            Some(("a_b&c".to_string(), 10))
        );
    }

    #[test]
    fn test_titles() {
        assert_eq!(parse_link_title("\"t\" x", 0), Some(("t".to_string(), 3)));
        assert_eq!(parse_link_title("'a\\'b'", 0), Some(("a'b".to_string(), 6)));
        assert_eq!(parse_link_title("(a(b)", 0), None);
        assert_eq!(parse_link_title("\"unclosed", 0), None);
    }

    #[test]
    fn test_spnl_and_line_end() {
        assert_eq!(skip_spnl("  \n  x", 0), 5);
        assert_eq!(skip_spnl(" \n\nx", 0), 2);
        assert_eq!(line_end("  \nx", 0), Some(3));
        assert_eq!(line_end("  x", 0), None);
        assert_eq!(line_end("  ", 0), Some(2));
    }
}
