//! Line scanners for block starts and block ends.
//!
//! Each scanner looks at the remainder of a line, starting at its first
//! non-space character, and never sees a line ending.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::inlines::{CLOSE_TAG, OPEN_TAG};

/// Tag names that start an HTML block of type 6
pub const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "base", "basefont", "blockquote", "body",
    "caption", "center", "col", "colgroup", "dd", "details", "dialog", "dir",
    "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form",
    "frame", "frameset", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header",
    "hr", "html", "iframe", "legend", "li", "link", "main", "menu", "menuitem",
    "nav", "noframes", "ol", "optgroup", "option", "p", "param", "search",
    "section", "summary", "table", "tbody", "td", "tfoot", "th", "thead",
    "title", "tr", "track", "ul",
];

/// Check if a tag starts an HTML block of type 6
pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag.to_lowercase().as_str())
}

static HTML_RAW_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^<(?:script|pre|style|textarea)(?:\s|>|$)").unwrap());

static HTML_BLOCK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^</?([A-Za-z][A-Za-z0-9-]*)(?:\s|/?>|$)").unwrap());

static HTML_COMPLETE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(?:{}|{})[ \t]*$", *OPEN_TAG, *CLOSE_TAG)).unwrap()
});

static HTML_RAW_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</(?:script|pre|style|textarea)>").unwrap());

static ATX_CLOSING_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]*#+[ \t]*$").unwrap());
static ATX_CLOSING: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+#+[ \t]*$").unwrap());

fn is_space_or_tab(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Three or more `*`, `-` or `_`, optionally separated by spaces or tabs
pub fn thematic_break(s: &str) -> bool {
    let bytes = s.as_bytes();
    let Some(&marker) = bytes.first() else {
        return false;
    };
    if !matches!(marker, b'*' | b'-' | b'_') {
        return false;
    }
    let mut count = 0;
    for &b in bytes {
        if b == marker {
            count += 1;
        } else if !is_space_or_tab(b) {
            return false;
        }
    }
    count >= 3
}

/// Level of an ATX heading opener and the offset its content starts at
pub fn atx_heading_start(s: &str) -> Option<(u8, usize)> {
    let bytes = s.as_bytes();
    let level = bytes.iter().take_while(|&&b| b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    match bytes.get(level) {
        None => Some((level as u8, level)),
        Some(&b) if is_space_or_tab(b) => {
            let content = level + bytes[level..].iter().take_while(|&&b| is_space_or_tab(b)).count();
            Some((level as u8, content))
        }
        Some(_) => None,
    }
}

/// ATX heading content with the optional closing sequence removed
pub fn atx_heading_content(s: &str) -> &str {
    if ATX_CLOSING_ONLY.is_match(s) {
        return "";
    }
    let s = match ATX_CLOSING.find(s) {
        Some(m) => &s[..m.start()],
        None => s,
    };
    s.trim_end_matches([' ', '\t'])
}

/// Fence character and length of a code fence opener
pub fn open_code_fence(s: &str) -> Option<(u8, usize)> {
    let bytes = s.as_bytes();
    let fence = *bytes.first()?;
    if fence != b'`' && fence != b'~' {
        return None;
    }
    let len = bytes.iter().take_while(|&&b| b == fence).count();
    if len < 3 {
        return None;
    }
    // A backtick fence's info string may not contain backticks
    if fence == b'`' && bytes[len..].contains(&b'`') {
        return None;
    }
    Some((fence, len))
}

/// Whether `s` closes a fence of `len` or more `fence` characters
pub fn close_code_fence(s: &str, fence: u8, len: usize) -> bool {
    let bytes = s.as_bytes();
    let run = bytes.iter().take_while(|&&b| b == fence).count();
    run >= len && bytes[run..].iter().all(|&b| is_space_or_tab(b))
}

/// Heading level for a setext underline
pub fn setext_heading_line(s: &str) -> Option<u8> {
    let bytes = s.as_bytes();
    let marker = *bytes.first()?;
    let level = match marker {
        b'=' => 1,
        b'-' => 2,
        _ => return None,
    };
    let run = bytes.iter().take_while(|&&b| b == marker).count();
    if bytes[run..].iter().all(|&b| is_space_or_tab(b)) {
        Some(level)
    } else {
        None
    }
}

/// HTML block start condition (1-7) matched by `s`. Type 7 cannot interrupt
/// a paragraph and is only tried when `allow_type7` is set.
pub fn html_block_start(s: &str, allow_type7: bool) -> Option<u8> {
    if !s.starts_with('<') {
        return None;
    }
    if HTML_RAW_START.is_match(s) {
        return Some(1);
    }
    if s.starts_with("<!--") {
        return Some(2);
    }
    if s.starts_with("<?") {
        return Some(3);
    }
    if s.len() > 2 && s.starts_with("<!") && s.as_bytes()[2].is_ascii_alphabetic() {
        return Some(4);
    }
    if s.starts_with("<![CDATA[") {
        return Some(5);
    }
    if let Some(caps) = HTML_BLOCK_TAG.captures(s) {
        if is_block_tag(&caps[1]) {
            return Some(6);
        }
    }
    if allow_type7 && HTML_COMPLETE_TAG.is_match(s) {
        return Some(7);
    }
    None
}

/// Whether a line ends an HTML block of the given type. Types 6 and 7 end
/// at a blank line instead.
pub fn html_block_end(block_type: u8, line: &str) -> bool {
    match block_type {
        1 => HTML_RAW_END.is_match(line),
        2 => line.contains("-->"),
        3 => line.contains("?>"),
        4 => line.contains('>'),
        5 => line.contains("]]>"),
        _ => false,
    }
}
