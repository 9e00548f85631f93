//! Escaping helpers shared by the renderers.

/// Raw HTML tags neutralised by the tag filter extension
pub(crate) const FILTERED_TAGS: &[&str] = &[
    "title", "textarea", "style", "xmp", "iframe", "noembed", "noframes", "script", "plaintext",
];

/// Escape text content: `&`, `<` and `>`.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped_html(&mut out, text, false);
    out
}

/// Escape an attribute value: text escaping plus `"`.
pub fn escape_attribute(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped_html(&mut out, text, true);
    out
}

pub(crate) fn push_escaped_html(out: &mut String, text: &str, attribute: bool) {
    let mut last = 0;
    for (i, b) in text.bytes().enumerate() {
        let replacement = match b {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' if attribute => "&quot;",
            _ => continue,
        };
        out.push_str(&text[last..i]);
        out.push_str(replacement);
        last = i + 1;
    }
    out.push_str(&text[last..]);
}

/// Percent-encode characters not allowed in an `href`, leaving everything
/// else (including existing `%XX` sequences) untouched.
pub fn escape_href(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    push_escaped_href(&mut out, url);
    out
}

pub(crate) fn push_escaped_href(out: &mut String, url: &str) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    for &b in url.as_bytes() {
        match b {
            b'&' => out.push_str("&amp;"),
            b'\'' => out.push_str("&#x27;"),
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'('
            | b')'
            | b';'
            | b'/'
            | b'?'
            | b':'
            | b'@'
            | b'='
            | b'+'
            | b'$'
            | b','
            | b'%'
            | b'#' => out.push(b as char),
            _ => {
                out.push('%');
                out.push(HEX[(b >> 4) as usize] as char);
                out.push(HEX[(b & 0x0f) as usize] as char);
            }
        }
    }
}

/// Replace the `<` of filtered tags with `&lt;`, leaving other markup alone.
pub(crate) fn filter_tags(html: &str) -> String {
    let bytes = html.as_bytes();
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'<' && is_filtered_tag(&bytes[i + 1..]) {
            out.push_str(&html[last..i]);
            out.push_str("&lt;");
            last = i + 1;
        }
    }
    out.push_str(&html[last..]);
    out
}

fn is_filtered_tag(rest: &[u8]) -> bool {
    let rest = rest.strip_prefix(b"/").unwrap_or(rest);
    FILTERED_TAGS.iter().any(|tag| {
        let len = tag.len();
        rest.len() >= len
            && rest[..len].eq_ignore_ascii_case(tag.as_bytes())
            && match rest.get(len) {
                None => true,
                Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') => true,
                Some(b'/') => rest.get(len + 1) == Some(&b'>'),
                _ => false,
            }
    })
}
