//! Entity and numeric character references, backslash escapes

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^&(?:#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[A-Za-z][A-Za-z0-9]{1,31});").unwrap()
});

/// Recognise an entity at the start of `s`, returning its byte length and
/// the decoded text. Unknown names are not entities.
pub(crate) fn match_entity(s: &str) -> Option<(usize, String)> {
    let m = ENTITY.find(s)?;
    let raw = m.as_str();
    let body = &raw[1..raw.len() - 1];

    let decoded = if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => num.parse::<u32>().ok(),
        };
        let c = code
            .filter(|&c| c != 0)
            .and_then(char::from_u32)
            .unwrap_or('\u{FFFD}');
        c.to_string()
    } else {
        // Legacy names may be decoded without their semicolon, leaving the
        // rest of the name behind
        match html_escape::decode_html_entities(raw) {
            Cow::Owned(text) if text != raw && (!text.ends_with(';') || body == "semi") => text,
            _ => return None,
        }
    };
    Some((raw.len(), decoded))
}

/// Resolve backslash escapes and entities, as done for link destinations,
/// titles and code block info strings
pub(crate) fn unescape_string(s: &str) -> Cow<'_, str> {
    if !s.contains(['\\', '&']) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < s.len() {
        let rest = &s[i..];
        let bytes = rest.as_bytes();
        match bytes[0] {
            b'\\' if bytes.len() > 1 && bytes[1].is_ascii_punctuation() => {
                out.push(bytes[1] as char);
                i += 2;
            }
            b'&' => match match_entity(rest) {
                Some((len, text)) => {
                    out.push_str(&text);
                    i += len;
                }
                None => {
                    out.push('&');
                    i += 1;
                }
            },
            _ => {
                let next = rest[1..]
                    .find(['\\', '&'])
                    .map_or(rest.len(), |p| p + 1);
                out.push_str(&rest[..next]);
                i += next;
            }
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_entities() {
        assert_eq!(match_entity("&amp; x"), Some((5, "&".to_string())));
        assert_eq!(match_entity("&copy;"), Some((6, "©".to_string())));
        assert_eq!(match_entity("&notanentity;"), None);
        assert_eq!(match_entity("&amp"), None);
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(match_entity("&#35;"), Some((5, "#".to_string())));
        assert_eq!(match_entity("&#x22;"), Some((6, "\"".to_string())));
        assert_eq!(match_entity("&#0;"), Some((4, "\u{FFFD}".to_string())));
        assert_eq!(match_entity("&#xD800;"), Some((8, "\u{FFFD}".to_string())));
        assert_eq!(match_entity("&#12345678;"), None);
    }

    #[test]
    fn test_unescape_string() {
        assert_eq!(unescape_string(r"a\*b"), "a*b");
        assert_eq!(unescape_string(r"a\b"), r"a\b");
        assert_eq!(unescape_string("f&ouml;&ouml;"), "föö");
        assert_eq!(unescape_string("a & b"), "a & b");
        assert!(matches!(unescape_string("plain"), Cow::Borrowed(_)));
    }
}
