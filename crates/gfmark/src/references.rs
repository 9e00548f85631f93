//! Link reference definitions
//!
//! Definitions are collected from the start of paragraphs as the block
//! parser closes them, and resolved by the inline parser once the whole
//! block tree is finished. Footnote labels are collected alongside as their
//! definitions open.

use std::collections::{HashMap, HashSet};

use crate::inlines::links::{
    line_end, parse_link_destination, parse_link_title, scan_link_label, skip_spnl,
    MAX_LABEL_LENGTH,
};

/// The destination and title a label refers to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkReference {
    pub url: String,
    pub title: String,
}

/// Normalised label to definition. The first definition of a label wins.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    map: HashMap<String, LinkReference>,
    footnotes: HashSet<String>,
}

impl ReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition unless the label is already defined. Returns whether
    /// the definition was stored.
    pub fn insert(&mut self, label: &str, reference: LinkReference) -> bool {
        let Some(key) = normalize_label(label) else {
            return false;
        };
        if self.map.contains_key(&key) {
            return false;
        }
        self.map.insert(key, reference);
        true
    }

    pub fn get(&self, label: &str) -> Option<&LinkReference> {
        normalize_label(label).and_then(|key| self.map.get(&key))
    }

    /// Record a footnote label. Returns whether it was new.
    pub fn insert_footnote(&mut self, label: &str) -> bool {
        normalize_label(label).is_some_and(|key| self.footnotes.insert(key))
    }

    pub fn has_footnote(&self, label: &str) -> bool {
        normalize_label(label).is_some_and(|key| self.footnotes.contains(&key))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Normalise a label for matching: trim, collapse internal whitespace and
/// case-fold. Blank or over-long labels have no normal form.
pub fn normalize_label(label: &str) -> Option<String> {
    if label.chars().count() > MAX_LABEL_LENGTH {
        return None;
    }
    let collapsed = label.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    Some(collapsed.to_lowercase().to_uppercase())
}

/// One definition parsed from the start of block content
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Definition {
    pub label: String,
    pub reference: LinkReference,
}

/// Parse a single definition at the start of `s`, returning the number of
/// bytes it spans (including its line ending)
pub(crate) fn parse_definition(s: &str) -> Option<(usize, Definition)> {
    let label_end = scan_link_label(s, 0)?;
    let label = &s[1..label_end - 1];
    normalize_label(label)?;

    if s.as_bytes().get(label_end) != Some(&b':') {
        return None;
    }

    let pos = skip_spnl(s, label_end + 1);
    let (url, after_dest) = parse_link_destination(s, pos)?;
    if after_dest == pos && s.as_bytes().get(pos) != Some(&b'<') {
        return None;
    }

    let title_start = skip_spnl(s, after_dest);
    let title = if title_start > after_dest {
        parse_link_title(s, title_start)
    } else {
        None
    };

    let (consumed, title) = match title {
        Some((title, after_title)) => match line_end(s, after_title) {
            Some(end) => (end, title),
            // A title followed by junk is no title; the destination alone
            // may still end the line
            None => (line_end(s, after_dest)?, String::new()),
        },
        None => (line_end(s, after_dest)?, String::new()),
    };

    Some((
        consumed,
        Definition {
            label: label.to_string(),
            reference: LinkReference { url, title },
        },
    ))
}

/// Parse every definition at the start of `content`. Returns the number of
/// bytes they span and the definitions in source order.
pub(crate) fn parse_definitions(content: &str) -> (usize, Vec<Definition>) {
    let mut consumed = 0;
    let mut found = Vec::new();
    while content[consumed..].starts_with('[') {
        match parse_definition(&content[consumed..]) {
            Some((len, definition)) => {
                consumed += len;
                found.push(definition);
            }
            None => break,
        }
    }
    (consumed, found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Foo \n  bar ").as_deref(), Some("FOO BAR"));
        assert_eq!(normalize_label("ẞ"), normalize_label("ss"));
        assert_eq!(normalize_label(" \t"), None);
    }

    #[test]
    fn test_first_definition_wins() {
        let mut map = ReferenceMap::new();
        assert!(map.insert(
            "Foo",
            LinkReference {
                url: "/first".into(),
                title: String::new()
            }
        ));
        assert!(!map.insert(
            "FOO",
            LinkReference {
                url: "/second".into(),
                title: String::new()
            }
        ));
        assert_eq!(map.get("foo").map(|r| r.url.as_str()), Some("/first"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_footnote_labels_are_separate() {
        let mut map = ReferenceMap::new();
        assert!(map.insert_footnote("Note"));
        assert!(!map.insert_footnote("NOTE"));
        assert!(map.has_footnote("note"));
        assert!(map.get("note").is_none());
        assert!(map.is_empty());
    }

    #[test]
    fn test_parse_definition() {
        let (len, def) = parse_definition("[foo]: /url \"title\"\nrest").unwrap();
        assert_eq!(len, 20);
        assert_eq!(def.label, "foo");
        assert_eq!(def.reference.url, "/url");
        assert_eq!(def.reference.title, "title");
    }

    #[test]
    fn test_definition_title_on_next_line() {
        let (len, def) = parse_definition("[foo]:\n/url\n'the title'\n").unwrap();
        assert_eq!(len, 24);
        assert_eq!(def.reference.title, "the title");
    }

    #[test]
    fn test_definition_rejects_trailing_junk() {
        assert!(parse_definition("[foo]: /url \"title\" ok").is_none());
        assert!(parse_definition("[foo]: /url bar").is_none());
        assert!(parse_definition("[foo]:").is_none());
        assert!(parse_definition("[ ]: /url").is_none());
    }

    #[test]
    fn test_invalid_title_falls_back_to_destination() {
        let (len, def) = parse_definition("[foo]: /url\n\"title\" ok\n").unwrap();
        assert_eq!(len, 12);
        assert_eq!(def.reference.title, "");
    }

    #[test]
    fn test_parse_definitions() {
        let content = "[a]: /a\n[b]: /b\ntext\n";
        let (len, defs) = parse_definitions(content);
        assert_eq!(&content[len..], "text\n");
        assert_eq!(defs.len(), 2);
    }
}
