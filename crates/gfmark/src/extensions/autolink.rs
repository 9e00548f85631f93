//! Bare autolinks: `www.` domains, `http://`, `https://` and `ftp://` URLs,
//! and e-mail addresses found in plain text.

use gfmark_core::{AutoLinkKind, LineColumn, Node, NodeAutoLink, NodeValue, Sourcepos};

use super::ExtensionHooks;

pub(super) fn hooks() -> ExtensionHooks {
    ExtensionHooks {
        inline_postprocess: Some(autolink_text),
        ..ExtensionHooks::default()
    }
}

const URL_SCHEMES: &[&str] = &["http://", "https://", "ftp://"];

/// Replace links found in text nodes, leaving existing links alone
fn autolink_text(nodes: &mut Vec<Node>) {
    if !nodes.iter().any(may_contain_link) {
        return;
    }
    let mut out = Vec::with_capacity(nodes.len());
    for mut node in nodes.drain(..) {
        match &node.value {
            NodeValue::Link(_) | NodeValue::Image(_) | NodeValue::AutoLink(_) => out.push(node),
            NodeValue::Text(text) => split_text(text, node.sourcepos, &mut out),
            _ => {
                autolink_text(&mut node.children);
                out.push(node);
            }
        }
    }
    *nodes = out;
}

fn may_contain_link(node: &Node) -> bool {
    match &node.value {
        NodeValue::Text(text) => text.contains(['.', '@']),
        NodeValue::Link(_) | NodeValue::Image(_) | NodeValue::AutoLink(_) => false,
        _ => !node.children.is_empty(),
    }
}

fn split_text(text: &str, pos: Sourcepos, out: &mut Vec<Node>) {
    let at = |offset: usize| LineColumn::new(pos.start.line, pos.start.column + offset);
    let mut last = 0;
    let mut i = 0;

    while i < text.len() {
        let Some(c) = text[i..].chars().next() else {
            break;
        };
        let before = text[..i].chars().next_back();
        if let Some((end, link)) = match_link(text, i, before) {
            if last < i {
                out.push(Node::text(&text[last..i], Sourcepos { start: at(last), end: at(i - 1) }));
            }
            let span = Sourcepos {
                start: at(i),
                end: at(end - 1),
            };
            out.push(Node::new(NodeValue::AutoLink(link), span));
            last = end;
            i = end;
            continue;
        }
        i += c.len_utf8();
    }

    if last == 0 {
        out.push(Node::text(text, pos));
    } else if last < text.len() {
        out.push(Node::text(&text[last..], Sourcepos { start: at(last), end: pos.end }));
    }
}

fn match_link(text: &str, start: usize, before: Option<char>) -> Option<(usize, NodeAutoLink)> {
    let rest = &text[start..];
    let link_boundary = before.map_or(true, |c| {
        c.is_whitespace() || matches!(c, '*' | '_' | '~' | '(')
    });

    if link_boundary && rest.starts_with("www.") {
        let end = start + link_length(rest, 4)?;
        let label = text[start..end].to_string();
        return Some((
            end,
            NodeAutoLink {
                url: format!("http://{label}"),
                label,
                kind: AutoLinkKind::Www,
            },
        ));
    }

    if link_boundary {
        if let Some(scheme) = URL_SCHEMES.iter().find(|scheme| {
            rest.get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
        }) {
            let end = start + link_length(rest, scheme.len())?;
            let label = text[start..end].to_string();
            return Some((
                end,
                NodeAutoLink {
                    url: label.clone(),
                    label,
                    kind: AutoLinkKind::Uri,
                },
            ));
        }
    }

    let email_boundary = before.map_or(true, |c| !is_local_part(c) && c != '/');
    if email_boundary {
        let end = start + email_length(rest)?;
        let label = text[start..end].to_string();
        return Some((
            end,
            NodeAutoLink {
                url: format!("mailto:{label}"),
                label,
                kind: AutoLinkKind::Email,
            },
        ));
    }
    None
}

fn is_domain_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn is_local_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-' | '_')
}

/// Length of the domain at `from`. Underscores are not allowed in the last
/// two labels.
fn domain_length(s: &str, from: usize) -> Option<usize> {
    let mut end = from;
    let mut labels: Vec<bool> = vec![false];
    for (i, c) in s[from..].char_indices() {
        if c == '.' {
            labels.push(false);
        } else if is_domain_char(c) {
            if c == '_' {
                if let Some(underscore) = labels.last_mut() {
                    *underscore = true;
                }
            }
        } else {
            break;
        }
        end = from + i + c.len_utf8();
    }
    if end == from {
        return None;
    }
    if labels.iter().rev().take(2).any(|&underscore| underscore) {
        return None;
    }
    Some(end)
}

/// Length of a link whose domain starts at `domain_start`: up to whitespace
/// or `<`, minus trailing punctuation
fn link_length(s: &str, domain_start: usize) -> Option<usize> {
    let domain_end = domain_length(s, domain_start)?;
    let mut end = s[domain_end..]
        .find(|c: char| c.is_whitespace() || c == '<')
        .map_or(s.len(), |i| domain_end + i);

    // Counted once; only trimming a `)` changes the balance
    let opening = s[..end].matches('(').count();
    let mut closing = s[..end].matches(')').count();

    loop {
        let Some(last) = s[..end].chars().next_back() else {
            break;
        };
        match last {
            '?' | '!' | '.' | ',' | ':' | '*' | '_' | '~' | '\'' | '"' => end -= 1,
            ')' => {
                if closing > opening {
                    closing -= 1;
                    end -= 1;
                } else {
                    break;
                }
            }
            ';' => {
                let Some(amp) = s[..end].rfind('&') else {
                    break;
                };
                let name = &s[amp + 1..end - 1];
                if !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric()) {
                    end = amp;
                } else {
                    break;
                }
            }
            _ => break,
        }
    }

    if end <= domain_start {
        return None;
    }
    Some(end)
}

/// Length of an e-mail address at the start of `s`
fn email_length(s: &str) -> Option<usize> {
    let local = s.find(|c: char| !is_local_part(c)).unwrap_or(s.len());
    if local == 0 || s.as_bytes().get(local) != Some(&b'@') {
        return None;
    }

    let domain_start = local + 1;
    let mut end = domain_start
        + s[domain_start..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
            .unwrap_or(s.len() - domain_start);
    while end > domain_start && s.as_bytes()[end - 1] == b'.' {
        end -= 1;
    }

    let domain = &s[domain_start..end];
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with(['-', '_']) {
        return None;
    }
    Some(end)
}
