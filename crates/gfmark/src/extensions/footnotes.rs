//! Footnotes
//!
//! `[^label]:` opens a definition block whose content continues on lines
//! indented by four columns. `[^label]` in inline text refers to a defined
//! label. Once the document is complete, references are numbered by first
//! use and the referenced definitions move to the end of the document in
//! that order; definitions nobody refers to are dropped.

use std::collections::HashMap;

use gfmark_core::{Node, NodeFootnoteDefinition, NodeValue};
use tracing::{debug, trace};

use crate::blocks::{BlockParser, MAX_BLOCK_DEPTH};
use crate::references::normalize_label;

use super::{BlockStart, BlockStartHook, ExtensionHooks, Slot};

/// Columns of indentation that continue a definition
const CONTENT_INDENT: usize = 4;

pub(super) fn hooks() -> ExtensionHooks {
    ExtensionHooks {
        block_starts: vec![BlockStartHook {
            slot: Slot::BeforeCore,
            start: try_opening_definition,
        }],
        continues: Some(definition_continues),
        document_postprocess: Some(number_footnotes),
        ..ExtensionHooks::default()
    }
}

/// `[^label]:` plus the spaces after it at the start of `s`. Returns the
/// label and the number of bytes matched.
fn scan_definition(s: &str) -> Option<(&str, usize)> {
    let after = s.strip_prefix("[^")?;
    let end = after.find([']', ' ', '\t'])?;
    let label = &after[..end];
    if label.is_empty() || !after[end..].starts_with("]:") {
        return None;
    }
    normalize_label(label)?;

    let marker = 2 + end + 2;
    let spaces = s[marker..]
        .bytes()
        .take_while(|&b| b == b' ' || b == b'\t')
        .count();
    Some((label, marker + spaces))
}

fn try_opening_definition(parser: &mut BlockParser<'_>, container: usize) -> BlockStart {
    if parser.is_indented() || parser.depth(container) >= MAX_BLOCK_DEPTH {
        return BlockStart::None;
    }
    let rest = parser.rest();
    let Some((label, len)) = scan_definition(rest) else {
        return BlockStart::None;
    };

    let start = parser.next_nonspace();
    parser.advance_next_nonspace();
    parser.advance_offset(rest[..len].chars().count(), false);
    parser.close_unmatched();

    parser.refmap.insert_footnote(label);
    let definition = NodeFootnoteDefinition {
        name: label.to_string(),
        total_references: 0,
    };
    parser.add_child(NodeValue::FootnoteDefinition(definition), start);
    trace!(label, line = parser.line_number(), "footnote definition");
    BlockStart::Container
}

fn definition_continues(parser: &mut BlockParser<'_>, id: usize) -> Option<bool> {
    if !matches!(parser.block(id).value, NodeValue::FootnoteDefinition(_)) {
        return None;
    }
    if parser.is_indented() {
        parser.advance_offset(CONTENT_INDENT, true);
        return Some(true);
    }
    Some(parser.is_blank())
}

/// Numbering state of one defined label
struct Footnote {
    /// Name as written in the first definition
    name: String,
    ix: Option<usize>,
    references: usize,
}

fn number_footnotes(root: &mut Node) {
    // The first definition of a label wins
    let mut footnotes: HashMap<String, Footnote> = HashMap::new();
    for node in root.descendants() {
        if let NodeValue::FootnoteDefinition(def) = &node.value {
            if let Some(key) = normalize_label(&def.name) {
                footnotes.entry(key).or_insert_with(|| Footnote {
                    name: def.name.clone(),
                    ix: None,
                    references: 0,
                });
            }
        }
    }
    if footnotes.is_empty() {
        return;
    }

    let mut next_ix = 0;
    let mut stack = vec![&mut *root];
    while let Some(node) = stack.pop() {
        if let NodeValue::FootnoteReference(reference) = &mut node.value {
            let footnote = normalize_label(&reference.name).and_then(|key| footnotes.get_mut(&key));
            if let Some(footnote) = footnote {
                let ix = *footnote.ix.get_or_insert_with(|| {
                    next_ix += 1;
                    next_ix
                });
                footnote.references += 1;
                reference.ix = ix;
                reference.ref_num = footnote.references;
                reference.name = footnote.name.clone();
            }
        }
        stack.extend(node.children.iter_mut().rev());
    }

    let mut definitions = Vec::new();
    take_definitions(root, &mut definitions);

    let mut referenced = Vec::with_capacity(next_ix);
    for mut definition in definitions {
        let NodeValue::FootnoteDefinition(def) = &mut definition.value else {
            continue;
        };
        let Some(footnote) = normalize_label(&def.name).and_then(|key| footnotes.remove(&key))
        else {
            trace!(name = %def.name, "dropped duplicate footnote definition");
            continue;
        };
        let Some(ix) = footnote.ix else {
            trace!(name = %def.name, "dropped unreferenced footnote definition");
            continue;
        };
        def.total_references = footnote.references;
        referenced.push((ix, definition));
    }

    referenced.sort_by_key(|(ix, _)| *ix);
    debug!(footnotes = referenced.len(), "numbered footnotes");
    root.children
        .extend(referenced.into_iter().map(|(_, definition)| definition));
}

/// Detach every footnote definition below `node`, in document order
fn take_definitions(node: &mut Node, out: &mut Vec<Node>) {
    for mut child in std::mem::take(&mut node.children) {
        if !child.value.is_block() {
            node.children.push(child);
            continue;
        }
        if matches!(child.value, NodeValue::FootnoteDefinition(_)) {
            let at = out.len();
            take_definitions(&mut child, out);
            out.insert(at, child);
        } else {
            take_definitions(&mut child, out);
            node.children.push(child);
        }
    }
}
