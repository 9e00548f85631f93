//! `- [ ]` and `- [x]` list items
//!
//! When an item closes, a `[ ]`, `[x]` or `[X]` at the start of its first
//! paragraph is cut from the paragraph and recorded on the item.

use gfmark_core::NodeValue;
use tracing::trace;

use crate::blocks::BlockParser;
use crate::scanner::{drop_prefix, position_at};

use super::ExtensionHooks;

pub(super) fn hooks() -> ExtensionHooks {
    ExtensionHooks {
        finalize: Some(finalize_item),
        ..ExtensionHooks::default()
    }
}

/// Checked state of a task marker at the start of `content`
fn task_marker(content: &str) -> Option<bool> {
    let bytes = content.as_bytes();
    if bytes.len() < 4 || bytes[0] != b'[' || bytes[2] != b']' {
        return None;
    }
    let checked = match bytes[1] {
        b' ' => false,
        b'x' | b'X' => true,
        _ => return None,
    };
    if !matches!(bytes[3], b' ' | b'\t') || content[4..].trim().is_empty() {
        return None;
    }
    Some(checked)
}

fn finalize_item(parser: &mut BlockParser<'_>, id: usize) {
    let item = parser.block(id);
    if !matches!(item.value, NodeValue::Item(_)) {
        return;
    }
    let Some(&first) = item.children.first() else {
        return;
    };
    let paragraph = parser.block(first);
    if !matches!(paragraph.value, NodeValue::Paragraph) {
        return;
    }
    let Some(checked) = task_marker(&paragraph.content) else {
        return;
    };
    let marker = position_at(&paragraph.line_map, 0);

    let paragraph = parser.block_mut(first);
    paragraph.content.drain(..3);
    drop_prefix(&mut paragraph.line_map, 3);
    trace!(checked, line = marker.line, "task list item");
    parser.block_mut(id).task = Some((checked, marker));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_marker() {
        assert_eq!(task_marker("[ ] todo\n"), Some(false));
        assert_eq!(task_marker("[x] done\n"), Some(true));
        assert_eq!(task_marker("[X]\tdone\n"), Some(true));
        assert_eq!(task_marker("[ ]\n"), None);
        assert_eq!(task_marker("[ ]   \n"), None);
        assert_eq!(task_marker("[y] no\n"), None);
        assert_eq!(task_marker("[x]no\n"), None);
    }
}
