//! `~text~` and `~~text~~`

use gfmark_core::NodeValue;

use super::{ExtensionHooks, InlineDelimiter};

pub(super) fn hooks() -> ExtensionHooks {
    ExtensionHooks {
        delimiters: vec![InlineDelimiter {
            ch: b'~',
            min_run: 1,
            max_run: 2,
            same_length: true,
            value: NodeValue::Strikethrough,
        }],
        ..ExtensionHooks::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tilde_delimiter() {
        let hooks = hooks();
        assert_eq!(hooks.delimiters.len(), 1);
        assert_eq!(hooks.delimiters[0].ch, b'~');
        assert!(hooks.block_starts.is_empty());
    }
}
