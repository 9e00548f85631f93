//! Extension registry
//!
//! Each GFM extension contributes a set of hooks into the block and inline
//! parsers. The registry is keyed by [`Extension`] and built once per
//! [`Parser`](crate::Parser); parsing only ever reads it, so one registry can
//! serve any number of documents on any number of threads.

mod autolink;
mod footnotes;
mod strikethrough;
mod table;
mod tasklist;

use indexmap::IndexMap;
use tracing::debug;

use gfmark_core::{Extension, Node, NodeValue};

use crate::blocks::BlockParser;

/// Where an extension's block start is tried relative to the core starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Before any CommonMark block start
    BeforeCore,
    /// After every CommonMark block start failed
    AfterCore,
}

/// Outcome of a block-start predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStart {
    /// Not a match; try the next start
    None,
    /// Opened a container; keep looking for starts inside it
    Container,
    /// Opened or extended a leaf; the rest of the line is handled
    Leaf,
}

pub(crate) type BlockStartFn = fn(&mut BlockParser<'_>, usize) -> BlockStart;
pub(crate) type ContinueFn = fn(&mut BlockParser<'_>, usize) -> Option<bool>;
pub(crate) type FinalizeFn = fn(&mut BlockParser<'_>, usize);
pub(crate) type PostprocessFn = fn(&mut Vec<Node>);
pub(crate) type DocumentPostprocessFn = fn(&mut Node);

#[derive(Clone)]
pub(crate) struct BlockStartHook {
    pub slot: Slot,
    pub start: BlockStartFn,
}

/// An inline delimiter handled by the emphasis algorithm
#[derive(Debug, Clone)]
pub(crate) struct InlineDelimiter {
    pub ch: u8,
    pub min_run: usize,
    pub max_run: usize,
    /// Opener and closer must have the same length
    pub same_length: bool,
    /// Node produced for a matched pair
    pub value: NodeValue,
}

/// Everything one extension plugs into the parsers
#[derive(Clone, Default)]
pub(crate) struct ExtensionHooks {
    pub block_starts: Vec<BlockStartHook>,
    /// Continuation test for blocks the extension owns; `None` leaves the
    /// block to the core rules
    pub continues: Option<ContinueFn>,
    /// Called for every block as it is closed
    pub finalize: Option<FinalizeFn>,
    pub delimiters: Vec<InlineDelimiter>,
    /// Runs over the finished inline children of each block
    pub inline_postprocess: Option<PostprocessFn>,
    /// Runs once over the finished document
    pub document_postprocess: Option<DocumentPostprocessFn>,
}

impl ExtensionHooks {
    fn for_extension(extension: Extension) -> Self {
        match extension {
            Extension::Table => table::hooks(),
            Extension::Strikethrough => strikethrough::hooks(),
            Extension::TaskList => tasklist::hooks(),
            Extension::AutoLink => autolink::hooks(),
            Extension::Footnotes => footnotes::hooks(),
            // Applied by the HTML renderer
            Extension::TagFilter => Self::default(),
        }
    }
}

/// Immutable, ordered map of enabled extensions to their hooks
#[derive(Clone, Default)]
pub(crate) struct ExtensionRegistry {
    hooks: IndexMap<Extension, ExtensionHooks>,
}

impl ExtensionRegistry {
    pub fn new(extensions: &[Extension]) -> Self {
        let mut hooks = IndexMap::new();
        for &extension in extensions {
            hooks
                .entry(extension)
                .or_insert_with(|| ExtensionHooks::for_extension(extension));
        }
        debug!(extensions = ?hooks.keys().collect::<Vec<_>>(), "built extension registry");
        Self { hooks }
    }

    pub fn extensions(&self) -> Vec<Extension> {
        self.hooks.keys().copied().collect()
    }

    pub fn block_starts(&self, slot: Slot) -> impl Iterator<Item = BlockStartFn> + '_ {
        self.hooks
            .values()
            .flat_map(|hooks| hooks.block_starts.iter())
            .filter(move |hook| hook.slot == slot)
            .map(|hook| hook.start)
    }

    pub fn continues(&self) -> impl Iterator<Item = ContinueFn> + '_ {
        self.hooks.values().filter_map(|hooks| hooks.continues)
    }

    pub fn finalizers(&self) -> impl Iterator<Item = FinalizeFn> + '_ {
        self.hooks.values().filter_map(|hooks| hooks.finalize)
    }

    pub fn delimiter(&self, ch: u8) -> Option<&InlineDelimiter> {
        self.hooks
            .values()
            .flat_map(|hooks| hooks.delimiters.iter())
            .find(|delimiter| delimiter.ch == ch)
    }

    pub fn delimiter_chars(&self) -> impl Iterator<Item = u8> + '_ {
        self.hooks
            .values()
            .flat_map(|hooks| hooks.delimiters.iter())
            .map(|delimiter| delimiter.ch)
    }

    pub fn postprocessors(&self) -> impl Iterator<Item = PostprocessFn> + '_ {
        self.hooks.values().filter_map(|hooks| hooks.inline_postprocess)
    }

    pub fn document_postprocessors(&self) -> impl Iterator<Item = DocumentPostprocessFn> + '_ {
        self.hooks.values().filter_map(|hooks| hooks.document_postprocess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_preserves_order_and_dedups() {
        let registry = ExtensionRegistry::new(&[
            Extension::TaskList,
            Extension::Table,
            Extension::TaskList,
        ]);
        assert_eq!(
            registry.extensions(),
            vec![Extension::TaskList, Extension::Table]
        );
    }

    #[test]
    fn test_registry_hooks() {
        let registry = ExtensionRegistry::new(&Extension::ALL);
        assert_eq!(registry.block_starts(Slot::AfterCore).count(), 1);
        assert_eq!(registry.block_starts(Slot::BeforeCore).count(), 1);
        assert_eq!(registry.continues().count(), 2);
        assert_eq!(registry.finalizers().count(), 1);
        assert_eq!(registry.postprocessors().count(), 1);
        assert_eq!(registry.document_postprocessors().count(), 1);
        assert!(registry.delimiter(b'~').is_some());
        assert!(registry.delimiter(b'*').is_none());
    }

    #[test]
    fn test_empty_registry() {
        let registry = ExtensionRegistry::new(&[]);
        assert!(registry.delimiter(b'~').is_none());
        assert_eq!(registry.delimiter_chars().count(), 0);
    }
}
