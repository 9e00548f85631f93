//! Document parser

use tracing::debug;

use gfmark_core::{Document, Format, RenderOptions, Result};

use crate::blocks::BlockParser;
use crate::extensions::ExtensionRegistry;
use crate::options::ParseOptions;
use crate::scanner::{self, SourceBuffer};

/// Parses Markdown documents with a fixed configuration.
///
/// A `Parser` holds no per-document state; one instance can be shared
/// across threads and reused for any number of documents.
#[derive(Clone)]
pub struct Parser {
    options: ParseOptions,
    registry: ExtensionRegistry,
}

impl Parser {
    /// Create a parser, validating the options
    pub fn new(options: ParseOptions) -> Result<Self> {
        options.validate()?;
        let registry = ExtensionRegistry::new(&options.extensions);
        Ok(Self { options, registry })
    }

    /// Create a parser with every GFM extension enabled
    pub fn gfm() -> Self {
        let options = ParseOptions::gfm();
        let registry = ExtensionRegistry::new(&options.extensions);
        Self { options, registry }
    }

    /// Parse raw bytes. Fails only on invalid UTF-8 with `strict_utf8` set.
    pub fn parse(&self, input: &[u8]) -> Result<Document> {
        debug!(bytes = input.len(), extensions = self.options.extensions.len(), "parsing document");
        let source = scanner::scan(input, self.options.strict_utf8)?;
        Ok(self.build(&source))
    }

    /// Parse text that is already valid UTF-8
    pub fn parse_str(&self, input: &str) -> Document {
        debug!(bytes = input.len(), extensions = self.options.extensions.len(), "parsing document");
        self.build(&scanner::scan_str(input))
    }

    fn build(&self, source: &SourceBuffer) -> Document {
        let mut blocks = BlockParser::new(&self.registry, &self.options);
        for line in source.lines() {
            blocks.feed(line.text, line.number);
        }
        let root = blocks.finish(source.len());

        debug!(
            lines = source.len(),
            blocks = root.children.len(),
            "parsed document"
        );
        Document::new(root, self.registry.extensions())
    }

    /// Parse and render in one step
    pub fn render(&self, input: &str, format: Format, options: &RenderOptions) -> String {
        gfmark_core::render(&self.parse_str(input), format, options)
    }

    /// Get the current options
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }
}

impl Default for Parser {
    fn default() -> Self {
        let options = ParseOptions::default();
        let registry = ExtensionRegistry::new(&options.extensions);
        Self { options, registry }
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
