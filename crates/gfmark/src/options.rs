//! Parser configuration

use gfmark_core::{Error, Extension, Result};

/// Options for parsing
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Enabled GFM extensions, in registration order
    pub extensions: Vec<Extension>,

    /// Tab stop width used when measuring indentation
    pub tab_width: usize,

    /// Open emphasis runs and brackets per inline span; past this limit
    /// further openers are literal text
    pub max_delimiter_depth: usize,

    /// Curly quotes, en/em dashes and ellipses
    pub smart: bool,

    /// Fail on invalid UTF-8 instead of substituting U+FFFD
    pub strict_utf8: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            tab_width: 4,
            max_delimiter_depth: 1024,
            smart: false,
            strict_utf8: false,
        }
    }
}

impl ParseOptions {
    /// Every GFM extension enabled
    pub fn gfm() -> Self {
        Self {
            extensions: Extension::ALL.to_vec(),
            ..Self::default()
        }
    }

    /// Default options with extensions enabled by name
    pub fn with_extension_names(names: &[&str]) -> Result<Self> {
        let extensions = names
            .iter()
            .map(|name| name.parse())
            .collect::<Result<Vec<Extension>>>()?;
        Ok(Self {
            extensions,
            ..Self::default()
        })
    }

    pub fn has_extension(&self, extension: Extension) -> bool {
        self.extensions.contains(&extension)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tab_width == 0 {
            return Err(Error::Configuration("tab_width must be at least 1".into()));
        }
        if self.max_delimiter_depth == 0 {
            return Err(Error::Configuration(
                "max_delimiter_depth must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
