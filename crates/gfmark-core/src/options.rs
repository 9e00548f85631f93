//! Configuration shared by the parser and the renderers

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The fixed, compiled-in set of GFM extensions
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Extension {
    /// `~~text~~`
    Strikethrough,
    /// Pipe tables
    Table,
    /// `- [ ]` / `- [x]` list items
    TaskList,
    /// Bare `www.`, `http(s)://` and e-mail autolinks
    AutoLink,
    /// Neutralises a fixed set of raw HTML tags in HTML output
    TagFilter,
    /// `[^label]` references and `[^label]:` definitions
    Footnotes,
}

impl Extension {
    pub const ALL: [Extension; 6] = [
        Extension::Table,
        Extension::Strikethrough,
        Extension::TaskList,
        Extension::AutoLink,
        Extension::TagFilter,
        Extension::Footnotes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Extension::Strikethrough => "strikethrough",
            Extension::Table => "table",
            Extension::TaskList => "tasklist",
            Extension::AutoLink => "autolink",
            Extension::TagFilter => "tagfilter",
            Extension::Footnotes => "footnotes",
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Extension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strikethrough" => Ok(Extension::Strikethrough),
            "table" | "tables" => Ok(Extension::Table),
            "tasklist" | "task-list" | "tasklists" => Ok(Extension::TaskList),
            "autolink" | "autolinks" => Ok(Extension::AutoLink),
            "tagfilter" | "tag-filter" => Ok(Extension::TagFilter),
            "footnotes" | "footnote" => Ok(Extension::Footnotes),
            other => Err(Error::Configuration(format!("unknown extension `{other}`"))),
        }
    }
}

/// Output format for rendering
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Html,
    /// Normalised CommonMark source
    CommonMark,
    PlainText,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Html => "html",
            Format::CommonMark => "commonmark",
            Format::PlainText => "plaintext",
        })
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Format::Html),
            "commonmark" | "markdown" | "md" => Ok(Format::CommonMark),
            "plaintext" | "text" | "plain" => Ok(Format::PlainText),
            other => Err(Error::Configuration(format!("unsupported format `{other}`"))),
        }
    }
}

/// Options for rendering
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Render soft line breaks as a space instead of a newline
    pub soft_break_as_space: bool,

    /// Emit raw HTML verbatim; when false it is escaped
    pub unsafe_raw_html: bool,

    /// Add `data-sourcepos` attributes to block elements (HTML only)
    pub sourcepos: bool,

    /// Use `style="text-align: ..."` rather than `align="..."` on table cells
    pub table_prefer_style_attributes: bool,

    /// Emit the info string after the language word as `data-meta`
    pub full_info_string: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            soft_break_as_space: false,
            unsafe_raw_html: false,
            sourcepos: false,
            table_prefer_style_attributes: false,
            full_info_string: false,
        }
    }
}
