//! Registry of the formats reachable through pandoc.
//!
//! Maps format names and file extensions to the pandoc reader/writer name and
//! records whether the format is binary, in which case pandoc must read from or
//! write to a file rather than a pipe.

use crate::error::CodecError;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PandocFormat {
    /// Name pandoc knows the format by.
    pub name: String,
    pub extensions: Vec<String>,
    /// Whether pandoc can only read and write the format as files.
    pub binary: bool,
}

impl PandocFormat {
    pub fn new(name: &str, extensions: &[&str], binary: bool) -> Self {
        PandocFormat {
            name: name.to_string(),
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
            binary,
        }
    }
}

/// Formats by name.
///
/// ```ignore
/// let registry = FormatRegistry::default();
/// assert!(registry.get("docx")?.binary);
/// assert_eq!(registry.file_extension("markdown"), "md");
/// ```
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    formats: BTreeMap<String, PandocFormat>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        FormatRegistry {
            formats: BTreeMap::new(),
        }
    }

    /// Registers a format, replacing any with the same name.
    pub fn register(&mut self, format: PandocFormat) {
        self.formats.insert(format.name.clone(), format);
    }

    pub fn get(&self, name: &str) -> Result<&PandocFormat, CodecError> {
        self.formats
            .get(name)
            .ok_or_else(|| CodecError::FormatNotFound(name.to_string()))
    }

    /// Whether the named format has to go through a file. Unknown formats are
    /// treated as text.
    pub fn is_binary(&self, name: &str) -> bool {
        self.formats.get(name).is_some_and(|format| format.binary)
    }

    /// Extension for files pandoc reads or writes in the named format: the
    /// format's first extension, or its name when it has none.
    pub fn file_extension(&self, name: &str) -> String {
        self.get(name)
            .ok()
            .and_then(|format| format.extensions.first().cloned())
            .unwrap_or_else(|| name.to_string())
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PandocFormat::new("markdown", &["md", "markdown"], false));
        registry.register(PandocFormat::new("gfm", &[], false));
        registry.register(PandocFormat::new("commonmark", &[], false));
        registry.register(PandocFormat::new("html", &["html", "htm"], false));
        registry.register(PandocFormat::new("latex", &["tex", "latex"], false));
        registry.register(PandocFormat::new("rst", &["rst"], false));
        registry.register(PandocFormat::new("jats", &["jats"], false));
        registry.register(PandocFormat::new("json", &["json"], false));
        registry.register(PandocFormat::new("plain", &["txt"], false));
        registry.register(PandocFormat::new("docx", &["docx"], true));
        registry.register(PandocFormat::new("odt", &["odt"], true));
        registry.register(PandocFormat::new("epub", &["epub"], true));
        registry.register(PandocFormat::new("pdf", &["pdf"], true));
        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
