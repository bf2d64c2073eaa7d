//! Input adapters.
//! Turn an XML or JSON document into a [`Node`] tree, element for node,
//! attribute for attribute.

use crate::error::{Error, Result};
use crate::node::Node;
use std::fmt;
use std::path::Path;

pub mod json;
pub mod xml;

pub use json::JsonAdapter;
pub use xml::XmlAdapter;

/// Trait for building a node tree from a source document.
pub trait InputAdapter {
    /// Parses `source` and returns the root node.
    ///
    /// # Errors
    /// * `Error::ParseError` if the document is malformed
    fn build(&self, source: &str) -> Result<Node>;
}

/// Surface syntax of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Xml,
    Json,
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Xml => f.write_str("XML"),
            InputFormat::Json => f.write_str("JSON"),
        }
    }
}

impl InputFormat {
    /// Picks the format from a file extension (`.xml` or `.json`, case-insensitive).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("xml") => Ok(Self::Xml),
            Some("json") => Ok(Self::Json),
            _ => Err(Error::ParseError(format!(
                "input '{}' must be an XML or JSON file",
                path.display()
            ))),
        }
    }

    /// Returns the adapter for this format.
    pub fn adapter(self) -> Box<dyn InputAdapter> {
        match self {
            InputFormat::Xml => Box::new(XmlAdapter::new()),
            InputFormat::Json => Box::new(JsonAdapter::new()),
        }
    }
}

/// Normalizes element text: trimmed, with whitespace-only text treated as absent.
pub(crate) fn normalize_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(InputFormat::from_path("main.xml").unwrap(), InputFormat::Xml);
        assert_eq!(InputFormat::from_path("tree.JSON").unwrap(), InputFormat::Json);
        assert!(InputFormat::from_path("notes.txt").is_err());
        assert!(InputFormat::from_path("Makefile").is_err());
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  hi \n"), Some("hi".to_string()));
        assert_eq!(normalize_text(" \n\t "), None);
    }
}
