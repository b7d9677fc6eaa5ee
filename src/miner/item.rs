//! Identifier and item types

use serde::Serialize;
use std::fmt;

/// A trimmed archive.org item identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Creates an identifier from a raw input line, trimming surrounding whitespace
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// The metadata record retrieved for one identifier
///
/// `metadata` is the API response passed through unmodified.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub identifier: Identifier,
    pub metadata: serde_json::Value,
}

impl Item {
    pub fn new(identifier: Identifier, metadata: serde_json::Value) -> Self {
        Self {
            identifier,
            metadata,
        }
    }
}
