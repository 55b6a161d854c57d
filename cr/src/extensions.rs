//! Checkpoint file extension allow-lists

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::error::{ResolveError, ResolveResult};

/// Extensions known to be plain tensor containers (no embedded code)
pub const SAFE_EXTENSIONS: [&str; 2] = [".safetensors", ".sft"];

/// Ordered, normalized set of file extensions.
///
/// Every entry is dot-prefixed and lower-cased. Order is significant: an
/// entry's position is its preference rank when several candidates tie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    extensions: Vec<String>,
}

impl ExtensionSet {
    /// Parse a comma-separated list of dot-optional tokens, e.g. `".safetensors, sft"`
    pub fn parse(list: &str) -> ResolveResult<Self> {
        debug!(%list, "ExtensionSet::parse: called");
        let mut extensions: Vec<String> = Vec::new();

        for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let ext = if token.starts_with('.') {
                token.to_lowercase()
            } else {
                format!(".{}", token.to_lowercase())
            };

            if ext.len() < 2 || ext[1..].contains(['.', '/', '\\']) || ext.contains(char::is_whitespace) {
                return Err(ResolveError::InvalidConfiguration(format!(
                    "invalid extension '{}' in list '{}'",
                    token, list
                )));
            }

            if !extensions.contains(&ext) {
                extensions.push(ext);
            }
        }

        if extensions.is_empty() {
            return Err(ResolveError::InvalidConfiguration(format!(
                "extension list '{}' contains no extensions",
                list
            )));
        }

        debug!(?extensions, "ExtensionSet::parse: parsed");
        Ok(Self { extensions })
    }

    /// The approved safetensors extensions, in preference order
    pub fn safe() -> Self {
        Self {
            extensions: SAFE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Case-insensitive suffix test against every entry
    pub fn matches(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.extensions.iter().any(|ext| lower.ends_with(ext.as_str()))
    }

    /// Preference rank of `extension` (dot-prefixed), or `len()` when absent
    pub fn rank(&self, extension: &str) -> usize {
        let lower = extension.to_lowercase();
        self.extensions
            .iter()
            .position(|e| *e == lower)
            .unwrap_or(self.extensions.len())
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.rank(extension) < self.extensions.len()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

impl Default for ExtensionSet {
    fn default() -> Self {
        Self::safe()
    }
}

impl fmt::Display for ExtensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extensions.join(","))
    }
}

impl FromStr for ExtensionSet {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ExtensionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ExtensionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
