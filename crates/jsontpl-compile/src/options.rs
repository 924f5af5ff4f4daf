use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Options for compiling a template.
///
/// Every field may be omitted in TOML; missing fields keep their defaults.
///
/// ```toml
/// [string]
/// left = "<%"
/// right = "%>"
///
/// [object]
/// call = "@"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CompileOptions {
    pub string: StringOptions,
    pub object: ObjectOptions,
}

/// Delimiters marking an interpolation span and the token that escapes them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct StringOptions {
    pub left: String,
    pub right: String,
    pub escape: String,
}

impl Default for StringOptions {
    fn default() -> Self {
        Self {
            left: "{{".to_string(),
            right: "}}".to_string(),
            escape: "\\".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectOptions {
    /// Key prefix marking a one-key object as a function call.
    pub call: String,
}

impl Default for ObjectOptions {
    fn default() -> Self {
        Self {
            call: "$".to_string(),
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiters(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.string.left = left.into();
        self.string.right = right.into();
        self
    }

    pub fn with_escape(mut self, escape: impl Into<String>) -> Self {
        self.string.escape = escape.into();
        self
    }

    pub fn with_call_sigil(mut self, call: impl Into<String>) -> Self {
        self.object.call = call.into();
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let options: CompileOptions =
            toml::from_str(content).context("invalid compile options")?;
        Ok(options)
    }

    /// Load options from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = CompileOptions::default();
        assert_eq!(opts.string.left, "{{");
        assert_eq!(opts.string.right, "}}");
        assert_eq!(opts.string.escape, "\\");
        assert_eq!(opts.object.call, "$");
    }

    #[test]
    fn partial_toml_keeps_defaults() -> Result<()> {
        let opts = CompileOptions::from_toml_str("[string]\nleft = \"<%\"\n")?;
        assert_eq!(opts.string.left, "<%");
        assert_eq!(opts.string.right, "}}");
        assert_eq!(opts.object.call, "$");
        Ok(())
    }

    #[test]
    fn empty_toml_is_default() -> Result<()> {
        assert_eq!(CompileOptions::from_toml_str("")?, CompileOptions::default());
        Ok(())
    }

    #[test]
    fn invalid_toml_is_error() {
        let err = CompileOptions::from_toml_str("[string]\nleft = 3\n").unwrap_err();
        assert!(err.to_string().contains("invalid compile options"));
    }

    #[test]
    fn missing_file_names_path() {
        let err = CompileOptions::from_file(Path::new("/nonexistent/jsontpl.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/jsontpl.toml"));
    }

    #[test]
    fn builders() {
        let opts = CompileOptions::new()
            .with_delimiters("<%", "%>")
            .with_escape("!")
            .with_call_sigil("@");
        assert_eq!(opts.string.left, "<%");
        assert_eq!(opts.string.right, "%>");
        assert_eq!(opts.string.escape, "!");
        assert_eq!(opts.object.call, "@");
    }
}
