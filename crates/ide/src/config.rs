use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Client options for completion requests. Every field has a default, so an
/// empty table is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionConfig {
    /// Emit `$0` tab-stop snippets. When off, insert text is plain and
    /// snippet-only suggestions are dropped.
    pub snippets: bool,
    /// Match typed resource type prefixes case-sensitively.
    pub case_sensitive_type_filter: bool,
    /// Offer decorator names after `@`.
    pub decorators: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            snippets: true,
            case_sensitive_type_filter: false,
            decorators: true,
        }
    }
}

impl CompletionConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}
