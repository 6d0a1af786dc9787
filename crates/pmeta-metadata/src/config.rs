//! # Validation Configuration
//!
//! All policy that influences construction is carried by an explicit
//! [`ValidationConfig`] value. It deserializes from a kebab-case table so a
//! build backend can embed it in its own settings:
//!
//! ```toml
//! error-mode = "collect-all"
//! unknown-keys = "error"
//! metadata-version = "2.4"
//! dynamic-metadata = ["Requires-Dist"]
//! ```

use serde::{Deserialize, Serialize};

use crate::collector::ErrorMode;
use crate::metadata_version::MetadataVersion;

/// Treatment of keys in `[project]` that are not recognized fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyPolicy {
    Ignore,
    #[default]
    Warn,
    Error,
}

/// Treatment of a `description` containing line breaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultilinePolicy {
    #[default]
    Error,
    /// Keep the value, emit a warning and fold it on output.
    Warn,
}

/// Construction and serialization policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ValidationConfig {
    pub error_mode: ErrorMode,
    pub unknown_keys: KeyPolicy,
    pub multiline_summary: MultilinePolicy,
    /// Pinned output version. `None` selects the minimum version that can
    /// represent the populated fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_version: Option<MetadataVersion>,
    /// Core-metadata fields the backend will fill in at build time
    /// (emitted as `Dynamic` headers).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dynamic_metadata: Vec<String>,
}

impl ValidationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    pub fn with_unknown_keys(mut self, policy: KeyPolicy) -> Self {
        self.unknown_keys = policy;
        self
    }

    pub fn with_multiline_summary(mut self, policy: MultilinePolicy) -> Self {
        self.multiline_summary = policy;
        self
    }

    pub fn with_metadata_version(mut self, version: MetadataVersion) -> Self {
        self.metadata_version = Some(version);
        self
    }

    pub fn with_dynamic_metadata<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dynamic_metadata = fields.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ValidationConfig::default();
        assert_eq!(config.error_mode, ErrorMode::FailFast);
        assert_eq!(config.unknown_keys, KeyPolicy::Warn);
        assert_eq!(config.multiline_summary, MultilinePolicy::Error);
        assert_eq!(config.metadata_version, None);
        assert!(config.dynamic_metadata.is_empty());
    }

    #[test]
    fn test_deserialize_kebab_case() {
        let config: ValidationConfig = serde_json::from_value(json!({
            "error-mode": "collect-all",
            "unknown-keys": "error",
            "multiline-summary": "warn",
            "metadata-version": "2.4",
            "dynamic-metadata": ["Requires-Dist"],
        }))
        .unwrap();
        assert_eq!(
            config,
            ValidationConfig::new()
                .with_error_mode(ErrorMode::CollectAll)
                .with_unknown_keys(KeyPolicy::Error)
                .with_multiline_summary(MultilinePolicy::Warn)
                .with_metadata_version(MetadataVersion::V2_4)
                .with_dynamic_metadata(["Requires-Dist"])
        );
    }

    #[test]
    fn test_partial_table_uses_defaults() {
        let config: ValidationConfig =
            serde_json::from_value(json!({ "unknown-keys": "ignore" })).unwrap();
        assert_eq!(config.unknown_keys, KeyPolicy::Ignore);
        assert_eq!(config.error_mode, ErrorMode::FailFast);
    }
}
