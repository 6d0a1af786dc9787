//! JSON rendering of [`CoreMetadata`].

use serde_json::Value;

use crate::core_metadata::CoreMetadata;
use crate::error::{ConfigurationError, MetadataError};

/// Serialize `metadata` to a JSON object with snake_case keys.
pub fn to_json(metadata: &CoreMetadata) -> Result<Value, MetadataError> {
    serde_json::to_value(metadata).map_err(|e| {
        ConfigurationError::structural(
            "metadata",
            format!("Core metadata could not be serialized to JSON: {e}"),
        )
        .into()
    })
}
