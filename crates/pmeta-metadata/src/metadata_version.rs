//! # Metadata-Version Resolution
//!
//! Each optional feature of a record needs a minimum core-metadata version.
//! The resolver walks this table in order:
//!
//! | Feature                                       | Minimum |
//! |-----------------------------------------------|---------|
//! | `import-names` / `import-namespaces`          | 2.5     |
//! | license expression / `license-files`          | 2.4     |
//! | `requires-python` with `or` alternatives      | 2.3     |
//! | caller-declared dynamic metadata (`Dynamic`)  | 2.2     |
//! | otherwise                                     | 2.1     |
//!
//! Without a pinned version the highest requirement wins. A pinned version
//! is never raised: every feature it cannot represent becomes an error that
//! names the field and the version it needs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ConfigurationWarning};

/// A core-metadata format version.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum MetadataVersion {
    #[default]
    #[serde(rename = "2.1")]
    V2_1,
    #[serde(rename = "2.2")]
    V2_2,
    #[serde(rename = "2.3")]
    V2_3,
    #[serde(rename = "2.4")]
    V2_4,
    #[serde(rename = "2.5")]
    V2_5,
}

impl MetadataVersion {
    pub const ALL: [MetadataVersion; 5] = [Self::V2_1, Self::V2_2, Self::V2_3, Self::V2_4, Self::V2_5];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V2_1 => "2.1",
            Self::V2_2 => "2.2",
            Self::V2_3 => "2.3",
            Self::V2_4 => "2.4",
            Self::V2_5 => "2.5",
        }
    }
}

impl fmt::Display for MetadataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetadataVersion {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s.trim())
            .ok_or_else(|| {
                ConfigurationError::syntactic(
                    "metadata-version",
                    "The metadata version must be one of 2.1, 2.2, 2.3, 2.4, 2.5",
                )
            })
    }
}

/// The version-relevant features of a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionFeatures {
    pub import_names: bool,
    pub import_namespaces: bool,
    pub license_expression: bool,
    pub license_files: bool,
    pub legacy_license: bool,
    pub license_classifiers: bool,
    pub requires_python_disjunction: bool,
    pub dynamic_metadata: bool,
}

struct Requirement {
    key: &'static str,
    minimum: MetadataVersion,
    message: &'static str,
}

impl VersionFeatures {
    fn requirements(&self) -> Vec<Requirement> {
        let table = [
            (
                self.import_names,
                Requirement {
                    key: "project.import-names",
                    minimum: MetadataVersion::V2_5,
                    message: "\"project.import-names\" is supported only when emitting metadata version >= 2.5",
                },
            ),
            (
                self.import_namespaces,
                Requirement {
                    key: "project.import-namespaces",
                    minimum: MetadataVersion::V2_5,
                    message: "\"project.import-namespaces\" is supported only when emitting metadata version >= 2.5",
                },
            ),
            (
                self.license_expression,
                Requirement {
                    key: "project.license",
                    minimum: MetadataVersion::V2_4,
                    message: "Setting \"project.license\" to an SPDX license expression is supported only when emitting metadata version >= 2.4",
                },
            ),
            (
                self.license_files,
                Requirement {
                    key: "project.license-files",
                    minimum: MetadataVersion::V2_4,
                    message: "\"project.license-files\" is supported only when emitting metadata version >= 2.4",
                },
            ),
            (
                self.requires_python_disjunction,
                Requirement {
                    key: "project.requires-python",
                    minimum: MetadataVersion::V2_3,
                    message: "\"project.requires-python\" with \"or\" alternatives is supported only when emitting metadata version >= 2.3",
                },
            ),
            (
                self.dynamic_metadata,
                Requirement {
                    key: "dynamic-metadata",
                    minimum: MetadataVersion::V2_2,
                    message: "Dynamic metadata fields are supported only when emitting metadata version >= 2.2",
                },
            ),
        ];
        table
            .into_iter()
            .filter(|(present, _)| *present)
            .map(|(_, requirement)| requirement)
            .collect()
    }

    /// The lowest version able to represent every present feature.
    pub fn minimum(&self) -> MetadataVersion {
        self.requirements()
            .first()
            .map_or(MetadataVersion::V2_1, |r| r.minimum)
    }

    /// Resolve the output version.
    ///
    /// With `pinned` set, returns it unchanged if sufficient, or one error per
    /// feature that needs a higher version.
    pub fn resolve(
        &self,
        pinned: Option<MetadataVersion>,
    ) -> Result<MetadataVersion, Vec<ConfigurationError>> {
        let Some(pinned) = pinned else {
            let version = self.minimum();
            tracing::debug!(metadata_version = %version, "resolved minimum metadata version");
            return Ok(version);
        };
        let errors: Vec<_> = self
            .requirements()
            .into_iter()
            .filter(|r| r.minimum > pinned)
            .map(|r| ConfigurationError::semantic(r.key, r.message))
            .collect();
        if errors.is_empty() {
            Ok(pinned)
        } else {
            Err(errors)
        }
    }

    /// Deprecation warnings that apply when emitting `version`. A legacy
    /// license table takes precedence over `License ::` classifiers.
    pub fn warnings(&self, version: MetadataVersion) -> Vec<ConfigurationWarning> {
        let mut warnings = Vec::new();
        if version < MetadataVersion::V2_4 {
            return warnings;
        }
        if self.legacy_license {
            warnings.push(ConfigurationWarning::new(
                "project.license",
                "Set \"project.license\" to an SPDX license expression for metadata >= 2.4",
            ));
        } else if self.license_classifiers {
            warnings.push(ConfigurationWarning::new(
                "project.classifiers",
                "\"License ::\" classifiers are deprecated for metadata >= 2.4, use a SPDX license expression for \"project.license\" instead",
            ));
        }
        warnings
    }
}
