//! # pmeta-metadata — Project Metadata Validation & Serialization
//!
//! Turns an already-parsed `pyproject.toml` document (as a
//! [`serde_json::Value`] tree) into a validated [`StandardMetadata`] record,
//! and renders that record as core metadata.
//!
//! ## Pipeline
//!
//! 1. [`StandardMetadata::from_pyproject`] locates `[project]`, shape-checks
//!    each field, parses names, versions, specifiers and requirements through
//!    `pmeta-core`, and applies the cross-field rules.
//! 2. [`StandardMetadata::core_metadata`] re-validates the record, resolves
//!    the output [`MetadataVersion`] and produces a [`CoreMetadata`] value.
//! 3. [`CoreMetadata::to_rfc822`] and [`json::to_json`] render it.
//!
//! Every validation failure is a [`ConfigurationError`] with the dotted path
//! of the offending field. [`ErrorMode`] selects whether construction stops
//! at the first one or returns them all, ordered by field.
//!
//! ## Crate Policy
//!
//! - Depends only on `pmeta-core` internally.
//! - No direct file system access in the pipeline: `readme`, `license.file`
//!   and `license-files` go through a [`ContentSource`].
//! - Error messages never contain the rejected value.

pub mod collector;
pub mod config;
pub mod constants;
pub mod content;
pub mod core_metadata;
pub mod error;
mod extract;
pub mod field;
pub mod json;
pub mod metadata_version;
pub mod model;
pub mod record;
pub mod rfc822;

pub use collector::{ErrorCollector, ErrorMode};
pub use config::{KeyPolicy, MultilinePolicy, ValidationConfig};
pub use content::{ContentSource, FsContentSource, MemoryContentSource, NoContentSource};
pub use core_metadata::CoreMetadata;
pub use error::{
    ConfigurationError, ConfigurationErrors, ConfigurationWarning, ContentError, ErrorKind,
    MetadataError,
};
pub use field::{FieldShape, ProjectField, ValueKind};
pub use metadata_version::{MetadataVersion, VersionFeatures};
pub use model::{Contact, ImportName, License, LicenseField, Readme};
pub use record::StandardMetadata;
pub use rfc822::Rfc822Message;
