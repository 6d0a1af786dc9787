//! # Error Types — Configuration Errors and Warnings
//!
//! Every violated constraint becomes one [`ConfigurationError`] carrying the
//! dotted field path (`project.authors[0]`, `project.license.file`), an
//! [`ErrorKind`], a message and, for type mismatches, the observed
//! [`ValueKind`].
//!
//! ## Design
//!
//! - Messages name the field and the rule. They never contain the rejected
//!   value: configuration files are untrusted input and values may be large
//!   or sensitive. Table keys (which are identifiers) may be quoted.
//! - [`MetadataError`] is the single error surface. Fail-fast construction
//!   returns [`MetadataError::Configuration`]; collect-all construction
//!   returns [`MetadataError::Grouped`] with every error in field order.
//! - Warnings are a separate type and never abort construction.

use std::fmt;

use thiserror::Error;

use crate::field::ValueKind;

/// Category of a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong type for a field, or an unexpected key in a fixed-shape table.
    Structural,
    /// Malformed name, version, specifier, marker or glob.
    Syntactic,
    /// Conflicting, missing or unrepresentable fields.
    Semantic,
    /// Rejected by a configurable policy.
    Policy,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Syntactic => "syntactic",
            Self::Semantic => "semantic",
            Self::Policy => "policy",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ConfigurationError
// ---------------------------------------------------------------------------

/// A single violated constraint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ConfigurationError {
    key: String,
    kind: ErrorKind,
    message: String,
    value_type: Option<ValueKind>,
}

impl ConfigurationError {
    pub fn new(key: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind,
            message: message.into(),
            value_type: None,
        }
    }

    /// A type mismatch at `key`.
    pub fn invalid_type(key: impl Into<String>, expected: &str, got: ValueKind) -> Self {
        let key = key.into();
        let message = format!("Field \"{key}\" has an invalid type, expecting {expected} (got {got})");
        Self {
            key,
            kind: ErrorKind::Structural,
            message,
            value_type: Some(got),
        }
    }

    pub fn structural(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(key, ErrorKind::Structural, message)
    }

    pub fn syntactic(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(key, ErrorKind::Syntactic, message)
    }

    pub fn semantic(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(key, ErrorKind::Semantic, message)
    }

    pub fn policy(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(key, ErrorKind::Policy, message)
    }

    /// Dotted path of the offending field.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Type category of the offending value, for type mismatches.
    pub fn value_type(&self) -> Option<ValueKind> {
        self.value_type
    }
}

/// Ordered collection of configuration errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationErrors {
    errors: Vec<ConfigurationError>,
}

impl ConfigurationErrors {
    pub(crate) fn new(errors: Vec<ConfigurationError>) -> Self {
        Self { errors }
    }

    /// Returns the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if there are no errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns a slice of all errors.
    pub fn errors(&self) -> &[ConfigurationError] {
        &self.errors
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<ConfigurationError> {
        self.errors
    }
}

impl fmt::Display for ConfigurationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {}: {}", e.key, e.message)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MetadataError
// ---------------------------------------------------------------------------

/// Error returned by record construction, validation and serialization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// A single error (fail-fast mode, or a serialization-time check).
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Every error found in collect-all mode, in field order.
    #[error("Failed to parse pyproject.toml ({} errors):\n{errors}", .errors.len())]
    Grouped {
        /// The collected errors.
        errors: ConfigurationErrors,
    },
}

impl MetadataError {
    /// All individual errors, regardless of mode.
    pub fn errors(&self) -> Vec<&ConfigurationError> {
        match self {
            Self::Configuration(e) => vec![e],
            Self::Grouped { errors } => errors.errors().iter().collect(),
        }
    }
}

/// Non-fatal diagnostic returned alongside a successfully built record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationWarning {
    key: String,
    message: String,
}

impl ConfigurationWarning {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConfigurationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Failure of a [`ContentSource`](crate::content::ContentSource) operation.
#[derive(Error, Debug)]
pub enum ContentError {
    /// The referenced file does not exist.
    #[error("file not found")]
    NotFound,

    /// The file exists but is not valid UTF-8.
    #[error("file is not valid UTF-8")]
    InvalidUtf8,

    /// The glob pattern could not be compiled.
    #[error("invalid glob pattern: {0}")]
    InvalidPattern(String),

    /// The source does not provide file access.
    #[error("file access is not available")]
    Unavailable,

    /// IO error reading a file or walking a directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_type_message() {
        let err = ConfigurationError::invalid_type("project.name", "a string", ValueKind::Boolean);
        assert_eq!(
            err.to_string(),
            "Field \"project.name\" has an invalid type, expecting a string (got boolean)"
        );
        assert_eq!(err.key(), "project.name");
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert_eq!(err.value_type(), Some(ValueKind::Boolean));
    }

    #[test]
    fn test_grouped_display_lists_every_error() {
        let err = MetadataError::Grouped {
            errors: ConfigurationErrors::new(vec![
                ConfigurationError::syntactic("project.name", "bad name"),
                ConfigurationError::policy("project.description", "multiline"),
            ]),
        };
        assert_eq!(
            err.to_string(),
            "Failed to parse pyproject.toml (2 errors):\n  project.name: bad name\n  project.description: multiline"
        );
        assert_eq!(err.errors().len(), 2);
    }

    #[test]
    fn test_single_error_is_transparent() {
        let err: MetadataError = ConfigurationError::semantic("project", "missing").into();
        assert_eq!(err.to_string(), "missing");
        assert_eq!(err.errors()[0].kind(), ErrorKind::Semantic);
    }
}
