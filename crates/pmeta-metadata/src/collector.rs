//! # Error Aggregation
//!
//! [`ErrorCollector`] implements the two construction modes:
//!
//! - [`ErrorMode::FailFast`]: [`ErrorCollector::push`] returns the error
//!   immediately, so `?` at the call site aborts construction.
//! - [`ErrorMode::CollectAll`]: errors are stored and returned together by
//!   [`ErrorCollector::finish`] as a [`MetadataError::Grouped`], sorted by
//!   field declaration order (stable within a field).
//!
//! Field order is derived from the error key: `project` itself ranks first,
//! then every [`ProjectField`] in declaration order, then keys that belong to
//! the caller's configuration (`metadata-version`, `dynamic-metadata`).

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ConfigurationErrors, MetadataError};
use crate::field::ProjectField;

/// How construction reacts to the first error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorMode {
    /// Return the first error encountered.
    #[default]
    FailFast,
    /// Run every check and return all errors together.
    CollectAll,
}

/// Reporting rank of an error key.
pub(crate) fn rank_of(key: &str) -> usize {
    let Some(rest) = key.strip_prefix("project") else {
        return usize::MAX;
    };
    if rest.is_empty() {
        return 0;
    }
    let Some(rest) = rest.strip_prefix('.') else {
        return usize::MAX;
    };
    let end = rest.find(['.', '[']).unwrap_or(rest.len());
    ProjectField::from_key(&rest[..end]).map_or(usize::MAX - 1, |f| f.rank() + 1)
}

/// Accumulates errors according to an [`ErrorMode`].
#[derive(Debug)]
pub struct ErrorCollector {
    mode: ErrorMode,
    errors: Vec<ConfigurationError>,
}

impl ErrorCollector {
    pub fn new(mode: ErrorMode) -> Self {
        Self {
            mode,
            errors: Vec::new(),
        }
    }

    pub fn mode(&self) -> ErrorMode {
        self.mode
    }

    /// Record an error. In fail-fast mode the error is returned instead.
    pub fn push(&mut self, error: ConfigurationError) -> Result<(), MetadataError> {
        match self.mode {
            ErrorMode::FailFast => Err(error.into()),
            ErrorMode::CollectAll => {
                self.errors.push(error);
                Ok(())
            }
        }
    }

    /// Unwrap a fallible check: `Ok(Some(value))` on success, `Ok(None)` when
    /// the error was recorded, `Err` when it aborts construction.
    pub fn check<T>(
        &mut self,
        result: Result<T, ConfigurationError>,
    ) -> Result<Option<T>, MetadataError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(error) => self.push(error).map(|()| None),
        }
    }

    /// Record every error of `errors`.
    pub fn extend(
        &mut self,
        errors: impl IntoIterator<Item = ConfigurationError>,
    ) -> Result<(), MetadataError> {
        for error in errors {
            self.push(error)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Finish collection: `Ok(())` if nothing was recorded, otherwise every
    /// recorded error in field order.
    pub fn finish(mut self) -> Result<(), MetadataError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        self.errors.sort_by_key(|e| rank_of(e.key()));
        Err(MetadataError::Grouped {
            errors: ConfigurationErrors::new(self.errors),
        })
    }
}
