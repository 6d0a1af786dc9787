//! # Content Sources
//!
//! The record needs file content for `readme`, a legacy `license.file` and
//! `license-files` globbing. That access goes through the [`ContentSource`]
//! capability so the pipeline itself performs no I/O:
//!
//! - [`FsContentSource`] reads relative to a project root. Each read opens,
//!   decodes and closes the file before returning.
//! - [`MemoryContentSource`] serves an in-memory file map.
//! - [`NoContentSource`] rejects every file reference.
//!
//! Paths handed to and returned from a source are relative to the project
//! root and use `/` separators.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::error::ContentError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// File access capability used during record construction.
pub trait ContentSource {
    /// Read a UTF-8 text file.
    fn read_text(&self, path: &Path) -> Result<String, ContentError>;

    /// Files matching `pattern`, sorted, relative to the project root.
    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>, ContentError>;
}

// ---------------------------------------------------------------------------
// File system
// ---------------------------------------------------------------------------

/// Reads files below a project directory.
#[derive(Debug, Clone)]
pub struct FsContentSource {
    root: PathBuf,
}

impl FsContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentSource for FsContentSource {
    fn read_text(&self, path: &Path) -> Result<String, ContentError> {
        let full = self.root.join(path);
        if !full.is_file() {
            return Err(ContentError::NotFound);
        }
        let bytes = std::fs::read(&full)?;
        String::from_utf8(bytes).map_err(|_| ContentError::InvalidUtf8)
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>, ContentError> {
        let root = self.root.to_string_lossy();
        let full = format!("{}/{pattern}", Pattern::escape(root.trim_end_matches('/')));
        let entries = glob::glob_with(&full, MATCH_OPTIONS)
            .map_err(|e| ContentError::InvalidPattern(e.msg.to_string()))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ContentError::Io(e.into_error()))?;
            if !path.is_file() {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(&self.root) {
                files.push(relative.to_path_buf());
            }
        }
        files.sort();
        Ok(files)
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

/// In-memory file map, keyed by relative path.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentSource {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl ContentSource for MemoryContentSource {
    fn read_text(&self, path: &Path) -> Result<String, ContentError> {
        self.files.get(path).cloned().ok_or(ContentError::NotFound)
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>, ContentError> {
        let pattern =
            Pattern::new(pattern).map_err(|e| ContentError::InvalidPattern(e.msg.to_string()))?;
        Ok(self
            .files
            .keys()
            .filter(|path| pattern.matches_path_with(path, MATCH_OPTIONS))
            .cloned()
            .collect())
    }
}

/// A source without file access.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContentSource;

impl ContentSource for NoContentSource {
    fn read_text(&self, _path: &Path) -> Result<String, ContentError> {
        Err(ContentError::Unavailable)
    }

    fn glob(&self, _pattern: &str) -> Result<Vec<PathBuf>, ContentError> {
        Err(ContentError::Unavailable)
    }
}
