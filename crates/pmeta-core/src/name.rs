//! # Names — Project and Extra Identifiers
//!
//! Project names and extra names share one grammar and one canonical form:
//!
//! - Grammar: ASCII letters, digits, `.`, `_`, `-`; first and last character
//!   must be a letter or digit.
//! - Canonical form: lowercase, every run of `-`, `_` and `.` collapsed into a
//!   single `-`.
//!
//! [`ProjectName`] keeps the author's spelling for display and exposes the
//! canonical form for identity. [`ExtraName`] only ever stores the canonical
//! form, so an extra declared as `Dev_Tools` and referenced in a marker as
//! `dev.tools` compare equal.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

fn name_regex() -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| {
        Regex::new(r"(?i)^([A-Z0-9]|[A-Z0-9][A-Z0-9._-]*[A-Z0-9])$")
            .unwrap_or_else(|e| unreachable!("static name pattern is valid: {e}"))
    })
}

/// Returns `true` if `name` matches the project/extra name grammar.
pub fn is_valid_name(name: &str) -> bool {
    name_regex().is_match(name)
}

/// Canonicalize a project or extra name.
///
/// Lowercases the input and collapses each run of `-`, `_` and `.` into a
/// single `-`. The function is total and idempotent:
/// `canonicalize_name(&canonicalize_name(x)) == canonicalize_name(x)`.
pub fn canonicalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                out.push('-');
                in_separator = true;
            }
        } else {
            out.extend(c.to_lowercase());
            in_separator = false;
        }
    }
    out
}

fn validate(name: &str) -> Result<(), ParseError> {
    if name.is_empty() {
        return Err(ParseError::EmptyName);
    }
    if !is_valid_name(name) {
        return Err(ParseError::InvalidName);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ProjectName
// ---------------------------------------------------------------------------

/// A validated project name.
///
/// Equality and hashing use the canonical form; `Display` and [`as_str`]
/// return the spelling supplied by the author.
///
/// [`as_str`]: ProjectName::as_str
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectName {
    raw: String,
    canonical: String,
}

impl ProjectName {
    /// Validate and wrap a project name.
    pub fn new(name: impl Into<String>) -> Result<Self, ParseError> {
        let raw = name.into();
        validate(&raw)?;
        let canonical = canonicalize_name(&raw);
        Ok(Self { raw, canonical })
    }

    /// The name as written by the author.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The canonical form used for identity comparisons.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl PartialEq for ProjectName {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for ProjectName {}

impl Hash for ProjectName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for ProjectName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ProjectName {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProjectName> for String {
    fn from(name: ProjectName) -> Self {
        name.raw
    }
}

// ---------------------------------------------------------------------------
// ExtraName
// ---------------------------------------------------------------------------

/// A validated, canonicalized extra (optional dependency group) name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExtraName(String);

impl ExtraName {
    /// Validate `name` against the name grammar and store its canonical form.
    pub fn new(name: &str) -> Result<Self, ParseError> {
        validate(name)?;
        Ok(Self(canonicalize_name(name)))
    }

    /// The canonical extra name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtraName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ExtraName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ExtraName {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ExtraName> for String {
    fn from(name: ExtraName) -> Self {
        name.0
    }
}

impl AsRef<str> for ExtraName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_collapses_separator_runs() {
        assert_eq!(canonicalize_name("Full_Metadata"), "full-metadata");
        assert_eq!(canonicalize_name("a.-_b"), "a-b");
        assert_eq!(canonicalize_name("do.t"), "do-t");
        assert_eq!(canonicalize_name("UPPER"), "upper");
    }

    #[test]
    fn test_valid_names() {
        for name in ["a", "A1", "full_metadata", "foo.bar-baz", "x_y.z"] {
            assert!(is_valid_name(name), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", ".test", "test-", "_a", "a b", "ünïcode", "a/b"] {
            assert!(!is_valid_name(name), "{name} should be invalid");
        }
        assert_eq!(ProjectName::new(""), Err(ParseError::EmptyName));
        assert_eq!(ProjectName::new(".test"), Err(ParseError::InvalidName));
    }

    #[test]
    fn test_project_name_keeps_spelling_but_compares_canonically() {
        let a = ProjectName::new("Full_Metadata").unwrap();
        let b = ProjectName::new("full-metadata").unwrap();
        assert_eq!(a.as_str(), "Full_Metadata");
        assert_eq!(a.canonical(), "full-metadata");
        assert_eq!(a.to_string(), "Full_Metadata");
        assert_eq!(a, b);
    }

    #[test]
    fn test_extra_name_is_canonical() {
        let extra = ExtraName::new("under_score").unwrap();
        assert_eq!(extra.as_str(), "under-score");
        assert_eq!(ExtraName::new("Dev.Tools").unwrap(), ExtraName::new("dev_tools").unwrap());
        assert!(ExtraName::new("-bad").is_err());
    }

    #[test]
    fn test_serde_uses_plain_strings() {
        let name: ProjectName = serde_json::from_str("\"My.Pkg\"").unwrap();
        assert_eq!(name.canonical(), "my-pkg");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"My.Pkg\"");
        assert!(serde_json::from_str::<ExtraName>("\"bad name\"").is_err());
    }
}
