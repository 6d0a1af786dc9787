//! # Version Specifiers
//!
//! A [`Specifier`] is one `<operator><version>` clause; a [`SpecifierSet`] is
//! a comma-joined conjunction of clauses; [`RequiresPython`] is the
//! `requires-python` form, which additionally allows `or`-joined
//! alternatives (each alternative being a specifier set).
//!
//! ## Clause rules
//!
//! - `===` takes an arbitrary non-empty string without whitespace.
//! - `==` and `!=` accept a full version (including a local segment) or a
//!   release prefix followed by `.*`.
//! - `~=` needs at least two release segments and no local segment.
//! - `<`, `<=`, `>`, `>=` reject wildcards and local segments.
//!
//! The version text is kept as written (trimmed) so the rendered requirement
//! matches what the author declared. Sets are rendered sorted and without
//! spaces, e.g. `<2,>=1.0`.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::version::Version;

/// Comparison operator of a version specifier clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Compatible,
    Equal,
    NotEqual,
    LessThanEqual,
    GreaterThanEqual,
    LessThan,
    GreaterThan,
    ArbitraryEqual,
}

impl Operator {
    /// Operators ordered so that a longest-prefix match is found first.
    const BY_LENGTH: [Operator; 8] = [
        Self::ArbitraryEqual,
        Self::Compatible,
        Self::Equal,
        Self::NotEqual,
        Self::LessThanEqual,
        Self::GreaterThanEqual,
        Self::LessThan,
        Self::GreaterThan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compatible => "~=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessThanEqual => "<=",
            Self::GreaterThanEqual => ">=",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::ArbitraryEqual => "===",
        }
    }

    /// Split a leading operator off `input`.
    fn split_prefix(input: &str) -> Option<(Self, &str)> {
        Self::BY_LENGTH
            .iter()
            .find(|op| input.starts_with(op.as_str()))
            .map(|op| (*op, &input[op.as_str().len()..]))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn wildcard_prefix_regex() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| {
        Regex::new(r"^([0-9]+!)?[0-9]+(\.[0-9]+)*\.\*$")
            .unwrap_or_else(|e| unreachable!("static wildcard pattern is valid: {e}"))
    })
}

// ---------------------------------------------------------------------------
// Specifier
// ---------------------------------------------------------------------------

/// A single version specifier clause, e.g. `>=1.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Specifier {
    operator: Operator,
    version: String,
}

impl Specifier {
    /// Parse a single clause. Whitespace around the operator and version is
    /// allowed and dropped.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let trimmed = input.trim();
        let (operator, rest) = Operator::split_prefix(trimmed)
            .ok_or(ParseError::InvalidSpecifier("expected a comparison operator"))?;
        let version = rest.trim();
        if version.is_empty() {
            return Err(ParseError::InvalidSpecifier("expected a version after the operator"));
        }

        match operator {
            Operator::ArbitraryEqual => {
                if version.chars().any(char::is_whitespace) {
                    return Err(ParseError::InvalidSpecifier(
                        "arbitrary equality takes a single token",
                    ));
                }
            }
            Operator::Equal | Operator::NotEqual => {
                if version.ends_with(".*") {
                    if !wildcard_prefix_regex().is_match(version) {
                        return Err(ParseError::InvalidSpecifier(
                            "a wildcard must follow a release number",
                        ));
                    }
                } else {
                    Version::parse(version)?;
                }
            }
            Operator::Compatible => {
                let parsed = parse_plain(version)?;
                if parsed.release().len() < 2 {
                    return Err(ParseError::InvalidSpecifier(
                        "compatible release needs at least two release segments",
                    ));
                }
            }
            Operator::LessThanEqual
            | Operator::GreaterThanEqual
            | Operator::LessThan
            | Operator::GreaterThan => {
                parse_plain(version)?;
            }
        }

        Ok(Self {
            operator,
            version: version.to_string(),
        })
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The version text as written.
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Parse a version that may carry neither a wildcard nor a local segment.
fn parse_plain(version: &str) -> Result<Version, ParseError> {
    if version.ends_with(".*") {
        return Err(ParseError::InvalidSpecifier(
            "wildcards are only allowed with == and !=",
        ));
    }
    let parsed = Version::parse(version)?;
    if parsed.local().is_some() {
        return Err(ParseError::InvalidSpecifier(
            "local versions are only allowed with == and !=",
        ));
    }
    Ok(parsed)
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.version)
    }
}

impl FromStr for Specifier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// SpecifierSet
// ---------------------------------------------------------------------------

/// A comma-joined conjunction of specifier clauses.
///
/// An empty string parses to the empty set. Clauses are stored sorted by
/// their rendered form and de-duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpecifierSet {
    specifiers: Vec<Specifier>,
}

impl SpecifierSet {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut specifiers = input
            .split(',')
            .map(|clause| {
                if clause.trim().is_empty() {
                    Err(ParseError::InvalidSpecifier("empty clause in specifier list"))
                } else {
                    Specifier::parse(clause)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        specifiers.sort_by_cached_key(Specifier::to_string);
        specifiers.dedup();
        Ok(Self { specifiers })
    }

    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.specifiers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specifier> {
        self.specifiers.iter()
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, spec) in self.specifiers.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{spec}")?;
        }
        Ok(())
    }
}

impl FromStr for SpecifierSet {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SpecifierSet {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SpecifierSet> for String {
    fn from(set: SpecifierSet) -> Self {
        set.to_string()
    }
}

// ---------------------------------------------------------------------------
// RequiresPython
// ---------------------------------------------------------------------------

fn or_separator_regex() -> &'static Regex {
    static OR: OnceLock<Regex> = OnceLock::new();
    OR.get_or_init(|| {
        Regex::new(r"\s+or\s+")
            .unwrap_or_else(|e| unreachable!("static separator pattern is valid: {e}"))
    })
}

/// The `requires-python` constraint: one or more specifier sets joined by
/// `or`.
///
/// A single alternative is an ordinary specifier set. More than one
/// alternative is a disjunction, which only metadata 2.3 and later can carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequiresPython {
    alternatives: Vec<SpecifierSet>,
}

impl RequiresPython {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let alternatives = or_separator_regex()
            .split(input.trim())
            .map(|part| {
                let set = SpecifierSet::parse(part)?;
                if set.is_empty() {
                    Err(ParseError::InvalidSpecifier("empty alternative in requires-python"))
                } else {
                    Ok(set)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { alternatives })
    }

    /// Returns `true` if more than one `or`-joined alternative is present.
    pub fn is_disjunction(&self) -> bool {
        self.alternatives.len() > 1
    }

    pub fn alternatives(&self) -> &[SpecifierSet] {
        &self.alternatives
    }
}

impl fmt::Display for RequiresPython {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, set) in self.alternatives.iter().enumerate() {
            if i > 0 {
                f.write_str(" or ")?;
            }
            write!(f, "{set}")?;
        }
        Ok(())
    }
}

impl FromStr for RequiresPython {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RequiresPython {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RequiresPython> for String {
    fn from(value: RequiresPython) -> Self {
        value.to_string()
    }
}
