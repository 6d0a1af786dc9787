//! # Requirements (PEP 508 Dependency Specifiers)
//!
//! `name [extras] (specifiers | @ url) ; marker`
//!
//! Parsed requirements render canonically: extras sorted and comma-joined,
//! specifiers sorted without spaces, markers in the form produced by
//! [`MarkerTree`]. A marker that follows a URL is separated by ` ; ` because a
//! bare `;` would be read as part of the URL.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::error::ParseError;
use crate::marker::{MarkerExpression, MarkerTree};
use crate::name::{is_valid_name, ExtraName, ProjectName};
use crate::specifier::SpecifierSet;

/// The version constraint of a requirement: specifiers or a direct URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionOrUrl {
    Specifiers(SpecifierSet),
    Url(String),
}

/// A parsed dependency specifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Requirement {
    name: ProjectName,
    extras: Vec<String>,
    version_or_url: Option<VersionOrUrl>,
    marker: Option<MarkerTree>,
}

fn requirement_error(cursor: &Cursor<'_>, reason: &'static str) -> ParseError {
    ParseError::InvalidRequirement {
        position: cursor.pos(),
        reason,
    }
}

impl Requirement {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut cursor = Cursor::new(input);
        cursor.eat_whitespace();

        let start = cursor.pos();
        let name_text =
            cursor.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !is_valid_name(name_text) {
            return Err(ParseError::InvalidRequirement {
                position: start,
                reason: "expected a valid package name",
            });
        }
        let name = ProjectName::new(name_text)?;
        cursor.eat_whitespace();

        let extras = if cursor.eat("[") {
            parse_extras(&mut cursor)?
        } else {
            Vec::new()
        };
        cursor.eat_whitespace();

        let version_or_url = if cursor.eat("@") {
            cursor.eat_whitespace();
            let url = cursor.take_while(|c| !c.is_whitespace());
            if url.is_empty() || !url.contains(':') {
                return Err(requirement_error(&cursor, "expected a URL after '@'"));
            }
            let before = cursor.pos();
            cursor.eat_whitespace();
            if !cursor.is_eof() && cursor.pos() == before {
                return Err(requirement_error(&cursor, "expected whitespace after URL"));
            }
            Some(VersionOrUrl::Url(url.to_string()))
        } else {
            let parenthesized = cursor.eat("(");
            let text = if parenthesized {
                let text = cursor.take_while(|c| c != ')');
                if !cursor.eat(")") {
                    return Err(requirement_error(&cursor, "expected a closing parenthesis"));
                }
                text
            } else {
                cursor.take_while(|c| c != ';')
            };
            let set = SpecifierSet::parse(text)?;
            if set.is_empty() {
                None
            } else {
                Some(VersionOrUrl::Specifiers(set))
            }
        };
        cursor.eat_whitespace();

        let marker = if cursor.eat(";") {
            let offset = cursor.pos();
            Some(MarkerTree::parse(cursor.rest()).map_err(|e| e.shifted(offset))?)
        } else if cursor.is_eof() {
            None
        } else {
            return Err(requirement_error(&cursor, "expected ';' or end of input"));
        };

        Ok(Self {
            name,
            extras,
            version_or_url,
            marker,
        })
    }

    pub fn name(&self) -> &ProjectName {
        &self.name
    }

    pub fn canonical_name(&self) -> &str {
        self.name.canonical()
    }

    /// Requested extras, sorted, in the author's spelling.
    pub fn extras(&self) -> &[String] {
        &self.extras
    }

    pub fn version_or_url(&self) -> Option<&VersionOrUrl> {
        self.version_or_url.as_ref()
    }

    pub fn marker(&self) -> Option<&MarkerTree> {
        self.marker.as_ref()
    }

    /// Canonical names of extras referenced by the marker.
    pub fn referenced_extras(&self) -> Vec<String> {
        self.marker
            .as_ref()
            .map(MarkerTree::referenced_extras)
            .unwrap_or_default()
    }

    /// Return a copy whose marker additionally requires `extra` to be active.
    pub fn with_extra_marker(&self, extra: &ExtraName) -> Self {
        let marker = match self.marker.clone() {
            Some(marker) => marker.and_extra(extra),
            None => MarkerTree::Expression(MarkerExpression::extra_equals(extra)),
        };
        Self {
            marker: Some(marker),
            ..self.clone()
        }
    }
}

fn parse_extras(cursor: &mut Cursor<'_>) -> Result<Vec<String>, ParseError> {
    let mut extras = Vec::new();
    loop {
        cursor.eat_whitespace();
        if cursor.eat("]") {
            break;
        }
        if !extras.is_empty() {
            if !cursor.eat(",") {
                return Err(requirement_error(cursor, "expected ',' or ']' in extras"));
            }
            cursor.eat_whitespace();
        }
        let extra =
            cursor.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !is_valid_name(extra) {
            return Err(requirement_error(cursor, "expected a valid extra name"));
        }
        extras.push(extra.to_string());
    }
    extras.sort();
    extras.dedup();
    Ok(extras)
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        match &self.version_or_url {
            Some(VersionOrUrl::Specifiers(set)) => write!(f, "{set}")?,
            Some(VersionOrUrl::Url(url)) => {
                write!(f, " @ {url}")?;
                if let Some(marker) = &self.marker {
                    return write!(f, " ; {marker}");
                }
            }
            None => {}
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {marker}")?;
        }
        Ok(())
    }
}

impl FromStr for Requirement {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Requirement {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Requirement> for String {
    fn from(requirement: Requirement) -> Self {
        requirement.to_string()
    }
}
