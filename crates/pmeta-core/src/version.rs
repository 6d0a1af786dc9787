//! # Versions — PEP 440 Parsing and Normalization
//!
//! Parses the permissive PEP 440 grammar (alternate spellings, separators,
//! implicit numbers, a leading `v`) and renders the normal form:
//!
//! | Input            | Normal form     |
//! |------------------|-----------------|
//! | `v1.0`           | `1.0`           |
//! | `1.0.0-alpha1`   | `1.0.0a1`       |
//! | `1.0RC1`         | `1.0rc1`        |
//! | `1.0-1`          | `1.0.post1`     |
//! | `1.0.dev`        | `1.0.dev0`      |
//! | `1.0+ABC.def_1`  | `1.0+abc.def.1` |
//!
//! Equality is structural on the parsed components, which means `1.0` and
//! `1.0.0` are distinct values. Ordering is not needed by the metadata
//! pipeline and is not implemented.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

const VERSION_PATTERN: &str = r"(?xi)
    ^\s*
    v?
    (?:
        (?:(?P<epoch>[0-9]+)!)?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?:
            [-_.]?
            (?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)
            [-_.]?
            (?P<pre_n>[0-9]+)?
        )?
        (?:
            (?:-(?P<post_n1>[0-9]+))
            |
            (?:
                [-_.]?
                (?P<post_l>post|rev|r)
                [-_.]?
                (?P<post_n2>[0-9]+)?
            )
        )?
        (?:
            [-_.]?
            (?P<dev_l>dev)
            [-_.]?
            (?P<dev_n>[0-9]+)?
        )?
    )
    (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
    \s*$
";

fn version_regex() -> &'static Regex {
    static VERSION: OnceLock<Regex> = OnceLock::new();
    VERSION.get_or_init(|| {
        Regex::new(VERSION_PATTERN)
            .unwrap_or_else(|e| unreachable!("static version pattern is valid: {e}"))
    })
}

/// Pre-release phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreReleaseKind {
    /// `a` (also spelled `alpha`).
    Alpha,
    /// `b` (also spelled `beta`).
    Beta,
    /// `rc` (also spelled `c`, `pre`, `preview`).
    ReleaseCandidate,
}

impl PreReleaseKind {
    /// Normalized spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alpha => "a",
            Self::Beta => "b",
            Self::ReleaseCandidate => "rc",
        }
    }

    fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "a" | "alpha" => Self::Alpha,
            "b" | "beta" => Self::Beta,
            _ => Self::ReleaseCandidate,
        }
    }
}

impl fmt::Display for PreReleaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pre-release segment such as `rc1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreRelease {
    pub kind: PreReleaseKind,
    pub number: u64,
}

/// A parsed PEP 440 version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<PreRelease>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Option<String>,
}

fn number(caps: &Captures<'_>, group: &str) -> Result<Option<u64>, ParseError> {
    caps.name(group)
        .map(|m| {
            m.as_str()
                .parse::<u64>()
                .map_err(|_| ParseError::VersionComponentOverflow)
        })
        .transpose()
}

impl Version {
    /// Parse a PEP 440 version string.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let caps = version_regex()
            .captures(input)
            .ok_or(ParseError::InvalidVersion)?;

        let epoch = number(&caps, "epoch")?.unwrap_or(0);
        let release = caps
            .name("release")
            .map(|m| m.as_str())
            .unwrap_or_default()
            .split('.')
            .map(|part| {
                part.parse::<u64>()
                    .map_err(|_| ParseError::VersionComponentOverflow)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let pre = match caps.name("pre_l") {
            Some(label) => Some(PreRelease {
                kind: PreReleaseKind::from_label(label.as_str()),
                number: number(&caps, "pre_n")?.unwrap_or(0),
            }),
            None => None,
        };

        let post = if caps.name("post_n1").is_some() {
            number(&caps, "post_n1")?
        } else if caps.name("post_l").is_some() {
            Some(number(&caps, "post_n2")?.unwrap_or(0))
        } else {
            None
        };

        let dev = if caps.name("dev_l").is_some() {
            Some(number(&caps, "dev_n")?.unwrap_or(0))
        } else {
            None
        };

        let local = caps.name("local").map(|m| {
            m.as_str()
                .to_ascii_lowercase()
                .split(['-', '_', '.'])
                .collect::<Vec<_>>()
                .join(".")
        });

        Ok(Self {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn release(&self) -> &[u64] {
        &self.release
    }

    pub fn pre(&self) -> Option<PreRelease> {
        self.pre
    }

    pub fn post(&self) -> Option<u64> {
        self.post
    }

    pub fn dev(&self) -> Option<u64> {
        self.dev
    }

    /// Normalized local segment, without the leading `+`.
    pub fn local(&self) -> Option<&str> {
        self.local.as_deref()
    }

    /// Returns `true` for pre-releases and development releases.
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        for (i, part) in self.release.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
        }
        if let Some(pre) = self.pre {
            write!(f, "{}{}", pre.kind, pre.number)?;
        }
        if let Some(post) = self.post {
            write!(f, ".post{post}")?;
        }
        if let Some(dev) = self.dev {
            write!(f, ".dev{dev}")?;
        }
        if let Some(local) = &self.local {
            write!(f, "+{local}")?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal(input: &str) -> String {
        Version::parse(input).unwrap().to_string()
    }

    #[test]
    fn test_normalizes_alternate_spellings() {
        assert_eq!(normal("1.0.0-alpha1"), "1.0.0a1");
        assert_eq!(normal("1.0-1"), "1.0.post1");
        assert_eq!(normal("v1.0"), "1.0");
        assert_eq!(normal("1.0+ABC.def_1"), "1.0+abc.def.1");
        assert_eq!(normal("1.0RC1"), "1.0rc1");
        assert_eq!(normal("1.0.dev"), "1.0.dev0");
        assert_eq!(normal("1.0c2"), "1.0rc2");
        assert_eq!(normal("1.0-preview.3"), "1.0rc3");
        assert_eq!(normal("1.0.0.beta"), "1.0.0b0");
        assert_eq!(normal("2.0-rev4"), "2.0.post4");
        assert_eq!(normal("  1.2.3  "), "1.2.3");
    }

    #[test]
    fn test_keeps_epoch_and_full_form() {
        assert_eq!(normal("1!2.0a1.post2.dev3+local.7"), "1!2.0a1.post2.dev3+local.7");
        assert_eq!(normal("0!1.0"), "1.0");
    }

    #[test]
    fn test_rejects_invalid_versions() {
        for input in ["", "0.1.0-extra", "not-a-version", "1.0+", "1..0", "1.0 beta"] {
            assert_eq!(
                Version::parse(input),
                Err(ParseError::InvalidVersion),
                "{input:?}"
            );
        }
    }

    #[test]
    fn test_overflowing_component_is_reported() {
        assert_eq!(
            Version::parse("1.99999999999999999999999"),
            Err(ParseError::VersionComponentOverflow)
        );
    }

    #[test]
    fn test_accessors_expose_components() {
        let v = Version::parse("3!1.2rc4.post5.dev6").unwrap();
        assert_eq!(v.epoch(), 3);
        assert_eq!(v.release(), &[1, 2]);
        assert_eq!(
            v.pre(),
            Some(PreRelease {
                kind: PreReleaseKind::ReleaseCandidate,
                number: 4
            })
        );
        assert_eq!(v.post(), Some(5));
        assert_eq!(v.dev(), Some(6));
        assert!(v.is_prerelease());
        assert!(!Version::parse("1.0.post1").unwrap().is_prerelease());
    }

    #[test]
    fn test_serde_round_trips_normal_form() {
        let v: Version = serde_json::from_str("\"1.0-1\"").unwrap();
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"1.0.post1\"");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The normal form parses back to the same version.
        #[test]
        fn normal_form_is_stable(
            release in proptest::collection::vec(0u64..10_000, 1..5),
            pre in proptest::option::of((0usize..3, 0u64..100)),
            post in proptest::option::of(0u64..100),
            dev in proptest::option::of(0u64..100),
        ) {
            let mut text = release.iter().map(u64::to_string).collect::<Vec<_>>().join(".");
            if let Some((kind, n)) = pre {
                text.push_str(["alpha", "b", "c"][kind]);
                text.push_str(&n.to_string());
            }
            if let Some(n) = post {
                text.push_str(&format!("-post{n}"));
            }
            if let Some(n) = dev {
                text.push_str(&format!("_dev{n}"));
            }
            let parsed = Version::parse(&text).unwrap();
            let normal = parsed.to_string();
            prop_assert_eq!(Version::parse(&normal).unwrap(), parsed);
            prop_assert_eq!(Version::parse(&normal).unwrap().to_string(), normal);
        }
    }
}
