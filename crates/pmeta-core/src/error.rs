//! # Error Types — Parse Failures for Packaging Primitives
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Messages state the violated rule, never the rejected text. Inputs come
//!   from untrusted configuration files and may be arbitrarily large.
//! - Grammar errors in requirements and markers carry the byte offset at which
//!   parsing stopped so callers can point at the problem without quoting it.

use thiserror::Error;

/// Error produced when parsing a packaging primitive fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A project or extra name was empty.
    #[error("name must not be empty")]
    EmptyName,

    /// A project or extra name did not match the name grammar.
    #[error(
        "a valid name consists only of ASCII letters and numbers, period, underscore and \
         hyphen, and must start and end with a letter or number"
    )]
    InvalidName,

    /// A version string did not match the PEP 440 grammar.
    #[error("not a valid PEP 440 version")]
    InvalidVersion,

    /// A version component does not fit into 64 bits.
    #[error("version component is too large")]
    VersionComponentOverflow,

    /// A version specifier clause was malformed.
    #[error("invalid version specifier: {0}")]
    InvalidSpecifier(&'static str),

    /// A dependency specifier did not match the PEP 508 grammar.
    #[error("invalid requirement at position {position}: {reason}")]
    InvalidRequirement {
        /// Byte offset at which parsing stopped.
        position: usize,
        /// What the parser expected.
        reason: &'static str,
    },

    /// An environment marker did not match the PEP 508 marker grammar.
    #[error("invalid marker at position {position}: {reason}")]
    InvalidMarker {
        /// Byte offset at which parsing stopped.
        position: usize,
        /// What the parser expected.
        reason: &'static str,
    },
}

impl ParseError {
    /// Shift the byte offset of a positional error by `offset`.
    ///
    /// Used when a sub-grammar (a marker inside a requirement) was parsed from
    /// a slice of the original input.
    pub(crate) fn shifted(self, offset: usize) -> Self {
        match self {
            Self::InvalidRequirement { position, reason } => Self::InvalidRequirement {
                position: position + offset,
                reason,
            },
            Self::InvalidMarker { position, reason } => Self::InvalidMarker {
                position: position + offset,
                reason,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_do_not_contain_input() {
        let err = ParseError::InvalidMarker {
            position: 7,
            reason: "expected a quoted string or marker variable",
        };
        assert_eq!(
            err.to_string(),
            "invalid marker at position 7: expected a quoted string or marker variable"
        );
    }

    #[test]
    fn test_shifted_moves_positional_errors_only() {
        let err = ParseError::InvalidMarker {
            position: 2,
            reason: "x",
        };
        assert_eq!(
            err.shifted(10),
            ParseError::InvalidMarker {
                position: 12,
                reason: "x"
            }
        );
        assert_eq!(ParseError::InvalidName.shifted(10), ParseError::InvalidName);
    }
}
