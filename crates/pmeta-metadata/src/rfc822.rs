//! # RFC822-style Core Metadata Messages
//!
//! An ordered list of `Name: value` headers, a blank line, and an optional
//! body.
//!
//! ## Folding
//!
//! A value containing line breaks is folded: its first line stays on the
//! header line and every further line is indented by `len(Name) + 2` spaces,
//! so continuation text lines up under the value. A blank line inside a
//! value is written as ` |` (one space and a bar) so it cannot be mistaken
//! for the end of the header block:
//!
//! ```text
//! Summary: first
//!          second
//!  |
//!          fourth
//! ```
//!
//! `\r\n` and bare `\r` in a value are stored as `\n` before folding.
//! [`Rfc822Message::parse`] reverses exactly this transformation.

use std::fmt;

use crate::constants::is_known_metadata_field;
use crate::error::ConfigurationError;

const BLANK_LINE_PLACEHOLDER: &str = " |";

/// A core-metadata message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rfc822Message {
    headers: Vec<(String, String)>,
    body: Option<String>,
}

fn unify_line_breaks(value: &str) -> String {
    value.replace("\r\n", "\n").replace('\r', "\n")
}

fn check_name(name: &str) -> Result<(), ConfigurationError> {
    if is_known_metadata_field(name) {
        Ok(())
    } else {
        Err(ConfigurationError::structural(
            name,
            format!("Unknown field \"{name}\""),
        ))
    }
}

impl Rfc822Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header. Empty values are skipped.
    pub fn insert(&mut self, name: &str, value: &str) -> Result<(), ConfigurationError> {
        check_name(name)?;
        if !value.is_empty() {
            self.headers.push((name.to_string(), unify_line_breaks(value)));
        }
        Ok(())
    }

    /// Append a header even if its value is empty.
    pub fn insert_allow_empty(&mut self, name: &str, value: &str) -> Result<(), ConfigurationError> {
        check_name(name)?;
        self.headers.push((name.to_string(), unify_line_breaks(value)));
        Ok(())
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = Some(body.into());
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// First value of `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value of `name` (case-insensitive), in order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// UTF-8 encoding of the rendered message.
    pub fn as_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Parse a rendered message, unfolding continuation lines.
    pub fn parse(text: &str) -> Result<Self, ConfigurationError> {
        let mut message = Self::new();
        let mut lines = text.split('\n');

        for (number, line) in lines.by_ref().enumerate() {
            if line.is_empty() {
                let body: Vec<&str> = lines.collect();
                let body = body.join("\n");
                if !body.is_empty() {
                    message.body = Some(body);
                }
                return Ok(message);
            }
            if line.starts_with(' ') {
                let (name, value) = message.headers.last_mut().ok_or_else(|| {
                    ConfigurationError::structural(
                        "metadata",
                        format!("Continuation line {} has no header", number + 1),
                    )
                })?;
                value.push('\n');
                if line != BLANK_LINE_PLACEHOLDER {
                    let indent = name.len() + 2;
                    let stripped = line.len() - line.trim_start_matches(' ').len();
                    value.push_str(&line[stripped.min(indent)..]);
                }
                continue;
            }
            let (name, value) = line.split_once(':').ok_or_else(|| {
                ConfigurationError::structural(
                    "metadata",
                    format!("Line {} is not a header", number + 1),
                )
            })?;
            check_name(name)?;
            let value = value.strip_prefix(' ').unwrap_or(value);
            message.headers.push((name.to_string(), value.to_string()));
        }
        Ok(message)
    }
}

impl fmt::Display for Rfc822Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.headers {
            if value.is_empty() {
                writeln!(f, "{name}:")?;
                continue;
            }
            let indent = " ".repeat(name.len() + 2);
            for (i, line) in value.split('\n').enumerate() {
                if i == 0 {
                    write!(f, "{name}: {line}")?;
                } else if line.is_empty() {
                    write!(f, "\n{BLANK_LINE_PLACEHOLDER}")?;
                } else {
                    write!(f, "\n{indent}{line}")?;
                }
            }
            writeln!(f)?;
        }
        writeln!(f)?;
        if let Some(body) = &self.body {
            f.write_str(body)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_headers_then_blank_line() {
        let mut message = Rfc822Message::new();
        message.insert("Metadata-Version", "2.1").unwrap();
        message.insert("Name", "example").unwrap();
        message.insert("Summary", "").unwrap();
        assert_eq!(message.to_string(), "Metadata-Version: 2.1\nName: example\n\n");
    }

    #[test]
    fn test_rejects_unknown_header() {
        let mut message = Rfc822Message::new();
        let err = message.insert("Not-Real", "x").unwrap_err();
        assert_eq!(err.to_string(), "Unknown field \"Not-Real\"");
        assert!(message.insert("requires-dist", "x").is_ok());
    }

    #[test]
    fn test_folding_and_placeholder() {
        let mut message = Rfc822Message::new();
        message.insert("Summary", "first\nsecond\n\nfourth").unwrap();
        assert_eq!(
            message.to_string(),
            "Summary: first\n         second\n |\n         fourth\n\n"
        );
    }

    #[test]
    fn test_carriage_returns_are_folded() {
        let mut message = Rfc822Message::new();
        message.insert("Summary", "first\rsecond\r\nthird").unwrap();
        assert_eq!(message.get("Summary"), Some("first\nsecond\nthird"));
        let rendered = message.to_string();
        assert!(!rendered.contains('\r'));
        assert_eq!(
            rendered,
            "Summary: first\n         second\n         third\n\n"
        );
        assert_eq!(Rfc822Message::parse(&rendered).unwrap(), message);
    }

    #[test]
    fn test_empty_value_allowed_when_requested() {
        let mut message = Rfc822Message::new();
        message.insert_allow_empty("Import-Name", "").unwrap();
        assert_eq!(message.to_string(), "Import-Name:\n\n");
        let parsed = Rfc822Message::parse(&message.to_string()).unwrap();
        assert_eq!(parsed.get("Import-Name"), Some(""));
    }

    #[test]
    fn test_body_after_blank_line() {
        let mut message = Rfc822Message::new();
        message.insert("Name", "x").unwrap();
        message.set_body("# Title\n\ntext\n");
        assert_eq!(message.to_string(), "Name: x\n\n# Title\n\ntext\n");
        assert_eq!(
            String::from_utf8(message.as_bytes()).unwrap(),
            message.to_string()
        );
    }

    #[test]
    fn test_parse_reverses_rendering() {
        let mut message = Rfc822Message::new();
        message.insert("Name", "x").unwrap();
        message.insert("Summary", "a\n  indented\n\nb\n").unwrap();
        message.insert("Classifier", "One").unwrap();
        message.insert("Classifier", "Two").unwrap();
        message.set_body("body\n\nmore");
        let parsed = Rfc822Message::parse(&message.to_string()).unwrap();
        assert_eq!(parsed, message);
        assert_eq!(parsed.get_all("classifier"), ["One", "Two"]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Rfc822Message::parse(" orphan\n\n").is_err());
        assert!(Rfc822Message::parse("no colon here\n\n").is_err());
        assert!(Rfc822Message::parse("Bogus: x\n\n").is_err());
    }
}
