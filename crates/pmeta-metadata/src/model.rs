//! Value types held by [`StandardMetadata`](crate::record::StandardMetadata).

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

/// Long description of the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readme {
    text: String,
    file: Option<PathBuf>,
    content_type: String,
}

impl Readme {
    pub fn new(text: impl Into<String>, file: Option<PathBuf>, content_type: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            file,
            content_type: content_type.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The file the text was read from; `None` for inline text.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

/// Legacy license: free text, optionally read from a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct License {
    text: String,
    file: Option<PathBuf>,
}

impl License {
    pub fn new(text: impl Into<String>, file: Option<PathBuf>) -> Self {
        Self {
            text: text.into(),
            file,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

/// The `license` field: an SPDX expression or a legacy license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseField {
    /// Caller-validated SPDX license expression.
    Expression(String),
    Legacy(License),
}

impl LicenseField {
    pub fn is_expression(&self) -> bool {
        matches!(self, Self::Expression(_))
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }
}

/// An author or maintainer. At least one of the two parts is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub name: Option<String>,
    pub email: Option<String>,
}

fn import_name_regex() -> &'static Regex {
    static IMPORT_NAME: OnceLock<Regex> = OnceLock::new();
    IMPORT_NAME.get_or_init(|| {
        Regex::new(r"^[^\W\d]\w*(\.[^\W\d]\w*)*$")
            .unwrap_or_else(|e| unreachable!("static import name pattern is valid: {e}"))
    })
}

/// An entry of `import-names` or `import-namespaces`: a dotted module path,
/// optionally marked `; private`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportName {
    name: String,
    private: bool,
}

impl ImportName {
    /// Parse an entry. The error describes the violated rule.
    pub fn parse(text: &str) -> Result<Self, &'static str> {
        let (name, private) = match text.split_once(';') {
            Some((name, rest)) => {
                if rest.trim() != "private" {
                    return Err("only \"private\" may follow the \";\"");
                }
                (name.trim(), true)
            }
            None => (text.trim(), false),
        };
        if !import_name_regex().is_match(name) {
            return Err("expected a dotted Python identifier");
        }
        Ok(Self {
            name: name.to_string(),
            private,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_private(&self) -> bool {
        self.private
    }
}

impl fmt::Display for ImportName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.private {
            write!(f, "{}; private", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_names() {
        let plain = ImportName::parse("pkg.sub").unwrap();
        assert_eq!(plain.name(), "pkg.sub");
        assert!(!plain.is_private());
        assert_eq!(plain.to_string(), "pkg.sub");

        let private = ImportName::parse(" _internal ;  private ").unwrap();
        assert!(private.is_private());
        assert_eq!(private.to_string(), "_internal; private");

        assert!(ImportName::parse("1pkg").is_err());
        assert!(ImportName::parse("pkg.").is_err());
        assert!(ImportName::parse("pkg-name").is_err());
        assert!(ImportName::parse("pkg; public").is_err());
        assert!(ImportName::parse("").is_err());
    }

    #[test]
    fn test_license_variants() {
        let expr = LicenseField::Expression("MIT".into());
        assert!(expr.is_expression());
        let legacy = LicenseField::Legacy(License::new("text", Some(PathBuf::from("LICENSE"))));
        assert!(legacy.is_legacy());
        if let LicenseField::Legacy(license) = legacy {
            assert_eq!(license.file(), Some(Path::new("LICENSE")));
        }
    }
}
