//! # Field Descriptors
//!
//! The closed set of recognized `[project]` keys, each paired with the
//! [`FieldShape`] the extractor checks it against. The declaration order of
//! [`ProjectField::ALL`] is the order errors are reported in.

use std::fmt;

use serde_json::Value;

/// A recognized key of the `[project]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProjectField {
    Name,
    Version,
    Description,
    Readme,
    RequiresPython,
    License,
    LicenseFiles,
    Authors,
    Maintainers,
    Keywords,
    Classifiers,
    Urls,
    Scripts,
    GuiScripts,
    EntryPoints,
    Dependencies,
    OptionalDependencies,
    Dynamic,
    ImportNames,
    ImportNamespaces,
}

impl ProjectField {
    /// All fields, in reporting order.
    pub const ALL: [ProjectField; 20] = [
        Self::Name,
        Self::Version,
        Self::Description,
        Self::Readme,
        Self::RequiresPython,
        Self::License,
        Self::LicenseFiles,
        Self::Authors,
        Self::Maintainers,
        Self::Keywords,
        Self::Classifiers,
        Self::Urls,
        Self::Scripts,
        Self::GuiScripts,
        Self::EntryPoints,
        Self::Dependencies,
        Self::OptionalDependencies,
        Self::Dynamic,
        Self::ImportNames,
        Self::ImportNamespaces,
    ];

    /// The key as spelled in the `[project]` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Version => "version",
            Self::Description => "description",
            Self::Readme => "readme",
            Self::RequiresPython => "requires-python",
            Self::License => "license",
            Self::LicenseFiles => "license-files",
            Self::Authors => "authors",
            Self::Maintainers => "maintainers",
            Self::Keywords => "keywords",
            Self::Classifiers => "classifiers",
            Self::Urls => "urls",
            Self::Scripts => "scripts",
            Self::GuiScripts => "gui-scripts",
            Self::EntryPoints => "entry-points",
            Self::Dependencies => "dependencies",
            Self::OptionalDependencies => "optional-dependencies",
            Self::Dynamic => "dynamic",
            Self::ImportNames => "import-names",
            Self::ImportNamespaces => "import-namespaces",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == key)
    }

    /// Dotted path used in error messages, e.g. `project.requires-python`.
    pub fn path(&self) -> String {
        format!("project.{}", self.as_str())
    }

    /// Position in reporting order.
    pub fn rank(&self) -> usize {
        *self as usize
    }

    pub fn shape(&self) -> FieldShape {
        match self {
            Self::Name | Self::Version | Self::Description | Self::RequiresPython => {
                FieldShape::String
            }
            Self::Readme | Self::License => FieldShape::StringOrTable,
            Self::LicenseFiles
            | Self::Keywords
            | Self::Classifiers
            | Self::Dependencies
            | Self::Dynamic
            | Self::ImportNames
            | Self::ImportNamespaces => FieldShape::StringList,
            Self::Authors | Self::Maintainers => FieldShape::ContactList,
            Self::Urls | Self::Scripts | Self::GuiScripts => FieldShape::StringTable,
            Self::EntryPoints => FieldShape::TableOfTables,
            Self::OptionalDependencies => FieldShape::TableOfStringLists,
        }
    }
}

impl fmt::Display for ProjectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected shape of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    String,
    StringList,
    StringTable,
    ContactList,
    StringOrTable,
    TableOfTables,
    TableOfStringLists,
}

impl FieldShape {
    /// Human-readable description used after "expecting".
    pub fn describe(&self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::StringList => "a list of strings",
            Self::StringTable => "a table of strings",
            Self::ContactList => "a list of tables containing \"name\" and/or \"email\" keys",
            Self::StringOrTable => "a string or a table",
            Self::TableOfTables => "a table of tables of strings",
            Self::TableOfStringLists => "a table of lists of strings",
        }
    }
}

/// Type category of an input value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Integer,
    Float,
    Boolean,
    Array,
    Table,
    Null,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => Self::String,
            Value::Number(n) if n.is_f64() => Self::Float,
            Value::Number(_) => Self::Integer,
            Value::Bool(_) => Self::Boolean,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Table,
            Value::Null => Self::Null,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Table => "table",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_round_trip() {
        for field in ProjectField::ALL {
            assert_eq!(ProjectField::from_key(field.as_str()), Some(field));
        }
        assert_eq!(ProjectField::from_key("not-real-key"), None);
    }

    #[test]
    fn test_rank_follows_declaration_order() {
        assert!(ProjectField::Name.rank() < ProjectField::Description.rank());
        assert!(ProjectField::Dynamic.rank() < ProjectField::ImportNames.rank());
        assert_eq!(ProjectField::ImportNamespaces.rank(), 19);
    }

    #[test]
    fn test_value_kind_of() {
        assert_eq!(ValueKind::of(&json!("x")), ValueKind::String);
        assert_eq!(ValueKind::of(&json!(1)), ValueKind::Integer);
        assert_eq!(ValueKind::of(&json!(1.5)), ValueKind::Float);
        assert_eq!(ValueKind::of(&json!(true)), ValueKind::Boolean);
        assert_eq!(ValueKind::of(&json!([])), ValueKind::Array);
        assert_eq!(ValueKind::of(&json!({})), ValueKind::Table);
        assert_eq!(ValueKind::of(&Value::Null), ValueKind::Null);
    }
}
