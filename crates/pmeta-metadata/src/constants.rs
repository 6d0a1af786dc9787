//! Known field tables and the pyproject-level helpers built on them.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::field::ProjectField;

/// Core-metadata field names, lowercase.
pub const KNOWN_METADATA_FIELDS: &[&str] = &[
    "author",
    "author-email",
    "classifier",
    "description",
    "description-content-type",
    "download-url",
    "dynamic",
    "home-page",
    "import-name",
    "import-namespace",
    "keywords",
    "license",
    "license-expression",
    "license-file",
    "maintainer",
    "maintainer-email",
    "metadata-version",
    "name",
    "obsoletes",
    "obsoletes-dist",
    "platform",
    "project-url",
    "provides",
    "provides-dist",
    "provides-extra",
    "requires",
    "requires-dist",
    "requires-external",
    "requires-python",
    "summary",
    "supported-platform",
    "version",
];

/// Core-metadata fields that can never be listed in `Dynamic`.
pub const NON_DYNAMIC_METADATA_FIELDS: &[&str] = &["name", "version", "metadata-version", "dynamic"];

pub const KNOWN_TOPLEVEL_FIELDS: &[&str] = &["build-system", "project", "tool", "dependency-groups"];

pub const KNOWN_BUILD_SYSTEM_FIELDS: &[&str] = &["backend-path", "build-backend", "requires"];

/// Returns `true` if `name` is a core-metadata field (case-insensitive).
pub fn is_known_metadata_field(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    KNOWN_METADATA_FIELDS.contains(&lower.as_str())
}

/// Core-metadata headers populated from a project field.
pub fn field_to_metadata(field: ProjectField) -> &'static [&'static str] {
    match field {
        ProjectField::Name => &["Name"],
        ProjectField::Version => &["Version"],
        ProjectField::Description => &["Summary"],
        ProjectField::Readme => &["Description", "Description-Content-Type"],
        ProjectField::RequiresPython => &["Requires-Python"],
        ProjectField::License => &["License", "License-Expression"],
        ProjectField::LicenseFiles => &["License-File"],
        ProjectField::Authors => &["Author", "Author-Email"],
        ProjectField::Maintainers => &["Maintainer", "Maintainer-Email"],
        ProjectField::Keywords => &["Keywords"],
        ProjectField::Classifiers => &["Classifier"],
        ProjectField::Urls => &["Project-URL"],
        ProjectField::Dependencies => &["Requires-Dist"],
        ProjectField::OptionalDependencies => &["Provides-Extra", "Requires-Dist"],
        ProjectField::ImportNames => &["Import-Name"],
        ProjectField::ImportNamespaces => &["Import-Namespace"],
        ProjectField::Scripts
        | ProjectField::GuiScripts
        | ProjectField::EntryPoints
        | ProjectField::Dynamic => &[],
    }
}

fn unknown_keys(table: Option<&Value>, known: &[&str]) -> BTreeSet<String> {
    table
        .and_then(Value::as_object)
        .map(|map| {
            map.keys()
                .filter(|k| !known.contains(&k.as_str()))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// Top-level pyproject keys outside the standardized set.
pub fn extras_top_level(pyproject: &Value) -> BTreeSet<String> {
    unknown_keys(Some(pyproject), KNOWN_TOPLEVEL_FIELDS)
}

/// `[build-system]` keys outside the standardized set.
pub fn extras_build_system(pyproject: &Value) -> BTreeSet<String> {
    unknown_keys(pyproject.get("build-system"), KNOWN_BUILD_SYSTEM_FIELDS)
}
