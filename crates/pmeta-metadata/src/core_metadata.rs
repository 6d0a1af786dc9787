//! # Core Metadata
//!
//! [`CoreMetadata`] holds the core-metadata field values derived from a
//! [`StandardMetadata`] record. It is the single source for both output
//! formats:
//!
//! - [`CoreMetadata::to_rfc822`] writes headers in a fixed order (see
//!   below) with the long description as the message body.
//! - Its `Serialize` implementation produces the JSON form: snake_case keys,
//!   multi-use fields as arrays, absent and empty fields omitted.
//!
//! Header order: `Metadata-Version`, `Name`, `Version`, `Summary`,
//! `Keywords`, `Author`, `Author-Email`, `Maintainer`, `Maintainer-Email`,
//! `License`, `License-Expression`, `License-File`, `Classifier`,
//! `Project-URL`, `Requires-Dist`, `Requires-Python`, `Provides-Extra`,
//! `Import-Name`, `Import-Namespace`, `Dynamic`, `Description-Content-Type`.

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, MetadataError};
use crate::metadata_version::MetadataVersion;
use crate::model::{Contact, LicenseField};
use crate::record::StandardMetadata;
use crate::rfc822::Rfc822Message;

/// Characters that force quoting of a display name in an address.
const ADDRESS_SPECIALS: &[char] = &['(', ')', '<', '>', '@', ',', ':', ';', '.', '"', '[', ']', '\\'];

/// Core-metadata field values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreMetadata {
    pub metadata_version: MetadataVersion,
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub license_file: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classifier: Vec<String>,
    /// `label, url` pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub project_url: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_dist: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_python: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides_extra: Vec<String>,
    /// `Some(vec![])` records an explicitly empty `import-names`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_name: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub import_namespace: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dynamic: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn posix_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn format_address(name: &str, email: &str) -> String {
    if name.contains(ADDRESS_SPECIALS) {
        let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\" <{email}>")
    } else {
        format!("{name} <{email}>")
    }
}

fn joined(values: Vec<String>) -> Option<String> {
    (!values.is_empty()).then(|| values.join(", "))
}

/// `(names, addresses)`: contacts without an email contribute their name to
/// the first, every contact with an email contributes an address.
fn contact_fields(contacts: &[Contact]) -> (Option<String>, Option<String>) {
    let names = contacts
        .iter()
        .filter(|c| c.email.is_none())
        .filter_map(|c| c.name.clone())
        .collect();
    let addresses = contacts
        .iter()
        .filter_map(|c| match (&c.name, &c.email) {
            (Some(name), Some(email)) => Some(format_address(name, email)),
            (None, Some(email)) => Some(email.clone()),
            _ => None,
        })
        .collect();
    (joined(names), joined(addresses))
}

/// Line endings become `\n`, one leading newline is dropped and a trailing
/// blank line is collapsed.
pub(crate) fn normalize_description(text: &str) -> String {
    let mut text = text.replace("\r\n", "\n").replace('\r', "\n");
    if text.starts_with('\n') {
        text.remove(0);
    }
    if text.ends_with("\n\n") {
        text.pop();
    }
    text
}

impl CoreMetadata {
    /// Derive the field values of `record`, validating it first.
    pub fn from_record(record: &StandardMetadata) -> Result<Self, MetadataError> {
        record.validate()?;
        let metadata_version = record.metadata_version()?;
        let version = record.version().ok_or_else(|| {
            ConfigurationError::semantic(
                "project.version",
                "Field \"project.version\" is dynamic and must be set before writing metadata",
            )
        })?;

        let (author, author_email) = contact_fields(record.authors());
        let (maintainer, maintainer_email) = contact_fields(record.maintainers());

        let (license, license_expression) = match record.license() {
            Some(LicenseField::Expression(expression)) => (None, Some(expression.clone())),
            Some(LicenseField::Legacy(legacy)) => (Some(legacy.text().to_string()), None),
            None => (None, None),
        };
        let mut license_file: Vec<String> = record
            .license_files()
            .unwrap_or_default()
            .iter()
            .map(|p| posix_path(p))
            .collect();
        if metadata_version >= MetadataVersion::V2_4 && record.license_files().is_none() {
            if let Some(LicenseField::Legacy(legacy)) = record.license() {
                license_file.extend(legacy.file().map(posix_path));
            }
        }

        let mut requires_dist: Vec<String> =
            record.dependencies().iter().map(ToString::to_string).collect();
        for (extra, requirements) in record.optional_dependencies() {
            requires_dist.extend(
                requirements
                    .iter()
                    .map(|r| r.with_extra_marker(extra).to_string()),
            );
        }

        let readme = record.readme();
        Ok(Self {
            metadata_version,
            name: record.name().to_string(),
            version: version.to_string(),
            summary: record.description().map(str::to_string),
            keywords: record.keywords().to_vec(),
            author,
            author_email,
            maintainer,
            maintainer_email,
            license,
            license_expression,
            license_file,
            classifier: record.classifiers().to_vec(),
            project_url: record
                .urls()
                .iter()
                .map(|(label, url)| format!("{label}, {url}"))
                .collect(),
            requires_dist,
            requires_python: record.requires_python().map(ToString::to_string),
            provides_extra: record
                .optional_dependencies()
                .keys()
                .map(ToString::to_string)
                .collect(),
            import_name: record
                .import_names()
                .map(|names| names.iter().map(ToString::to_string).collect()),
            import_namespace: record
                .import_namespaces()
                .unwrap_or_default()
                .iter()
                .map(ToString::to_string)
                .collect(),
            dynamic: record.config().dynamic_metadata.clone(),
            description_content_type: readme.map(|r| r.content_type().to_string()),
            description: readme
                .map(|r| normalize_description(r.text()))
                .filter(|text| !text.is_empty()),
        })
    }

    /// Render as an RFC822-style message.
    pub fn to_rfc822(&self) -> Result<Rfc822Message, ConfigurationError> {
        let mut message = Rfc822Message::new();
        let opt = |value: &Option<String>| value.as_deref().unwrap_or_default().to_string();

        message.insert("Metadata-Version", self.metadata_version.as_str())?;
        message.insert("Name", &self.name)?;
        message.insert("Version", &self.version)?;
        message.insert("Summary", &opt(&self.summary))?;
        message.insert("Keywords", &self.keywords.join(","))?;
        message.insert("Author", &opt(&self.author))?;
        message.insert("Author-Email", &opt(&self.author_email))?;
        message.insert("Maintainer", &opt(&self.maintainer))?;
        message.insert("Maintainer-Email", &opt(&self.maintainer_email))?;
        message.insert("License", &opt(&self.license))?;
        message.insert("License-Expression", &opt(&self.license_expression))?;
        for file in &self.license_file {
            message.insert("License-File", file)?;
        }
        for classifier in &self.classifier {
            message.insert("Classifier", classifier)?;
        }
        for url in &self.project_url {
            message.insert("Project-URL", url)?;
        }
        for requirement in &self.requires_dist {
            message.insert("Requires-Dist", requirement)?;
        }
        message.insert("Requires-Python", &opt(&self.requires_python))?;
        for extra in &self.provides_extra {
            message.insert("Provides-Extra", extra)?;
        }
        match &self.import_name {
            Some(names) if names.is_empty() => message.insert_allow_empty("Import-Name", "")?,
            Some(names) => {
                for name in names {
                    message.insert("Import-Name", name)?;
                }
            }
            None => {}
        }
        for namespace in &self.import_namespace {
            message.insert("Import-Namespace", namespace)?;
        }
        for field in &self.dynamic {
            message.insert("Dynamic", field)?;
        }
        message.insert(
            "Description-Content-Type",
            &opt(&self.description_content_type),
        )?;
        if let Some(description) = &self.description {
            message.set_body(description.clone());
        }
        Ok(message)
    }

    /// Read field values back from a rendered message.
    ///
    /// `Keywords` is a single comma-separated header: a keyword containing a
    /// comma comes back as several keywords, and surrounding whitespace is
    /// trimmed.
    pub fn from_rfc822(message: &Rfc822Message) -> Result<Self, ConfigurationError> {
        let required = |name: &str| {
            message.get(name).map(str::to_string).ok_or_else(|| {
                ConfigurationError::structural(name, format!("Missing \"{name}\" header"))
            })
        };
        let optional = |name: &str| message.get(name).map(str::to_string);
        let all = |name: &str| -> Vec<String> {
            message.get_all(name).into_iter().map(str::to_string).collect()
        };

        let import_name = match message.get_all("Import-Name").as_slice() {
            [] => None,
            [""] => Some(Vec::new()),
            names => Some(names.iter().map(|n| n.to_string()).collect()),
        };

        Ok(Self {
            metadata_version: required("Metadata-Version")?.parse()?,
            name: required("Name")?,
            version: required("Version")?,
            summary: optional("Summary"),
            keywords: message
                .get("Keywords")
                .map(|k| {
                    k.split(',')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            author: optional("Author"),
            author_email: optional("Author-Email"),
            maintainer: optional("Maintainer"),
            maintainer_email: optional("Maintainer-Email"),
            license: optional("License"),
            license_expression: optional("License-Expression"),
            license_file: all("License-File"),
            classifier: all("Classifier"),
            project_url: all("Project-URL"),
            requires_dist: all("Requires-Dist"),
            requires_python: optional("Requires-Python"),
            provides_extra: all("Provides-Extra"),
            import_name,
            import_namespace: all("Import-Namespace"),
            dynamic: all("Dynamic"),
            description_content_type: optional("Description-Content-Type"),
            description: message.body().map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationConfig;
    use crate::content::MemoryContentSource;
    use serde_json::json;

    fn contact(name: Option<&str>, email: Option<&str>) -> Contact {
        Contact {
            name: name.map(str::to_string),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn test_contact_fields() {
        let contacts = [
            contact(Some("Only Name"), None),
            contact(Some("Jane Doe"), Some("jane@example.com")),
            contact(None, Some("bare@example.com")),
            contact(Some("Doe, John"), Some("john@example.com")),
        ];
        let (names, addresses) = contact_fields(&contacts);
        assert_eq!(names.as_deref(), Some("Only Name"));
        assert_eq!(
            addresses.as_deref(),
            Some("Jane Doe <jane@example.com>, bare@example.com, \"Doe, John\" <john@example.com>")
        );
        assert_eq!(contact_fields(&[]), (None, None));
    }

    #[test]
    fn test_quoted_names_are_escaped() {
        assert_eq!(
            format_address("A \"B\" C.", "a@b.c"),
            "\"A \\\"B\\\" C.\" <a@b.c>"
        );
    }

    #[test]
    fn test_normalize_description() {
        assert_eq!(normalize_description("\r\nline\r\nnext\r\n\r\n"), "line\nnext\n");
        assert_eq!(normalize_description("text\n"), "text\n");
        assert_eq!(normalize_description("a\rb"), "a\nb");
    }

    #[test]
    fn test_message_header_order() {
        let metadata = CoreMetadata {
            metadata_version: MetadataVersion::V2_5,
            name: "pkg".into(),
            version: "1.0".into(),
            keywords: vec!["a".into(), "b".into()],
            classifier: vec!["Typing :: Typed".into()],
            requires_python: Some(">=3.9".into()),
            import_name: Some(Vec::new()),
            description_content_type: Some("text/plain".into()),
            description: Some("Body\n".into()),
            ..Default::default()
        };
        assert_eq!(
            metadata.to_rfc822().unwrap().to_string(),
            "Metadata-Version: 2.5\nName: pkg\nVersion: 1.0\nKeywords: a,b\nClassifier: Typing :: Typed\nRequires-Python: >=3.9\nImport-Name:\nDescription-Content-Type: text/plain\n\nBody\n"
        );
    }

    #[test]
    fn test_message_round_trip() {
        let metadata = CoreMetadata {
            metadata_version: MetadataVersion::V2_4,
            name: "pkg".into(),
            version: "1.0".into(),
            summary: Some("Summary".into()),
            license_expression: Some("MIT OR Apache-2.0".into()),
            license_file: vec!["LICENSE".into()],
            project_url: vec!["Homepage, https://example.com".into()],
            requires_dist: vec!["dep>=1".into(), "extra-dep; extra == \"test\"".into()],
            provides_extra: vec!["test".into()],
            dynamic: vec!["Requires-Dist".into()],
            description: Some("# Title\n\nText\n".into()),
            ..Default::default()
        };
        let rendered = metadata.to_rfc822().unwrap().to_string();
        let parsed = Rfc822Message::parse(&rendered).unwrap();
        assert_eq!(CoreMetadata::from_rfc822(&parsed).unwrap(), metadata);
    }

    #[test]
    fn test_blank_readme_has_no_body() {
        let source = MemoryContentSource::new().with_file("README.md", "\n");
        let record = StandardMetadata::from_project_table(
            &json!({"name": "pkg", "version": "1", "readme": "README.md"}),
            &source,
            ValidationConfig::default(),
        )
        .unwrap();
        let metadata = CoreMetadata::from_record(&record).unwrap();
        assert_eq!(metadata.description, None);
        assert_eq!(metadata.description_content_type.as_deref(), Some("text/markdown"));

        let parsed = Rfc822Message::parse(&metadata.to_rfc822().unwrap().to_string()).unwrap();
        assert_eq!(CoreMetadata::from_rfc822(&parsed).unwrap(), metadata);
    }

    #[test]
    fn test_keywords_header_is_comma_separated() {
        let metadata = CoreMetadata {
            name: "pkg".into(),
            version: "1".into(),
            keywords: vec!["a, b".into(), " c".into()],
            ..Default::default()
        };
        let parsed = Rfc822Message::parse(&metadata.to_rfc822().unwrap().to_string()).unwrap();
        assert_eq!(CoreMetadata::from_rfc822(&parsed).unwrap().keywords, ["a", "b", "c"]);
    }

    #[test]
    fn test_from_rfc822_requires_name() {
        let parsed = Rfc822Message::parse("Metadata-Version: 2.1\nVersion: 1\n\n").unwrap();
        let err = CoreMetadata::from_rfc822(&parsed).unwrap_err();
        assert_eq!(err.to_string(), "Missing \"Name\" header");
    }

    #[test]
    fn test_legacy_license_file_listed_from_2_4() {
        let source = MemoryContentSource::new().with_file("COPYING", "All rights reserved");
        let project = json!({"name": "pkg", "version": "1", "license": {"file": "COPYING"}});

        let record = StandardMetadata::from_project_table(
            &project,
            &source,
            ValidationConfig::default().with_metadata_version(MetadataVersion::V2_4),
        )
        .unwrap();
        let metadata = CoreMetadata::from_record(&record).unwrap();
        assert_eq!(metadata.license.as_deref(), Some("All rights reserved"));
        assert_eq!(metadata.license_file, ["COPYING"]);

        let record =
            StandardMetadata::from_project_table(&project, &source, ValidationConfig::default())
                .unwrap();
        assert!(CoreMetadata::from_record(&record).unwrap().license_file.is_empty());
    }

    #[test]
    fn test_unset_dynamic_version_cannot_be_written() {
        let record = StandardMetadata::from_project_table(
            &json!({"name": "pkg", "dynamic": ["version"]}),
            &MemoryContentSource::new(),
            ValidationConfig::default(),
        )
        .unwrap();
        let err = CoreMetadata::from_record(&record).unwrap_err();
        assert_eq!(err.errors()[0].key(), "project.version");
    }
}
