//! Integration tests: whole `pyproject.toml` documents through record
//! construction and both output formats.

use std::fs;

use pmeta_metadata::{
    ConfigurationError, CoreMetadata, ErrorKind, ErrorMode, FsContentSource, MemoryContentSource,
    MetadataError, MetadataVersion, MultilinePolicy, NoContentSource, Rfc822Message,
    StandardMetadata, ValidationConfig,
};
use serde_json::{json, Value};

fn full_pyproject() -> Value {
    json!({
        "build-system": {"requires": ["backend"], "build-backend": "backend.api"},
        "project": {
            "name": "Full_Metadata",
            "version": "3.2.1",
            "description": "A package with all the metadata",
            "readme": "README.md",
            "requires-python": ">=3.8",
            "license": "MIT",
            "license-files": ["LICENSE"],
            "keywords": ["trampolim", "is", "interesting"],
            "authors": [
                {"email": "author@example.com"},
                {"name": "Example!"},
                {"name": "Another Person", "email": "other@example.com"},
            ],
            "maintainers": [
                {"name": "Other Example", "email": "other@example.com"},
            ],
            "classifiers": [
                "Development Status :: 4 - Beta",
                "Programming Language :: Python",
            ],
            "dependencies": [
                "dependency1",
                "dependency2>1.0.0",
                "dependency3[extra]",
                "dependency4; os_name != \"nt\"",
                "dependency5[other-extra]>1.0; os_name == \"nt\"",
            ],
            "optional-dependencies": {
                "test": [
                    "test_dependency",
                    "test_dependency[test_extra]",
                    "test_dependency[test_extra2] > 3.0; os_name == \"nt\"",
                ],
            },
            "urls": {
                "homepage": "example.com",
                "documentation": "readthedocs.org",
                "repository": "github.com/some/repo",
                "changelog": "github.com/some/repo/blob/master/CHANGELOG.rst",
            },
            "scripts": {"full-metadata": "full_metadata:main_cli"},
            "gui-scripts": {"full-metadata-gui": "full_metadata:main_gui"},
            "entry-points": {"custom": {"full-metadata": "full_metadata:main_custom"}},
        },
    })
}

fn full_source() -> MemoryContentSource {
    MemoryContentSource::new()
        .with_file("README.md", "some readme 👋\n")
        .with_file("LICENSE", "Permission is hereby granted...")
}

fn collect_all() -> ValidationConfig {
    ValidationConfig::default().with_error_mode(ErrorMode::CollectAll)
}

fn keys(err: &MetadataError) -> Vec<String> {
    err.errors().iter().map(|e| e.key().to_string()).collect()
}

#[test]
fn test_full_metadata_rfc822() {
    let record =
        StandardMetadata::from_pyproject(&full_pyproject(), &full_source(), ValidationConfig::default())
            .unwrap();
    assert_eq!(record.canonical_name(), "full-metadata");
    assert_eq!(record.metadata_version().unwrap(), MetadataVersion::V2_4);

    let expected = "\
Metadata-Version: 2.4
Name: Full_Metadata
Version: 3.2.1
Summary: A package with all the metadata
Keywords: trampolim,is,interesting
Author: Example!
Author-Email: author@example.com, Another Person <other@example.com>
Maintainer-Email: Other Example <other@example.com>
License-Expression: MIT
License-File: LICENSE
Classifier: Development Status :: 4 - Beta
Classifier: Programming Language :: Python
Project-URL: homepage, example.com
Project-URL: documentation, readthedocs.org
Project-URL: repository, github.com/some/repo
Project-URL: changelog, github.com/some/repo/blob/master/CHANGELOG.rst
Requires-Dist: dependency1
Requires-Dist: dependency2>1.0.0
Requires-Dist: dependency3[extra]
Requires-Dist: dependency4; os_name != \"nt\"
Requires-Dist: dependency5[other-extra]>1.0; os_name == \"nt\"
Requires-Dist: test_dependency; extra == \"test\"
Requires-Dist: test_dependency[test_extra]; extra == \"test\"
Requires-Dist: test_dependency[test_extra2]>3.0; os_name == \"nt\" and extra == \"test\"
Requires-Python: >=3.8
Provides-Extra: test
Description-Content-Type: text/markdown

some readme 👋
";
    assert_eq!(record.as_rfc822().unwrap().to_string(), expected);
}

#[test]
fn test_full_metadata_json() {
    let record =
        StandardMetadata::from_pyproject(&full_pyproject(), &full_source(), ValidationConfig::default())
            .unwrap();
    let value = record.as_json().unwrap();
    assert_eq!(value["metadata_version"], "2.4");
    assert_eq!(value["name"], "Full_Metadata");
    assert_eq!(value["keywords"], json!(["trampolim", "is", "interesting"]));
    assert_eq!(value["license_expression"], "MIT");
    assert_eq!(value["license_file"], json!(["LICENSE"]));
    assert_eq!(value["provides_extra"], json!(["test"]));
    assert_eq!(value["requires_dist"].as_array().map(Vec::len), Some(8));
    assert_eq!(value["description"], "some readme 👋\n");
    assert!(value.get("license").is_none());
    assert!(value.get("dynamic").is_none());
}

#[test]
fn test_minimal_output() {
    let pyproject = json!({"project": {"name": "example", "version": "0.1.0"}});
    let record =
        StandardMetadata::from_pyproject(&pyproject, &NoContentSource, ValidationConfig::default())
            .unwrap();
    assert_eq!(
        record.as_rfc822().unwrap().to_string(),
        "Metadata-Version: 2.1\nName: example\nVersion: 0.1.0\n\n"
    );
    assert_eq!(
        record.as_json().unwrap(),
        json!({"metadata_version": "2.1", "name": "example", "version": "0.1.0"})
    );
}

#[test]
fn test_rfc822_round_trip() {
    let record =
        StandardMetadata::from_pyproject(&full_pyproject(), &full_source(), ValidationConfig::default())
            .unwrap();
    let metadata = record.core_metadata().unwrap();
    let parsed = Rfc822Message::parse(&metadata.to_rfc822().unwrap().to_string()).unwrap();
    assert_eq!(CoreMetadata::from_rfc822(&parsed).unwrap(), metadata);
}

#[test]
fn test_collect_all_reports_every_error_in_field_order() {
    let pyproject = json!({"project": {
        "description": "first line\nsecond line",
        "name": "not valid!",
        "version": "1.0",
    }});
    let err = StandardMetadata::from_pyproject(&pyproject, &NoContentSource, collect_all())
        .unwrap_err();
    assert_eq!(keys(&err), ["project.name", "project.description"]);
    assert!(matches!(err, MetadataError::Grouped { ref errors } if errors.len() == 2));
    assert!(err.to_string().starts_with("Failed to parse pyproject.toml (2 errors):\n  project.name: "));
    assert!(!err.to_string().contains("not valid!"));

    let err = StandardMetadata::from_pyproject(&pyproject, &NoContentSource, ValidationConfig::default())
        .unwrap_err();
    assert!(matches!(err, MetadataError::Configuration(ref e) if e.key() == "project.name"));
}

#[test]
fn test_collect_all_and_fail_fast_agree_on_first_error() {
    let pyproject = json!({"project": {
        "name": "pkg",
        "version": "not a version",
        "keywords": "one string",
        "urls": {"homepage": 3},
        "dependencies": ["ok", "broken["],
    }});
    let all = StandardMetadata::from_pyproject(&pyproject, &NoContentSource, collect_all())
        .unwrap_err();
    assert_eq!(
        keys(&all),
        [
            "project.version",
            "project.keywords",
            "project.urls.homepage",
            "project.dependencies[1]",
        ]
    );
    let first = StandardMetadata::from_pyproject(&pyproject, &NoContentSource, ValidationConfig::default())
        .unwrap_err();
    assert_eq!(first.errors(), vec![all.errors()[0]]);

    let pinned_too_low = json!({"project": {
        "name": "pkg",
        "version": "1",
        "license": "MIT",
        "keywords": [1],
    }});
    let config = ValidationConfig::default().with_metadata_version(MetadataVersion::V2_1);
    assert_eq!(first_key_in_both_modes(&pinned_too_low, config), "project.license");

    let undeclared_extra = json!({"project": {
        "name": "pkg",
        "version": "1",
        "dependencies": ["x; extra == 'missing'"],
        "optional-dependencies": {"a": ["bad =="]},
    }});
    assert_eq!(
        first_key_in_both_modes(&undeclared_extra, ValidationConfig::default()),
        "project.dependencies[0]"
    );
}

/// Key of the first error, asserting that fail-fast reports exactly the
/// first error collect-all reports.
fn first_key_in_both_modes(pyproject: &Value, config: ValidationConfig) -> String {
    let all = StandardMetadata::from_pyproject(
        pyproject,
        &NoContentSource,
        config.clone().with_error_mode(ErrorMode::CollectAll),
    )
    .unwrap_err();
    let first = StandardMetadata::from_pyproject(
        pyproject,
        &NoContentSource,
        config.with_error_mode(ErrorMode::FailFast),
    )
    .unwrap_err();
    assert!(matches!(first, MetadataError::Configuration(_)));
    assert_eq!(first.errors(), vec![all.errors()[0]]);
    all.errors()[0].key().to_string()
}

#[test]
fn test_dynamic_field_also_defined() {
    let pyproject = json!({"project": {
        "name": "pkg",
        "version": "1.0",
        "dynamic": ["version", "readme"],
        "readme": "README.md",
    }});
    let err = StandardMetadata::from_pyproject(&pyproject, &NoContentSource, collect_all())
        .unwrap_err();
    assert_eq!(keys(&err), ["project.version", "project.readme"]);
    for error in err.errors() {
        assert_eq!(error.kind(), ErrorKind::Semantic);
        assert!(error.message().contains("declared as dynamic"));
    }
}

#[test]
fn test_dynamic_fields_can_be_filled_before_writing() {
    let pyproject = json!({"project": {
        "name": "pkg",
        "dynamic": ["version", "dependencies"],
    }});
    let mut record =
        StandardMetadata::from_pyproject(&pyproject, &NoContentSource, ValidationConfig::default())
            .unwrap();
    assert!(record.as_rfc822().is_err());

    record.set_version("2.0.0".parse().unwrap()).unwrap();
    record
        .set_dependencies(vec!["numpy>=1.20".parse().unwrap()])
        .unwrap();
    let err: ConfigurationError = record.set_keywords(vec!["x".into()]).unwrap_err();
    assert_eq!(err.key(), "project.keywords");

    assert_eq!(
        record.as_rfc822().unwrap().to_string(),
        "Metadata-Version: 2.1\nName: pkg\nVersion: 2.0.0\nRequires-Dist: numpy>=1.20\n\n"
    );
}

#[test]
fn test_license_conflicts() {
    let source = MemoryContentSource::new().with_file("LICENSE", "text");
    let legacy_with_files = json!({"project": {
        "name": "pkg",
        "version": "1",
        "license": {"text": "MIT"},
        "license-files": ["LICENSE"],
    }});
    let err = StandardMetadata::from_pyproject(&legacy_with_files, &source, collect_all())
        .unwrap_err();
    assert_eq!(keys(&err), ["project.license"]);

    let expression_with_classifier = json!({"project": {
        "name": "pkg",
        "version": "1",
        "license": "MIT",
        "classifiers": ["License :: OSI Approved :: MIT License"],
    }});
    let err = StandardMetadata::from_pyproject(&expression_with_classifier, &source, collect_all())
        .unwrap_err();
    assert_eq!(keys(&err), ["project.classifiers"]);
}

#[test]
fn test_pinned_version_too_low() {
    let source = MemoryContentSource::new().with_file("LICENSE", "text");
    let pyproject = json!({"project": {
        "name": "pkg",
        "version": "1",
        "license": "MIT",
        "license-files": ["LICENSE"],
    }});
    let config = collect_all().with_metadata_version(MetadataVersion::V2_1);
    let err = StandardMetadata::from_pyproject(&pyproject, &source, config).unwrap_err();
    assert_eq!(keys(&err), ["project.license", "project.license-files"]);
    assert_eq!(
        err.errors()[1].message(),
        "\"project.license-files\" is supported only when emitting metadata version >= 2.4"
    );

    let pinned = ValidationConfig::default().with_metadata_version(MetadataVersion::V2_5);
    let record = StandardMetadata::from_pyproject(&pyproject, &source, pinned).unwrap();
    assert_eq!(record.metadata_version().unwrap(), MetadataVersion::V2_5);
}

#[test]
fn test_legacy_license_warns_from_2_4() {
    let pyproject = json!({"project": {
        "name": "pkg",
        "version": "1",
        "license": {"text": "Proprietary"},
    }});
    let config = ValidationConfig::default().with_metadata_version(MetadataVersion::V2_4);
    let record = StandardMetadata::from_pyproject(&pyproject, &NoContentSource, config).unwrap();
    assert_eq!(record.warnings().len(), 1);
    assert_eq!(record.warnings()[0].key(), "project.license");
    let rendered = record.as_rfc822().unwrap().to_string();
    assert!(rendered.contains("\nLicense: Proprietary\n"));
}

#[test]
fn test_extras_are_normalized() {
    let pyproject = json!({"project": {
        "name": "pkg",
        "version": "1",
        "dependencies": ["pkg[Dev.Tools]; extra == 'Dev_Tools'"],
        "optional-dependencies": {
            "Dev.Tools": ["ruff"],
            "docs": ["sphinx; python_version >= '3.9' or os_name == 'nt'"],
        },
    }});
    let record =
        StandardMetadata::from_pyproject(&pyproject, &NoContentSource, ValidationConfig::default())
            .unwrap();
    let metadata = record.core_metadata().unwrap();
    assert_eq!(metadata.provides_extra, ["dev-tools", "docs"]);
    assert_eq!(
        metadata.requires_dist,
        [
            "pkg[Dev.Tools]; extra == \"dev-tools\"",
            "ruff; extra == \"dev-tools\"",
            "sphinx; (python_version >= \"3.9\" or os_name == \"nt\") and extra == \"docs\"",
        ]
    );
}

#[test]
fn test_multiline_summary_warning_folds_output() {
    let pyproject = json!({"project": {
        "name": "pkg",
        "version": "1",
        "description": "first\nsecond",
    }});
    let config = ValidationConfig::default().with_multiline_summary(MultilinePolicy::Warn);
    let record = StandardMetadata::from_pyproject(&pyproject, &NoContentSource, config).unwrap();
    assert_eq!(record.warnings().len(), 1);
    assert!(record
        .as_rfc822()
        .unwrap()
        .to_string()
        .contains("Summary: first\n         second\n"));
}

#[test]
fn test_file_system_source() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("README.rst"), "Title\n=====\n").unwrap();
    fs::create_dir(dir.path().join("LICENSES")).unwrap();
    fs::write(dir.path().join("LICENSES/MIT.txt"), "mit").unwrap();
    fs::write(dir.path().join("LICENSES/Apache-2.0.txt"), "apache").unwrap();

    let pyproject = json!({"project": {
        "name": "pkg",
        "version": "1",
        "readme": "README.rst",
        "license": "MIT OR Apache-2.0",
        "license-files": ["LICENSES/*.txt"],
    }});
    let source = FsContentSource::new(dir.path());
    let record =
        StandardMetadata::from_pyproject(&pyproject, &source, ValidationConfig::default()).unwrap();
    let metadata = record.core_metadata().unwrap();
    assert_eq!(metadata.description_content_type.as_deref(), Some("text/x-rst"));
    assert_eq!(
        metadata.license_file,
        ["LICENSES/Apache-2.0.txt", "LICENSES/MIT.txt"]
    );
}

#[test]
fn test_project_must_be_a_table() {
    let err = StandardMetadata::from_pyproject(
        &json!({"project": ["not", "a", "table"]}),
        &NoContentSource,
        ValidationConfig::default(),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Field \"project\" has an invalid type, expecting a table (got array)"
    );
}
