//! # Standard Metadata Record
//!
//! [`StandardMetadata`] is the validated, typed form of a `[project]` table.
//!
//! ## Construction
//!
//! Fields are processed in declaration order. `dynamic` is read first
//! because every other field consults it, but its own errors are reported
//! at its declared position. Each field is shape-checked by the extractor,
//! then parsed and cross-checked; every violation goes through the
//! [`ErrorCollector`] so fail-fast and collect-all share one code path.
//!
//! Record-level rules (license conflicts, undeclared extras, caller-declared
//! dynamic metadata and metadata-version sufficiency) run at the step of the
//! field their error is keyed on, so the first error raised in fail-fast
//! mode is also the first one reported in collect-all mode. They run again
//! in [`StandardMetadata::validate`], so a record mutated through its
//! setters is re-checked before serialization.
//!
//! ## Mutation
//!
//! Only fields listed in `project.dynamic` may be filled in after
//! construction. The version override and caller-declared dynamic metadata
//! belong to the configuration and may always change.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use indexmap::IndexMap;
use pmeta_core::{ExtraName, ProjectName, Requirement, RequiresPython, Version};
use regex::Regex;
use serde_json::{Map, Value};

use crate::collector::{rank_of, ErrorCollector, ErrorMode};
use crate::config::{KeyPolicy, MultilinePolicy, ValidationConfig};
use crate::constants::{is_known_metadata_field, NON_DYNAMIC_METADATA_FIELDS};
use crate::content::ContentSource;
use crate::core_metadata::CoreMetadata;
use crate::error::{
    ConfigurationError, ConfigurationErrors, ConfigurationWarning, ContentError, MetadataError,
};
use crate::extract::{extract, get_str, unexpected_keys, Extracted};
use crate::field::{ProjectField, ValueKind};
use crate::metadata_version::{MetadataVersion, VersionFeatures};
use crate::model::{Contact, ImportName, License, LicenseField, Readme};
use crate::rfc822::Rfc822Message;

const README_CONTENT_TYPES: &[&str] = &["text/plain", "text/markdown", "text/x-rst"];

const MAX_URL_LABEL_LEN: usize = 32;

fn entry_point_group_regex() -> &'static Regex {
    static GROUP: OnceLock<Regex> = OnceLock::new();
    GROUP.get_or_init(|| {
        Regex::new(r"^\w+(\.\w+)*$")
            .unwrap_or_else(|e| unreachable!("static entry point group pattern is valid: {e}"))
    })
}

/// The validated metadata of one project.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardMetadata {
    name: ProjectName,
    version: Option<Version>,
    description: Option<String>,
    readme: Option<Readme>,
    requires_python: Option<RequiresPython>,
    license: Option<LicenseField>,
    license_files: Option<Vec<PathBuf>>,
    authors: Vec<Contact>,
    maintainers: Vec<Contact>,
    keywords: Vec<String>,
    classifiers: Vec<String>,
    urls: IndexMap<String, String>,
    scripts: IndexMap<String, String>,
    gui_scripts: IndexMap<String, String>,
    entry_points: IndexMap<String, IndexMap<String, String>>,
    dependencies: Vec<Requirement>,
    optional_dependencies: IndexMap<ExtraName, Vec<Requirement>>,
    import_names: Option<Vec<ImportName>>,
    import_namespaces: Option<Vec<ImportName>>,
    dynamic: Vec<ProjectField>,
    extra_keys: Vec<String>,
    warnings: Vec<ConfigurationWarning>,
    config: ValidationConfig,
}

impl StandardMetadata {
    /// Build a record from a whole parsed pyproject document.
    pub fn from_pyproject(
        pyproject: &Value,
        source: &dyn ContentSource,
        config: ValidationConfig,
    ) -> Result<Self, MetadataError> {
        let Some(project) = pyproject.get("project") else {
            return Err(ConfigurationError::semantic(
                "project",
                "Section \"project\" missing in pyproject.toml",
            )
            .into());
        };
        Self::from_project_table(project, source, config)
    }

    /// Build a record from the `[project]` table alone.
    pub fn from_project_table(
        project: &Value,
        source: &dyn ContentSource,
        config: ValidationConfig,
    ) -> Result<Self, MetadataError> {
        let table = project.as_object().ok_or_else(|| {
            ConfigurationError::invalid_type("project", "a table", ValueKind::of(project))
        })?;
        build(table, source, config)
    }

    // -- accessors ----------------------------------------------------------

    pub fn name(&self) -> &ProjectName {
        &self.name
    }

    /// The normalized project name.
    pub fn canonical_name(&self) -> &str {
        self.name.canonical()
    }

    /// `None` only while a dynamic version has not been set.
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn readme(&self) -> Option<&Readme> {
        self.readme.as_ref()
    }

    pub fn requires_python(&self) -> Option<&RequiresPython> {
        self.requires_python.as_ref()
    }

    pub fn license(&self) -> Option<&LicenseField> {
        self.license.as_ref()
    }

    /// Expanded `license-files`, sorted and deduplicated. `Some(&[])` when
    /// the field was given as an empty list.
    pub fn license_files(&self) -> Option<&[PathBuf]> {
        self.license_files.as_deref()
    }

    pub fn authors(&self) -> &[Contact] {
        &self.authors
    }

    pub fn maintainers(&self) -> &[Contact] {
        &self.maintainers
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn classifiers(&self) -> &[String] {
        &self.classifiers
    }

    pub fn urls(&self) -> &IndexMap<String, String> {
        &self.urls
    }

    pub fn scripts(&self) -> &IndexMap<String, String> {
        &self.scripts
    }

    pub fn gui_scripts(&self) -> &IndexMap<String, String> {
        &self.gui_scripts
    }

    pub fn entry_points(&self) -> &IndexMap<String, IndexMap<String, String>> {
        &self.entry_points
    }

    pub fn dependencies(&self) -> &[Requirement] {
        &self.dependencies
    }

    pub fn optional_dependencies(&self) -> &IndexMap<ExtraName, Vec<Requirement>> {
        &self.optional_dependencies
    }

    pub fn import_names(&self) -> Option<&[ImportName]> {
        self.import_names.as_deref()
    }

    pub fn import_namespaces(&self) -> Option<&[ImportName]> {
        self.import_namespaces.as_deref()
    }

    /// Fields listed in `project.dynamic`, in listing order.
    pub fn dynamic(&self) -> &[ProjectField] {
        &self.dynamic
    }

    /// Unrecognized `[project]` keys, in document order.
    pub fn extra_keys(&self) -> &[String] {
        &self.extra_keys
    }

    pub fn warnings(&self) -> &[ConfigurationWarning] {
        &self.warnings
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    // -- mutation -----------------------------------------------------------

    fn ensure_dynamic(&self, field: ProjectField) -> Result<(), ConfigurationError> {
        if self.dynamic.contains(&field) {
            return Ok(());
        }
        let path = field.path();
        Err(ConfigurationError::semantic(
            &path,
            format!("Field \"{path}\" is not declared in \"project.dynamic\""),
        ))
    }

    pub fn set_version(&mut self, version: Version) -> Result<(), ConfigurationError> {
        self.ensure_dynamic(ProjectField::Version)?;
        self.version = Some(version);
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), ConfigurationError> {
        self.ensure_dynamic(ProjectField::Description)?;
        let description = description.into();
        if let Some(warning) = check_summary(&description, self.config.multiline_summary)? {
            log_warning(&warning);
            self.warnings.push(warning);
        }
        self.description = Some(description);
        Ok(())
    }

    pub fn set_readme(&mut self, readme: Readme) -> Result<(), ConfigurationError> {
        self.ensure_dynamic(ProjectField::Readme)?;
        self.readme = Some(readme);
        Ok(())
    }

    pub fn set_requires_python(&mut self, requires: RequiresPython) -> Result<(), ConfigurationError> {
        self.ensure_dynamic(ProjectField::RequiresPython)?;
        self.requires_python = Some(requires);
        Ok(())
    }

    pub fn set_keywords(&mut self, keywords: Vec<String>) -> Result<(), ConfigurationError> {
        self.ensure_dynamic(ProjectField::Keywords)?;
        for warning in keyword_warnings(&keywords) {
            log_warning(&warning);
            self.warnings.push(warning);
        }
        self.keywords = keywords;
        Ok(())
    }

    pub fn set_classifiers(&mut self, classifiers: Vec<String>) -> Result<(), ConfigurationError> {
        self.ensure_dynamic(ProjectField::Classifiers)?;
        self.classifiers = classifiers;
        Ok(())
    }

    pub fn set_urls(&mut self, urls: IndexMap<String, String>) -> Result<(), ConfigurationError> {
        self.ensure_dynamic(ProjectField::Urls)?;
        self.urls = urls;
        Ok(())
    }

    pub fn set_dependencies(&mut self, dependencies: Vec<Requirement>) -> Result<(), ConfigurationError> {
        self.ensure_dynamic(ProjectField::Dependencies)?;
        self.dependencies = dependencies;
        Ok(())
    }

    pub fn set_optional_dependencies(
        &mut self,
        optional: IndexMap<ExtraName, Vec<Requirement>>,
    ) -> Result<(), ConfigurationError> {
        self.ensure_dynamic(ProjectField::OptionalDependencies)?;
        self.optional_dependencies = optional;
        Ok(())
    }

    /// Pin (or unpin) the output metadata version.
    pub fn set_metadata_version(&mut self, version: Option<MetadataVersion>) {
        self.config.metadata_version = version;
    }

    /// Replace the core-metadata fields declared dynamic by the caller.
    pub fn set_dynamic_metadata(&mut self, fields: Vec<String>) {
        self.config.dynamic_metadata = fields;
    }

    // -- validation and output ----------------------------------------------

    fn features(&self) -> VersionFeatures {
        version_features(
            self.license.as_ref(),
            self.license_files.is_some(),
            self.requires_python.as_ref(),
            &self.classifiers,
            self.import_names.is_some(),
            self.import_namespaces.is_some(),
            &self.config.dynamic_metadata,
        )
    }

    /// Re-run the record-level checks.
    pub fn validate(&self) -> Result<(), MetadataError> {
        let mut found = Vec::new();
        if let Some(description) = &self.description {
            found.extend(check_summary(description, self.config.multiline_summary).err());
        }
        found.extend(license_files_conflict(
            self.license.as_ref(),
            self.license_files.is_some(),
        ));
        found.extend(license_classifier_conflict(self.license.as_ref(), &self.classifiers));
        if !self.dynamic.contains(&ProjectField::OptionalDependencies) {
            found.extend(undeclared_extras(&self.dependencies, &self.optional_dependencies));
        }
        found.extend(dynamic_metadata_errors(&self.config.dynamic_metadata));
        if let Err(resolve_errors) = self.features().resolve(self.config.metadata_version) {
            found.extend(resolve_errors);
        }
        found.sort_by_key(|e| rank_of(e.key()));

        let mut errors = ErrorCollector::new(self.config.error_mode);
        errors.extend(found)?;
        errors.finish()
    }

    /// The metadata version output will use: the pinned version, or the
    /// minimum able to represent every populated field.
    pub fn metadata_version(&self) -> Result<MetadataVersion, MetadataError> {
        self.features()
            .resolve(self.config.metadata_version)
            .map_err(|mut errors| {
                errors.sort_by_key(|e| rank_of(e.key()));
                match self.config.error_mode {
                    ErrorMode::FailFast if !errors.is_empty() => {
                        MetadataError::Configuration(errors.remove(0))
                    }
                    _ => MetadataError::Grouped {
                        errors: ConfigurationErrors::new(errors),
                    },
                }
            })
    }

    /// The core-metadata field values of this record.
    pub fn core_metadata(&self) -> Result<CoreMetadata, MetadataError> {
        CoreMetadata::from_record(self)
    }

    /// Render as an RFC822-style core-metadata message.
    pub fn as_rfc822(&self) -> Result<Rfc822Message, MetadataError> {
        Ok(self.core_metadata()?.to_rfc822()?)
    }

    /// Render as a JSON object of core-metadata fields.
    pub fn as_json(&self) -> Result<Value, MetadataError> {
        crate::json::to_json(&self.core_metadata()?)
    }
}

// ---------------------------------------------------------------------------
// Record-level rules
// ---------------------------------------------------------------------------

fn check_summary(
    summary: &str,
    policy: MultilinePolicy,
) -> Result<Option<ConfigurationWarning>, ConfigurationError> {
    if !summary.contains(['\n', '\r']) {
        return Ok(None);
    }
    match policy {
        MultilinePolicy::Error => Err(ConfigurationError::policy(
            "project.description",
            "The one-line summary \"project.description\" must not contain more than one line",
        )),
        MultilinePolicy::Warn => Ok(Some(ConfigurationWarning::new(
            "project.description",
            "The one-line summary \"project.description\" should not contain more than one line. Readers might merge or truncate newlines.",
        ))),
    }
}

/// One warning per keyword that would be split when the `Keywords` header
/// is read back.
fn keyword_warnings(keywords: &[String]) -> Vec<ConfigurationWarning> {
    keywords
        .iter()
        .enumerate()
        .filter(|(_, keyword)| keyword.contains(','))
        .map(|(i, _)| {
            let key = format!("project.keywords[{i}]");
            let message = format!(
                "Field \"{key}\" contains a comma, readers of the \"Keywords\" header will split it"
            );
            ConfigurationWarning::new(key, message)
        })
        .collect()
}

fn log_warning(warning: &ConfigurationWarning) {
    tracing::warn!(key = %warning.key(), "{}", warning.message());
}

fn has_license_classifiers(classifiers: &[String]) -> bool {
    classifiers.iter().any(|c| c.starts_with("License ::"))
}

fn license_files_conflict(
    license: Option<&LicenseField>,
    has_license_files: bool,
) -> Option<ConfigurationError> {
    (has_license_files && license.is_some_and(LicenseField::is_legacy)).then(|| {
        ConfigurationError::semantic(
            "project.license",
            "\"project.license-files\" must not be used when \"project.license\" is not a SPDX license expression",
        )
    })
}

fn license_classifier_conflict(
    license: Option<&LicenseField>,
    classifiers: &[String],
) -> Option<ConfigurationError> {
    (license.is_some_and(LicenseField::is_expression) && has_license_classifiers(classifiers)).then(
        || {
            ConfigurationError::semantic(
                "project.classifiers",
                "Setting \"project.license\" to an SPDX license expression is not compatible with \"License ::\" classifiers",
            )
        },
    )
}

/// One error per extra referenced by the marker of `requirement` that
/// `is_declared` rejects.
fn undeclared_extra_errors(
    key: &str,
    requirement: &Requirement,
    is_declared: impl Fn(&str) -> bool,
) -> Vec<ConfigurationError> {
    requirement
        .referenced_extras()
        .into_iter()
        .filter(|extra| !is_declared(extra.as_str()))
        .map(|extra| {
            ConfigurationError::semantic(
                key,
                format!(
                    "Field \"{key}\" references extra \"{extra}\" which is not declared in \"project.optional-dependencies\""
                ),
            )
        })
        .collect()
}

/// Undeclared extra references across every requirement of a record.
fn undeclared_extras(
    dependencies: &[Requirement],
    optional: &IndexMap<ExtraName, Vec<Requirement>>,
) -> Vec<ConfigurationError> {
    let declared: BTreeSet<&str> = optional.keys().map(ExtraName::as_str).collect();
    let keyed = dependencies
        .iter()
        .enumerate()
        .map(|(i, r)| (format!("project.dependencies[{i}]"), r))
        .chain(optional.iter().flat_map(|(extra, requirements)| {
            requirements
                .iter()
                .enumerate()
                .map(move |(i, r)| (format!("project.optional-dependencies.{extra}[{i}]"), r))
        }));
    keyed
        .flat_map(|(key, requirement)| {
            undeclared_extra_errors(&key, requirement, |extra| declared.contains(extra))
        })
        .collect()
}

fn dynamic_metadata_errors(fields: &[String]) -> Vec<ConfigurationError> {
    fields
        .iter()
        .filter_map(|field| {
            let lower = field.to_ascii_lowercase();
            if NON_DYNAMIC_METADATA_FIELDS.contains(&lower.as_str()) {
                Some(ConfigurationError::policy(
                    "dynamic-metadata",
                    format!("Metadata field \"{field}\" cannot be declared dynamic"),
                ))
            } else if !is_known_metadata_field(&lower) {
                Some(ConfigurationError::semantic(
                    "dynamic-metadata",
                    format!("Unknown metadata field \"{field}\" cannot be declared dynamic"),
                ))
            } else {
                None
            }
        })
        .collect()
}

fn version_features(
    license: Option<&LicenseField>,
    has_license_files: bool,
    requires_python: Option<&RequiresPython>,
    classifiers: &[String],
    has_import_names: bool,
    has_import_namespaces: bool,
    dynamic_metadata: &[String],
) -> VersionFeatures {
    VersionFeatures {
        import_names: has_import_names,
        import_namespaces: has_import_namespaces,
        license_expression: license.is_some_and(LicenseField::is_expression),
        license_files: has_license_files,
        legacy_license: license.is_some_and(LicenseField::is_legacy),
        license_classifiers: has_license_classifiers(classifiers),
        requires_python_disjunction: requires_python.is_some_and(RequiresPython::is_disjunction),
        dynamic_metadata: !dynamic_metadata.is_empty(),
    }
}

/// Parse `project.dynamic` without reporting: the errors are replayed at
/// the field's position.
fn parse_dynamic(project: &Map<String, Value>) -> (Vec<ProjectField>, Vec<ConfigurationError>) {
    let mut fields = Vec::new();
    let mut errors = Vec::new();
    match extract(project, ProjectField::Dynamic) {
        Err(e) => errors.push(e),
        Ok(Some(Extracted::StringList(items))) => {
            for (i, item) in items.into_iter().enumerate() {
                match ProjectField::from_key(item) {
                    Some(field @ (ProjectField::Name | ProjectField::Dynamic)) => {
                        errors.push(ConfigurationError::semantic(
                            "project.dynamic",
                            format!("Unsupported field \"{}\" in \"project.dynamic\"", field.as_str()),
                        ));
                    }
                    Some(field) => {
                        if !fields.contains(&field) {
                            fields.push(field);
                        }
                    }
                    None => {
                        let key = format!("project.dynamic[{i}]");
                        errors.push(ConfigurationError::structural(
                            &key,
                            format!("Field \"{key}\" is not a known project field"),
                        ));
                    }
                }
            }
        }
        Ok(_) => {}
    }
    (fields, errors)
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

struct Builder<'a> {
    project: &'a Map<String, Value>,
    source: &'a dyn ContentSource,
    config: &'a ValidationConfig,
    dynamic: Vec<ProjectField>,
    /// Canonical names of the declared extras, `None` when the set is not
    /// statically known.
    declared_extras: Option<BTreeSet<String>>,
    errors: ErrorCollector,
    warnings: Vec<ConfigurationWarning>,
}

impl<'a> Builder<'a> {
    fn push(&mut self, error: ConfigurationError) -> Result<(), MetadataError> {
        self.errors.push(error)
    }

    fn is_dynamic(&self, field: ProjectField) -> bool {
        self.dynamic.contains(&field)
    }

    fn is_present(&self, field: ProjectField) -> bool {
        self.project.contains_key(field.as_str())
    }

    /// Whether `field` is static and has a well-shaped value, without
    /// reporting anything.
    fn declares(&self, field: ProjectField) -> bool {
        !self.is_dynamic(field) && matches!(extract(self.project, field), Ok(Some(_)))
    }

    /// Report every feature the pinned metadata version cannot represent.
    fn check_pinned(&mut self, features: VersionFeatures) -> Result<(), MetadataError> {
        let Some(pinned) = self.config.metadata_version else {
            return Ok(());
        };
        match features.resolve(Some(pinned)) {
            Ok(_) => Ok(()),
            Err(errors) => self.errors.extend(errors),
        }
    }

    /// Extras of `optional-dependencies` that marker references are checked
    /// against. Unknown when the field is dynamic, malformed or has an
    /// invalid extra name.
    fn find_declared_extras(&self) -> Option<BTreeSet<String>> {
        let field = ProjectField::OptionalDependencies;
        if self.is_dynamic(field) {
            return None;
        }
        match extract(self.project, field) {
            Ok(None) => Some(BTreeSet::new()),
            Ok(Some(Extracted::TableOfStringLists(lists))) => lists
                .keys()
                .map(|raw| ExtraName::new(raw).ok().map(|extra| extra.as_str().to_string()))
                .collect(),
            _ => None,
        }
    }

    fn check_extras(&mut self, key: &str, requirement: &Requirement) -> Result<(), MetadataError> {
        let errors = match &self.declared_extras {
            Some(declared) => {
                undeclared_extra_errors(key, requirement, |extra| declared.contains(extra))
            }
            None => return Ok(()),
        };
        self.errors.extend(errors)
    }

    /// Shape-checked value of `field`. A field both listed as dynamic and
    /// given a value is rejected here.
    fn field(&mut self, field: ProjectField) -> Result<Option<Extracted<'a>>, MetadataError> {
        if self.is_dynamic(field) && self.is_present(field) {
            let path = field.path();
            self.push(ConfigurationError::semantic(
                &path,
                format!("Field \"{path}\" declared as dynamic in \"project.dynamic\" but is defined"),
            ))?;
            return Ok(None);
        }
        Ok(self.errors.check(extract(self.project, field))?.flatten())
    }

    fn string(&mut self, field: ProjectField) -> Result<Option<&'a str>, MetadataError> {
        Ok(match self.field(field)? {
            Some(Extracted::String(s)) => Some(s),
            _ => None,
        })
    }

    fn string_list(&mut self, field: ProjectField) -> Result<Option<Vec<&'a str>>, MetadataError> {
        Ok(match self.field(field)? {
            Some(Extracted::StringList(items)) => Some(items),
            _ => None,
        })
    }

    fn owned_list(&mut self, field: ProjectField) -> Result<Vec<String>, MetadataError> {
        Ok(self
            .string_list(field)?
            .map(|items| items.into_iter().map(str::to_string).collect())
            .unwrap_or_default())
    }

    fn owned_table(&mut self, field: ProjectField) -> Result<IndexMap<String, String>, MetadataError> {
        Ok(match self.field(field)? {
            Some(Extracted::StringTable(table)) => table
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            _ => IndexMap::new(),
        })
    }

    fn read(&mut self, key: &str, path: &str) -> Result<Option<String>, MetadataError> {
        match self.source.read_text(Path::new(path)) {
            Ok(text) => Ok(Some(text)),
            Err(ContentError::NotFound) => {
                self.push(ConfigurationError::semantic(
                    key,
                    format!("Field \"{key}\" refers to a file that does not exist"),
                ))?;
                Ok(None)
            }
            Err(e) => {
                self.push(ConfigurationError::structural(
                    key,
                    format!("Field \"{key}\" refers to a file that could not be read: {e}"),
                ))?;
                Ok(None)
            }
        }
    }

    fn unknown_keys(&mut self) -> Result<Vec<String>, MetadataError> {
        let extra_keys: Vec<String> = self
            .project
            .keys()
            .filter(|k| ProjectField::from_key(k).is_none())
            .cloned()
            .collect();
        if extra_keys.is_empty() {
            return Ok(extra_keys);
        }
        let listed = extra_keys
            .iter()
            .map(|k| format!("\"{k}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let message = format!("Extra keys present in \"project\": {listed}");
        match self.config.unknown_keys {
            KeyPolicy::Ignore => {}
            KeyPolicy::Warn => self.warnings.push(ConfigurationWarning::new("project", message)),
            KeyPolicy::Error => self.push(ConfigurationError::policy("project", message))?,
        }
        Ok(extra_keys)
    }

    fn name(&mut self) -> Result<Option<ProjectName>, MetadataError> {
        match self.string(ProjectField::Name)? {
            Some(raw) => self.errors.check(ProjectName::new(raw).map_err(|e| {
                ConfigurationError::syntactic(
                    "project.name",
                    format!("Field \"project.name\" is not a valid project name: {e}"),
                )
            })),
            None => {
                if !self.is_present(ProjectField::Name) {
                    self.push(ConfigurationError::semantic(
                        "project.name",
                        "Field \"project.name\" missing",
                    ))?;
                }
                Ok(None)
            }
        }
    }

    fn version(&mut self) -> Result<Option<Version>, MetadataError> {
        match self.string(ProjectField::Version)? {
            Some(raw) => self.errors.check(Version::parse(raw).map_err(|e| {
                ConfigurationError::syntactic(
                    "project.version",
                    format!("Field \"project.version\" is an invalid PEP 440 version: {e}"),
                )
            })),
            None => {
                if !self.is_present(ProjectField::Version) && !self.is_dynamic(ProjectField::Version) {
                    self.push(ConfigurationError::semantic(
                        "project.version",
                        "Field \"project.version\" missing and \"version\" not specified in \"project.dynamic\"",
                    ))?;
                }
                Ok(None)
            }
        }
    }

    fn description(&mut self) -> Result<Option<String>, MetadataError> {
        let Some(text) = self.string(ProjectField::Description)? else {
            return Ok(None);
        };
        match check_summary(text, self.config.multiline_summary) {
            Ok(warning) => {
                self.warnings.extend(warning);
                Ok(Some(text.to_string()))
            }
            Err(e) => {
                self.push(e)?;
                Ok(None)
            }
        }
    }

    fn readme(&mut self) -> Result<Option<Readme>, MetadataError> {
        match self.field(ProjectField::Readme)? {
            Some(Extracted::String(file)) => {
                let content_type = match Path::new(file).extension().and_then(|e| e.to_str()) {
                    Some(ext) if ext.eq_ignore_ascii_case("md") => "text/markdown",
                    Some(ext) if ext.eq_ignore_ascii_case("rst") => "text/x-rst",
                    _ => {
                        self.push(ConfigurationError::syntactic(
                            "project.readme",
                            "Could not infer content type for readme file in \"project.readme\"",
                        ))?;
                        return Ok(None);
                    }
                };
                let text = self.read("project.readme", file)?;
                Ok(text.map(|text| Readme::new(text, Some(PathBuf::from(file)), content_type)))
            }
            Some(Extracted::Table(table)) => self.readme_table(table),
            _ => Ok(None),
        }
    }

    fn readme_table(&mut self, table: &'a Map<String, Value>) -> Result<Option<Readme>, MetadataError> {
        let mut valid = true;
        if let Some(keys) = unexpected_keys(table, &["file", "text", "content-type"]) {
            self.push(ConfigurationError::structural(
                "project.readme",
                format!("Field \"project.readme\" contains unexpected keys: {keys}"),
            ))?;
            valid = false;
        }
        let file = get_str(table, "file").filter(|f| !f.is_empty());
        let text = get_str(table, "text").filter(|t| !t.is_empty());
        if file.is_some() == text.is_some() {
            self.push(ConfigurationError::structural(
                "project.readme",
                "Field \"project.readme\" must have exactly one of \"file\" or \"text\" keys",
            ))?;
            valid = false;
        }
        let content_type = get_str(table, "content-type");
        match content_type {
            None => {
                self.push(ConfigurationError::structural(
                    "project.readme.content-type",
                    "Field \"project.readme.content-type\" missing",
                ))?;
                valid = false;
            }
            Some(ct) => {
                let base = ct.split_once(';').map_or(ct, |(base, _)| base).trim();
                if !README_CONTENT_TYPES.contains(&base) {
                    self.push(ConfigurationError::syntactic(
                        "project.readme.content-type",
                        "Field \"project.readme.content-type\" must be one of \"text/plain\", \"text/markdown\" or \"text/x-rst\"",
                    ))?;
                    valid = false;
                }
            }
        }

        let (true, Some(content_type)) = (valid, content_type) else {
            return Ok(None);
        };
        match (text, file) {
            (Some(text), _) => Ok(Some(Readme::new(text, None, content_type))),
            (None, Some(file)) => Ok(self
                .read("project.readme.file", file)?
                .map(|text| Readme::new(text, Some(PathBuf::from(file)), content_type))),
            (None, None) => Ok(None),
        }
    }

    fn requires_python(&mut self) -> Result<Option<RequiresPython>, MetadataError> {
        let Some(raw) = self.string(ProjectField::RequiresPython)? else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        self.errors.check(RequiresPython::parse(raw).map_err(|e| {
            ConfigurationError::syntactic(
                "project.requires-python",
                format!("Field \"project.requires-python\" is an invalid Python version specifier: {e}"),
            )
        }))
    }

    fn license(&mut self) -> Result<Option<LicenseField>, MetadataError> {
        let table = match self.field(ProjectField::License)? {
            Some(Extracted::String(expression)) => {
                return Ok(Some(LicenseField::Expression(expression.trim().to_string())))
            }
            Some(Extracted::Table(table)) => table,
            _ => return Ok(None),
        };
        if let Some(keys) = unexpected_keys(table, &["text", "file"]) {
            self.push(ConfigurationError::structural(
                "project.license",
                format!("Field \"project.license\" contains unexpected keys: {keys}"),
            ))?;
            return Ok(None);
        }
        let text = get_str(table, "text").filter(|t| !t.is_empty());
        let file = get_str(table, "file").filter(|f| !f.is_empty());
        match (text, file) {
            (Some(text), None) => Ok(Some(LicenseField::Legacy(License::new(text, None)))),
            (None, Some(file)) => Ok(self
                .read("project.license.file", file)?
                .map(|text| LicenseField::Legacy(License::new(text, Some(PathBuf::from(file)))))),
            _ => {
                self.push(ConfigurationError::structural(
                    "project.license",
                    "Field \"project.license\" must have exactly one of \"text\" or \"file\" keys",
                ))?;
                Ok(None)
            }
        }
    }

    fn license_files(&mut self) -> Result<Option<Vec<PathBuf>>, MetadataError> {
        let Some(patterns) = self.string_list(ProjectField::LicenseFiles)? else {
            return Ok(None);
        };
        let mut files = Vec::new();
        for (i, pattern) in patterns.into_iter().enumerate() {
            let key = format!("project.license-files[{i}]");
            let escapes = pattern.starts_with('/')
                || pattern.contains('\\')
                || pattern.split('/').any(|part| part == "..");
            if escapes {
                self.push(ConfigurationError::syntactic(
                    &key,
                    format!("Field \"{key}\" is an invalid glob: the pattern must match files within the project directory"),
                ))?;
                continue;
            }
            match self.source.glob(pattern) {
                Ok(matched) if matched.is_empty() => {
                    self.push(ConfigurationError::semantic(
                        &key,
                        format!("Field \"{key}\" does not match any file"),
                    ))?;
                }
                Ok(matched) => files.extend(matched),
                Err(ContentError::InvalidPattern(reason)) => {
                    self.push(ConfigurationError::syntactic(
                        &key,
                        format!("Field \"{key}\" is an invalid glob: {reason}"),
                    ))?;
                }
                Err(e) => {
                    self.push(ConfigurationError::structural(
                        &key,
                        format!("Field \"{key}\" could not be expanded: {e}"),
                    ))?;
                }
            }
        }
        files.sort();
        files.dedup();
        Ok(Some(files))
    }

    fn contacts(&mut self, field: ProjectField) -> Result<Vec<Contact>, MetadataError> {
        let Some(Extracted::ContactList(tables)) = self.field(field)? else {
            return Ok(Vec::new());
        };
        let mut contacts = Vec::with_capacity(tables.len());
        for (i, table) in tables.into_iter().enumerate() {
            let key = format!("{}[{i}]", field.path());
            if let Some(keys) = unexpected_keys(table, &["name", "email"]) {
                self.push(ConfigurationError::structural(
                    &key,
                    format!("Field \"{key}\" contains unexpected keys: {keys}"),
                ))?;
                continue;
            }
            let name = get_str(table, "name").map(str::to_string);
            let email = get_str(table, "email").map(str::to_string);
            if name.is_none() && email.is_none() {
                self.push(ConfigurationError::structural(
                    &key,
                    format!("Field \"{key}\" must have at least one of \"name\" or \"email\" keys"),
                ))?;
                continue;
            }
            contacts.push(Contact { name, email });
        }
        Ok(contacts)
    }

    fn urls(&mut self) -> Result<IndexMap<String, String>, MetadataError> {
        let table = self.owned_table(ProjectField::Urls)?;
        let mut urls = IndexMap::with_capacity(table.len());
        for (label, url) in table {
            if label.chars().count() > MAX_URL_LABEL_LEN {
                self.push(ConfigurationError::syntactic(
                    format!("project.urls.{label}"),
                    format!("Field \"project.urls\" contains a label longer than {MAX_URL_LABEL_LEN} characters"),
                ))?;
                continue;
            }
            urls.insert(label, url);
        }
        Ok(urls)
    }

    fn entry_points(&mut self) -> Result<IndexMap<String, IndexMap<String, String>>, MetadataError> {
        let Some(Extracted::TableOfTables(groups)) = self.field(ProjectField::EntryPoints)? else {
            return Ok(IndexMap::new());
        };
        let mut entry_points = IndexMap::with_capacity(groups.len());
        for (group, entries) in groups {
            let key = format!("project.entry-points.{group}");
            let reserved = match group {
                "console_scripts" => Some("project.scripts"),
                "gui_scripts" => Some("project.gui-scripts"),
                _ => None,
            };
            if let Some(field) = reserved {
                self.push(ConfigurationError::semantic(
                    &key,
                    format!("Field \"project.entry-points\" must not contain a \"{group}\" group, use \"{field}\" instead"),
                ))?;
                continue;
            }
            if !entry_point_group_regex().is_match(group) {
                self.push(ConfigurationError::syntactic(
                    &key,
                    "Field \"project.entry-points\" contains an invalid group name, expecting dot-separated alphanumeric or underscore segments",
                ))?;
                continue;
            }
            let entries = entries
                .into_iter()
                .map(|(name, target)| (name.to_string(), target.to_string()))
                .collect();
            entry_points.insert(group.to_string(), entries);
        }
        Ok(entry_points)
    }

    fn requirement(&mut self, key: &str, text: &str) -> Result<Option<Requirement>, MetadataError> {
        self.errors.check(Requirement::parse(text).map_err(|e| {
            ConfigurationError::syntactic(
                key,
                format!("Field \"{key}\" is an invalid PEP 508 requirement: {e}"),
            )
        }))
    }

    fn dependencies(&mut self) -> Result<Vec<Requirement>, MetadataError> {
        let Some(items) = self.string_list(ProjectField::Dependencies)? else {
            return Ok(Vec::new());
        };
        let mut requirements = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let key = format!("project.dependencies[{i}]");
            if let Some(requirement) = self.requirement(&key, item)? {
                self.check_extras(&key, &requirement)?;
                requirements.push(requirement);
            }
        }
        Ok(requirements)
    }

    fn optional_dependencies(
        &mut self,
    ) -> Result<IndexMap<ExtraName, Vec<Requirement>>, MetadataError> {
        let extracted = self.field(ProjectField::OptionalDependencies)?;
        let Some(Extracted::TableOfStringLists(lists)) = extracted else {
            return Ok(IndexMap::new());
        };

        let mut extras = IndexMap::with_capacity(lists.len());
        for (raw, items) in lists {
            let key = format!("project.optional-dependencies.{raw}");
            let extra = match ExtraName::new(raw) {
                Ok(extra) => extra,
                Err(e) => {
                    self.push(ConfigurationError::syntactic(
                        &key,
                        format!("Field \"{key}\" has an invalid extra name: {e}"),
                    ))?;
                    continue;
                }
            };
            if extras.contains_key(&extra) {
                self.push(ConfigurationError::semantic(
                    &key,
                    format!("Field \"{key}\" duplicates extra \"{extra}\" after normalization"),
                ))?;
                continue;
            }
            let mut requirements = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let key = format!("{key}[{i}]");
                if let Some(requirement) = self.requirement(&key, item)? {
                    self.check_extras(&key, &requirement)?;
                    requirements.push(requirement);
                }
            }
            extras.insert(extra, requirements);
        }
        Ok(extras)
    }

    fn import_names(
        &mut self,
        field: ProjectField,
        seen: &mut HashSet<String>,
    ) -> Result<Option<Vec<ImportName>>, MetadataError> {
        let Some(items) = self.string_list(field)? else {
            return Ok(None);
        };
        let mut names = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let key = format!("{}[{i}]", field.path());
            match ImportName::parse(item) {
                Ok(name) => {
                    if !seen.insert(name.name().to_string()) {
                        self.push(ConfigurationError::semantic(
                            &key,
                            format!("Field \"{key}\" duplicates an import name listed earlier"),
                        ))?;
                        continue;
                    }
                    names.push(name);
                }
                Err(reason) => {
                    self.push(ConfigurationError::syntactic(
                        &key,
                        format!("Field \"{key}\" is not a valid import name: {reason}"),
                    ))?;
                }
            }
        }
        Ok(Some(names))
    }
}

fn build(
    project: &Map<String, Value>,
    source: &dyn ContentSource,
    config: ValidationConfig,
) -> Result<StandardMetadata, MetadataError> {
    let mut b = Builder {
        project,
        source,
        config: &config,
        dynamic: Vec::new(),
        declared_extras: None,
        errors: ErrorCollector::new(config.error_mode),
        warnings: Vec::new(),
    };

    let extra_keys = b.unknown_keys()?;
    let (dynamic, dynamic_errors) = parse_dynamic(project);
    b.dynamic = dynamic;

    let name = b.name()?;
    let version = b.version()?;
    let description = b.description()?;
    let readme = b.readme()?;
    let requires_python = b.requires_python()?;
    b.check_pinned(VersionFeatures {
        requires_python_disjunction: requires_python
            .as_ref()
            .is_some_and(RequiresPython::is_disjunction),
        ..Default::default()
    })?;

    let license = b.license()?;
    let declares_license_files = b.declares(ProjectField::LicenseFiles);
    if let Some(e) = license_files_conflict(license.as_ref(), declares_license_files) {
        b.push(e)?;
    }
    b.check_pinned(VersionFeatures {
        license_expression: license.as_ref().is_some_and(LicenseField::is_expression),
        ..Default::default()
    })?;

    let license_files = b.license_files()?;
    b.check_pinned(VersionFeatures {
        license_files: license_files.is_some(),
        ..Default::default()
    })?;

    let authors = b.contacts(ProjectField::Authors)?;
    let maintainers = b.contacts(ProjectField::Maintainers)?;
    let keywords = b.owned_list(ProjectField::Keywords)?;
    b.warnings.extend(keyword_warnings(&keywords));

    let classifiers = b.owned_list(ProjectField::Classifiers)?;
    if let Some(e) = license_classifier_conflict(license.as_ref(), &classifiers) {
        b.push(e)?;
    }

    let urls = b.urls()?;
    let scripts = b.owned_table(ProjectField::Scripts)?;
    let gui_scripts = b.owned_table(ProjectField::GuiScripts)?;
    let entry_points = b.entry_points()?;

    b.declared_extras = b.find_declared_extras();
    let dependencies = b.dependencies()?;
    let optional_dependencies = b.optional_dependencies()?;

    b.errors.extend(dynamic_errors)?;

    let mut seen = HashSet::new();
    let import_names = b.import_names(ProjectField::ImportNames, &mut seen)?;
    b.check_pinned(VersionFeatures {
        import_names: import_names.is_some(),
        ..Default::default()
    })?;
    let import_namespaces = b.import_names(ProjectField::ImportNamespaces, &mut seen)?;
    b.check_pinned(VersionFeatures {
        import_namespaces: import_namespaces.is_some(),
        ..Default::default()
    })?;

    b.errors
        .extend(dynamic_metadata_errors(&config.dynamic_metadata))?;
    b.check_pinned(VersionFeatures {
        dynamic_metadata: !config.dynamic_metadata.is_empty(),
        ..Default::default()
    })?;

    let features = version_features(
        license.as_ref(),
        license_files.is_some(),
        requires_python.as_ref(),
        &classifiers,
        import_names.is_some(),
        import_namespaces.is_some(),
        &config.dynamic_metadata,
    );
    // Pinned-version errors were reported at their fields.
    if let Ok(version) = features.resolve(config.metadata_version) {
        b.warnings.extend(features.warnings(version));
    }

    let Builder {
        errors,
        warnings,
        dynamic,
        ..
    } = b;
    errors.finish()?;
    let name = name.ok_or_else(|| {
        ConfigurationError::semantic("project.name", "Field \"project.name\" missing")
    })?;

    for warning in &warnings {
        log_warning(warning);
    }

    Ok(StandardMetadata {
        name,
        version,
        description,
        readme,
        requires_python,
        license,
        license_files,
        authors,
        maintainers,
        keywords,
        classifiers,
        urls,
        scripts,
        gui_scripts,
        entry_points,
        dependencies,
        optional_dependencies,
        import_names,
        import_namespaces,
        dynamic,
        extra_keys,
        warnings,
        config,
    })
}
