//! # Field Extractor
//!
//! Converts one `[project]` value into a borrowed, shape-checked
//! [`Extracted`] value according to its [`FieldShape`]. Every shape is
//! checked by the same code path; mismatches report the precise nested path
//! (`project.keywords[1]`, `project.urls.homepage`,
//! `project.entry-points.console.cli`) and the observed type category.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::ConfigurationError;
use crate::field::{FieldShape, ProjectField, ValueKind};

/// A shape-checked field value borrowing from the input.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Extracted<'a> {
    String(&'a str),
    StringList(Vec<&'a str>),
    StringTable(IndexMap<&'a str, &'a str>),
    /// Contact tables; every value is known to be a string.
    ContactList(Vec<&'a Map<String, Value>>),
    /// A table whose values are known to be strings.
    Table(&'a Map<String, Value>),
    TableOfTables(IndexMap<&'a str, IndexMap<&'a str, &'a str>>),
    TableOfStringLists(IndexMap<&'a str, Vec<&'a str>>),
}

/// Extract `field` from `project`. Absent fields yield `Ok(None)`.
pub(crate) fn extract<'a>(
    project: &'a Map<String, Value>,
    field: ProjectField,
) -> Result<Option<Extracted<'a>>, ConfigurationError> {
    let Some(value) = project.get(field.as_str()) else {
        return Ok(None);
    };
    let path = field.path();
    let shape = field.shape();
    let extracted = match shape {
        FieldShape::String => Extracted::String(string(value, &path)?),
        FieldShape::StringList => Extracted::StringList(string_list(value, &path, shape)?),
        FieldShape::StringTable => Extracted::StringTable(string_table(value, &path, shape)?),
        FieldShape::ContactList => {
            let items = array(value, &path, shape)?;
            let mut contacts = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{path}[{i}]");
                let table = item.as_object().ok_or_else(|| {
                    ConfigurationError::invalid_type(&item_path, "a table", ValueKind::of(item))
                })?;
                string_values(table, &item_path)?;
                contacts.push(table);
            }
            Extracted::ContactList(contacts)
        }
        FieldShape::StringOrTable => match value {
            Value::String(s) => Extracted::String(s),
            Value::Object(table) => {
                string_values(table, &path)?;
                Extracted::Table(table)
            }
            other => {
                return Err(ConfigurationError::invalid_type(
                    path,
                    shape.describe(),
                    ValueKind::of(other),
                ))
            }
        },
        FieldShape::TableOfTables => {
            let mut groups = IndexMap::new();
            for (group, entries) in table(value, &path, shape)? {
                let group_path = format!("{path}.{group}");
                let entries =
                    string_table(entries, &group_path, FieldShape::StringTable)?;
                groups.insert(group.as_str(), entries);
            }
            Extracted::TableOfTables(groups)
        }
        FieldShape::TableOfStringLists => {
            let mut lists = IndexMap::new();
            for (key, items) in table(value, &path, shape)? {
                let key_path = format!("{path}.{key}");
                let items = string_list(items, &key_path, FieldShape::StringList)?;
                lists.insert(key.as_str(), items);
            }
            Extracted::TableOfStringLists(lists)
        }
    };
    Ok(Some(extracted))
}

fn string<'a>(value: &'a Value, path: &str) -> Result<&'a str, ConfigurationError> {
    value
        .as_str()
        .ok_or_else(|| ConfigurationError::invalid_type(path, "a string", ValueKind::of(value)))
}

fn array<'a>(
    value: &'a Value,
    path: &str,
    shape: FieldShape,
) -> Result<&'a Vec<Value>, ConfigurationError> {
    value
        .as_array()
        .ok_or_else(|| ConfigurationError::invalid_type(path, shape.describe(), ValueKind::of(value)))
}

fn table<'a>(
    value: &'a Value,
    path: &str,
    shape: FieldShape,
) -> Result<&'a Map<String, Value>, ConfigurationError> {
    value
        .as_object()
        .ok_or_else(|| ConfigurationError::invalid_type(path, shape.describe(), ValueKind::of(value)))
}

fn string_list<'a>(
    value: &'a Value,
    path: &str,
    shape: FieldShape,
) -> Result<Vec<&'a str>, ConfigurationError> {
    array(value, path, shape)?
        .iter()
        .enumerate()
        .map(|(i, item)| string(item, &format!("{path}[{i}]")))
        .collect()
}

fn string_table<'a>(
    value: &'a Value,
    path: &str,
    shape: FieldShape,
) -> Result<IndexMap<&'a str, &'a str>, ConfigurationError> {
    table(value, path, shape)?
        .iter()
        .map(|(k, v)| string(v, &format!("{path}.{k}")).map(|s| (k.as_str(), s)))
        .collect()
}

fn string_values(table: &Map<String, Value>, path: &str) -> Result<(), ConfigurationError> {
    for (k, v) in table {
        string(v, &format!("{path}.{k}"))?;
    }
    Ok(())
}

/// Look up a string value of a table already checked by [`extract`].
pub(crate) fn get_str<'a>(table: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    table.get(key).and_then(Value::as_str)
}

/// `"a", "b"` list of the keys of `table` outside `allowed`, sorted.
pub(crate) fn unexpected_keys(table: &Map<String, Value>, allowed: &[&str]) -> Option<String> {
    let mut extra: Vec<&str> = table
        .keys()
        .map(String::as_str)
        .filter(|k| !allowed.contains(k))
        .collect();
    if extra.is_empty() {
        return None;
    }
    extra.sort_unstable();
    Some(
        extra
            .iter()
            .map(|k| format!("\"{k}\""))
            .collect::<Vec<_>>()
            .join(", "),
    )
}
