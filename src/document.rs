//! Declarative schema documents
//!
//! Schemas can also be written as data, for tools that receive them at run
//! time. A document is a list of attribute entries:
//!
//! ```json
//! [
//!   { "type": "string", "name": "name" },
//!   { "type": "integer", "name": "age", "optional": true },
//!   { "type": "hash", "name": "company", "attributes": [
//!       { "type": "string", "name": "name" }
//!   ]},
//!   { "type": "array", "name": "emails", "each": "string" }
//! ]
//! ```
//!
//! TOML documents use an `[[attributes]]` array of tables with the same keys.
//! Entries are replayed through [`SchemaBuilder::declare`], so they are
//! validated exactly like schemas defined in code.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::builder::SchemaBuilder;
use crate::caster::Caster;
use crate::error::{CastError, Result};

/// One attribute entry of a schema document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeEntry {
    /// Registered converter name
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub allow_nil: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub each: Option<String>,
    /// Nested attributes for `hash` entries, or `array` entries of hashes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<AttributeEntry>>,
}

/// A parsed schema document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub attributes: Vec<AttributeEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonDocument {
    List(Vec<AttributeEntry>),
    Wrapped(SchemaDocument),
}

impl SchemaDocument {
    /// Parse a JSON document, either a bare list or `{"attributes": [...]}`
    pub fn from_json_str(content: &str) -> Result<Self> {
        let document: JsonDocument = serde_json::from_str(content).map_err(invalid_document)?;
        Ok(match document {
            JsonDocument::List(attributes) => Self { attributes },
            JsonDocument::Wrapped(document) => document,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(invalid_document)
    }

    /// Read a document, choosing the format by extension (`.toml`, else JSON)
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CastError::argument(format!("invalid schema document: {}: {}", path.display(), e))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    /// Declare every entry on `builder`
    pub fn declare_into(&self, builder: &mut SchemaBuilder) {
        declare_entries(&self.attributes, builder);
    }

    /// Build a caster named `name` from this document
    pub fn into_caster(&self, name: impl Into<String>) -> Result<Caster> {
        Caster::define(name, |s| self.declare_into(s))
    }
}

fn declare_entries(entries: &[AttributeEntry], builder: &mut SchemaBuilder) {
    for entry in entries {
        let mut handle = match &entry.attributes {
            Some(children) => builder.declare_nested(&entry.type_name, entry.name.as_str(), |nested| {
                declare_entries(children, nested)
            }),
            None => builder.declare(&entry.type_name, entry.name.as_str()),
        };

        if entry.optional {
            handle = handle.optional();
        }
        if entry.allow_nil {
            handle = handle.allow_nil();
        }
        if let Some(each) = &entry.each {
            handle.each(each.clone());
        }
    }
}

fn invalid_document(err: impl std::fmt::Display) -> CastError {
    CastError::argument(format!("invalid schema document: {}", err))
}

impl Caster {
    /// Build a caster from a JSON schema document
    pub fn from_json_str(name: impl Into<String>, content: &str) -> Result<Self> {
        SchemaDocument::from_json_str(content)?.into_caster(name)
    }

    /// Build a caster from a TOML schema document
    pub fn from_toml_str(name: impl Into<String>, content: &str) -> Result<Self> {
        SchemaDocument::from_toml_str(content)?.into_caster(name)
    }

    /// Build a caster from a schema document on disk, named after the file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        SchemaDocument::from_path(path)?.into_caster(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Rule;
    use crate::error::ErrorKind;

    const CONTACT: &str = r#"[
        { "type": "string", "name": "name" },
        { "type": "integer", "name": "age", "optional": true },
        { "type": "hash", "name": "company", "attributes": [
            { "type": "string", "name": "name" }
        ]},
        { "type": "array", "name": "emails", "each": "string" }
    ]"#;

    #[test]
    fn test_json_document() {
        let caster = Caster::from_json_str("Contact", CONTACT).unwrap();
        let schema = caster.schema().unwrap();

        assert_eq!(schema.len(), 4);
        assert!(schema[1].is_optional());
        assert!(matches!(schema[2].rule, Rule::Nested(_)));
        assert!(matches!(schema[3].rule, Rule::Each(_)));
    }

    #[test]
    fn test_empty_nested_attributes() {
        let caster = Caster::from_json_str("Meta", r#"[{"type": "hash", "name": "meta", "attributes": []}]"#).unwrap();
        assert!(matches!(caster.schema().unwrap()[0].rule, Rule::Convert(_)));

        let input = crate::value::Value::from(serde_json::json!({"meta": {"k": 1}}));
        let options = crate::engine::CastOptions::new().input_keys(crate::value::KeyMode::String);
        let output = caster.cast(&input, &options).unwrap();
        assert_eq!(output.len(), 1);
    }

    #[test]
    fn test_wrapped_json_document() {
        let document = SchemaDocument::from_json_str(r#"{"attributes": [{"type": "date", "name": "born"}]}"#).unwrap();
        assert_eq!(document.attributes[0].type_name, "date");
    }

    #[test]
    fn test_toml_document() {
        let content = r#"
            [[attributes]]
            type = "string"
            name = "city"

            [[attributes]]
            type = "integer"
            name = "zip"
            allow_nil = true
        "#;
        let caster = Caster::from_toml_str("Home", content).unwrap();
        assert!(caster.schema().unwrap()[1].allows_nil());
    }

    #[test]
    fn test_unknown_type_in_document() {
        let err = Caster::from_json_str("Wrong", r#"[{"type": "integr", "name": "name"}]"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CasterNotFound);
    }

    #[test]
    fn test_malformed_document() {
        let err = SchemaDocument::from_json_str(r#"[{"name": "missing type"}]"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
        assert!(err.message().starts_with("invalid schema document"));
    }

    #[test]
    fn test_from_path_picks_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contact.json");
        std::fs::write(&path, CONTACT).unwrap();

        let caster = Caster::from_path(&path).unwrap();
        assert_eq!(caster.name(), "contact");
    }
}
