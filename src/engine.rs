//! Casting engine
//!
//! Walks an attribute list against an input [`Hash`], converting values and
//! enforcing the presence policy of each attribute. The first failure aborts
//! the whole cast.

use crate::attribute::{Attribute, Rule};
use crate::config::HashCastConfig;
use crate::error::{CastError, ConversionError, Result};
use crate::value::{Hash, KeyMode, Value};

/// Default bound on nested hash depth
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options for a single cast call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastOptions {
    /// Representation of keys read from the input
    pub input_keys: KeyMode,
    /// Representation of keys written to the output
    pub output_keys: KeyMode,
    /// Drop unknown input keys instead of failing
    pub skip_unexpected_attributes: bool,
    /// Deepest nested hash accepted
    pub max_depth: usize,
}

impl Default for CastOptions {
    fn default() -> Self {
        Self {
            input_keys: KeyMode::Symbol,
            output_keys: KeyMode::Symbol,
            skip_unexpected_attributes: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CastOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults taken from a loaded configuration
    pub fn from_config(config: &HashCastConfig) -> Self {
        Self {
            input_keys: config.cast.input_keys,
            output_keys: config.cast.output_keys,
            skip_unexpected_attributes: config.cast.skip_unexpected_attributes,
            max_depth: config.limits.max_depth,
        }
    }

    /// Defaults taken from the process-wide configuration
    pub fn from_global() -> Self {
        Self::from_config(&crate::config::global())
    }

    pub fn input_keys(mut self, mode: KeyMode) -> Self {
        self.input_keys = mode;
        self
    }

    pub fn output_keys(mut self, mode: KeyMode) -> Self {
        self.output_keys = mode;
        self
    }

    pub fn skip_unexpected_attributes(mut self, skip: bool) -> Self {
        self.skip_unexpected_attributes = skip;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Read options from an untyped mapping on top of `self`
    pub fn merge_value(mut self, value: &Value) -> Result<Self> {
        let hash = value
            .as_hash()
            .ok_or_else(|| CastError::argument("Options should be a hash"))?;

        for (key, value) in hash {
            match key.as_str() {
                "input_keys" => {
                    self.input_keys = KeyMode::from_value(value).ok_or_else(|| {
                        CastError::argument("input_keys should be :string or :symbol")
                    })?;
                }
                "output_keys" => {
                    self.output_keys = KeyMode::from_value(value).ok_or_else(|| {
                        CastError::argument("output_keys should be :string or :symbol")
                    })?;
                }
                "skip_unexpected_attributes" => {
                    self.skip_unexpected_attributes = !matches!(value, Value::Null | Value::Boolean(false));
                }
                other => tracing::debug!(option = other, "ignoring unknown cast option"),
            }
        }
        Ok(self)
    }
}

impl TryFrom<&Value> for CastOptions {
    type Error = CastError;

    /// Key modes default to symbols; the depth limit comes from
    /// [`crate::config::global`].
    fn try_from(value: &Value) -> Result<Self> {
        let max_depth = crate::config::global().limits.max_depth;
        CastOptions::default().max_depth(max_depth).merge_value(value)
    }
}

/// Path of the attribute `name` below `prefix`: `name` or `prefix[name]`
pub(crate) fn child_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}[{}]", prefix, name)
    }
}

/// Cast a top-level input value
pub(crate) fn cast_root(attributes: &[Attribute], input: &Value, options: &CastOptions) -> Result<Hash> {
    let hash = input
        .as_hash()
        .ok_or_else(|| CastError::argument("Hash should be given"))?;
    cast_tree(attributes, hash, options, "", 0)
}

/// Cast `input` against `attributes`.
///
/// `path` is the bracketed location of `input` (empty at the top level) and
/// `depth` the number of enclosing hashes.
pub(crate) fn cast_tree(
    attributes: &[Attribute],
    input: &Hash,
    options: &CastOptions,
    path: &str,
    depth: usize,
) -> Result<Hash> {
    if depth > options.max_depth {
        return Err(CastError::Casting(format!(
            "{} exceeds maximum nesting depth of {}",
            path, options.max_depth
        )));
    }

    let mut output = Hash::with_capacity(attributes.len());

    for attribute in attributes {
        let attr_path = child_path(path, &attribute.name);
        let value = match input.get(&attribute.key(options.input_keys)) {
            Some(value) => value,
            None if attribute.is_optional() => continue,
            None => return Err(CastError::missing(&attr_path)),
        };

        tracing::trace!(path = %attr_path, converter = %attribute.type_name, "casting attribute");

        let converted = if value.is_null() && attribute.allows_nil() {
            Value::Null
        } else {
            apply(&attribute.rule, attribute, value, options, &attr_path, depth)?
        };
        output.insert(attribute.key(options.output_keys), converted);
    }

    if !options.skip_unexpected_attributes {
        check_unexpected(attributes, input, options.input_keys, path)?;
    }

    Ok(output)
}

fn check_unexpected(attributes: &[Attribute], input: &Hash, mode: KeyMode, path: &str) -> Result<()> {
    let unknown = input
        .keys()
        .find(|key| !attributes.iter().any(|attribute| attribute.key(mode) == **key));

    match unknown {
        Some(key) => Err(CastError::unexpected(&child_path(path, key.as_str()))),
        None => Ok(()),
    }
}

fn apply(
    rule: &Rule,
    attribute: &Attribute,
    value: &Value,
    options: &CastOptions,
    path: &str,
    depth: usize,
) -> Result<Value> {
    match rule {
        Rule::Convert(converter) => converter
            .cast(value, &attribute.name, &attribute.options)
            .map_err(|reason| CastError::casting(path, &reason)),
        Rule::Nested(children) => {
            let hash = expect_hash(value, path)?;
            cast_tree(children, hash, options, path, depth + 1).map(Value::Hash)
        }
        Rule::Delegate(link) => {
            let hash = expect_hash(value, path)?;
            let caster = link
                .caster()
                .ok_or_else(|| CastError::argument("Attributes block should be defined"))?;
            caster
                .cast_nested(hash, options, path, depth + 1)
                .map(Value::Hash)
        }
        // Element failures are reported under the attribute path, not per index
        Rule::Each(element) => {
            let items = value.as_array().ok_or_else(|| {
                CastError::casting(path, &ConversionError::unexpected_type("an array", value))
            })?;
            items
                .iter()
                .map(|item| apply(element, attribute, item, options, path, depth))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
    }
}

fn expect_hash<'v>(value: &'v Value, path: &str) -> Result<&'v Hash> {
    value
        .as_hash()
        .ok_or_else(|| CastError::casting(path, &ConversionError::unexpected_type("a hash", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SchemaBuilder;
    use crate::error::ErrorKind;
    use crate::value::Key;

    fn sym_hash(entries: Vec<(&str, Value)>) -> Value {
        entries
            .into_iter()
            .map(|(k, v)| (Key::symbol(k), v))
            .collect()
    }

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("", "name"), "name");
        assert_eq!(child_path("contact", "name"), "contact[name]");
        assert_eq!(child_path("a[b]", "c"), "a[b][c]");
    }

    #[test]
    fn test_optional_absent_is_omitted() {
        let attributes = SchemaBuilder::build(|s| {
            s.string("name");
            s.integer("age").optional();
            s.float("weight");
        })
        .unwrap();
        let input = sym_hash(vec![("name", "Jim".into()), ("weight", "65.5".into())]);

        let output = cast_root(&attributes, &input, &CastOptions::default()).unwrap();
        assert_eq!(output.len(), 2);
        assert_eq!(output[&Key::symbol("weight")], Value::Float(65.5));
        assert!(!output.contains_key(&Key::symbol("age")));
    }

    #[test]
    fn test_nested_missing_attribute_path() {
        let attributes = SchemaBuilder::build(|s| {
            s.hash("contact", |c| {
                c.hash("company", |co| {
                    co.string("name");
                });
            });
        })
        .unwrap();
        let input = sym_hash(vec![("contact", sym_hash(vec![("company", sym_hash(vec![]))]))]);

        let err = cast_root(&attributes, &input, &CastOptions::default()).unwrap_err();
        assert_eq!(err, CastError::MissingAttribute("contact[company][name] should be given".into()));
    }

    #[test]
    fn test_unknown_key_after_attributes() {
        let attributes = SchemaBuilder::build(|s| {
            s.string("name");
        })
        .unwrap();
        let input = sym_hash(vec![("extra", Value::Integer(1)), ("name", "Jim".into())]);

        let err = cast_root(&attributes, &input, &CastOptions::default()).unwrap_err();
        assert_eq!(err.message(), "extra is not valid attribute name");

        let output = cast_root(&attributes, &input, &CastOptions::new().skip_unexpected_attributes(true)).unwrap();
        assert_eq!(output.len(), 1);
    }

    #[test]
    fn test_key_in_wrong_mode_is_missing() {
        let attributes = SchemaBuilder::build(|s| {
            s.string("name");
        })
        .unwrap();
        let input: Value = [(Key::string("name"), Value::from("Jim"))].into_iter().collect();

        let err = cast_root(&attributes, &input, &CastOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingAttribute);
    }

    #[test]
    fn test_each_failure_is_not_indexed() {
        let attributes = SchemaBuilder::build(|s| {
            s.array("emails").each("string");
        })
        .unwrap();
        let input = sym_hash(vec![(
            "emails",
            Value::Array(vec!["a@b.com".into(), Value::Integer(2)]),
        )]);

        let err = cast_root(&attributes, &input, &CastOptions::default()).unwrap_err();
        assert_eq!(err.message(), "emails should be a string, but was Integer");
    }

    #[test]
    fn test_empty_nested_block_passes_hash_through() {
        let attributes = SchemaBuilder::build(|s| {
            s.hash("meta", |_| {});
        })
        .unwrap();
        let meta = sym_hash(vec![("k", Value::Integer(1))]);
        let input = sym_hash(vec![("meta", meta.clone())]);

        let output = cast_root(&attributes, &input, &CastOptions::default()).unwrap();
        assert_eq!(output[&Key::symbol("meta")], meta);
    }

    #[test]
    fn test_depth_guard() {
        let attributes = SchemaBuilder::build(|s| {
            s.hash("a", |a| {
                a.hash("b", |b| {
                    b.string("c");
                });
            });
        })
        .unwrap();
        let input = sym_hash(vec![(
            "a",
            sym_hash(vec![("b", sym_hash(vec![("c", "deep".into())]))]),
        )]);

        assert!(cast_root(&attributes, &input, &CastOptions::default()).is_ok());
        let err = cast_root(&attributes, &input, &CastOptions::new().max_depth(1)).unwrap_err();
        assert_eq!(err.message(), "a[b] exceeds maximum nesting depth of 1");
    }

    #[test]
    fn test_options_from_config() {
        let mut config = HashCastConfig::default();
        config.cast.output_keys = KeyMode::String;
        config.limits.max_depth = 4;

        let options = CastOptions::from_config(&config);
        assert_eq!(options.input_keys, KeyMode::Symbol);
        assert_eq!(options.output_keys, KeyMode::String);
        assert_eq!(options.max_depth, 4);
    }

    #[test]
    fn test_options_from_value() {
        let options = CastOptions::try_from(&sym_hash(vec![
            ("input_keys", Value::symbol("string")),
            ("skip_unexpected_attributes", Value::Boolean(true)),
        ]))
        .unwrap();
        assert_eq!(options.input_keys, KeyMode::String);
        assert_eq!(options.output_keys, KeyMode::Symbol);
        assert!(options.skip_unexpected_attributes);

        let err = CastOptions::try_from(&Value::Integer(1)).unwrap_err();
        assert_eq!(err.message(), "Options should be a hash");

        let err = CastOptions::try_from(&sym_hash(vec![("output_keys", "string".into())])).unwrap_err();
        assert_eq!(err.message(), "output_keys should be :string or :symbol");
    }
}
