//! Attribute metadata
//!
//! One [`Attribute`] is one schema rule: the key it governs, how its value is
//! converted and the presence policy. Attributes are produced by the
//! [`SchemaBuilder`](crate::builder::SchemaBuilder) and never change afterwards.

use std::fmt;
use std::sync::Arc;

use crate::caster::{Caster, CasterLink};
use crate::casters::Converter;
use crate::error::{CastError, Result};
use crate::value::{Key, Value};

/// Options recognized on an attribute declaration
#[derive(Clone, Default)]
pub struct AttributeOptions {
    /// Missing key is not an error
    pub optional: bool,
    /// A present null skips conversion and is written as null
    pub allow_nil: bool,
    /// Converter name applied to every element of an array
    pub each: Option<String>,
    /// Full caster used for a nested hash or for every element of an array.
    /// Moved into the attribute's [`Rule`] when the schema is built.
    pub caster: Option<Caster>,
}

impl AttributeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn allow_nil(mut self) -> Self {
        self.allow_nil = true;
        self
    }

    pub fn each(mut self, type_name: impl Into<String>) -> Self {
        self.each = Some(type_name.into());
        self
    }

    pub fn caster(mut self, caster: &Caster) -> Self {
        self.caster = Some(caster.clone());
        self
    }
}

impl fmt::Debug for AttributeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeOptions")
            .field("optional", &self.optional)
            .field("allow_nil", &self.allow_nil)
            .field("each", &self.each)
            .field("caster", &self.caster.as_ref().map(Caster::name))
            .finish()
    }
}

impl TryFrom<&Value> for AttributeOptions {
    type Error = CastError;

    /// Read options from an untyped mapping (`{optional: true, each: :string}`).
    ///
    /// Flags follow truthiness: anything but null or `false` enables them.
    fn try_from(value: &Value) -> Result<Self> {
        let hash = value
            .as_hash()
            .ok_or_else(|| CastError::argument("attribute options should be a Hash"))?;

        let mut options = AttributeOptions::default();
        for (key, value) in hash {
            match key.as_str() {
                "optional" => options.optional = truthy(value),
                "allow_nil" => options.allow_nil = truthy(value),
                "each" => {
                    let name = value.as_name().ok_or_else(|| {
                        CastError::argument("each option should be a symbol or string")
                    })?;
                    options.each = Some(name.to_string());
                }
                other => tracing::debug!(option = other, "ignoring unknown attribute option"),
            }
        }
        Ok(options)
    }
}

fn truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Boolean(false))
}

/// How an attribute's value is turned into output
#[derive(Clone)]
pub enum Rule {
    /// Invoke a registered converter
    Convert(Arc<dyn Converter>),
    /// Recurse into the engine with these attributes as the sub-schema
    Nested(Vec<Attribute>),
    /// Hand the value to another caster
    Delegate(CasterLink),
    /// Apply the inner rule to every element of an array
    Each(Box<Rule>),
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Convert(_) => f.write_str("Convert"),
            Rule::Nested(children) => f.debug_tuple("Nested").field(children).finish(),
            Rule::Delegate(link) => f.debug_tuple("Delegate").field(link).finish(),
            Rule::Each(inner) => f.debug_tuple("Each").field(inner).finish(),
        }
    }
}

/// A single schema rule
#[derive(Debug, Clone)]
pub struct Attribute {
    /// Key this rule governs
    pub name: String,
    /// Registered converter name used in the declaration
    pub type_name: String,
    pub options: AttributeOptions,
    pub rule: Rule,
}

impl Attribute {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        options: AttributeOptions,
        rule: Rule,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            options,
            rule,
        }
    }

    /// Nested attributes, empty unless this is a nested hash (or array of them)
    pub fn children(&self) -> &[Attribute] {
        match &self.rule {
            Rule::Nested(children) => children,
            Rule::Each(inner) => match inner.as_ref() {
                Rule::Nested(children) => children,
                _ => &[],
            },
            _ => &[],
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    pub fn is_optional(&self) -> bool {
        self.options.optional
    }

    pub fn is_required(&self) -> bool {
        !self.is_optional()
    }

    pub fn allows_nil(&self) -> bool {
        self.options.allow_nil
    }

    /// Key used to read or write this attribute in the given representation
    pub fn key(&self, mode: crate::value::KeyMode) -> Key {
        mode.key(&self.name)
    }
}
