//! Container converters.
//!
//! These only check the container shape. Element and nested-attribute rules
//! are applied by the casting engine.

use super::Converter;
use crate::attribute::AttributeOptions;
use crate::error::ConversionError;
use crate::value::Value;

pub struct ArrayCaster;

impl Converter for ArrayCaster {
    fn cast(&self, value: &Value, _: &str, _: &AttributeOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Array(_) => Ok(value.clone()),
            other => Err(ConversionError::unexpected_type("an array", other)),
        }
    }
}

/// Accepts any mapping unchanged; used for `hash` attributes declared
/// without nested attributes or a caster
pub struct HashCaster;

impl Converter for HashCaster {
    fn cast(&self, value: &Value, _: &str, _: &AttributeOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Hash(_) => Ok(value.clone()),
            other => Err(ConversionError::unexpected_type("a hash", other)),
        }
    }
}
