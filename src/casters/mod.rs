//! Converter registry
//!
//! A process-wide table mapping type names (`string`, `integer`, ...) to
//! [`Converter`] implementations. The table is seeded with the built-in
//! converters on first use and may be extended at startup with
//! [`register_converter`]. Schemas resolve converters by name when they are
//! built, so later lookups never happen during a cast.

mod collections;
mod primitives;
mod temporal;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::attribute::AttributeOptions;
use crate::error::ConversionError;
use crate::value::Value;

pub use collections::{ArrayCaster, HashCaster};
pub use primitives::{BooleanCaster, FloatCaster, IntegerCaster, StringCaster, SymbolCaster};
pub use temporal::{DateCaster, DateTimeCaster, TimeCaster};

/// Converts one raw value into its target type.
///
/// Implementations must be pure: the same input always yields the same output.
pub trait Converter: Send + Sync {
    fn cast(
        &self,
        value: &Value,
        attr_name: &str,
        options: &AttributeOptions,
    ) -> Result<Value, ConversionError>;
}

impl<F> Converter for F
where
    F: Fn(&Value, &str, &AttributeOptions) -> Result<Value, ConversionError> + Send + Sync,
{
    fn cast(
        &self,
        value: &Value,
        attr_name: &str,
        options: &AttributeOptions,
    ) -> Result<Value, ConversionError> {
        self(value, attr_name, options)
    }
}

type Registry = BTreeMap<String, Arc<dyn Converter>>;

static CONVERTERS: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(builtins()));

fn builtins() -> Registry {
    let mut registry: Registry = BTreeMap::new();
    registry.insert("array".into(), Arc::new(ArrayCaster));
    registry.insert("boolean".into(), Arc::new(BooleanCaster));
    registry.insert("date".into(), Arc::new(DateCaster));
    registry.insert("datetime".into(), Arc::new(DateTimeCaster));
    registry.insert("float".into(), Arc::new(FloatCaster));
    registry.insert("hash".into(), Arc::new(HashCaster));
    registry.insert("integer".into(), Arc::new(IntegerCaster));
    registry.insert("string".into(), Arc::new(StringCaster));
    registry.insert("symbol".into(), Arc::new(SymbolCaster));
    registry.insert("time".into(), Arc::new(TimeCaster));
    registry
}

/// Add a converter to the registry, replacing any previous one with the same name
pub fn register_converter(name: impl Into<String>, converter: impl Converter + 'static) {
    let name = name.into();
    let previous = CONVERTERS.write().insert(name.clone(), Arc::new(converter));
    if previous.is_some() {
        tracing::warn!(converter = %name, "replaced registered converter");
    } else {
        tracing::debug!(converter = %name, "registered converter");
    }
}

/// Names of all registered converters
pub fn list_converters() -> BTreeSet<String> {
    CONVERTERS.read().keys().cloned().collect()
}

pub fn is_registered(name: &str) -> bool {
    CONVERTERS.read().contains_key(name)
}

/// Resolve a converter by name
pub fn lookup(name: &str) -> Option<Arc<dyn Converter>> {
    CONVERTERS.read().get(name).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_registered() {
        let names = list_converters();
        for name in [
            "array", "boolean", "date", "datetime", "float", "hash", "integer", "string",
            "symbol", "time",
        ] {
            assert!(names.contains(name), "missing built-in converter {}", name);
        }
    }

    #[test]
    fn test_register_closure() {
        register_converter(
            "registry_test_upcase",
            |value: &Value, _: &str, _: &AttributeOptions| match value {
                Value::String(s) => Ok(Value::String(s.to_uppercase())),
                other => Err(ConversionError::unexpected_type("a string", other)),
            },
        );

        let converter = lookup("registry_test_upcase").unwrap();
        let result = converter
            .cast(&Value::from("abc"), "code", &AttributeOptions::default())
            .unwrap();
        assert_eq!(result, Value::from("ABC"));
        assert!(is_registered("registry_test_upcase"));
    }

    #[test]
    fn test_unknown_lookup() {
        assert!(lookup("integr").is_none());
    }
}
