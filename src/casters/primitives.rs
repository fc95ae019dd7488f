//! Scalar converters: string, symbol, integer, float, boolean

use once_cell::sync::Lazy;
use regex::Regex;

use super::Converter;
use crate::attribute::AttributeOptions;
use crate::error::ConversionError;
use crate::value::Value;

static INTEGER_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("valid integer pattern"));

static FLOAT_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("valid float pattern")
});

pub struct StringCaster;

impl Converter for StringCaster {
    fn cast(&self, value: &Value, _: &str, _: &AttributeOptions) -> Result<Value, ConversionError> {
        match value {
            Value::String(_) => Ok(value.clone()),
            Value::Symbol(s) => Ok(Value::String(s.clone())),
            other => Err(ConversionError::unexpected_type("a string", other)),
        }
    }
}

pub struct SymbolCaster;

impl Converter for SymbolCaster {
    fn cast(&self, value: &Value, _: &str, _: &AttributeOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Symbol(_) => Ok(value.clone()),
            Value::String(s) => Ok(Value::Symbol(s.clone())),
            other => Err(ConversionError::unexpected_type("a symbol", other)),
        }
    }
}

pub struct IntegerCaster;

impl Converter for IntegerCaster {
    fn cast(&self, value: &Value, _: &str, _: &AttributeOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Integer(_) => Ok(value.clone()),
            Value::Float(f) => {
                let truncated = f.trunc();
                // i64::MAX as f64 rounds up, so the upper bound is exclusive
                if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                    Ok(Value::Integer(truncated as i64))
                } else {
                    Err(ConversionError::new(format!("{} is invalid integer", f)))
                }
            }
            Value::String(s) => {
                let trimmed = s.trim();
                if !INTEGER_LITERAL.is_match(trimmed) {
                    return Err(ConversionError::new(format!("{} is invalid integer", s)));
                }
                trimmed
                    .parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|_| ConversionError::new(format!("{} is invalid integer", s)))
            }
            other => Err(ConversionError::unexpected_type("an integer", other)),
        }
    }
}

pub struct FloatCaster;

impl Converter for FloatCaster {
    fn cast(&self, value: &Value, _: &str, _: &AttributeOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Float(_) => Ok(value.clone()),
            Value::Integer(i) => Ok(Value::Float(*i as f64)),
            Value::String(s) => {
                let trimmed = s.trim();
                if !FLOAT_LITERAL.is_match(trimmed) {
                    return Err(ConversionError::new(format!("{} is invalid float", s)));
                }
                trimmed
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| ConversionError::new(format!("{} is invalid float", s)))
            }
            other => Err(ConversionError::unexpected_type("a float", other)),
        }
    }
}

pub struct BooleanCaster;

impl Converter for BooleanCaster {
    fn cast(&self, value: &Value, _: &str, _: &AttributeOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Boolean(_) => Ok(value.clone()),
            Value::Integer(1) => Ok(Value::Boolean(true)),
            Value::Integer(0) => Ok(Value::Boolean(false)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Boolean(true)),
                "false" | "0" => Ok(Value::Boolean(false)),
                _ => Err(ConversionError::new(format!("{} is invalid boolean", s))),
            },
            other => Err(ConversionError::unexpected_type("a boolean", other)),
        }
    }
}
