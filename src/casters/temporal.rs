//! Date and time converters
//!
//! Strings are accepted in ISO-8601-ish forms:
//! - `2014-02-02`
//! - `2014-02-02 10:10:00`, `2014-02-02T10:10:00.250`, `2014-02-02 10:10`
//! - RFC 3339 with an offset, `2014-02-02T10:10:00+03:00`
//!
//! Timestamps without an offset are read as UTC for `datetime` and as wall
//! clock for `time`.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

use super::Converter;
use crate::attribute::AttributeOptions;
use crate::error::ConversionError;
use crate::value::Value;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// A parsed timestamp, with the offset when the input carried one
enum Parsed {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl Parsed {
    fn into_datetime(self) -> DateTime<FixedOffset> {
        match self {
            Parsed::Zoned(dt) => dt,
            Parsed::Naive(naive) => naive.and_utc().fixed_offset(),
        }
    }

    fn into_wall_clock(self) -> NaiveDateTime {
        match self {
            Parsed::Zoned(dt) => dt.naive_local(),
            Parsed::Naive(naive) => naive,
        }
    }
}

fn parse_timestamp(input: &str) -> Option<Parsed> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Parsed::Zoned(dt));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(Parsed::Zoned(dt));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Parsed::Naive(naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|date| Parsed::Naive(date.and_time(NaiveTime::MIN)))
}

pub struct DateCaster;

impl Converter for DateCaster {
    fn cast(&self, value: &Value, _: &str, _: &AttributeOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Date(_) => Ok(value.clone()),
            Value::DateTime(dt) => Ok(Value::Date(dt.date_naive())),
            Value::Time(t) => Ok(Value::Date(t.date())),
            Value::String(s) => parse_timestamp(s)
                .map(|parsed| Value::Date(parsed.into_wall_clock().date()))
                .ok_or_else(|| ConversionError::new(format!("{} is invalid date", s))),
            other => Err(ConversionError::unexpected_type("a date", other)),
        }
    }
}

pub struct DateTimeCaster;

impl Converter for DateTimeCaster {
    fn cast(&self, value: &Value, _: &str, _: &AttributeOptions) -> Result<Value, ConversionError> {
        match value {
            Value::DateTime(_) => Ok(value.clone()),
            Value::Time(t) => Ok(Value::DateTime(t.and_utc().fixed_offset())),
            Value::String(s) => parse_timestamp(s)
                .map(|parsed| Value::DateTime(parsed.into_datetime()))
                .ok_or_else(|| ConversionError::new(format!("{} is invalid datetime", s))),
            other => Err(ConversionError::unexpected_type("a datetime", other)),
        }
    }
}

pub struct TimeCaster;

impl Converter for TimeCaster {
    fn cast(&self, value: &Value, _: &str, _: &AttributeOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Time(_) => Ok(value.clone()),
            Value::DateTime(dt) => Ok(Value::Time(dt.naive_local())),
            Value::String(s) => parse_timestamp(s)
                .map(|parsed| Value::Time(parsed.into_wall_clock()))
                .ok_or_else(|| ConversionError::new(format!("{} is invalid time", s))),
            other => Err(ConversionError::unexpected_type("a time", other)),
        }
    }
}
