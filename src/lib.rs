//! hashcast
//!
//! Declarative coercion of untyped nested data. A schema describes the
//! expected keys, their types and nesting; casting an input hash against it
//! yields a hash with converted values, or a descriptive error for the first
//! mismatch.
//!
//! ## Example
//!
//! ```
//! use hashcast::{define_caster, CastOptions, Key, Value};
//!
//! let contact = define_caster("Contact", |s| {
//!     s.string("name");
//!     s.integer("age").optional();
//!     s.float("weight");
//! })
//! .unwrap();
//!
//! let input: Value = [
//!     (Key::symbol("name"), Value::from("Jim")),
//!     (Key::symbol("weight"), Value::from("65.5")),
//! ]
//! .into_iter()
//! .collect();
//!
//! let output = contact.cast(&input, &CastOptions::default()).unwrap();
//! assert_eq!(output[&Key::symbol("weight")], Value::Float(65.5));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! casters    registry of named converters (string, integer, ...)
//! builder    closure DSL producing Attribute trees, resolved against the registry
//! attribute  one schema rule: name, options, Rule (Convert | Nested | Delegate | Each)
//! engine     recursive cast of a Hash against an Attribute list
//! caster     Caster facade: schema built once, cast many times
//! ```

pub mod attribute;
pub mod builder;
pub mod caster;
pub mod casters;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod value;

pub use attribute::{Attribute, AttributeOptions, Rule};
pub use builder::{AttributeHandle, SchemaBuilder};
pub use caster::{define_caster, Caster, CasterLink};
pub use casters::{list_converters, register_converter, Converter};
pub use config::HashCastConfig;
pub use document::{AttributeEntry, SchemaDocument};
pub use engine::CastOptions;
pub use error::{CastError, ConversionError, ErrorKind, Result};
pub use value::{Hash, Key, KeyMode, Value};
