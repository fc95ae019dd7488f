//! Schema definition DSL
//!
//! A schema is defined by a plain closure that receives a [`SchemaBuilder`]
//! and declares one attribute per call:
//!
//! ```
//! use hashcast::SchemaBuilder;
//!
//! let attributes = SchemaBuilder::build(|s| {
//!     s.string("name");
//!     s.integer("age").optional();
//!     s.hash("company", |c| {
//!         c.string("name");
//!     });
//!     s.array("emails").each("string");
//!     s.array_of("social_accounts", |a| {
//!         a.string("name");
//!         a.symbol("type");
//!     });
//! })
//! .unwrap();
//!
//! assert_eq!(attributes.len(), 5);
//! ```
//!
//! Every declaration, typed helper or not, goes through
//! [`SchemaBuilder::declare`], which resolves the type name in the converter
//! registry. Declarations are checked in order when the closure returns and
//! the first invalid one fails the whole build.

use crate::attribute::{Attribute, AttributeOptions, Rule};
use crate::caster::{Caster, CasterLink};
use crate::casters::{self, Converter};
use crate::error::{CastError, Result};
use crate::value::Value;

use std::sync::Arc;

/// A declaration recorded while the definition closure runs
struct Declaration {
    type_name: String,
    name: Value,
    options: AttributeOptions,
    options_error: Option<CastError>,
    children: Option<Vec<Declaration>>,
}

/// Collects attribute declarations
#[derive(Default)]
pub struct SchemaBuilder {
    declarations: Vec<Declaration>,
}

/// Handle to the declaration just made, used to attach options
pub struct AttributeHandle<'a> {
    declaration: &'a mut Declaration,
}

impl AttributeHandle<'_> {
    pub fn optional(self) -> Self {
        self.declaration.options.optional = true;
        self
    }

    pub fn allow_nil(self) -> Self {
        self.declaration.options.allow_nil = true;
        self
    }

    /// Converter applied to every element (arrays)
    pub fn each(self, type_name: impl Into<String>) -> Self {
        self.declaration.options.each = Some(type_name.into());
        self
    }

    /// Caster used for the nested hash, or for every element of an array
    pub fn caster(self, caster: &Caster) -> Self {
        self.declaration.options.caster = Some(caster.clone());
        self
    }

    /// Replace the options with typed ones
    pub fn with_options(self, options: AttributeOptions) -> Self {
        self.declaration.options = options;
        self
    }

    /// Replace the options with an untyped mapping such as
    /// `{optional: true, each: :string}`. A non-mapping fails the build.
    pub fn options(self, options: &Value) -> Self {
        match AttributeOptions::try_from(options) {
            Ok(mut parsed) => {
                parsed.caster = self.declaration.options.caster.take();
                self.declaration.options = parsed;
            }
            Err(err) => self.declaration.options_error = Some(err),
        }
        self
    }
}

impl SchemaBuilder {
    /// Run a definition closure and return the resulting attribute list
    pub fn build<F>(block: F) -> Result<Vec<Attribute>>
    where
        F: FnOnce(&mut SchemaBuilder),
    {
        let mut builder = SchemaBuilder::default();
        block(&mut builder);
        let attributes = builder.finish()?;
        tracing::debug!(attributes = attributes.len(), "built schema");
        Ok(attributes)
    }

    fn finish(self) -> Result<Vec<Attribute>> {
        resolve_all(self.declarations)
    }

    /// Declare an attribute converted by the converter registered as `type_name`
    pub fn declare(&mut self, type_name: &str, name: impl Into<Value>) -> AttributeHandle<'_> {
        self.push(type_name, name.into(), None)
    }

    /// Declare an attribute with nested attributes
    pub fn declare_nested<F>(&mut self, type_name: &str, name: impl Into<Value>, block: F) -> AttributeHandle<'_>
    where
        F: FnOnce(&mut SchemaBuilder),
    {
        let mut nested = SchemaBuilder::default();
        block(&mut nested);
        self.push(type_name, name.into(), Some(nested.declarations))
    }

    fn push(&mut self, type_name: &str, name: Value, children: Option<Vec<Declaration>>) -> AttributeHandle<'_> {
        self.declarations.push(Declaration {
            type_name: type_name.to_string(),
            name,
            options: AttributeOptions::default(),
            options_error: None,
            children,
        });
        let index = self.declarations.len() - 1;
        AttributeHandle {
            declaration: &mut self.declarations[index],
        }
    }

    pub fn string(&mut self, name: impl Into<Value>) -> AttributeHandle<'_> {
        self.declare("string", name)
    }

    pub fn integer(&mut self, name: impl Into<Value>) -> AttributeHandle<'_> {
        self.declare("integer", name)
    }

    pub fn float(&mut self, name: impl Into<Value>) -> AttributeHandle<'_> {
        self.declare("float", name)
    }

    pub fn boolean(&mut self, name: impl Into<Value>) -> AttributeHandle<'_> {
        self.declare("boolean", name)
    }

    pub fn date(&mut self, name: impl Into<Value>) -> AttributeHandle<'_> {
        self.declare("date", name)
    }

    pub fn datetime(&mut self, name: impl Into<Value>) -> AttributeHandle<'_> {
        self.declare("datetime", name)
    }

    pub fn time(&mut self, name: impl Into<Value>) -> AttributeHandle<'_> {
        self.declare("time", name)
    }

    pub fn symbol(&mut self, name: impl Into<Value>) -> AttributeHandle<'_> {
        self.declare("symbol", name)
    }

    /// Array attribute; combine with [`AttributeHandle::each`] or
    /// [`AttributeHandle::caster`] to check elements
    pub fn array(&mut self, name: impl Into<Value>) -> AttributeHandle<'_> {
        self.declare("array", name)
    }

    /// Array whose elements are hashes described by `block`
    pub fn array_of<F>(&mut self, name: impl Into<Value>, block: F) -> AttributeHandle<'_>
    where
        F: FnOnce(&mut SchemaBuilder),
    {
        self.declare_nested("array", name, block).each("hash")
    }

    /// Nested hash described by `block`
    pub fn hash<F>(&mut self, name: impl Into<Value>, block: F) -> AttributeHandle<'_>
    where
        F: FnOnce(&mut SchemaBuilder),
    {
        self.declare_nested("hash", name, block)
    }

    /// Hash attribute without nested attributes; any mapping passes, or
    /// the one accepted by a caster set on the handle
    pub fn any_hash(&mut self, name: impl Into<Value>) -> AttributeHandle<'_> {
        self.declare("hash", name)
    }
}

fn resolve_all(declarations: Vec<Declaration>) -> Result<Vec<Attribute>> {
    declarations.into_iter().map(resolve).collect()
}

fn resolve(declaration: Declaration) -> Result<Attribute> {
    let Declaration {
        type_name,
        name,
        mut options,
        options_error,
        children,
    } = declaration;

    let converter =
        casters::lookup(&type_name).ok_or_else(|| CastError::caster_not_found(&type_name))?;

    let name = match name {
        Value::String(s) | Value::Symbol(s) => s,
        _ => return Err(CastError::argument("attribute name should be a symbol or string")),
    };

    if let Some(err) = options_error {
        return Err(err);
    }

    let children = children.map(resolve_all).transpose()?;
    let caster = options.caster.take();
    let rule = rule_for(&type_name, &name, converter, &options, children, caster)?;
    Ok(Attribute::new(name, type_name, options, rule))
}

/// Pick the casting rule for a declaration.
///
/// `hash` and `array` are structural: nested attributes or a caster turn them
/// into recursion instead of a plain shape check. Nested attributes win over
/// a caster, and both win over `each`. An empty nested block counts as none.
fn rule_for(
    type_name: &str,
    name: &str,
    converter: Arc<dyn Converter>,
    options: &AttributeOptions,
    children: Option<Vec<Attribute>>,
    caster: Option<Caster>,
) -> Result<Rule> {
    let children = children.filter(|children| !children.is_empty());
    if matches!(type_name, "hash" | "array") {
        warn_ignored(name, options, children.is_some(), caster.as_ref());
    }

    let rule = match (type_name, children, caster) {
        ("hash", Some(children), _) => Rule::Nested(children),
        ("hash", None, Some(caster)) => Rule::Delegate(CasterLink::new(caster)),
        ("array", Some(children), _) => Rule::Each(Box::new(Rule::Nested(children))),
        ("array", None, Some(caster)) => Rule::Each(Box::new(Rule::Delegate(CasterLink::new(caster)))),
        ("array", None, None) => match &options.each {
            Some(each) => {
                let element =
                    casters::lookup(each).ok_or_else(|| CastError::caster_not_found(each))?;
                Rule::Each(Box::new(Rule::Convert(element)))
            }
            None => Rule::Convert(converter),
        },
        (_, Some(_), _) => {
            return Err(CastError::argument(format!(
                "{} attribute {} can't have nested attributes",
                type_name, name
            )))
        }
        (_, None, Some(caster)) => Rule::Delegate(CasterLink::new(caster)),
        (_, None, None) => Rule::Convert(converter),
    };
    Ok(rule)
}

fn warn_ignored(name: &str, options: &AttributeOptions, has_children: bool, caster: Option<&Caster>) {
    if has_children {
        if let Some(caster) = caster {
            tracing::warn!(attribute = name, caster = caster.name(), "caster ignored, nested attributes take precedence");
        }
    }
    // `array_of` marks its elements as hashes itself
    let each = options.each.as_deref().filter(|each| *each != "hash");
    if let Some(each) = each {
        if has_children || caster.is_some() {
            tracing::warn!(attribute = name, each, "each option ignored for array of hashes");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::value::{Hash, Key};

    #[test]
    fn test_builds_attributes_in_order() {
        let attributes = SchemaBuilder::build(|s| {
            s.string("name");
            s.integer("age").optional();
            s.float("weight").allow_nil();
        })
        .unwrap();

        let names: Vec<_> = attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age", "weight"]);
        assert!(attributes[1].is_optional());
        assert!(attributes[2].allows_nil());
    }

    #[test]
    fn test_nested_hash_has_children() {
        let attributes = SchemaBuilder::build(|s| {
            s.hash("company", |c| {
                c.string("name");
            });
        })
        .unwrap();

        assert!(matches!(attributes[0].rule, Rule::Nested(_)));
        assert_eq!(attributes[0].children()[0].name, "name");
    }

    #[test]
    fn test_array_rules() {
        let attributes = SchemaBuilder::build(|s| {
            s.array("emails").each("string");
            s.array_of("accounts", |a| {
                a.symbol("type");
            });
            s.array("anything");
        })
        .unwrap();

        assert!(matches!(&attributes[0].rule, Rule::Each(inner) if matches!(**inner, Rule::Convert(_))));
        assert!(attributes[1].has_children());
        assert!(matches!(attributes[2].rule, Rule::Convert(_)));
    }

    #[test]
    fn test_unknown_converter() {
        let err = SchemaBuilder::build(|s| {
            s.declare("integr", "name");
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CasterNotFound);
        assert_eq!(err.message(), "caster with name 'integr' is not found");
    }

    #[test]
    fn test_unknown_each_converter() {
        let err = SchemaBuilder::build(|s| {
            s.array("emails").each("strng");
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CasterNotFound);
    }

    #[test]
    fn test_invalid_attribute_name() {
        let err = SchemaBuilder::build(|s| {
            s.string(4545);
        })
        .unwrap_err();
        assert_eq!(err, CastError::argument("attribute name should be a symbol or string"));
    }

    #[test]
    fn test_converter_checked_before_name() {
        let err = SchemaBuilder::build(|s| {
            s.declare("integr", 4545);
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CasterNotFound);
    }

    #[test]
    fn test_untyped_options() {
        let err = SchemaBuilder::build(|s| {
            s.string("some")
                .options(&Value::Array(vec![Value::Integer(1), Value::Integer(2)]));
        })
        .unwrap_err();
        assert_eq!(err, CastError::argument("attribute options should be a Hash"));

        let mut options = Hash::new();
        options.insert(Key::symbol("optional"), Value::Boolean(true));
        let attributes = SchemaBuilder::build(|s| {
            s.string("some").options(&Value::Hash(options));
        })
        .unwrap();
        assert!(attributes[0].is_optional());
    }

    #[test]
    fn test_nested_block_on_scalar_rejected() {
        let err = SchemaBuilder::build(|s| {
            s.declare_nested("string", "name", |n| {
                n.string("first");
            });
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn test_empty_block_is_no_block() {
        let attributes = SchemaBuilder::build(|s| {
            s.hash("meta", |_| {});
            s.array_of("tags", |_| {});
        })
        .unwrap();

        assert!(!attributes[0].has_children());
        assert!(matches!(attributes[0].rule, Rule::Convert(_)));
        assert!(matches!(&attributes[1].rule, Rule::Each(inner) if matches!(**inner, Rule::Convert(_))));
    }

    #[test]
    fn test_empty_block_falls_back_to_caster() {
        let settings = crate::caster::define_caster("Settings", |s| {
            s.string("account");
        })
        .unwrap();
        let attributes = SchemaBuilder::build(|s| {
            s.hash("settings", |_| {}).caster(&settings);
        })
        .unwrap();

        assert!(matches!(attributes[0].rule, Rule::Delegate(_)));
        assert!(attributes[0].options.caster.is_none());
    }

    #[test]
    fn test_nested_attributes_take_precedence() {
        let settings = crate::caster::define_caster("Settings", |s| {
            s.string("account");
        })
        .unwrap();
        let attributes = SchemaBuilder::build(|s| {
            s.hash("settings", |n| {
                n.integer("id");
            })
            .caster(&settings);
            s.array_of("accounts", |a| {
                a.string("name");
            })
            .each("string");
        })
        .unwrap();

        assert_eq!(attributes[0].children()[0].name, "id");
        assert_eq!(attributes[1].children()[0].name, "name");
    }

    #[test]
    fn test_first_failure_wins() {
        let err = SchemaBuilder::build(|s| {
            s.string("ok");
            s.hash("nested", |n| {
                n.declare("bogus", "x");
            });
            s.string(1);
        })
        .unwrap_err();
        assert_eq!(err.message(), "caster with name 'bogus' is not found");
    }
}
