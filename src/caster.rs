//! Caster facade
//!
//! A [`Caster`] binds a schema, built once, to a `cast` entry point. Casters
//! are cheap to clone and can be shared across threads; every clone refers to
//! the same schema.

use std::fmt;
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;

use crate::attribute::{Attribute, Rule};
use crate::builder::SchemaBuilder;
use crate::engine::{self, CastOptions};
use crate::error::{CastError, Result};
use crate::value::{hash_to_json, Hash, Value};

struct CasterInner {
    name: String,
    attributes: OnceCell<Vec<Attribute>>,
}

/// A named, reusable schema
#[derive(Clone)]
pub struct Caster {
    inner: Arc<CasterInner>,
}

/// Reference from a [`Rule::Delegate`] to the caster it hands values to.
///
/// A caster that refers to itself holds a weak reference so that dropping
/// the last outside handle frees it.
#[derive(Clone)]
pub struct CasterLink(Link);

#[derive(Clone)]
enum Link {
    Shared(Caster),
    Recursive(Weak<CasterInner>),
}

impl CasterLink {
    pub(crate) fn new(caster: Caster) -> Self {
        CasterLink(Link::Shared(caster))
    }

    /// The linked caster, unless it has been dropped
    pub fn caster(&self) -> Option<Caster> {
        match &self.0 {
            Link::Shared(caster) => Some(caster.clone()),
            Link::Recursive(weak) => weak.upgrade().map(|inner| Caster { inner }),
        }
    }

    pub fn is_recursive(&self) -> bool {
        matches!(self.0, Link::Recursive(_))
    }

    fn points_to(&self, target: &Arc<CasterInner>) -> bool {
        match &self.0 {
            Link::Shared(caster) => Arc::ptr_eq(&caster.inner, target),
            Link::Recursive(weak) => weak.as_ptr() == Arc::as_ptr(target),
        }
    }
}

impl fmt::Debug for CasterLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.caster() {
            Some(caster) => f.write_str(caster.name()),
            None => f.write_str("<dropped>"),
        }
    }
}

/// Turn links back to `target` into weak ones
fn unlink_self(rule: &mut Rule, target: &Arc<CasterInner>) {
    match rule {
        Rule::Delegate(link) if link.points_to(target) => {
            *link = CasterLink(Link::Recursive(Arc::downgrade(target)));
        }
        Rule::Nested(children) => {
            for child in children {
                unlink_self(&mut child.rule, target);
            }
        }
        Rule::Each(inner) => unlink_self(inner, target),
        Rule::Convert(_) | Rule::Delegate(_) => {}
    }
}

impl Caster {
    /// Create a caster whose attributes are defined later with [`Caster::attributes`].
    ///
    /// Useful for casters that refer to themselves.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(CasterInner {
                name: name.into(),
                attributes: OnceCell::new(),
            }),
        }
    }

    /// Create a caster and build its schema from `block`
    pub fn define<F>(name: impl Into<String>, block: F) -> Result<Self>
    where
        F: FnOnce(&mut SchemaBuilder),
    {
        let caster = Self::new(name);
        caster.attributes(block)?;
        Ok(caster)
    }

    /// Build the schema. Can only succeed once per caster.
    pub fn attributes<F>(&self, block: F) -> Result<()>
    where
        F: FnOnce(&mut SchemaBuilder),
    {
        if self.is_defined() {
            return Err(CastError::argument("Attributes block already defined"));
        }
        let attributes = SchemaBuilder::build(block)?;
        self.set_attributes(attributes)
    }

    pub(crate) fn set_attributes(&self, mut attributes: Vec<Attribute>) -> Result<()> {
        for attribute in &mut attributes {
            unlink_self(&mut attribute.rule, &self.inner);
        }
        self.inner
            .attributes
            .set(attributes)
            .map_err(|_| CastError::argument("Attributes block already defined"))?;
        tracing::debug!(caster = %self.name(), "defined caster");
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn is_defined(&self) -> bool {
        self.inner.attributes.get().is_some()
    }

    /// The top-level attributes, once defined
    pub fn schema(&self) -> Option<&[Attribute]> {
        self.inner.attributes.get().map(Vec::as_slice)
    }

    fn defined_attributes(&self) -> Result<&[Attribute]> {
        self.schema()
            .ok_or_else(|| CastError::argument("Attributes block should be defined"))
    }

    /// Cast `input`, which must be a hash
    pub fn cast(&self, input: &Value, options: &CastOptions) -> Result<Hash> {
        let attributes = self.defined_attributes()?;
        let _span = tracing::debug_span!("cast", caster = %self.name()).entered();
        engine::cast_root(attributes, input, options)
    }

    /// Cast with options given as an untyped mapping
    /// (`{input_keys: :string, output_keys: :symbol}`)
    ///
    /// The depth limit comes from the process-wide configuration.
    pub fn cast_with(&self, input: &Value, options: &Value) -> Result<Hash> {
        self.defined_attributes()?;
        let options = CastOptions::try_from(options)?;
        self.cast(input, &options)
    }

    /// Cast parsed JSON and render the result back to JSON
    pub fn cast_json(&self, input: serde_json::Value, options: &CastOptions) -> Result<serde_json::Value> {
        let output = self.cast(&Value::from(input), options)?;
        Ok(hash_to_json(&output))
    }

    /// Cast a hash nested at `path` inside another caster's input
    pub(crate) fn cast_nested(&self, input: &Hash, options: &CastOptions, path: &str, depth: usize) -> Result<Hash> {
        let attributes = self.defined_attributes()?;
        engine::cast_tree(attributes, input, options, path, depth)
    }
}

impl fmt::Debug for Caster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Caster")
            .field("name", &self.name())
            .field("attributes", &self.schema().map(<[Attribute]>::len))
            .finish()
    }
}

/// Build a reusable caster from a definition closure
pub fn define_caster<F>(name: impl Into<String>, block: F) -> Result<Caster>
where
    F: FnOnce(&mut SchemaBuilder),
{
    Caster::define(name, block)
}
