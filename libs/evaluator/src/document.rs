//! Documents as handed to the evaluator
//!
//! A document is a key plus a flat list of attributes. Attributes are shared (`Arc`) so the
//! tuples built from them can point back at their origin without owning it.

use crate::context::MapContext;
use crate::encoding;
use crate::error::{Error, Result};
use crate::number::Number;
use crate::value::{Scalar, ValueTuple};
use std::sync::Arc;

/// One stored field value with its visibility marking.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub field: Arc<str>,
    pub normalized: Scalar,
    pub raw: Scalar,
    pub visibility: Arc<str>,
}

impl Attribute {
    pub fn new(
        field: impl Into<Arc<str>>,
        normalized: impl Into<Scalar>,
        raw: impl Into<Scalar>,
    ) -> Self {
        Self {
            field: field.into(),
            normalized: normalized.into(),
            raw: raw.into(),
            visibility: Arc::from(""),
        }
    }

    pub fn with_visibility(mut self, visibility: impl Into<Arc<str>>) -> Self {
        self.visibility = visibility.into();
        self
    }
}

/// A document under evaluation.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub key: String,
    attributes: Vec<Arc<Attribute>>,
}

impl Document {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            attributes: Vec::new(),
        }
    }

    /// Text value, normalized to lower case.
    pub fn with_text(self, field: &str, value: &str) -> Self {
        self.with_attribute(Attribute::new(field, value.to_lowercase(), value))
    }

    /// Numeric value, normalized to its sortable encoding.
    pub fn with_number(self, field: &str, value: impl Into<Number>) -> Result<Self> {
        let value = value.into();
        let normalized = encoding::encode(&value).ok_or_else(|| {
            Error::Arithmetic(format!("{} cannot be encoded for field {}", value, field))
        })?;
        Ok(self.with_attribute(Attribute::new(field, normalized, value)))
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.push(attribute);
        self
    }

    pub fn push(&mut self, attribute: Attribute) {
        self.attributes.push(Arc::new(attribute));
    }

    pub fn attributes(&self) -> &[Arc<Attribute>] {
        &self.attributes
    }

    pub fn attributes_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Arc<Attribute>> {
        self.attributes.iter().filter(move |a| &*a.field == field)
    }

    /// Map context holding one tuple per attribute, grouped by field.
    ///
    /// The tuples refer back to this document's attributes, so hit provenance is only
    /// recoverable while the document is alive.
    pub fn context(&self) -> MapContext {
        let mut context = MapContext::new();
        for attribute in &self.attributes {
            context.add_tuple(ValueTuple::from_attribute(attribute));
        }
        context
    }
}
