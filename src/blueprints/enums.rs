//! Enum-derived trait expansion.
//!
//! A described class can expose enumerated fields. Each registered enum
//! field expands into one trait per value, named `<field>_<value>`, that sets
//! the field to that value and nothing else.

use indexmap::IndexMap;

use super::declaration::Declaration;
use super::definition::Composable;
use super::traits::Trait;
use crate::core::error::{ComposeError, Result};

/// Source of enumerated-field metadata.
///
/// Implementors that have no enums keep the default method, which reports
/// the capability as absent.
pub trait DescribedClass {
    /// Field name to ordered values, or `None` when not supported
    fn defined_enum_fields(&self) -> Option<IndexMap<String, Vec<String>>> {
        None
    }
}

/// A described class without enum metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct Undescribed;

impl DescribedClass for Undescribed {}

/// A described class backed by a fixed table
#[derive(Debug, Clone, Default)]
pub struct EnumTable {
    fields: IndexMap<String, Vec<String>>,
}

impl EnumTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .insert(field.into(), values.into_iter().map(Into::into).collect());
        self
    }
}

impl DescribedClass for EnumTable {
    fn defined_enum_fields(&self) -> Option<IndexMap<String, Vec<String>>> {
        Some(self.fields.clone())
    }
}

/// An enum field registered on a definition for later expansion
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSpec {
    field: String,
    /// Explicit values, used instead of the described class metadata
    values: Option<Vec<String>>,
}

impl EnumSpec {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            values: None,
        }
    }

    pub fn with_values<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            values: Some(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn trait_name(&self, value: &str) -> String {
        format!("{}_{}", self.field, value)
    }

    /// Build one trait per enum value
    pub fn build_traits(&self, described: &dyn DescribedClass) -> Result<Vec<Trait>> {
        let values = match &self.values {
            Some(values) => values.clone(),
            None => described
                .defined_enum_fields()
                .and_then(|mut fields| fields.swap_remove(&self.field))
                .ok_or_else(|| ComposeError::UnknownEnumField(self.field.clone()))?,
        };

        values
            .iter()
            .map(|value| {
                let mut enum_trait = Trait::new(self.trait_name(value));
                enum_trait.declare_attribute(Declaration::value(&self.field, value.as_str()))?;
                Ok(enum_trait)
            })
            .collect()
    }
}
