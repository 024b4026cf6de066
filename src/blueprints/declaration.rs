//! Attribute declarations and the ordered declaration set.
//!
//! A `DeclarationSet` keeps at most one declaration per attribute name and
//! remembers the position where each name first appeared. Later
//! declarations with the same name replace the value in place.

use indexmap::IndexMap;
use serde::Serialize;

use crate::core::error::{ComposeError, Result};

/// How an attribute value is produced at build time.
///
/// The composer never evaluates a rule, it only stores and merges them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AttributeRule {
    /// A literal value
    Static { value: toml::Value },
    /// An expression evaluated against the in-progress instance
    Dynamic { expression: String },
    /// Another blueprint built with the given traits
    Association {
        blueprint: String,
        traits: Vec<String>,
    },
    /// Next value of a named sequence
    Sequence { sequence: String },
}

impl AttributeRule {
    pub fn value(value: impl Into<toml::Value>) -> Self {
        AttributeRule::Static {
            value: value.into(),
        }
    }

    pub fn expression(expression: impl Into<String>) -> Self {
        AttributeRule::Dynamic {
            expression: expression.into(),
        }
    }
}

/// A single named attribute declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    name: String,
    rule: AttributeRule,
    overridable: bool,
}

impl Declaration {
    pub fn new(name: impl Into<String>, rule: AttributeRule) -> Self {
        Self {
            name: name.into(),
            rule,
            overridable: false,
        }
    }

    /// Shorthand for a declaration with a literal value
    pub fn value(name: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        Self::new(name, AttributeRule::value(value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rule(&self) -> &AttributeRule {
        &self.rule
    }

    pub fn is_overridable(&self) -> bool {
        self.overridable
    }

    /// Allow a later declaration of the same name to replace this one
    pub fn overridable(mut self) -> Self {
        self.overridable = true;
        self
    }
}

/// Ordered, name-keyed set of attribute declarations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclarationSet {
    declarations: IndexMap<String, Declaration>,
    overridable: bool,
}

impl DeclarationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a declaration, replacing an existing one of the same name.
    ///
    /// Replacement keeps the original position and is only allowed when the
    /// set or the existing declaration is overridable.
    pub fn declare(&mut self, mut declaration: Declaration) -> Result<()> {
        if self.overridable {
            declaration.overridable = true;
        }

        if let Some(existing) = self.declarations.get(&declaration.name) {
            if !existing.overridable {
                return Err(ComposeError::AttributeAlreadyDefined(declaration.name));
            }
        }

        self.declarations
            .insert(declaration.name.clone(), declaration);
        Ok(())
    }

    /// Right-biased stable merge of `other` into this set.
    ///
    /// Values from `other` win. Names already present keep their position,
    /// new names are appended in `other`'s order.
    pub fn apply(&mut self, other: &DeclarationSet) {
        for declaration in other.iter() {
            let mut declaration = declaration.clone();
            if self.overridable {
                declaration.overridable = true;
            }
            self.declarations
                .insert(declaration.name.clone(), declaration);
        }
    }

    /// Mark current and future declarations as overridable
    pub fn mark_overridable(&mut self) {
        self.overridable = true;
        for declaration in self.declarations.values_mut() {
            declaration.overridable = true;
        }
    }

    pub fn is_overridable(&self) -> bool {
        self.overridable
    }

    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.declarations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    /// Position of `name` in iteration order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.declarations.get_index_of(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.declarations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}
