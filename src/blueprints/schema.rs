//! Definition file schema types for TOML deserialization.
//!
//! A definition file declares shared traits and top-level blueprints. Hooks
//! are referenced by name and resolved against a `HookCatalog` when loaded.

use indexmap::IndexMap;
use serde::Deserialize;

use super::declaration::AttributeRule;

/// Contents of one definition file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefinitionFile {
    /// Traits registered in the trait registry
    #[serde(default)]
    pub traits: Vec<DefinitionDef>,
    /// Blueprints added to the blueprint catalog
    #[serde(default)]
    pub blueprints: Vec<DefinitionDef>,
}

/// A trait or blueprint definition
#[derive(Debug, Clone, Deserialize)]
pub struct DefinitionDef {
    /// Unique name
    pub name: String,
    /// Base traits, composed before the definition's own attributes
    #[serde(default)]
    pub traits: Vec<String>,
    /// Additional traits, composed after and overriding own attributes
    #[serde(default)]
    pub append_traits: Vec<String>,
    /// Allow attributes to be redeclared silently
    #[serde(default)]
    pub overridable: bool,
    /// Install a construction strategy that does nothing
    #[serde(default)]
    pub skip_create: bool,
    /// Hook name of the constructor override
    #[serde(default)]
    pub constructor: Option<String>,
    /// Hook name of the construction strategy override
    #[serde(default)]
    pub to_create: Option<String>,
    /// Attribute declarations in file order
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeDef>,
    /// Lifecycle callbacks
    #[serde(default)]
    pub callbacks: Vec<CallbackDef>,
    /// Enum fields expanded into traits
    #[serde(default)]
    pub enums: Vec<EnumDef>,
    /// Register every enum field the described class exposes
    #[serde(default)]
    pub auto_enums: bool,
    /// Traits defined locally on this definition
    #[serde(default)]
    pub local_traits: Vec<DefinitionDef>,
}

/// Attribute value as written in a definition file.
///
/// Tables with a recognised key select a rule kind, anything else is a
/// literal value.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AttributeDef {
    Dynamic {
        expr: String,
    },
    Association {
        association: String,
        #[serde(default)]
        traits: Vec<String>,
    },
    Sequence {
        sequence: String,
    },
    Static(toml::Value),
}

impl From<AttributeDef> for AttributeRule {
    fn from(def: AttributeDef) -> Self {
        match def {
            AttributeDef::Dynamic { expr } => AttributeRule::Dynamic { expression: expr },
            AttributeDef::Association {
                association,
                traits,
            } => AttributeRule::Association {
                blueprint: association,
                traits,
            },
            AttributeDef::Sequence { sequence } => AttributeRule::Sequence { sequence },
            AttributeDef::Static(value) => AttributeRule::Static { value },
        }
    }
}

/// One hook bound to one or more lifecycle phases
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackDef {
    /// Moments prefixed with `before_`
    #[serde(default)]
    pub before: Vec<String>,
    /// Moments prefixed with `after_`
    #[serde(default)]
    pub after: Vec<String>,
    /// Raw phase names
    #[serde(default)]
    pub names: Vec<String>,
    /// Hook name in the catalog
    pub action: String,
}

/// An enum field to expand
#[derive(Debug, Clone, Deserialize)]
pub struct EnumDef {
    pub field: String,
    /// Explicit values; falls back to the described class when absent
    #[serde(default)]
    pub values: Option<Vec<String>>,
}
