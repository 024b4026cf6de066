//! Top-level blueprints.

use super::definition::{Composable, Definition};

/// A blueprint built directly by the caller.
///
/// Unlike a `Trait`, a blueprint is never resolved by name from other
/// definitions. Cloning a blueprint gives an uncompiled copy with an empty
/// attribute cache, ready to be extended independently.
#[derive(Debug, Clone)]
pub struct Blueprint {
    definition: Definition,
}

impl Blueprint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            definition: Definition::new(name),
        }
    }

    /// Create a blueprint that inherits `base_traits` first
    pub fn with_traits<I, S>(name: impl Into<String>, base_traits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut blueprint = Self::new(name);
        blueprint.inherit_traits(base_traits);
        blueprint
    }
}

impl Composable for Blueprint {
    fn definition(&self) -> &Definition {
        &self.definition
    }

    fn definition_mut(&mut self) -> &mut Definition {
        &mut self.definition
    }
}
