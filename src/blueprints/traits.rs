//! Named, reusable traits.
//!
//! A `Trait` composes exactly like a `Blueprint` but carries an identity that
//! registries and trait-name lists resolve against. Traits are shared between
//! many definitions through `TraitRef` handles.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use super::definition::{Composable, Definition};
use crate::core::error::{ComposeError, Result};

/// A named composable unit
#[derive(Debug, Clone)]
pub struct Trait {
    definition: Definition,
}

impl Trait {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            definition: Definition::new(name),
        }
    }

    /// Wrap into a shareable handle
    pub fn into_ref(self) -> TraitRef {
        TraitRef::from(self)
    }
}

impl Composable for Trait {
    fn definition(&self) -> &Definition {
        &self.definition
    }

    fn definition_mut(&mut self) -> &mut Definition {
        &mut self.definition
    }
}

/// Shared handle to a trait.
///
/// The name is kept outside the cell so resolution never needs to borrow a
/// trait that is currently being composed.
#[derive(Clone)]
pub struct TraitRef {
    name: Rc<str>,
    inner: Rc<RefCell<Trait>>,
}

impl TraitRef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether both handles point at the same trait
    pub fn ptr_eq(&self, other: &TraitRef) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Shared access; fails while the trait is being composed
    pub fn borrow(&self) -> Result<Ref<'_, Trait>> {
        self.inner
            .try_borrow()
            .map_err(|_| ComposeError::CircularTrait(self.name.to_string()))
    }

    /// Exclusive access; fails when the trait is already borrowed, which
    /// during composition means the trait reached itself
    pub fn borrow_mut(&self) -> Result<RefMut<'_, Trait>> {
        self.inner
            .try_borrow_mut()
            .map_err(|_| ComposeError::CircularTrait(self.name.to_string()))
    }
}

impl From<Trait> for TraitRef {
    fn from(composed: Trait) -> Self {
        Self {
            name: Rc::from(composed.name()),
            inner: Rc::new(RefCell::new(composed)),
        }
    }
}

impl fmt::Debug for TraitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TraitRef").field(&self.name).finish()
    }
}
