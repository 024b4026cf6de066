//! Resolved output of a composed blueprint.

use std::any::Any;

use super::callback::{Callback, Hook};
use super::declaration::DeclarationSet;

/// Everything a build engine needs from a blueprint: the merged attributes,
/// callbacks in run order, and the winning constructor and construction
/// strategy overrides.
#[derive(Clone)]
pub struct Composition {
    name: String,
    attributes: DeclarationSet,
    callbacks: Vec<Callback>,
    constructor: Option<Hook>,
    construction_strategy: Option<Hook>,
}

impl Composition {
    pub fn new(
        name: String,
        attributes: DeclarationSet,
        callbacks: Vec<Callback>,
        constructor: Option<Hook>,
        construction_strategy: Option<Hook>,
    ) -> Self {
        Self {
            name,
            attributes,
            callbacks,
            constructor,
            construction_strategy,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &DeclarationSet {
        &self.attributes
    }

    pub fn callbacks(&self) -> &[Callback] {
        &self.callbacks
    }

    /// Callbacks bound to `phase`, in run order
    pub fn callbacks_for<'a>(&'a self, phase: &'a str) -> impl Iterator<Item = &'a Callback> + 'a {
        self.callbacks.iter().filter(move |c| c.name() == phase)
    }

    /// Run every callback bound to `phase` against `instance`
    pub fn run_callbacks(&self, phase: &str, instance: &mut dyn Any) -> usize {
        let mut ran = 0;
        for callback in self.callbacks_for(phase) {
            callback.run(instance);
            ran += 1;
        }
        ran
    }

    pub fn constructor(&self) -> Option<&Hook> {
        self.constructor.as_ref()
    }

    pub fn construction_strategy(&self) -> Option<&Hook> {
        self.construction_strategy.as_ref()
    }
}

impl std::fmt::Debug for Composition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composition")
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .field("callbacks", &self.callbacks)
            .field("constructor", &self.constructor.is_some())
            .field("construction_strategy", &self.construction_strategy.is_some())
            .finish()
    }
}
