//! Trait registry and blueprint catalog.
//!
//! `TraitRegistry` maps trait names to shared traits and is the fallback for
//! every name a definition cannot resolve locally. It also records the
//! callback phase names of everything registered with it. `BlueprintCatalog` holds
//! the top-level blueprints produced by the definition loader.
//!
//! Both are plain values owned by the caller: build them once while loading
//! definitions, then pass them by reference into composition.

use ahash::AHashMap;
use tracing::warn;

use super::blueprint::Blueprint;
use super::callback::CallbackNames;
use super::composition::Composition;
use super::definition::{Composable, Definition};
use super::traits::TraitRef;
use crate::core::error::{ComposeError, Result};

/// Registry for looking up traits by name
#[derive(Debug, Default)]
pub struct TraitRegistry {
    traits: AHashMap<String, TraitRef>,
    callback_names: CallbackNames,
}

impl TraitRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            traits: AHashMap::new(),
            callback_names: CallbackNames::new(),
        }
    }

    /// Register a trait under its own name and return the shared handle.
    ///
    /// A later registration with the same name replaces the earlier one.
    /// Callback phases the trait binds at this point become known names.
    pub fn register(&mut self, registered: impl Into<TraitRef>) -> TraitRef {
        let handle = registered.into();
        if let Ok(registered) = handle.borrow() {
            self.register_callbacks(registered.definition());
        }
        if let Some(previous) = self
            .traits
            .insert(handle.name().to_string(), handle.clone())
        {
            warn!(trait_name = previous.name(), "trait re-registered, replacing previous definition");
        }
        handle
    }

    /// Record the callback phases of `definition` and of the traits it
    /// defines locally
    pub fn register_callbacks(&mut self, definition: &Definition) {
        let mut visited = Vec::new();
        self.register_callbacks_from(definition, &mut visited);
    }

    fn register_callbacks_from(&mut self, definition: &Definition, visited: &mut Vec<TraitRef>) {
        self.callback_names
            .register_callbacks(definition.own_callbacks());
        for local in definition.defined_traits() {
            if visited.iter().any(|seen| seen.ptr_eq(local)) {
                continue;
            }
            visited.push(local.clone());
            if let Ok(local) = local.borrow() {
                self.register_callbacks_from(local.definition(), visited);
            }
        }
    }

    /// Callback phase names known to this registry
    pub fn callback_names(&self) -> &CallbackNames {
        &self.callback_names
    }

    /// Get a trait by name
    pub fn lookup(&self, name: &str) -> Option<TraitRef> {
        self.traits.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.traits.contains_key(name)
    }

    /// Registered trait names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.traits.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }
}

/// Blueprints indexed by name
#[derive(Debug, Default)]
pub struct BlueprintCatalog {
    blueprints: AHashMap<String, Blueprint>,
}

impl BlueprintCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a blueprint, returning the one it replaced
    pub fn insert(&mut self, blueprint: Blueprint) -> Option<Blueprint> {
        self.blueprints
            .insert(blueprint.name().to_string(), blueprint)
    }

    pub fn get(&self, name: &str) -> Option<&Blueprint> {
        self.blueprints.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Blueprint> {
        self.blueprints.get_mut(name)
    }

    /// Compose the named blueprint against `registry`
    pub fn compose(&mut self, name: &str, registry: &TraitRegistry) -> Result<Composition> {
        self.blueprints
            .get_mut(name)
            .ok_or_else(|| ComposeError::BlueprintNotFound(name.to_string()))?
            .compose(registry)
    }

    /// Blueprint names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.blueprints.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprints::callback::noop_hook;
    use crate::blueprints::declaration::{AttributeRule, Declaration};
    use crate::blueprints::traits::Trait;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = TraitRegistry::new();
        assert!(registry.is_empty());

        let handle = registry.register(Trait::new("admin"));

        let found = registry.lookup("admin").unwrap();
        assert!(found.ptr_eq(&handle));
        assert!(registry.contains("admin"));
        assert!(registry.lookup("guest").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = TraitRegistry::new();
        let first = registry.register(Trait::new("admin"));
        let second = registry.register(Trait::new("admin"));

        let found = registry.lookup("admin").unwrap();
        assert!(found.ptr_eq(&second));
        assert!(!found.ptr_eq(&first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = TraitRegistry::new();
        registry.register(Trait::new("verified"));
        registry.register(Trait::new("admin"));
        assert_eq!(registry.names(), vec!["admin", "verified"]);
    }

    #[test]
    fn test_catalog_compose() {
        let mut registry = TraitRegistry::new();
        let mut admin = Trait::new("admin");
        admin
            .declare_attribute(Declaration::value("role", "admin"))
            .unwrap();
        registry.register(admin);

        let mut catalog = BlueprintCatalog::new();
        catalog.insert(Blueprint::with_traits("user", ["admin"]));

        let composition = catalog.compose("user", &registry).unwrap();
        assert_eq!(composition.name(), "user");
        assert_eq!(
            composition.attributes().get("role").unwrap().rule(),
            &AttributeRule::value("admin")
        );

        match catalog.compose("post", &registry) {
            Err(ComposeError::BlueprintNotFound(name)) => assert_eq!(name, "post"),
            other => panic!("Expected BlueprintNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_registration_records_callback_phases() {
        let mut registry = TraitRegistry::new();
        assert!(registry.callback_names().is_empty());

        let mut audited = Trait::new("audited");
        audited.before(["create", "save"], noop_hook());
        let mut stamped = Trait::new("stamped");
        stamped.after(["build"], noop_hook());
        audited.define_trait(stamped.into_ref());
        registry.register(audited);

        assert_eq!(
            registry.callback_names().names(),
            vec!["after_build", "before_create", "before_save"]
        );

        let mut blueprint = Blueprint::new("user");
        blueprint
            .definition_mut()
            .callback(["custom_phase"], noop_hook());
        registry.register_callbacks(blueprint.definition());
        assert!(registry.callback_names().contains("custom_phase"));
        assert!(!registry.callback_names().contains("after_create"));
    }
}
