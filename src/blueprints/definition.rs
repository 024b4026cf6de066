//! Shared composition algorithm for blueprints and traits.
//!
//! A `Definition` owns its declarations, callbacks and overrides, and refers
//! to other traits by name. Names are resolved lazily, first against traits
//! defined locally and then against the registry, so a trait may be
//! referenced before it is defined.
//!
//! Aggregation always walks the same sequence: base traits in declared
//! order, then the definition itself, then additional traits. Multi-valued
//! fields are flattened along that sequence, single-valued overrides take the
//! last value present.

use std::fmt;

use tracing::{debug, trace};

use super::callback::{after_phase, before_phase, noop_hook, Callback, Hook};
use super::composition::Composition;
use super::declaration::{Declaration, DeclarationSet};
use super::enums::{DescribedClass, EnumSpec};
use super::registry::TraitRegistry;
use super::traits::TraitRef;
use crate::core::error::{ComposeError, Result};

/// State and algorithm shared by `Blueprint` and `Trait`
pub struct Definition {
    name: String,
    declarations: DeclarationSet,
    callbacks: Vec<Callback>,
    /// Traits introduced by this definition, unique by identity
    defined_traits: Vec<TraitRef>,
    registered_enums: Vec<EnumSpec>,
    constructor: Option<Hook>,
    construction_strategy: Option<Hook>,
    base_traits: Vec<String>,
    additional_traits: Vec<String>,
    /// Cached aggregated attributes; never copied by `clone`
    attributes: Option<DeclarationSet>,
    compiled: bool,
}

impl Definition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declarations: DeclarationSet::new(),
            callbacks: Vec::new(),
            defined_traits: Vec::new(),
            registered_enums: Vec::new(),
            constructor: None,
            construction_strategy: None,
            base_traits: Vec::new(),
            additional_traits: Vec::new(),
            attributes: None,
            compiled: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own declarations, without anything contributed by traits
    pub fn declarations(&self) -> &DeclarationSet {
        &self.declarations
    }

    /// Own callbacks, in declaration order
    pub fn own_callbacks(&self) -> &[Callback] {
        &self.callbacks
    }

    pub fn base_trait_names(&self) -> &[String] {
        &self.base_traits
    }

    pub fn additional_trait_names(&self) -> &[String] {
        &self.additional_traits
    }

    pub fn defined_traits(&self) -> &[TraitRef] {
        &self.defined_traits
    }

    pub fn registered_enums(&self) -> &[EnumSpec] {
        &self.registered_enums
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    pub fn declare_attribute(&mut self, declaration: Declaration) -> Result<()> {
        self.declarations.declare(declaration)
    }

    pub fn inherit_traits<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_traits.extend(names.into_iter().map(Into::into));
    }

    pub fn append_traits<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional_traits
            .extend(names.into_iter().map(Into::into));
    }

    /// Record a locally defined trait. Defining the same trait twice is a
    /// no-op.
    pub fn define_trait(&mut self, defined: TraitRef) {
        if !self.defined_traits.iter().any(|t| t.ptr_eq(&defined)) {
            self.defined_traits.push(defined);
        }
    }

    pub fn register_enum(&mut self, spec: EnumSpec) {
        self.registered_enums.push(spec);
    }

    pub fn add_callback(&mut self, callback: Callback) {
        self.callbacks.push(callback);
    }

    /// Bind `action` to each of the raw phase `names`
    pub fn callback<I, S>(&mut self, names: I, action: Hook)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.add_callback(Callback::new(name, action.clone()));
        }
    }

    pub fn before<I, S>(&mut self, moments: I, action: Hook)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = moments.into_iter().map(|m| before_phase(m.as_ref()));
        self.callback(names, action);
    }

    pub fn after<I, S>(&mut self, moments: I, action: Hook)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = moments.into_iter().map(|m| after_phase(m.as_ref()));
        self.callback(names, action);
    }

    pub fn define_constructor(&mut self, constructor: Hook) {
        self.constructor = Some(constructor);
    }

    pub fn to_create(&mut self, strategy: Hook) {
        self.construction_strategy = Some(strategy);
    }

    /// Install a construction strategy that does nothing
    pub fn skip_create(&mut self) {
        self.construction_strategy = Some(noop_hook());
    }

    /// Let later declarations replace earlier ones silently
    pub fn overridable(&mut self) -> &mut Self {
        self.declarations.mark_overridable();
        self
    }

    /// Register one enum spec per enum field the described class exposes
    pub fn automatically_register_defined_enums(&mut self, described: &dyn DescribedClass) {
        if let Some(fields) = described.defined_enum_fields() {
            for field in fields.into_keys() {
                self.register_enum(EnumSpec::new(field));
            }
        }
    }

    /// Define the traits generated by every registered enum
    pub fn expand_enum_traits(&mut self, described: &dyn DescribedClass) -> Result<()> {
        let mut generated = Vec::new();
        for spec in &self.registered_enums {
            generated.extend(spec.build_traits(described)?);
        }

        debug!(
            definition = %self.name,
            traits = generated.len(),
            "expanded enum traits"
        );
        for enum_trait in generated {
            self.define_trait(enum_trait.into_ref());
        }
        Ok(())
    }

    /// Look up a trait by name: local definitions first, then the registry
    pub fn find_trait(&self, name: &str, registry: &TraitRegistry) -> Option<TraitRef> {
        self.defined_traits
            .iter()
            .find(|t| t.name() == name)
            .cloned()
            .or_else(|| registry.lookup(name))
    }

    pub fn resolve_trait(&self, name: &str, registry: &TraitRegistry) -> Result<TraitRef> {
        let found = self.find_trait(name, registry);
        trace!(definition = %self.name, trait_name = name, found = found.is_some(), "resolve trait");
        found.ok_or_else(|| ComposeError::UnresolvableTrait {
            trait_name: name.to_string(),
            definition: self.name.clone(),
        })
    }

    fn resolve_all(&self, names: &[String], registry: &TraitRegistry) -> Result<Vec<TraitRef>> {
        names
            .iter()
            .map(|name| self.resolve_trait(name, registry))
            .collect()
    }

    /// Propagate locally defined traits into every composed trait.
    ///
    /// Runs once per instance. On error the definition stays uncompiled so a
    /// later call can retry after the missing trait is defined.
    pub fn compile(&mut self, registry: &TraitRegistry) -> Result<()> {
        if self.compiled {
            return Ok(());
        }

        let mut composed = self.resolve_all(&self.base_traits, registry)?;
        composed.extend(self.resolve_all(&self.additional_traits, registry)?);

        for defined in &self.defined_traits {
            for target in &composed {
                // A trait is never defined inside itself
                if target.ptr_eq(defined) {
                    continue;
                }
                target
                    .borrow_mut()?
                    .definition_mut()
                    .define_trait(defined.clone());
            }
        }

        debug!(
            definition = %self.name,
            defined = self.defined_traits.len(),
            composed = composed.len(),
            "compiled definition"
        );
        self.compiled = true;
        Ok(())
    }

    /// Aggregated attributes, computed once and cached.
    ///
    /// Declaring more attributes or traits after the first call does not
    /// invalidate the cache; clone the definition to extend it further.
    pub fn attributes(&mut self, registry: &TraitRegistry) -> Result<&DeclarationSet> {
        let list = match self.attributes.take() {
            Some(list) => list,
            None => self.aggregate_attributes(registry)?,
        };
        Ok(&*self.attributes.insert(list))
    }

    fn aggregate_attributes(&mut self, registry: &TraitRegistry) -> Result<DeclarationSet> {
        self.compile(registry)?;
        let base = self.resolve_all(&self.base_traits, registry)?;
        let additional = self.resolve_all(&self.additional_traits, registry)?;

        let mut list = DeclarationSet::new();
        for composed in &base {
            let mut composed = composed.borrow_mut()?;
            list.apply(composed.definition_mut().attributes(registry)?);
        }
        list.apply(&self.declarations);
        for composed in &additional {
            let mut composed = composed.borrow_mut()?;
            list.apply(composed.definition_mut().attributes(registry)?);
        }

        debug!(
            definition = %self.name,
            attributes = list.len(),
            "aggregated attributes"
        );
        Ok(list)
    }

    /// Callbacks of base traits, then own, then additional traits
    pub fn callbacks(&mut self, registry: &TraitRegistry) -> Result<Vec<Callback>> {
        self.aggregate_from_traits_and_self(registry, Definition::callbacks, |own| {
            own.callbacks.clone()
        })
    }

    /// Last constructor override along the aggregation sequence
    pub fn constructor(&mut self, registry: &TraitRegistry) -> Result<Option<Hook>> {
        let constructors = self.aggregate_from_traits_and_self(
            registry,
            |composed, registry| Ok(composed.constructor(registry)?.into_iter().collect()),
            |own| own.constructor.iter().cloned().collect(),
        )?;
        Ok(constructors.into_iter().last())
    }

    /// Last construction strategy along the aggregation sequence
    pub fn construction_strategy(&mut self, registry: &TraitRegistry) -> Result<Option<Hook>> {
        let strategies = self.aggregate_from_traits_and_self(
            registry,
            |composed, registry| {
                Ok(composed
                    .construction_strategy(registry)?
                    .into_iter()
                    .collect())
            },
            |own| own.construction_strategy.iter().cloned().collect(),
        )?;
        Ok(strategies.into_iter().last())
    }

    /// Every aggregated view in one bundle
    pub fn compose(&mut self, registry: &TraitRegistry) -> Result<Composition> {
        let attributes = self.attributes(registry)?.clone();
        let callbacks = self.callbacks(registry)?;
        let constructor = self.constructor(registry)?;
        let construction_strategy = self.construction_strategy(registry)?;

        Ok(Composition::new(
            self.name.clone(),
            attributes,
            callbacks,
            constructor,
            construction_strategy,
        ))
    }

    fn aggregate_from_traits_and_self<T>(
        &mut self,
        registry: &TraitRegistry,
        mut from_trait: impl FnMut(&mut Definition, &TraitRegistry) -> Result<Vec<T>>,
        from_self: impl FnOnce(&Definition) -> Vec<T>,
    ) -> Result<Vec<T>> {
        self.compile(registry)?;
        let base = self.resolve_all(&self.base_traits, registry)?;
        let additional = self.resolve_all(&self.additional_traits, registry)?;

        let mut values = Vec::new();
        for composed in &base {
            let mut composed = composed.borrow_mut()?;
            values.extend(from_trait(composed.definition_mut(), registry)?);
        }
        values.extend(from_self(self));
        for composed in &additional {
            let mut composed = composed.borrow_mut()?;
            values.extend(from_trait(composed.definition_mut(), registry)?);
        }
        Ok(values)
    }
}

impl Clone for Definition {
    /// Copies everything the caller declared. The attribute cache and the
    /// compiled flag start over so the copy can be composed differently.
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            declarations: self.declarations.clone(),
            callbacks: self.callbacks.clone(),
            defined_traits: self.defined_traits.clone(),
            registered_enums: self.registered_enums.clone(),
            constructor: self.constructor.clone(),
            construction_strategy: self.construction_strategy.clone(),
            base_traits: self.base_traits.clone(),
            additional_traits: self.additional_traits.clone(),
            attributes: None,
            compiled: false,
        }
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("name", &self.name)
            .field("declarations", &self.declarations)
            .field("callbacks", &self.callbacks)
            .field("defined_traits", &self.defined_traits)
            .field("base_traits", &self.base_traits)
            .field("additional_traits", &self.additional_traits)
            .field("constructor", &self.constructor.is_some())
            .field("construction_strategy", &self.construction_strategy.is_some())
            .field("compiled", &self.compiled)
            .finish()
    }
}

/// Common interface of blueprints and traits.
///
/// Implementors only expose their `Definition`; everything else is provided.
pub trait Composable {
    fn definition(&self) -> &Definition;
    fn definition_mut(&mut self) -> &mut Definition;

    fn name(&self) -> &str {
        self.definition().name()
    }

    fn declare_attribute(&mut self, declaration: Declaration) -> Result<()> {
        self.definition_mut().declare_attribute(declaration)
    }

    fn inherit_traits<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        Self: Sized,
    {
        self.definition_mut().inherit_traits(names)
    }

    fn append_traits<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        Self: Sized,
    {
        self.definition_mut().append_traits(names)
    }

    fn define_trait(&mut self, defined: TraitRef) {
        self.definition_mut().define_trait(defined)
    }

    fn register_enum(&mut self, spec: EnumSpec) {
        self.definition_mut().register_enum(spec)
    }

    fn add_callback(&mut self, callback: Callback) {
        self.definition_mut().add_callback(callback)
    }

    fn before<I, S>(&mut self, moments: I, action: Hook)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        Self: Sized,
    {
        self.definition_mut().before(moments, action)
    }

    fn after<I, S>(&mut self, moments: I, action: Hook)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        Self: Sized,
    {
        self.definition_mut().after(moments, action)
    }

    fn define_constructor(&mut self, constructor: Hook) {
        self.definition_mut().define_constructor(constructor)
    }

    fn to_create(&mut self, strategy: Hook) {
        self.definition_mut().to_create(strategy)
    }

    fn skip_create(&mut self) {
        self.definition_mut().skip_create()
    }

    fn overridable(&mut self) -> &mut Self
    where
        Self: Sized,
    {
        self.definition_mut().overridable();
        self
    }

    fn automatically_register_defined_enums(&mut self, described: &dyn DescribedClass) {
        self.definition_mut()
            .automatically_register_defined_enums(described)
    }

    fn expand_enum_traits(&mut self, described: &dyn DescribedClass) -> Result<()> {
        self.definition_mut().expand_enum_traits(described)
    }

    fn find_trait(&self, name: &str, registry: &TraitRegistry) -> Option<TraitRef> {
        self.definition().find_trait(name, registry)
    }

    fn compile(&mut self, registry: &TraitRegistry) -> Result<()> {
        self.definition_mut().compile(registry)
    }

    fn attributes(&mut self, registry: &TraitRegistry) -> Result<&DeclarationSet> {
        self.definition_mut().attributes(registry)
    }

    fn callbacks(&mut self, registry: &TraitRegistry) -> Result<Vec<Callback>> {
        self.definition_mut().callbacks(registry)
    }

    fn constructor(&mut self, registry: &TraitRegistry) -> Result<Option<Hook>> {
        self.definition_mut().constructor(registry)
    }

    fn construction_strategy(&mut self, registry: &TraitRegistry) -> Result<Option<Hook>> {
        self.definition_mut().construction_strategy(registry)
    }

    fn compose(&mut self, registry: &TraitRegistry) -> Result<Composition> {
        self.definition_mut().compose(registry)
    }
}
