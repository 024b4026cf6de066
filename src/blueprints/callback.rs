//! Lifecycle callbacks and hooks.
//!
//! A hook is an opaque action over the in-progress instance. Callbacks bind
//! a hook to a phase name such as `after_build`; the build engine walks the
//! aggregated list and runs the entries matching the current phase.

use ahash::{AHashMap, AHashSet};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::core::error::{ComposeError, Result};

/// Opaque action run against the instance being built
pub type Hook = Rc<dyn Fn(&mut dyn Any)>;

/// Wrap a closure as a `Hook`
pub fn hook(action: impl Fn(&mut dyn Any) + 'static) -> Hook {
    Rc::new(action)
}

/// A hook that does nothing, used by `skip_create`
pub fn noop_hook() -> Hook {
    Rc::new(|_: &mut dyn Any| {})
}

/// Phase name for a `before` callback
pub fn before_phase(moment: &str) -> String {
    format!("before_{}", moment)
}

/// Phase name for an `after` callback
pub fn after_phase(moment: &str) -> String {
    format!("after_{}", moment)
}

/// A hook bound to a named lifecycle phase
#[derive(Clone)]
pub struct Callback {
    name: String,
    action: Hook,
}

impl Callback {
    pub fn new(name: impl Into<String>, action: Hook) -> Self {
        Self {
            name: name.into(),
            action,
        }
    }

    /// Phase name this callback is bound to
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> &Hook {
        &self.action
    }

    pub fn run(&self, instance: &mut dyn Any) {
        (self.action)(instance)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").field("name", &self.name).finish()
    }
}

/// Phase names that some definition binds a callback to.
///
/// The build engine checks a phase against this set before walking the
/// aggregated callbacks, so phases nobody listens to cost nothing.
#[derive(Debug, Default, Clone)]
pub struct CallbackNames {
    names: AHashSet<String>,
}

impl CallbackNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a phase name, returning false if it was already known
    pub fn register(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    /// Record the phase of every callback in `callbacks`
    pub fn register_callbacks<'c>(&mut self, callbacks: impl IntoIterator<Item = &'c Callback>) {
        for callback in callbacks {
            self.register(callback.name());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Known phase names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Named hooks that definition files refer to
#[derive(Default, Clone)]
pub struct HookCatalog {
    hooks: AHashMap<String, Hook>,
    /// Returned for names that were never registered
    fallback: Option<Hook>,
}

impl HookCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog that resolves every unknown name to `fallback`
    pub fn with_fallback(fallback: Hook) -> Self {
        Self {
            hooks: AHashMap::new(),
            fallback: Some(fallback),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, action: Hook) {
        self.hooks.insert(name.into(), action);
    }

    pub fn get(&self, name: &str) -> Result<Hook> {
        self.hooks
            .get(name)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| ComposeError::UnknownHook(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.hooks.contains_key(name)
    }
}

impl fmt::Debug for HookCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.hooks.keys().collect();
        names.sort();
        f.debug_struct("HookCatalog")
            .field("hooks", &names)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
