//! Blueprint composition
//!
//! Blueprints and traits declare attributes, callbacks and construction
//! overrides, and compose further traits by name. Composition flattens base
//! traits, the definition itself and additional traits, in that order, into
//! one cached view.

pub mod blueprint;
pub mod callback;
pub mod composition;
pub mod declaration;
pub mod definition;
pub mod enums;
pub mod loader;
pub mod registry;
pub mod schema;
pub mod traits;

pub use blueprint::Blueprint;
pub use callback::{
    after_phase, before_phase, hook, noop_hook, Callback, CallbackNames, Hook, HookCatalog,
};
pub use composition::Composition;
pub use declaration::{AttributeRule, Declaration, DeclarationSet};
pub use definition::{Composable, Definition};
pub use enums::{DescribedClass, EnumSpec, EnumTable, Undescribed};
pub use loader::{DefinitionLoader, LoadSummary};
pub use registry::{BlueprintCatalog, TraitRegistry};
pub use schema::*;
pub use traits::{Trait, TraitRef};
