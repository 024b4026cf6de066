//! Load traits and blueprints from TOML definition files
//!
//! `DefinitionLoader` turns `DefinitionFile`s into registered traits and
//! catalogued blueprints. Trait references stay names until composition, so
//! files may be loaded in any order.

use std::path::Path;

use tracing::{debug, info};

use super::blueprint::Blueprint;
use super::callback::HookCatalog;
use super::declaration::Declaration;
use super::definition::Composable;
use super::enums::{DescribedClass, EnumSpec, Undescribed};
use super::registry::{BlueprintCatalog, TraitRegistry};
use super::schema::{DefinitionDef, DefinitionFile};
use super::traits::Trait;
use crate::core::config::ComposerConfig;
use crate::core::error::{ComposeError, Result};

/// Counts of what a load produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub files: usize,
    pub traits: usize,
    pub blueprints: usize,
}

impl LoadSummary {
    fn merge(&mut self, other: LoadSummary) {
        self.files += other.files;
        self.traits += other.traits;
        self.blueprints += other.blueprints;
    }
}

/// Loader that converts definition files into traits and blueprints
pub struct DefinitionLoader<'a> {
    config: &'a ComposerConfig,
    hooks: &'a HookCatalog,
    described: &'a dyn DescribedClass,
}

impl<'a> DefinitionLoader<'a> {
    /// Create a loader resolving hook names against `hooks`
    pub fn new(config: &'a ComposerConfig, hooks: &'a HookCatalog) -> Self {
        Self {
            config,
            hooks,
            described: &Undescribed,
        }
    }

    /// Use `described` as the source of enum metadata
    pub fn describing(mut self, described: &'a dyn DescribedClass) -> Self {
        self.described = described;
        self
    }

    /// Load definitions from TOML text
    pub fn load_str(
        &self,
        content: &str,
        registry: &mut TraitRegistry,
        catalog: &mut BlueprintCatalog,
    ) -> Result<LoadSummary> {
        let file: DefinitionFile =
            toml::from_str(content).map_err(|e| ComposeError::ParseError(e.to_string()))?;
        self.load_definitions(file, registry, catalog)
    }

    /// Load a single definition file from disk
    pub fn load_file(
        &self,
        path: &Path,
        registry: &mut TraitRegistry,
        catalog: &mut BlueprintCatalog,
    ) -> Result<LoadSummary> {
        let content = std::fs::read_to_string(path)?;
        let file: DefinitionFile = toml::from_str(&content)
            .map_err(|e| ComposeError::ParseError(format!("{}: {}", path.display(), e)))?;
        let summary = self.load_definitions(file, registry, catalog)?;
        debug!(
            path = %path.display(),
            traits = summary.traits,
            blueprints = summary.blueprints,
            "loaded definition file"
        );
        Ok(summary)
    }

    /// Load every definition file under `path` recursively
    pub fn load_directory(
        &self,
        path: &Path,
        registry: &mut TraitRegistry,
        catalog: &mut BlueprintCatalog,
    ) -> Result<LoadSummary> {
        let mut summary = LoadSummary::default();
        self.load_directory_recursive(path, registry, catalog, &mut summary)?;
        info!(
            path = %path.display(),
            files = summary.files,
            traits = summary.traits,
            blueprints = summary.blueprints,
            "loaded definitions"
        );
        Ok(summary)
    }

    fn load_directory_recursive(
        &self,
        path: &Path,
        registry: &mut TraitRegistry,
        catalog: &mut BlueprintCatalog,
        summary: &mut LoadSummary,
    ) -> Result<()> {
        // Sorted so re-registrations resolve the same way on every platform
        let mut entries = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        for entry_path in entries {
            if entry_path.is_dir() {
                self.load_directory_recursive(&entry_path, registry, catalog, summary)?;
            } else if self.config.is_definition_file(&entry_path) {
                summary.merge(self.load_file(&entry_path, registry, catalog)?);
            }
        }
        Ok(())
    }

    fn load_definitions(
        &self,
        file: DefinitionFile,
        registry: &mut TraitRegistry,
        catalog: &mut BlueprintCatalog,
    ) -> Result<LoadSummary> {
        let mut summary = LoadSummary {
            files: 1,
            ..Default::default()
        };

        for def in &file.traits {
            let mut built = Trait::new(&def.name);
            self.apply_definition(def, &mut built)?;
            registry.register(built);
            summary.traits += 1;
        }

        for def in &file.blueprints {
            let mut built = Blueprint::new(&def.name);
            self.apply_definition(def, &mut built)?;
            registry.register_callbacks(built.definition());
            catalog.insert(built);
            summary.blueprints += 1;
        }

        Ok(summary)
    }

    /// Fill `target` from a definition
    fn apply_definition<C: Composable>(&self, def: &DefinitionDef, target: &mut C) -> Result<()> {
        target.inherit_traits(def.traits.iter().cloned());
        target.append_traits(def.append_traits.iter().cloned());

        if def.overridable {
            target.overridable();
        }

        for (name, attribute) in &def.attributes {
            target.declare_attribute(Declaration::new(name, attribute.clone().into()))?;
        }

        for callback in &def.callbacks {
            let action = self.hooks.get(&callback.action)?;
            if !callback.before.is_empty() {
                target.before(&callback.before, action.clone());
            }
            if !callback.after.is_empty() {
                target.after(&callback.after, action.clone());
            }
            target
                .definition_mut()
                .callback(callback.names.iter().cloned(), action);
        }

        if let Some(name) = &def.constructor {
            target.define_constructor(self.hooks.get(name)?);
        }
        if let Some(name) = &def.to_create {
            target.to_create(self.hooks.get(name)?);
        }
        if def.skip_create {
            target.skip_create();
        }

        for local in &def.local_traits {
            let mut built = Trait::new(&local.name);
            self.apply_definition(local, &mut built)?;
            target.define_trait(built.into_ref());
        }

        if def.auto_enums {
            target.automatically_register_defined_enums(self.described);
        }
        for enum_def in &def.enums {
            let spec = match &enum_def.values {
                Some(values) => EnumSpec::with_values(&enum_def.field, values.iter().cloned()),
                None => EnumSpec::new(&enum_def.field),
            };
            target.register_enum(spec);
        }
        if !target.definition().registered_enums().is_empty() {
            target.expand_enum_traits(self.described)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprints::callback::noop_hook;
    use crate::blueprints::declaration::AttributeRule;
    use crate::blueprints::enums::EnumTable;

    fn hooks() -> HookCatalog {
        let mut hooks = HookCatalog::new();
        hooks.register("notify", noop_hook());
        hooks.register("save", noop_hook());
        hooks
    }

    #[test]
    fn test_load_traits_and_blueprints() {
        let config = ComposerConfig::default();
        let hooks = hooks();
        let loader = DefinitionLoader::new(&config, &hooks);
        let mut registry = TraitRegistry::new();
        let mut catalog = BlueprintCatalog::new();

        let summary = loader
            .load_str(
                r#"
[[blueprints]]
name = "user"
traits = ["named"]
append_traits = ["admin"]
to_create = "save"

[blueprints.attributes]
role = "member"

[[blueprints.callbacks]]
after = ["create"]
names = ["custom_phase"]
action = "notify"

[[traits]]
name = "named"
[traits.attributes]
name = "Ada"

[[traits]]
name = "admin"
[traits.attributes]
role = "admin"
"#,
                &mut registry,
                &mut catalog,
            )
            .unwrap();

        assert_eq!(
            summary,
            LoadSummary {
                files: 1,
                traits: 2,
                blueprints: 1
            }
        );

        let composition = catalog.compose("user", &registry).unwrap();
        let names: Vec<&str> = composition.attributes().names().collect();
        assert_eq!(names, vec!["name", "role"]);
        assert_eq!(
            composition.attributes().get("role").unwrap().rule(),
            &AttributeRule::value("admin")
        );
        let phases: Vec<&str> = composition.callbacks().iter().map(|c| c.name()).collect();
        assert_eq!(phases, vec!["after_create", "custom_phase"]);
        assert_eq!(
            registry.callback_names().names(),
            vec!["after_create", "custom_phase"]
        );
        assert!(composition.construction_strategy().is_some());
        assert!(composition.constructor().is_none());
    }

    #[test]
    fn test_unknown_hook() {
        let config = ComposerConfig::default();
        let hooks = hooks();
        let loader = DefinitionLoader::new(&config, &hooks);

        let result = loader.load_str(
            r#"
[[blueprints]]
name = "user"
constructor = "missing"
"#,
            &mut TraitRegistry::new(),
            &mut BlueprintCatalog::new(),
        );
        assert!(matches!(result, Err(ComposeError::UnknownHook(name)) if name == "missing"));
    }

    #[test]
    fn test_enum_and_local_traits() {
        let config = ComposerConfig::default();
        let hooks = hooks();
        let described = EnumTable::new().with_field("tier", ["free", "paid"]);
        let loader = DefinitionLoader::new(&config, &hooks).describing(&described);
        let mut registry = TraitRegistry::new();
        let mut catalog = BlueprintCatalog::new();

        loader
            .load_str(
                r#"
[[blueprints]]
name = "account"
auto_enums = true
append_traits = ["tier_paid", "status_archived", "trial"]

[[blueprints.enums]]
field = "status"
values = ["active", "archived"]

[[blueprints.local_traits]]
name = "trial"
skip_create = true
[blueprints.local_traits.attributes]
days = 14
"#,
                &mut registry,
                &mut catalog,
            )
            .unwrap();

        let account = catalog.get("account").unwrap();
        let defined: Vec<&str> = account
            .definition()
            .defined_traits()
            .iter()
            .map(|t| t.name())
            .collect();
        assert_eq!(
            defined,
            vec!["trial", "tier_free", "tier_paid", "status_active", "status_archived"]
        );

        let composition = catalog.compose("account", &registry).unwrap();
        let attributes = composition.attributes();
        assert_eq!(attributes.get("tier").unwrap().rule(), &AttributeRule::value("paid"));
        assert_eq!(
            attributes.get("status").unwrap().rule(),
            &AttributeRule::value("archived")
        );
        assert_eq!(attributes.get("days").unwrap().rule(), &AttributeRule::value(14i64));
        assert!(composition.construction_strategy().is_some());
    }

    #[test]
    fn test_overridable_definition_accepts_redeclaration() {
        let config = ComposerConfig::default();
        let hooks = hooks();
        let loader = DefinitionLoader::new(&config, &hooks);
        let mut registry = TraitRegistry::new();
        let mut catalog = BlueprintCatalog::new();
        loader
            .load_str(
                r#"
[[blueprints]]
name = "user"
overridable = true
[blueprints.attributes]
name = "Ada"
"#,
                &mut registry,
                &mut catalog,
            )
            .unwrap();

        let user = catalog.get_mut("user").unwrap();
        user.declare_attribute(Declaration::value("name", "Grace"))
            .unwrap();
        let composition = user.compose(&registry).unwrap();
        assert_eq!(
            composition.attributes().get("name").unwrap().rule(),
            &AttributeRule::value("Grace")
        );
    }

    #[test]
    fn test_parse_error() {
        let config = ComposerConfig::default();
        let hooks = hooks();
        let loader = DefinitionLoader::new(&config, &hooks);
        let result = loader.load_str(
            "[[blueprints]]\nattributes = 3",
            &mut TraitRegistry::new(),
            &mut BlueprintCatalog::new(),
        );
        assert!(matches!(result, Err(ComposeError::ParseError(_))));
    }
}
