//! Definition loader integration tests
//!
//! Writes definition files to a temporary directory and checks that loaded
//! traits and blueprints compose like code-built ones, regardless of which
//! file declares what.

use blueprint_composer::blueprints::*;
use blueprint_composer::core::config::ComposerConfig;
use blueprint_composer::core::error::ComposeError;
use std::fs;
use std::path::Path;

const TRAITS_TOML: &str = r#"
[[traits]]
name = "admin"
traits = ["verified"]
[traits.attributes]
role = "admin"

[[traits]]
name = "verified"
[traits.attributes]
verified = true
role = "member"

[[traits.callbacks]]
after = ["create"]
action = "send_welcome"
"#;

const BLUEPRINTS_TOML: &str = r#"
[[blueprints]]
name = "user"
append_traits = ["admin"]
to_create = "persist"

[blueprints.attributes]
name = "Ada"
email = { sequence = "email" }
manager = { association = "user", traits = ["admin"] }

[[blueprints.callbacks]]
before = ["create"]
action = "normalize_email"

[[blueprints]]
name = "guest"
skip_create = true
[blueprints.attributes]
name = "Guest"
"#;

fn hooks() -> HookCatalog {
    let mut hooks = HookCatalog::new();
    for name in ["send_welcome", "normalize_email", "persist"] {
        hooks.register(name, noop_hook());
    }
    hooks
}

fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn test_load_directory_recursively() {
    let dir = tempfile::tempdir().unwrap();
    // Blueprints sort before traits, so names resolve lazily at composition
    write(dir.path(), "a/blueprints.toml", BLUEPRINTS_TOML);
    write(dir.path(), "b/nested/traits.toml", TRAITS_TOML);
    write(dir.path(), "notes.md", "not a definition");

    let config = ComposerConfig::default();
    let hooks = hooks();
    let mut registry = TraitRegistry::new();
    let mut catalog = BlueprintCatalog::new();

    let summary = DefinitionLoader::new(&config, &hooks)
        .load_directory(dir.path(), &mut registry, &mut catalog)
        .unwrap();

    assert_eq!(summary.files, 2);
    assert_eq!(summary.traits, 2);
    assert_eq!(summary.blueprints, 2);
    assert_eq!(catalog.names(), vec!["guest", "user"]);
    assert_eq!(registry.names(), vec!["admin", "verified"]);

    let user = catalog.compose("user", &registry).unwrap();
    let names: Vec<&str> = user.attributes().names().collect();
    assert_eq!(names, vec!["name", "email", "manager", "verified", "role"]);
    assert_eq!(
        user.attributes().get("role").unwrap().rule(),
        &AttributeRule::value("admin")
    );
    assert_eq!(
        user.attributes().get("manager").unwrap().rule(),
        &AttributeRule::Association {
            blueprint: "user".to_string(),
            traits: vec!["admin".to_string()],
        }
    );

    let phases: Vec<&str> = user.callbacks().iter().map(|c| c.name()).collect();
    assert_eq!(phases, vec!["before_create", "after_create"]);
    assert!(user.construction_strategy().is_some());

    let guest = catalog.compose("guest", &registry).unwrap();
    assert_eq!(guest.attributes().len(), 1);
    assert!(guest.construction_strategy().is_some());
}

#[test]
fn test_custom_extension() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "traits.bp", TRAITS_TOML);
    write(dir.path(), "ignored.toml", "this is not valid toml [");

    let config = ComposerConfig::from_toml_str(r#"definition_extension = "bp""#).unwrap();
    let hooks = hooks();
    let mut registry = TraitRegistry::new();
    let mut catalog = BlueprintCatalog::new();

    let summary = DefinitionLoader::new(&config, &hooks)
        .load_directory(dir.path(), &mut registry, &mut catalog)
        .unwrap();
    assert_eq!(summary.files, 1);
    assert!(registry.contains("verified"));
}

#[test]
fn test_missing_trait_surfaces_at_composition() {
    let config = ComposerConfig::default();
    let hooks = hooks();
    let mut registry = TraitRegistry::new();
    let mut catalog = BlueprintCatalog::new();

    // Loading succeeds, the admin trait file was never loaded
    DefinitionLoader::new(&config, &hooks)
        .load_str(BLUEPRINTS_TOML, &mut registry, &mut catalog)
        .unwrap();

    match catalog.compose("user", &registry) {
        Err(ComposeError::UnresolvableTrait { trait_name, .. }) => {
            assert_eq!(trait_name, "admin")
        }
        other => panic!("Expected UnresolvableTrait, got {:?}", other),
    }
    assert!(catalog.compose("guest", &registry).is_ok());
}

#[test]
fn test_parse_error_names_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "broken.toml", "[[traits]]\nname = ");

    let config = ComposerConfig::default();
    let hooks = hooks();
    let result = DefinitionLoader::new(&config, &hooks).load_directory(
        dir.path(),
        &mut TraitRegistry::new(),
        &mut BlueprintCatalog::new(),
    );

    match result {
        Err(ComposeError::ParseError(message)) => assert!(message.contains("broken.toml")),
        other => panic!("Expected ParseError, got {:?}", other),
    }
}

#[test]
fn test_missing_directory_is_io_error() {
    let config = ComposerConfig::default();
    let hooks = hooks();
    let result = DefinitionLoader::new(&config, &hooks).load_directory(
        Path::new("/nonexistent/definitions"),
        &mut TraitRegistry::new(),
        &mut BlueprintCatalog::new(),
    );
    assert!(matches!(result, Err(ComposeError::IoError(_))));
}
