//! Blueprint Composer - Entry Point
//!
//! Loads a directory of definition files and prints the composed view of a
//! blueprint: merged attributes, callbacks in run order, and which
//! construction overrides won.

use std::fmt::Write;
use std::path::PathBuf;

use blueprint_composer::blueprints::{
    hook, AttributeRule, BlueprintCatalog, Composition, DefinitionLoader, HookCatalog,
    TraitRegistry,
};
use blueprint_composer::core::config::ComposerConfig;
use blueprint_composer::core::error::Result;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Inspect composed blueprints
#[derive(Parser, Debug)]
#[command(name = "blueprint-composer")]
#[command(about = "Compose blueprints from TOML definitions and print the result")]
struct Args {
    /// Blueprint to compose; lists all blueprints when omitted
    blueprint: Option<String>,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Definitions directory (overrides the configured one)
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

/// JSON output structure
#[derive(Serialize)]
struct CompositionReport<'a> {
    blueprint: &'a str,
    attributes: Vec<AttributeReport<'a>>,
    callbacks: Vec<&'a str>,
    constructor_overridden: bool,
    construction_strategy_overridden: bool,
}

#[derive(Serialize)]
struct AttributeReport<'a> {
    name: &'a str,
    rule: &'a AttributeRule,
    overridable: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ComposerConfig::load(path)?,
        None => ComposerConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    // Hooks are opaque to the composer; every referenced name resolves to a
    // placeholder so definitions can be inspected without the build engine
    let hooks = HookCatalog::with_fallback(hook(|_| {
        tracing::trace!("placeholder hook invoked");
    }));

    let dir = args.dir.clone().unwrap_or_else(|| config.definitions_dir.clone());
    let mut registry = TraitRegistry::new();
    let mut catalog = BlueprintCatalog::new();
    DefinitionLoader::new(&config, &hooks).load_directory(&dir, &mut registry, &mut catalog)?;

    let Some(name) = args.blueprint.as_deref() else {
        println!("Blueprints:");
        for name in catalog.names() {
            println!("  {}", name);
        }
        println!("Traits:");
        for name in registry.names() {
            println!("  {}", name);
        }
        return Ok(());
    };

    let composition = catalog.compose(name, &registry)?;
    print!("{}", render(&composition, &args.format)?);

    Ok(())
}

/// Render a composition in the requested output format
fn render(composition: &Composition, format: &str) -> Result<String> {
    match format {
        "json" => Ok(format!("{}\n", serde_json::to_string_pretty(&report(composition))?)),
        "text" => Ok(render_text(composition)),
        _ => {
            eprintln!("Unknown format '{}', defaulting to text", format);
            Ok(render_text(composition))
        }
    }
}

fn report(composition: &Composition) -> CompositionReport<'_> {
    CompositionReport {
        blueprint: composition.name(),
        attributes: composition
            .attributes()
            .iter()
            .map(|declaration| AttributeReport {
                name: declaration.name(),
                rule: declaration.rule(),
                overridable: declaration.is_overridable(),
            })
            .collect(),
        callbacks: composition.callbacks().iter().map(|c| c.name()).collect(),
        constructor_overridden: composition.constructor().is_some(),
        construction_strategy_overridden: composition.construction_strategy().is_some(),
    }
}

fn render_text(composition: &Composition) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", composition.name());
    let _ = writeln!(out, "Attributes:");
    for declaration in composition.attributes().iter() {
        let rule = match declaration.rule() {
            AttributeRule::Static { value } => value.to_string(),
            AttributeRule::Dynamic { expression } => format!("expr({})", expression),
            AttributeRule::Association { blueprint, traits } if traits.is_empty() => {
                format!("association({})", blueprint)
            }
            AttributeRule::Association { blueprint, traits } => {
                format!("association({} with {})", blueprint, traits.join(", "))
            }
            AttributeRule::Sequence { sequence } => format!("sequence({})", sequence),
        };
        let _ = writeln!(out, "  {:<20} {}", declaration.name(), rule);
    }

    let _ = writeln!(out, "Callbacks:");
    for callback in composition.callbacks() {
        let _ = writeln!(out, "  {}", callback.name());
    }

    let overridden = |present: bool| if present { "overridden" } else { "default" };
    let _ = writeln!(
        out,
        "Constructor:           {}",
        overridden(composition.constructor().is_some())
    );
    let _ = writeln!(
        out,
        "Construction strategy: {}",
        overridden(composition.construction_strategy().is_some())
    );
    out
}
