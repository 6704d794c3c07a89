// src/commands/info.rs

//! Info command - show recipe metadata

use super::load_recipe;
use crate::cli::RecipeArgs;
use anyhow::Result;
use graphqlgen_recipe::recipe::validate_recipe;

/// Print recipe metadata and the resolved option values
pub fn cmd_info(recipe_args: &RecipeArgs, json: bool) -> Result<()> {
    let (recipe, options) = load_recipe(recipe_args)?;
    let meta = &recipe.metadata;

    if json {
        let value = serde_json::json!({
            "metadata": meta,
            "options": options,
            "defines": options.defines(meta),
            "patches": recipe
                .patches
                .iter()
                .map(|p| serde_json::json!({ "name": p.name, "targets": p.targets() }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{} {}", meta.package.name, meta.package.version);
    if let Some(description) = &meta.package.description {
        println!("  {}", description);
    }
    if let Some(license) = &meta.package.license {
        println!("  License: {}", license);
    }
    if let Some(url) = &meta.package.url {
        println!("  URL: {}", url);
    }

    println!("\nSource: {} @ {}", meta.source.git, meta.revision());
    for patch in &recipe.patches {
        println!(
            "  patch {} ({} hunks): {}",
            patch.name,
            patch.hunk_count(),
            patch.targets().join(", ")
        );
    }

    println!("\nBuild requires:");
    for req in meta.build_requires() {
        println!("  {}", req);
    }
    println!("Settings: {}", meta.build.settings.join(", "));

    println!("\nOptions:");
    for (name, value) in options.iter() {
        let spec = &meta.options[name];
        println!(
            "  {} = {} (default {}){}",
            name,
            value,
            spec.default,
            spec.description
                .as_deref()
                .map(|d| format!(" - {}", d))
                .unwrap_or_default()
        );
    }

    println!("\nLibraries: {}", meta.info.libs.join(", "));
    println!("Include dirs: {}", meta.info.includedirs.join(", "));

    for warning in validate_recipe(meta)? {
        println!("Warning: {}", warning);
    }

    Ok(())
}
