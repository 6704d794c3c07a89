// src/commands/cook.rs

//! Cook commands - fetch, patch, build and package a recipe

use super::{kitchen_config, load_recipe};
use crate::cli::{KitchenArgs, RecipeArgs};
use anyhow::{Context, Result};
use graphqlgen_recipe::{Kitchen, KitchenConfig, OptionValues, PatchApplier, Recipe};
use tracing::info;

fn open_kitchen(
    recipe: Recipe,
    options: OptionValues,
    config: KitchenConfig,
    resume: bool,
) -> Result<Kitchen> {
    let work_dir = config.work_dir.clone();
    let kitchen = if resume {
        Kitchen::resume(recipe, options, config)
    } else {
        Kitchen::new(recipe, options, config)
    };
    kitchen.with_context(|| format!("Cannot use work directory {}", work_dir.display()))
}

/// Cook a package from the recipe
pub fn cmd_cook(recipe_args: &RecipeArgs, kitchen_args: &KitchenArgs, resume: bool) -> Result<()> {
    let (recipe, options) = load_recipe(recipe_args)?;
    let config = kitchen_config(kitchen_args)?;

    println!("Recipe: {} version {}", recipe.name(), recipe.version());
    for (name, value) in options.iter() {
        println!("  option {} = {}", name, value);
    }
    println!(
        "Cooking in {} ({} build, {} parallel jobs)...",
        config.work_dir.display(),
        config.build_type,
        config.jobs
    );

    let name = recipe.name().to_string();
    let mut kitchen = open_kitchen(recipe, options, config, resume)?;
    let result = kitchen
        .cook()
        .with_context(|| format!("Failed to cook {} (state: {})", name, kitchen.state()))?;

    println!(
        "\n[COMPLETE] Cooked: {} ({} files)",
        result.package_dir.display(),
        result.manifest.files.len()
    );

    if !result.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }

    info!("Successfully cooked {} to {}", name, result.package_dir.display());
    Ok(())
}

/// Check out the source into a fresh work directory
pub fn cmd_fetch(recipe_args: &RecipeArgs, kitchen_args: &KitchenArgs) -> Result<()> {
    let (recipe, options) = load_recipe(recipe_args)?;
    let config = kitchen_config(kitchen_args)?;

    let mut kitchen = open_kitchen(recipe, options, config, false)?;
    kitchen.fetch().context("Failed to fetch sources")?;

    println!("[COMPLETE] Fetched into {}", kitchen.source_dir().display());
    Ok(())
}

/// Apply the recipe's patches to a fetched checkout
pub fn cmd_patch(recipe_args: &RecipeArgs, kitchen_args: &KitchenArgs, dry_run: bool) -> Result<()> {
    let (recipe, options) = load_recipe(recipe_args)?;
    let config = kitchen_config(kitchen_args)?;

    if dry_run {
        let applier = PatchApplier::new().with_max_drift(config.max_patch_drift);
        let source_dir = config.work_dir.join(recipe.metadata.checkout_dir());
        for patch in &recipe.patches {
            applier
                .check(&source_dir, patch)
                .with_context(|| format!("Patch {} does not apply", patch.name))?;
            println!("[OK] {} applies ({} hunks)", patch.name, patch.hunk_count());
        }
        return Ok(());
    }

    let mut kitchen = open_kitchen(recipe, options, config, true)?;
    kitchen.patch().context("Failed to patch sources")?;

    for patch in &kitchen.recipe().patches {
        println!("[OK] Applied {}", patch.name);
    }
    Ok(())
}

/// Remove the work and package directories
pub fn cmd_reset(kitchen_args: &KitchenArgs) -> Result<()> {
    let config = kitchen_config(kitchen_args)?;
    Kitchen::reset(&config).with_context(|| {
        format!(
            "Failed to remove {} and {}",
            config.work_dir.display(),
            config.package_dir.display()
        )
    })?;
    println!("Removed {}", config.work_dir.display());
    println!("Removed {}", config.package_dir.display());
    Ok(())
}
