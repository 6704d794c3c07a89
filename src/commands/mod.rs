// src/commands/mod.rs
//! Command handlers for the graphqlgen-recipe CLI

mod cook;
mod info;
mod test_package;

pub use cook::{cmd_cook, cmd_fetch, cmd_patch, cmd_reset};
pub use info::cmd_info;
pub use test_package::cmd_test_package;

use crate::cli::{KitchenArgs, RecipeArgs};
use anyhow::{Context, Result};
use graphqlgen_recipe::recipe::{builtin, parse_assignment, parse_recipe_file};
use graphqlgen_recipe::{KitchenConfig, OptionValues, Recipe};

/// Load the selected recipe and resolve `-o` overrides against it
pub(crate) fn load_recipe(args: &RecipeArgs) -> Result<(Recipe, OptionValues)> {
    let recipe = match &args.recipe {
        Some(path) => parse_recipe_file(path)
            .with_context(|| format!("Failed to load recipe: {}", path.display()))?,
        None => builtin::cppgraphqlgen().context("Bundled recipe is invalid")?,
    };

    let overrides = args
        .options
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<graphqlgen_recipe::Result<Vec<_>>>()?;
    let options = OptionValues::resolve(&recipe.metadata, &overrides)?;

    Ok((recipe, options))
}

/// Kitchen configuration: config file (if any) overlaid with flags
pub(crate) fn kitchen_config(args: &KitchenArgs) -> Result<KitchenConfig> {
    let mut config = match &args.config {
        Some(path) => KitchenConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => KitchenConfig::default(),
    };

    if let Some(work_dir) = &args.work_dir {
        config.work_dir = work_dir.clone();
    }
    if let Some(package_dir) = &args.package_dir {
        config.package_dir = package_dir.clone();
    }
    if let Some(build_type) = &args.build_type {
        config.build_type = build_type.parse()?;
    }
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    config
        .build_info_files
        .extend(args.build_info.iter().cloned());

    Ok(config)
}
