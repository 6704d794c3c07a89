// src/recipe/builtin.rs

//! Recipes bundled into the binary
//!
//! The recipe metadata and its patches are kept as versioned files under
//! `recipes/` and compiled in with `include_str!`, so the binary can cook
//! without a recipe checkout next to it.

use crate::error::{Error, Result};
use crate::patch::PatchSet;
use crate::recipe::format::Recipe;
use crate::recipe::parser::{parse_recipe, validate_recipe};

const CPPGRAPHQLGEN_RECIPE: &str = include_str!("../../recipes/cppgraphqlgen/recipe.toml");

/// Patch files bundled for the cppgraphqlgen recipe, by file name
const CPPGRAPHQLGEN_PATCHES: &[(&str, &str)] = &[(
    "cppgraphqlgen-3.0.4-conan.patch",
    include_str!("../../recipes/cppgraphqlgen/cppgraphqlgen-3.0.4-conan.patch"),
)];

/// Names of the bundled recipes
pub fn names() -> &'static [&'static str] {
    &["cppgraphqlgen"]
}

/// Look up a bundled recipe by name
pub fn load(name: &str) -> Result<Recipe> {
    match name {
        "cppgraphqlgen" => cppgraphqlgen(),
        other => Err(Error::RecipeParse(format!(
            "no bundled recipe named '{}' (available: {})",
            other,
            names().join(", ")
        ))),
    }
}

/// The cppgraphqlgen 3.0.4 recipe
pub fn cppgraphqlgen() -> Result<Recipe> {
    bundled(CPPGRAPHQLGEN_RECIPE, CPPGRAPHQLGEN_PATCHES)
}

fn bundled(recipe_text: &str, patch_files: &[(&str, &str)]) -> Result<Recipe> {
    let metadata = parse_recipe(recipe_text)?;
    validate_recipe(&metadata)?;

    let patches = metadata
        .source
        .patches
        .iter()
        .map(|patch_ref| {
            let text = patch_files
                .iter()
                .find(|(name, _)| *name == patch_ref.file)
                .map(|(_, text)| *text)
                .ok_or_else(|| {
                    Error::RecipeParse(format!("patch {} is not bundled", patch_ref.file))
                })?;
            PatchSet::parse(&patch_ref.file, text, patch_ref.strip)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Recipe { metadata, patches })
}
