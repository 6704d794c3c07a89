// src/recipe/parser.rs

//! Recipe file parsing

use crate::error::{Error, Result};
use crate::patch::PatchSet;
use crate::recipe::format::{Recipe, RecipeMetadata};
use std::path::Path;
use tracing::debug;

/// Parse recipe metadata from a TOML string
pub fn parse_recipe(content: &str) -> Result<RecipeMetadata> {
    toml::from_str(content).map_err(|e| Error::RecipeParse(format!("{}", e)))
}

/// Load a recipe file and the patches it references
///
/// Patch files are resolved relative to the recipe's directory.
pub fn parse_recipe_file(path: &Path) -> Result<Recipe> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::RecipeParse(format!("failed to read {}: {}", path.display(), e))
    })?;
    let metadata = parse_recipe(&content)?;
    validate_recipe(&metadata)?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let mut patches = Vec::with_capacity(metadata.source.patches.len());
    for patch_ref in &metadata.source.patches {
        let patch_path = base.join(&patch_ref.file);
        let text = std::fs::read_to_string(&patch_path).map_err(|e| {
            Error::RecipeParse(format!(
                "failed to read patch {}: {}",
                patch_path.display(),
                e
            ))
        })?;
        debug!("Loaded patch {}", patch_path.display());
        patches.push(PatchSet::parse(&patch_ref.file, &text, patch_ref.strip)?);
    }

    Ok(Recipe { metadata, patches })
}

/// Validate recipe metadata
///
/// Returns warnings for incomplete but usable metadata, and an error for
/// metadata that cannot be cooked.
pub fn validate_recipe(metadata: &RecipeMetadata) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if metadata.package.name.is_empty() {
        return Err(Error::RecipeParse("package name cannot be empty".to_string()));
    }
    if metadata.package.version.is_empty() {
        return Err(Error::RecipeParse("package version cannot be empty".to_string()));
    }
    if metadata.source.git.is_empty() {
        return Err(Error::RecipeParse("source git URL cannot be empty".to_string()));
    }
    if metadata.revision().is_empty() {
        return Err(Error::RecipeParse("source revision cannot be empty".to_string()));
    }

    for (name, spec) in &metadata.options {
        if spec.values.is_empty() {
            return Err(Error::RecipeParse(format!(
                "option {} declares no allowed values",
                name
            )));
        }
        if !spec.allows(&spec.default) {
            return Err(Error::RecipeParse(format!(
                "default '{}' of option {} is not an allowed value",
                spec.default, name
            )));
        }
    }

    for rule in &metadata.copy_rules {
        if glob::Pattern::new(&rule.pattern).is_err() {
            return Err(Error::RecipeParse(format!(
                "invalid copy pattern '{}'",
                rule.pattern
            )));
        }
        if let Some(option) = &rule.when {
            match metadata.options.get(option) {
                Some(spec) if spec.is_boolean() => {}
                Some(_) => {
                    return Err(Error::RecipeParse(format!(
                        "copy rule '{}' is gated by non-boolean option {}",
                        rule.pattern, option
                    )));
                }
                None => {
                    return Err(Error::RecipeParse(format!(
                        "copy rule '{}' is gated by undeclared option {}",
                        rule.pattern, option
                    )));
                }
            }
        }
    }

    if metadata.package.license.is_none() {
        warnings.push("Missing package license".to_string());
    }
    if metadata.package.description.is_none() {
        warnings.push("Missing package description".to_string());
    }
    if metadata.copy_rules.is_empty() {
        warnings.push("No copy rules; the package will be empty".to_string());
    }

    Ok(warnings)
}
