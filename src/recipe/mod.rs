// src/recipe/mod.rs

//! Recipe system for building packages from source
//!
//! Recipes define how to build a package from source, including:
//! - The upstream git repository and pinned revision
//! - Patches to apply
//! - Build dependencies, settings and options
//! - CMake definitions
//! - Which artifacts land in `include/`, `lib/` and `bin/`
//!
//! # Culinary Terminology
//!
//! - **Recipe**: The build specification (like a recipe card)
//! - **Kitchen**: Where a recipe is cooked, one work directory per kitchen
//! - **Prep**: Fetch the source
//! - **Simmer**: Configure and compile
//! - **Plate**: Copy artifacts into the package layout
//!
//! # Example Recipe
//!
//! ```toml
//! [package]
//! name = "cppgraphqlgen"
//! version = "3.0.4"
//!
//! [source]
//! git = "https://github.com/microsoft/cppgraphqlgen"
//! revision = "v%(version)s"
//!
//! [options.build_schemagen]
//! values = [true, false]
//! default = true
//! define = "GRAPHQL_BUILD_SCHEMAGEN"
//!
//! [[copy]]
//! role = "bin"
//! src = "bin"
//! pattern = "schemagen*"
//! when = "build_schemagen"
//! ```

pub mod builtin;
mod format;
pub mod kitchen;
mod options;
pub mod parser;

pub use format::{
    ArtifactRoot, BuildRequirement, BuildSection, CopyRule, OptionSpec, OptionValue,
    PackageInfo, PackageSection, PatchRef, Recipe, RecipeMetadata, Role, SourceSection,
};
pub use kitchen::{CookResult, Kitchen, KitchenConfig, KitchenState};
pub use options::{parse_assignment, OptionValues};
pub use parser::{parse_recipe, parse_recipe_file, validate_recipe};
