// src/lib.rs

//! Source recipe for cppgraphqlgen
//!
//! Checks out a pinned upstream revision, applies the bundled build
//! patches, configures and compiles with CMake, and assembles the headers,
//! libraries and optional `schemagen` tool into an `include/`, `lib/`,
//! `bin/` package.
//!
//! # Architecture
//!
//! - Recipes: TOML metadata plus versioned patch files, bundled at build time
//! - Patches: unified diffs applied all-or-nothing with bounded offset drift
//! - Kitchen: a persisted state machine over one work directory
//! - Seams: checkout and build run behind traits so hosts can substitute them

mod error;
pub mod hash;
pub mod patch;
pub mod recipe;
pub mod test_package;

pub use error::{Error, Result};
pub use patch::{PatchApplier, PatchSet};
pub use recipe::{CookResult, Kitchen, KitchenConfig, KitchenState, OptionValues, Recipe};
pub use test_package::TestHarness;
