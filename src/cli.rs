// src/cli.rs
//! CLI definitions for graphqlgen-recipe
//!
//! The command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "graphqlgen-recipe")]
#[command(version)]
#[command(about = "Build and package cppgraphqlgen from source", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Which recipe to use and how to configure it
#[derive(Args, Debug, Clone)]
pub struct RecipeArgs {
    /// Recipe file (defaults to the bundled cppgraphqlgen recipe)
    #[arg(long)]
    pub recipe: Option<PathBuf>,

    /// Option override, repeatable (e.g. -o build_schemagen=False)
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<String>,
}

/// Where to cook
#[derive(Args, Debug, Clone)]
pub struct KitchenArgs {
    /// Kitchen configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Work directory for checkout, build tree and state
    #[arg(short, long)]
    pub work_dir: Option<PathBuf>,

    /// Package output directory
    #[arg(short, long)]
    pub package_dir: Option<PathBuf>,

    /// CMake build type (Release, Debug, RelWithDebInfo, MinSizeRel)
    #[arg(short, long)]
    pub build_type: Option<String>,

    /// Parallel build jobs
    #[arg(short, long)]
    pub jobs: Option<u32>,

    /// Dependency build info file to stage into the build directory, repeatable
    #[arg(long = "build-info", value_name = "FILE")]
    pub build_info: Vec<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show recipe metadata and resolved options
    Info {
        #[command(flatten)]
        recipe: RecipeArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch, patch, build and package in one go
    Cook {
        #[command(flatten)]
        recipe: RecipeArgs,

        #[command(flatten)]
        kitchen: KitchenArgs,

        /// Continue from the phase recorded in the work directory
        #[arg(long)]
        resume: bool,
    },

    /// Check out the source into a fresh work directory
    Fetch {
        #[command(flatten)]
        recipe: RecipeArgs,

        #[command(flatten)]
        kitchen: KitchenArgs,
    },

    /// Apply the recipe's patches to a fetched checkout
    Patch {
        #[command(flatten)]
        recipe: RecipeArgs,

        #[command(flatten)]
        kitchen: KitchenArgs,

        /// Only check that the patches apply
        #[arg(long)]
        dry_run: bool,
    },

    /// Build a consumer against a package and run its sample program
    TestPackage {
        /// Package directory to test
        package_dir: PathBuf,

        /// Consumer CMake project to build first
        #[arg(long)]
        consumer: Option<PathBuf>,

        /// Build directory for the consumer
        #[arg(long, default_value = "test_package_build")]
        work_dir: PathBuf,

        /// Executable to run from bin/
        #[arg(long, default_value = "sample")]
        executable: String,

        /// CMake build type for the consumer
        #[arg(short, long, default_value = "Release")]
        build_type: String,

        /// Parallel build jobs for the consumer
        #[arg(short, long, default_value_t = 1)]
        jobs: u32,
    },

    /// Remove the work and package directories so the recipe can be cooked again
    Reset {
        #[command(flatten)]
        kitchen: KitchenArgs,
    },
}
