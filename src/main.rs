// src/main.rs

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { recipe, json } => commands::cmd_info(&recipe, json),
        Commands::Cook {
            recipe,
            kitchen,
            resume,
        } => commands::cmd_cook(&recipe, &kitchen, resume),
        Commands::Fetch { recipe, kitchen } => commands::cmd_fetch(&recipe, &kitchen),
        Commands::Patch {
            recipe,
            kitchen,
            dry_run,
        } => commands::cmd_patch(&recipe, &kitchen, dry_run),
        Commands::TestPackage {
            package_dir,
            consumer,
            work_dir,
            executable,
            build_type,
            jobs,
        } => commands::cmd_test_package(
            &package_dir,
            consumer.as_deref(),
            &work_dir,
            &executable,
            &build_type,
            jobs,
        ),
        Commands::Reset { kitchen } => commands::cmd_reset(&kitchen),
    }
}
