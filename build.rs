// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common arguments: recipe selection
fn recipe_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("recipe")
            .long("recipe")
            .value_name("FILE")
            .help("Recipe file (defaults to the bundled cppgraphqlgen recipe)"),
    )
    .arg(
        Arg::new("option")
            .short('o')
            .long("option")
            .value_name("NAME=VALUE")
            .action(ArgAction::Append)
            .help("Option override, repeatable"),
    )
}

/// Common arguments: kitchen location and build settings
fn kitchen_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("config").short('c').long("config").help("Kitchen configuration file (TOML)"))
        .arg(Arg::new("work_dir").short('w').long("work-dir").help("Work directory"))
        .arg(Arg::new("package_dir").short('p').long("package-dir").help("Package output directory"))
        .arg(Arg::new("build_type").short('b').long("build-type").help("CMake build type"))
        .arg(Arg::new("jobs").short('j').long("jobs").help("Parallel build jobs"))
        .arg(
            Arg::new("build_info")
                .long("build-info")
                .value_name("FILE")
                .action(ArgAction::Append)
                .help("Dependency build info file to stage into the build directory"),
        )
}

fn build_cli() -> Command {
    Command::new("graphqlgen-recipe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build and package cppgraphqlgen from source")
        .subcommand_required(true)
        .subcommand(
            recipe_args(Command::new("info").about("Show recipe metadata and resolved options"))
                .arg(Arg::new("json").long("json").action(ArgAction::SetTrue).help("Print as JSON")),
        )
        .subcommand(
            kitchen_args(recipe_args(
                Command::new("cook").about("Fetch, patch, build and package in one go"),
            ))
            .arg(
                Arg::new("resume")
                    .long("resume")
                    .action(ArgAction::SetTrue)
                    .help("Continue from the phase recorded in the work directory"),
            ),
        )
        .subcommand(kitchen_args(recipe_args(
            Command::new("fetch").about("Check out the source into a fresh work directory"),
        )))
        .subcommand(
            kitchen_args(recipe_args(
                Command::new("patch").about("Apply the recipe's patches to a fetched checkout"),
            ))
            .arg(
                Arg::new("dry_run")
                    .long("dry-run")
                    .action(ArgAction::SetTrue)
                    .help("Only check that the patches apply"),
            ),
        )
        .subcommand(
            Command::new("test-package")
                .about("Build a consumer against a package and run its sample program")
                .arg(Arg::new("package_dir").required(true).help("Package directory to test"))
                .arg(Arg::new("consumer").long("consumer").help("Consumer CMake project to build first"))
                .arg(
                    Arg::new("work_dir")
                        .long("work-dir")
                        .default_value("test_package_build")
                        .help("Build directory for the consumer"),
                )
                .arg(
                    Arg::new("executable")
                        .long("executable")
                        .default_value("sample")
                        .help("Executable to run from bin/"),
                )
                .arg(
                    Arg::new("build_type")
                        .short('b')
                        .long("build-type")
                        .default_value("Release")
                        .help("CMake build type for the consumer"),
                )
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .default_value("1")
                        .help("Parallel build jobs for the consumer"),
                ),
        )
        .subcommand(kitchen_args(
            Command::new("reset").about("Remove the work and package directories so the recipe can be cooked again"),
        ))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=recipes");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("graphqlgen-recipe.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
