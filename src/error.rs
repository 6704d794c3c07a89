// src/error.rs

//! Error types for the recipe kitchen
//!
//! Every phase surfaces its own variant. The orchestrator never wraps a
//! phase error, so the variant a caller sees is the one the failing
//! component produced.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Source checkout failed (tool missing, network, unknown reference,
    /// or destination already present)
    #[error("Fetch failed: {0}")]
    FetchError(String),

    /// A hunk did not match the target file
    #[error("Patch failed for {file} at hunk #{hunk}: {reason}")]
    PatchApplyError {
        file: String,
        hunk: usize,
        reason: String,
    },

    /// The target already carries the patch, or was modified incompatibly
    #[error("Patch already applied or conflicting: {file}")]
    PatchAlreadyAppliedOrConflict { file: String },

    /// Patch text could not be parsed as a unified diff
    #[error("Malformed patch at line {line}: {reason}")]
    PatchParse { line: usize, reason: String },

    /// The configure phase of the build tool exited unsuccessfully
    #[error("Configure failed (exit code {exit_code:?}):\n{output}")]
    ConfigureError {
        exit_code: Option<i32>,
        output: String,
    },

    /// The compile phase of the build tool exited unsuccessfully
    #[error("Compile failed (exit code {exit_code:?}):\n{output}")]
    CompileError {
        exit_code: Option<i32>,
        output: String,
    },

    /// A required artifact was not produced
    #[error("Missing artifact for {role}: no file matches '{pattern}' under {}", .root.display())]
    MissingArtifactError {
        role: String,
        pattern: String,
        root: PathBuf,
    },

    /// Recipe metadata is invalid
    #[error("Invalid recipe: {0}")]
    RecipeParse(String),

    /// An option name or value is not declared by the recipe
    #[error("Invalid option {name}: {reason}")]
    InvalidOption { name: String, reason: String },

    /// A phase was requested out of order
    #[error("Cannot {phase} while kitchen is {state}")]
    InvalidTransition { phase: &'static str, state: String },

    /// The work directory already belongs to an earlier run
    #[error("Work directory {} already used (state: {state}); reset it first", .path.display())]
    WorkDirInUse { path: PathBuf, state: String },

    /// The package directory holds output from an earlier cook
    #[error("Package directory {} is not empty; reset it first", .path.display())]
    PackageDirNotEmpty { path: PathBuf },

    /// The kitchen configuration file is not valid TOML
    #[error("Invalid kitchen configuration {}: {reason}", .path.display())]
    ConfigParse { path: PathBuf, reason: String },

    /// The packaged test executable did not exit successfully
    #[error("Test package failed (exit code {exit_code:?}):\n{output}")]
    TestFailed {
        exit_code: Option<i32>,
        output: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
