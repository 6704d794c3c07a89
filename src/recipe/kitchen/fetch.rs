// src/recipe/kitchen/fetch.rs

//! Prep: check out the pinned upstream source
//!
//! The fetcher is a trait so the hosting package manager can route checkouts
//! through its own mirror or cache, and so tests can lay down a source tree
//! without network access.

use crate::error::{Error, Result};
use crate::recipe::format::RecipeMetadata;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// What to check out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    /// Tag or branch name
    pub revision: String,
    pub depth: u32,
    pub submodules: bool,
}

impl FetchRequest {
    pub fn from_metadata(metadata: &RecipeMetadata) -> Self {
        Self {
            url: metadata.source.git.clone(),
            revision: metadata.revision(),
            depth: metadata.source.depth,
            submodules: metadata.source.submodules,
        }
    }
}

/// Trait for producing a local source tree for a revision
pub trait SourceFetcher: Send + Sync {
    /// Check out `request` into `dest`, which must not exist yet
    fn fetch(&self, request: &FetchRequest, dest: &Path) -> Result<()>;
}

/// Fetcher that shells out to `git clone`
#[derive(Debug, Clone)]
pub struct GitFetcher {
    git: String,
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitFetcher {
    pub fn new(git: impl Into<String>) -> Self {
        Self { git: git.into() }
    }

    fn program(&self) -> Result<PathBuf> {
        which::which(&self.git)
            .map_err(|e| Error::FetchError(format!("{} not found: {}", self.git, e)))
    }

    /// Arguments for `git clone`, destination last
    pub fn clone_args(request: &FetchRequest, dest: &Path) -> Vec<String> {
        let mut args = vec!["clone".to_string()];
        if request.submodules {
            args.push("--recursive".to_string());
        }
        args.push("-b".to_string());
        args.push(request.revision.clone());
        if request.depth > 0 {
            args.push("--depth".to_string());
            args.push(request.depth.to_string());
        }
        args.push(request.url.clone());
        args.push(dest.to_string_lossy().into_owned());
        args
    }
}

impl SourceFetcher for GitFetcher {
    fn fetch(&self, request: &FetchRequest, dest: &Path) -> Result<()> {
        ensure_absent(dest)?;
        let program = self.program()?;
        let args = Self::clone_args(request, dest);

        info!("Cloning {} at {}", request.url, request.revision);
        debug!("Command: {} {}", program.display(), args.join(" "));

        let output = Command::new(&program)
            .args(&args)
            .output()
            .map_err(|e| Error::FetchError(format!("failed to run {}: {}", self.git, e)))?;

        if !output.status.success() {
            return Err(Error::FetchError(format!(
                "git clone of {} at {} failed with exit code {:?}: {}",
                request.url,
                request.revision,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }
}

/// Refuse to fetch over an existing path
pub fn ensure_absent(dest: &Path) -> Result<()> {
    if dest.exists() {
        return Err(Error::FetchError(format!(
            "destination {} already exists",
            dest.display()
        )));
    }
    Ok(())
}
