// src/recipe/kitchen/config.rs

//! Configuration types for the Kitchen

use crate::error::{Error, Result};
use crate::recipe::kitchen::plate::PackageManifest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// CMake build type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BuildType {
    #[default]
    Release,
    Debug,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Release => "Release",
            Self::Debug => "Debug",
            Self::RelWithDebInfo => "RelWithDebInfo",
            Self::MinSizeRel => "MinSizeRel",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "release" => Ok(Self::Release),
            "debug" => Ok(Self::Debug),
            "relwithdebinfo" => Ok(Self::RelWithDebInfo),
            "minsizerel" => Ok(Self::MinSizeRel),
            _ => Err(Error::InvalidOption {
                name: "build_type".to_string(),
                reason: format!(
                    "'{}' is not one of Release, Debug, RelWithDebInfo, MinSizeRel",
                    s
                ),
            }),
        }
    }
}

/// Configuration for the Kitchen
///
/// Loadable from a TOML file; every field has a default so a config file
/// only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KitchenConfig {
    /// Directory holding the checkout, the build tree and the state record
    pub work_dir: PathBuf,
    /// Destination of the assembled package
    pub package_dir: PathBuf,
    pub build_type: BuildType,
    /// Number of parallel build jobs
    pub jobs: u32,
    /// Lines a patch hunk may drift from its recorded offset
    pub max_patch_drift: usize,
    /// Extra arguments appended to the configure step
    pub extra_args: Vec<String>,
    /// Files copied into the build directory before configuring
    ///
    /// Used for dependency build info generated by the host package manager
    /// (e.g. `conanbuildinfo.cmake`, which the bundled patch includes).
    pub build_info_files: Vec<PathBuf>,
    /// git executable
    pub git: String,
    /// cmake executable
    pub cmake: String,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);

        Self {
            work_dir: PathBuf::from("kitchen"),
            package_dir: PathBuf::from("package"),
            build_type: BuildType::Release,
            jobs,
            max_patch_drift: crate::patch::DEFAULT_MAX_DRIFT,
            extra_args: Vec::new(),
            build_info_files: Vec::new(),
            git: "git".to_string(),
            cmake: "cmake".to_string(),
        }
    }
}

impl KitchenConfig {
    /// Configuration rooted at `work_dir`, packaging into `package_dir`
    pub fn new(work_dir: impl Into<PathBuf>, package_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            package_dir: package_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Build tree inside the work directory
    pub fn build_dir(&self) -> PathBuf {
        self.work_dir.join("build")
    }

    /// Location of the persisted kitchen state
    pub fn state_file(&self) -> PathBuf {
        self.work_dir.join(super::state::STATE_FILE)
    }
}

/// Result of cooking a recipe
#[derive(Debug)]
pub struct CookResult {
    /// Root of the assembled package
    pub package_dir: PathBuf,
    /// Manifest written alongside the package contents
    pub manifest: PackageManifest,
    /// Build log
    pub log: String,
    /// Warnings generated during the cook
    pub warnings: Vec<String>,
}
