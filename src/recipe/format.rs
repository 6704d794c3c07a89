// src/recipe/format.rs

//! Recipe file format definitions
//!
//! Recipes are TOML files describing where a project's source lives, which
//! patches it needs, how to configure its CMake build, and which artifacts
//! end up in the package.

use crate::error::Error;
use crate::patch::PatchSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A loaded recipe: metadata plus its parsed patches
#[derive(Debug, Clone)]
pub struct Recipe {
    pub metadata: RecipeMetadata,
    /// Patches in application order
    pub patches: Vec<PatchSet>,
}

impl Recipe {
    pub fn name(&self) -> &str {
        &self.metadata.package.name
    }

    pub fn version(&self) -> &str {
        &self.metadata.package.version
    }
}

/// Everything a package manager needs to know about a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeMetadata {
    pub package: PackageSection,

    pub source: SourceSection,

    #[serde(default)]
    pub build: BuildSection,

    /// Exposed options, keyed by name
    #[serde(default)]
    pub options: BTreeMap<String, OptionSpec>,

    /// Packaging rules
    #[serde(default, rename = "copy")]
    pub copy_rules: Vec<CopyRule>,

    /// Information for consumers of the package
    #[serde(default)]
    pub info: PackageInfo,
}

impl RecipeMetadata {
    /// Substitute `%(name)s` and `%(version)s` in a string
    pub fn substitute(&self, template: &str) -> String {
        template
            .replace("%(version)s", &self.package.version)
            .replace("%(name)s", &self.package.name)
    }

    /// The pinned revision with variables substituted
    pub fn revision(&self) -> String {
        self.substitute(&self.source.revision)
    }

    /// Build-time dependencies
    pub fn build_requires(&self) -> &[BuildRequirement] {
        &self.build.requires
    }

    /// Directory name of the checkout inside the work directory
    pub fn checkout_dir(&self) -> &str {
        self.source
            .checkout_dir
            .as_deref()
            .unwrap_or(&self.package.name)
    }
}

/// Package metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    pub name: String,

    pub version: String,

    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Upstream project URL
    #[serde(default)]
    pub url: Option<String>,
}

/// Where and how to check out the source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Git repository URL
    pub git: String,

    /// Tag or branch to check out (supports `%(version)s`)
    pub revision: String,

    /// Check out submodules as well
    #[serde(default = "default_true")]
    pub submodules: bool,

    /// Clone depth
    #[serde(default = "default_depth")]
    pub depth: u32,

    /// Checkout directory name (defaults to the package name)
    #[serde(default)]
    pub checkout_dir: Option<String>,

    /// Patches to apply after checkout
    #[serde(default)]
    pub patches: Vec<PatchRef>,
}

fn default_true() -> bool {
    true
}

fn default_depth() -> u32 {
    1
}

/// Reference to a patch shipped with the recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchRef {
    /// File name relative to the recipe directory
    pub file: String,

    /// Leading path components to strip (default: 1)
    #[serde(default = "default_strip")]
    pub strip: u32,
}

fn default_strip() -> u32 {
    1
}

/// Build configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSection {
    /// Build-time dependencies as `name/version@user/channel`
    #[serde(default)]
    pub requires: Vec<BuildRequirement>,

    /// Settings the package binary depends on
    #[serde(default = "default_settings")]
    pub settings: Vec<String>,

    /// Fixed CMake cache definitions
    #[serde(default)]
    pub defines: BTreeMap<String, String>,

    /// Extra arguments for the configure step
    #[serde(default)]
    pub args: Vec<String>,

    /// CMake generator (`-G`), if not the platform default
    #[serde(default)]
    pub generator: Option<String>,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            requires: Vec::new(),
            settings: default_settings(),
            defines: BTreeMap::new(),
            args: Vec::new(),
            generator: None,
        }
    }
}

fn default_settings() -> Vec<String> {
    ["os", "compiler", "build_type", "arch"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// A pinned build dependency: `name/version@user/channel`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BuildRequirement {
    pub name: String,
    pub version: String,
    pub user: String,
    pub channel: String,
}

impl FromStr for BuildRequirement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            Error::RecipeParse(format!(
                "invalid build requirement '{}', expected name/version@user/channel",
                s
            ))
        };

        let (name_version, user_channel) = s.split_once('@').ok_or_else(invalid)?;
        let (name, version) = name_version.split_once('/').ok_or_else(invalid)?;
        let (user, channel) = user_channel.split_once('/').ok_or_else(invalid)?;

        if [name, version, user, channel]
            .iter()
            .any(|part| part.is_empty() || part.contains(|c: char| c == '/' || c == '@'))
        {
            return Err(invalid());
        }

        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
            user: user.to_string(),
            channel: channel.to_string(),
        })
    }
}

impl TryFrom<String> for BuildRequirement {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BuildRequirement> for String {
    fn from(req: BuildRequirement) -> Self {
        req.to_string()
    }
}

impl fmt::Display for BuildRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}@{}/{}",
            self.name, self.version, self.user, self.channel
        )
    }
}

/// A value an option can take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Str(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Str(_) => None,
        }
    }

    /// Value in CMake cache syntax (`ON`/`OFF` for booleans)
    pub fn to_define(&self) -> String {
        match self {
            Self::Bool(true) => "ON".to_string(),
            Self::Bool(false) => "OFF".to_string(),
            Self::Str(s) => s.clone(),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// Declaration of a recipe option
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Allowed values
    pub values: Vec<OptionValue>,

    pub default: OptionValue,

    /// CMake variable driven by this option
    #[serde(default)]
    pub define: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl OptionSpec {
    pub fn allows(&self, value: &OptionValue) -> bool {
        self.values.contains(value)
    }

    /// True if every allowed value is a boolean
    pub fn is_boolean(&self) -> bool {
        !self.values.is_empty() && self.values.iter().all(|v| v.as_bool().is_some())
    }
}

/// Destination directory role in the package
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Include,
    Lib,
    Bin,
}

impl Role {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::Lib => "lib",
            Self::Bin => "bin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Which tree a copy rule reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactRoot {
    /// The patched source checkout
    Source,
    /// The build directory
    #[default]
    Build,
}

/// A packaging rule: copy files matching `pattern` under `root/src` into `role`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyRule {
    pub role: Role,

    /// Glob matched against paths relative to `root/src`; `*` crosses `/`
    pub pattern: String,

    #[serde(default)]
    pub root: ArtifactRoot,

    /// Sub-directory of the root to search
    #[serde(default)]
    pub src: String,

    /// Skip silently when nothing matches
    #[serde(default)]
    pub optional: bool,

    /// Only apply when this boolean option is enabled
    #[serde(default)]
    pub when: Option<String>,
}

/// Consumer-facing package information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Libraries consumers link, in link order
    #[serde(default)]
    pub libs: Vec<String>,

    #[serde(default = "default_includedirs")]
    pub includedirs: Vec<String>,
}

impl Default for PackageInfo {
    fn default() -> Self {
        Self {
            libs: Vec::new(),
            includedirs: default_includedirs(),
        }
    }
}

fn default_includedirs() -> Vec<String> {
    vec!["include".to_string()]
}
