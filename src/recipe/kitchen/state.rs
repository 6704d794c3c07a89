// src/recipe/kitchen/state.rs

//! Persisted phase state of a kitchen work directory

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// File name of the state record inside the work directory
pub const STATE_FILE: &str = ".kitchen-state.json";

/// Where a kitchen is in the cook
///
/// Phases move strictly forward `Loaded -> Fetched -> Patched -> Built ->
/// Packaged`; `Failed` is terminal and reachable from any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KitchenState {
    Loaded,
    Fetched,
    Patched,
    Built,
    Packaged,
    Failed,
}

impl KitchenState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::Fetched => "fetched",
            Self::Patched => "patched",
            Self::Built => "built",
            Self::Packaged => "packaged",
            Self::Failed => "failed",
        }
    }

    /// True once no further phase can run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Packaged | Self::Failed)
    }
}

impl fmt::Display for KitchenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State record written to `<work_dir>/.kitchen-state.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRecord {
    pub state: KitchenState,
    pub recipe: String,
    pub version: String,
    pub updated_at: DateTime<Utc>,
}

impl StateRecord {
    pub fn new(state: KitchenState, recipe: &str, version: &str) -> Self {
        Self {
            state,
            recipe: recipe.to_string(),
            version: version.to_string(),
            updated_at: Utc::now(),
        }
    }

    /// Read the record at `path`, if there is one
    pub fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
