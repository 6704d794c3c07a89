// src/recipe/kitchen/mod.rs

//! Kitchen: the work directory where a recipe is cooked
//!
//! A Kitchen sequences the phases of a cook:
//! - Prep: check out the pinned source revision
//! - Patch: apply the recipe's patches, all-or-nothing per patch set
//! - Simmer: configure and compile with CMake
//! - Plate: copy artifacts into `include/`, `lib/` and `bin/`
//!
//! Phases run strictly in that order. The state after each phase is
//! persisted in the work directory, and a failing phase leaves the kitchen
//! `Failed` with the component's error returned unchanged.

mod config;
pub mod fetch;
pub mod plate;
pub mod simmer;
mod state;

pub use config::{BuildType, CookResult, KitchenConfig};
pub use fetch::{FetchRequest, GitFetcher, SourceFetcher};
pub use plate::{ArtifactRoots, PackageLayout, PackageManifest, PackagedFile, MANIFEST_FILE};
pub use simmer::{BuildConfiguration, BuildDriver, BuildReport, CMakeDriver};
pub use state::{KitchenState, StateRecord, STATE_FILE};

use crate::error::{Error, Result};
use crate::patch::PatchApplier;
use crate::recipe::format::{Recipe, RecipeMetadata};
use crate::recipe::options::OptionValues;
use crate::recipe::parser::validate_recipe;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The Kitchen: where a recipe is cooked
pub struct Kitchen {
    recipe: Recipe,
    options: OptionValues,
    config: KitchenConfig,
    fetcher: Arc<dyn SourceFetcher>,
    driver: Arc<dyn BuildDriver>,
    applier: PatchApplier,
    state: KitchenState,
    manifest: Option<PackageManifest>,
    /// Build log accumulator
    log: String,
    warnings: Vec<String>,
}

impl std::fmt::Debug for Kitchen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kitchen")
            .field("recipe", &self.recipe.name())
            .field("version", &self.recipe.version())
            .field("work_dir", &self.config.work_dir)
            .field("state", &self.state)
            .finish()
    }
}

impl Kitchen {
    /// Claim `config.work_dir` for a fresh cook of `recipe`
    ///
    /// Fails with `WorkDirInUse` if the directory already carries a state
    /// record from an earlier run, and with `PackageDirNotEmpty` if the
    /// package directory still holds an earlier package.
    pub fn new(recipe: Recipe, options: OptionValues, config: KitchenConfig) -> Result<Self> {
        let state_file = config.state_file();
        if state_file.exists() {
            let state = match StateRecord::read(&state_file) {
                Ok(Some(record)) => record.state.to_string(),
                _ => "unreadable".to_string(),
            };
            return Err(Error::WorkDirInUse {
                path: config.work_dir.clone(),
                state,
            });
        }

        plate::ensure_empty(&config.package_dir)?;

        let kitchen = Self::assemble(recipe, options, config, KitchenState::Loaded)?;
        kitchen.persist()?;
        info!(
            "Kitchen ready for {} {} in {}",
            kitchen.recipe.name(),
            kitchen.recipe.version(),
            kitchen.config.work_dir.display()
        );
        Ok(kitchen)
    }

    /// Continue a cook from the state recorded in `config.work_dir`
    ///
    /// The record must belong to the same recipe and version, and must not
    /// be terminal.
    pub fn resume(recipe: Recipe, options: OptionValues, config: KitchenConfig) -> Result<Self> {
        let state_file = config.state_file();
        let record = StateRecord::read(&state_file)?.ok_or_else(|| Error::InvalidTransition {
            phase: "resume",
            state: "absent".to_string(),
        })?;

        if record.recipe != recipe.name() || record.version != recipe.version() {
            return Err(Error::WorkDirInUse {
                path: config.work_dir.clone(),
                state: format!("{} of {} {}", record.state, record.recipe, record.version),
            });
        }
        if record.state.is_terminal() {
            return Err(Error::WorkDirInUse {
                path: config.work_dir.clone(),
                state: record.state.to_string(),
            });
        }

        plate::ensure_empty(&config.package_dir)?;

        debug!("Resuming {} at {}", record.recipe, record.state);
        Self::assemble(recipe, options, config, record.state)
    }

    fn assemble(
        recipe: Recipe,
        options: OptionValues,
        config: KitchenConfig,
        state: KitchenState,
    ) -> Result<Self> {
        let warnings = validate_recipe(&recipe.metadata)?;
        for warning in &warnings {
            warn!("{}: {}", recipe.name(), warning);
        }

        let applier = PatchApplier::new().with_max_drift(config.max_patch_drift);
        let fetcher: Arc<dyn SourceFetcher> = Arc::new(GitFetcher::new(config.git.clone()));
        let driver: Arc<dyn BuildDriver> = Arc::new(CMakeDriver::new(config.cmake.clone()));

        Ok(Self {
            recipe,
            options,
            config,
            fetcher,
            driver,
            applier,
            state,
            manifest: None,
            log: String::new(),
            warnings,
        })
    }

    /// Replace the source fetcher
    pub fn with_fetcher(mut self, fetcher: Arc<dyn SourceFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Replace the build driver
    pub fn with_driver(mut self, driver: Arc<dyn BuildDriver>) -> Self {
        self.driver = driver;
        self
    }

    /// Remove the work directory and the package directory so the recipe
    /// can be cooked again
    pub fn reset(config: &KitchenConfig) -> Result<()> {
        for dir in [&config.work_dir, &config.package_dir] {
            if dir.exists() {
                info!("Removing {}", dir.display());
                fs::remove_dir_all(dir)?;
            }
        }
        Ok(())
    }

    pub fn metadata(&self) -> &RecipeMetadata {
        &self.recipe.metadata
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn options(&self) -> &OptionValues {
        &self.options
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    pub fn state(&self) -> KitchenState {
        self.state
    }

    pub fn log(&self) -> &str {
        &self.log
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Manifest of the plated package, once packaged
    pub fn manifest(&self) -> Option<&PackageManifest> {
        self.manifest.as_ref()
    }

    /// Checkout directory inside the work directory
    pub fn source_dir(&self) -> PathBuf {
        self.config.work_dir.join(self.recipe.metadata.checkout_dir())
    }

    pub fn build_dir(&self) -> PathBuf {
        self.config.build_dir()
    }

    /// Phase 1: Prep - check out the source
    pub fn fetch(&mut self) -> Result<()> {
        self.step("fetch", KitchenState::Loaded, KitchenState::Fetched, |k| {
            let request = FetchRequest::from_metadata(&k.recipe.metadata);
            let dest = k.source_dir();
            k.fetcher.fetch(&request, &dest)?;
            k.log_line(&format!(
                "Fetched {} at {} into {}",
                request.url,
                request.revision,
                dest.display()
            ));
            Ok(())
        })
    }

    /// Phase 2: apply every patch set in order
    pub fn patch(&mut self) -> Result<()> {
        self.step("patch", KitchenState::Fetched, KitchenState::Patched, |k| {
            let source_dir = k.source_dir();
            let mut lines = Vec::with_capacity(k.recipe.patches.len());
            for patch in &k.recipe.patches {
                info!("Applying patch: {}", patch.name);
                let applied = k.applier.apply(&source_dir, patch)?;
                debug!("{}:\n{}", patch.name, applied.render_diff());
                lines.push(format!(
                    "Applied patch: {} ({} files, {} hunks)",
                    patch.name,
                    applied.files.len(),
                    patch.hunk_count()
                ));
            }
            for line in lines {
                k.log_line(&line);
            }
            Ok(())
        })
    }

    /// Phase 3: Simmer - configure and compile
    pub fn build(&mut self) -> Result<BuildReport> {
        self.step("build", KitchenState::Patched, KitchenState::Built, |k| {
            let config = k.build_configuration();
            fs::create_dir_all(&config.build_dir)?;
            stage_build_info(&k.config.build_info_files, &config.build_dir)?;

            let report = k.driver.build(&config)?;
            k.log_output("configure", &report.configure_output);
            k.log_output("build", &report.compile_output);
            Ok(report)
        })
    }

    /// Phase 4: Plate - assemble the package
    pub fn package(&mut self) -> Result<PackageManifest> {
        self.step("package", KitchenState::Built, KitchenState::Packaged, |k| {
            let layout = PackageLayout::new(&k.recipe.metadata, &k.options);
            if layout.is_empty() {
                k.warnings.push("No copy rules apply; the package is empty".to_string());
            }
            let roots = ArtifactRoots {
                source_dir: k.source_dir(),
                build_dir: k.build_dir(),
            };
            let manifest = plate::assemble(
                &k.recipe.metadata,
                &k.options,
                &layout,
                &roots,
                &k.config.package_dir,
            )?;
            k.log_line(&format!(
                "Packaged {} files into {}",
                manifest.files.len(),
                k.config.package_dir.display()
            ));
            k.manifest = Some(manifest.clone());
            Ok(manifest)
        })
    }

    /// Run every remaining phase through packaging
    pub fn cook(&mut self) -> Result<CookResult> {
        if self.state == KitchenState::Loaded {
            self.fetch()?;
        }
        if self.state == KitchenState::Fetched {
            self.patch()?;
        }
        if self.state == KitchenState::Patched {
            self.build()?;
        }
        let manifest = self.package()?;

        info!(
            "Cooked {} {} ({} files)",
            self.recipe.name(),
            self.recipe.version(),
            manifest.files.len()
        );

        Ok(CookResult {
            package_dir: self.config.package_dir.clone(),
            manifest,
            log: self.log.clone(),
            warnings: self.warnings.clone(),
        })
    }

    /// Inputs for the build driver: recipe defines overlaid with options
    pub fn build_configuration(&self) -> BuildConfiguration {
        let build = &self.recipe.metadata.build;
        let mut defines = build.defines.clone();
        defines.extend(self.options.defines(&self.recipe.metadata));

        let mut extra_args = build.args.clone();
        extra_args.extend(self.config.extra_args.iter().cloned());

        BuildConfiguration {
            source_dir: self.source_dir(),
            build_dir: self.build_dir(),
            build_type: self.config.build_type,
            defines,
            extra_args,
            generator: build.generator.clone(),
            jobs: self.config.jobs,
        }
    }

    /// Run one phase if the kitchen is in `from`, moving to `to` on success
    /// and to `Failed` on error
    fn step<T>(
        &mut self,
        phase: &'static str,
        from: KitchenState,
        to: KitchenState,
        run: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if self.state != from {
            return Err(Error::InvalidTransition {
                phase,
                state: self.state.to_string(),
            });
        }

        let outcome = run(self).and_then(|value| {
            self.state = to;
            self.persist().map(|()| value)
        });
        if let Err(e) = &outcome {
            warn!("{} failed: {}", phase, e);
            self.log_line(&format!("=== {} failed ===\n{}", phase, e));
            self.state = KitchenState::Failed;
            if let Err(persist_err) = self.persist() {
                warn!("Could not record failed state: {}", persist_err);
            }
        }
        outcome
    }

    fn persist(&self) -> Result<()> {
        StateRecord::new(self.state, self.recipe.name(), self.recipe.version())
            .write(&self.config.state_file())
    }

    fn log_line(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }

    /// Log tool output with a phase header
    fn log_output(&mut self, phase: &str, output: &str) {
        self.log_line(&format!("=== {} ===", phase));
        if !output.is_empty() {
            self.log_line(output.trim_end());
        }
    }
}

/// Copy host-provided build info files into the build directory
fn stage_build_info(files: &[PathBuf], build_dir: &Path) -> Result<()> {
    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        debug!("Staging {} into {}", file.display(), build_dir.display());
        fs::copy(file, build_dir.join(name))?;
    }
    Ok(())
}
