// src/test_package.rs

//! Smoke test for an assembled package
//!
//! Mirrors how a consumer uses the package: build a small project against
//! it, import the package's executables next to the project's own, and run
//! the sample program. Only the exit code matters.

use crate::error::{Error, Result};
use crate::recipe::kitchen::simmer::{output_tail, OUTPUT_TAIL_LINES};
use crate::recipe::kitchen::{BuildConfiguration, BuildDriver, BuildType, CMakeDriver};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Executable run when none is configured
pub const DEFAULT_EXECUTABLE: &str = "sample";

/// Consumer build and run against a package directory
pub struct TestHarness {
    package_dir: PathBuf,
    work_dir: PathBuf,
    consumer_source: Option<PathBuf>,
    executable: String,
    build_type: BuildType,
    jobs: u32,
    driver: Arc<dyn BuildDriver>,
}

/// Outcome of a passing test run
#[derive(Debug, Clone)]
pub struct TestReport {
    /// Files imported from the package's `bin/`
    pub imported: Vec<PathBuf>,
    pub executable: PathBuf,
    pub output: String,
}

impl TestHarness {
    pub fn new(package_dir: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            package_dir: package_dir.into(),
            work_dir: work_dir.into(),
            consumer_source: None,
            executable: DEFAULT_EXECUTABLE.to_string(),
            build_type: BuildType::Release,
            jobs: 1,
            driver: Arc::new(CMakeDriver::default()),
        }
    }

    /// Build this CMake project against the package before running
    pub fn with_consumer(mut self, source: impl Into<PathBuf>) -> Self {
        self.consumer_source = Some(source.into());
        self
    }

    pub fn with_executable(mut self, name: impl Into<String>) -> Self {
        self.executable = name.into();
        self
    }

    pub fn with_build_type(mut self, build_type: BuildType, jobs: u32) -> Self {
        self.build_type = build_type;
        self.jobs = jobs;
        self
    }

    pub fn with_driver(mut self, driver: Arc<dyn BuildDriver>) -> Self {
        self.driver = driver;
        self
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.work_dir.join("bin")
    }

    /// Build, import and run
    pub fn run(&self) -> Result<TestReport> {
        fs::create_dir_all(&self.work_dir)?;

        if let Some(source) = &self.consumer_source {
            info!("Building consumer {}", source.display());
            let mut defines = BTreeMap::new();
            defines.insert(
                "CMAKE_PREFIX_PATH".to_string(),
                self.package_dir.to_string_lossy().into_owned(),
            );
            self.driver.build(&BuildConfiguration {
                source_dir: source.clone(),
                build_dir: self.work_dir.clone(),
                build_type: self.build_type,
                defines,
                extra_args: Vec::new(),
                generator: None,
                jobs: self.jobs,
            })?;
        }

        let imported = import_dir(&self.package_dir.join("bin"), &self.bin_dir())?;
        debug!("Imported {} file(s) from package bin/", imported.len());

        let bin_dir = self.bin_dir();
        let executable = bin_dir.join(format!("{}{}", self.executable, std::env::consts::EXE_SUFFIX));
        if !executable.is_file() {
            return Err(Error::MissingArtifactError {
                role: "bin".to_string(),
                pattern: self.executable.clone(),
                root: bin_dir,
            });
        }

        info!("Running {}", executable.display());
        let output = Command::new(&executable).current_dir(&bin_dir).output()?;
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(Error::TestFailed {
                exit_code: output.status.code(),
                output: output_tail(&combined, OUTPUT_TAIL_LINES),
            });
        }

        Ok(TestReport {
            imported,
            executable,
            output: combined,
        })
    }
}

/// Copy every file under `from` into `to`, keeping relative paths
fn import_dir(from: &Path, to: &Path) -> Result<Vec<PathBuf>> {
    let mut imported = Vec::new();
    if !from.is_dir() {
        return Ok(imported);
    }

    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let target = to.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &target)?;
        imported.push(relative.to_path_buf());
    }
    Ok(imported)
}
