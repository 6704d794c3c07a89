// src/recipe/kitchen/simmer.rs

//! Simmer: configure and compile with CMake

use crate::error::{Error, Result};
use crate::recipe::kitchen::config::BuildType;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Lines of tool output kept in configure/compile errors
pub const OUTPUT_TAIL_LINES: usize = 40;

/// Inputs of one build invocation
#[derive(Debug, Clone)]
pub struct BuildConfiguration {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub build_type: BuildType,
    /// CMake cache definitions (`-DKEY=VALUE`)
    pub defines: BTreeMap<String, String>,
    /// Appended to the configure command line
    pub extra_args: Vec<String>,
    pub generator: Option<String>,
    pub jobs: u32,
}

impl BuildConfiguration {
    /// Arguments of the configure step
    pub fn configure_args(&self) -> Vec<String> {
        let mut args = vec![
            "-S".to_string(),
            self.source_dir.to_string_lossy().into_owned(),
            "-B".to_string(),
            self.build_dir.to_string_lossy().into_owned(),
        ];
        if let Some(generator) = &self.generator {
            args.push("-G".to_string());
            args.push(generator.clone());
        }
        args.push(format!("-DCMAKE_BUILD_TYPE={}", self.build_type));
        args.extend(self.defines.iter().map(|(k, v)| format!("-D{}={}", k, v)));
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Arguments of the compile step
    pub fn build_args(&self) -> Vec<String> {
        vec![
            "--build".to_string(),
            self.build_dir.to_string_lossy().into_owned(),
            "--config".to_string(),
            self.build_type.to_string(),
            "--parallel".to_string(),
            self.jobs.max(1).to_string(),
        ]
    }
}

/// Output of a successful build
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub configure_output: String,
    pub compile_output: String,
}

/// Trait for driving an external build system
///
/// `configure` and `compile` run sequentially and block; errors are
/// `ConfigureError` and `CompileError` respectively.
pub trait BuildDriver: Send + Sync {
    fn configure(&self, config: &BuildConfiguration) -> Result<String>;

    fn compile(&self, config: &BuildConfiguration) -> Result<String>;

    fn build(&self, config: &BuildConfiguration) -> Result<BuildReport> {
        let configure_output = self.configure(config)?;
        let compile_output = self.compile(config)?;
        Ok(BuildReport {
            configure_output,
            compile_output,
        })
    }
}

/// Driver invoking the `cmake` executable
#[derive(Debug, Clone)]
pub struct CMakeDriver {
    cmake: String,
}

impl Default for CMakeDriver {
    fn default() -> Self {
        Self::new("cmake")
    }
}

impl CMakeDriver {
    pub fn new(cmake: impl Into<String>) -> Self {
        Self {
            cmake: cmake.into(),
        }
    }

    /// Run cmake; `Err` carries exit code and combined output
    fn run(&self, args: &[String], cwd: &Path) -> std::result::Result<String, (Option<i32>, String)> {
        let program = which::which(&self.cmake)
            .map_err(|e| (None, format!("{} not found: {}", self.cmake, e)))?;
        debug!("Command: {} {}", program.display(), args.join(" "));

        let output = Command::new(&program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|e| (None, format!("failed to run {}: {}", self.cmake, e)))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(combined)
        } else {
            Err((output.status.code(), output_tail(&combined, OUTPUT_TAIL_LINES)))
        }
    }
}

impl BuildDriver for CMakeDriver {
    fn configure(&self, config: &BuildConfiguration) -> Result<String> {
        info!("Configuring {}", config.source_dir.display());
        std::fs::create_dir_all(&config.build_dir)?;
        self.run(&config.configure_args(), &config.build_dir)
            .map_err(|(exit_code, output)| Error::ConfigureError { exit_code, output })
    }

    fn compile(&self, config: &BuildConfiguration) -> Result<String> {
        info!("Compiling with {} jobs", config.jobs.max(1));
        self.run(&config.build_args(), &config.build_dir)
            .map_err(|(exit_code, output)| Error::CompileError { exit_code, output })
    }
}

/// Last `lines` lines of `output`
pub fn output_tail(output: &str, lines: usize) -> String {
    let all: Vec<&str> = output.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}
