// src/commands/test_package.rs

//! Test-package command - smoke test an assembled package

use anyhow::{Context, Result};
use graphqlgen_recipe::recipe::kitchen::BuildType;
use graphqlgen_recipe::TestHarness;
use std::path::Path;

pub fn cmd_test_package(
    package_dir: &Path,
    consumer: Option<&Path>,
    work_dir: &Path,
    executable: &str,
    build_type: &str,
    jobs: u32,
) -> Result<()> {
    let build_type: BuildType = build_type.parse()?;
    let mut harness = TestHarness::new(package_dir, work_dir)
        .with_executable(executable)
        .with_build_type(build_type, jobs);
    if let Some(source) = consumer {
        harness = harness.with_consumer(source);
    }

    let report = harness
        .run()
        .with_context(|| format!("Package test failed for {}", package_dir.display()))?;

    println!(
        "[OK] {} exited successfully ({} file(s) imported from bin/)",
        report.executable.display(),
        report.imported.len()
    );
    Ok(())
}
