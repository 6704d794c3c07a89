// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.
//!
//! The fakes here stand in for `git` and `cmake`: the fetcher lays down a
//! tree shaped like the upstream checkout (including the files the bundled
//! patch touches), and the driver writes the libraries and tool a real
//! build would produce.

#![allow(dead_code)]

use graphqlgen_recipe::patch::FileDiff;
use graphqlgen_recipe::recipe::builtin;
use graphqlgen_recipe::recipe::kitchen::{BuildConfiguration, BuildDriver, FetchRequest, SourceFetcher};
use graphqlgen_recipe::{Error, KitchenConfig, OptionValues, Recipe, Result};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

/// Rebuild one side of a file from its diff, padding gaps with filler lines.
///
/// The filler sequence is the same for both sides, so the unpatched and
/// patched renderings differ exactly by the hunks.
pub fn synthesize(diff: &FileDiff, patched: bool) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut filler = 0;
    let mut push_filler = |lines: &mut Vec<String>| {
        filler += 1;
        lines.push(format!("# upstream line {}", filler));
    };

    for hunk in &diff.hunks {
        let start = if patched { hunk.new_start } else { hunk.old_start };
        while lines.len() + 1 < start {
            push_filler(&mut lines);
        }
        let image = if patched { hunk.new_image() } else { hunk.old_image() };
        lines.extend(image.into_iter().map(str::to_string));
    }
    for _ in 0..3 {
        push_filler(&mut lines);
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// (path, unpatched, patched) for every file the bundled patch touches
pub fn upstream_files(recipe: &Recipe) -> Vec<(String, String, String)> {
    recipe
        .patches
        .iter()
        .flat_map(|patch| patch.files.iter())
        .map(|diff| {
            (
                diff.target().to_string(),
                synthesize(diff, false),
                synthesize(diff, true),
            )
        })
        .collect()
}

/// Headers shipped in the source tree
pub const SOURCE_HEADERS: &[&str] = &[
    "include/graphqlservice/GraphQLService.h",
    "include/graphqlservice/GraphQLParse.h",
    "PEGTL/include/tao/pegtl.hpp",
    "PEGTL/include/tao/pegtl/ascii.hpp",
];

pub fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Fetcher that writes a synthetic upstream checkout
pub struct UpstreamFetcher {
    files: Vec<(String, String)>,
    pub requests: Mutex<Vec<FetchRequest>>,
}

impl UpstreamFetcher {
    pub fn new(recipe: &Recipe) -> Self {
        let mut files: Vec<(String, String)> = upstream_files(recipe)
            .into_iter()
            .map(|(path, original, _)| (path, original))
            .collect();
        for header in SOURCE_HEADERS {
            files.push((header.to_string(), format!("// {}\n", header)));
        }
        Self {
            files,
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl SourceFetcher for UpstreamFetcher {
    fn fetch(&self, request: &FetchRequest, dest: &Path) -> Result<()> {
        if dest.exists() {
            return Err(Error::FetchError(format!("{} exists", dest.display())));
        }
        self.requests.lock().unwrap().push(request.clone());
        for (path, content) in &self.files {
            write_file(&dest.join(path), content);
        }
        Ok(())
    }
}

/// Fetcher that always fails, as for an unknown revision
pub struct FailingFetcher;

impl SourceFetcher for FailingFetcher {
    fn fetch(&self, request: &FetchRequest, _dest: &Path) -> Result<()> {
        Err(Error::FetchError(format!(
            "Remote branch {} not found",
            request.revision
        )))
    }
}

/// What the fake build produces
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Complete,
    /// Compiles but never produces libgraphqljson
    MissingJson,
    CompileFails,
}

/// Driver that records configurations and writes build outputs
pub struct FakeCMake {
    outcome: BuildOutcome,
    pub seen: Mutex<Vec<BuildConfiguration>>,
}

impl FakeCMake {
    pub fn new(outcome: BuildOutcome) -> Self {
        Self {
            outcome,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn last_define(&self, key: &str) -> Option<String> {
        self.seen
            .lock()
            .unwrap()
            .last()
            .and_then(|config| config.defines.get(key).cloned())
    }
}

impl BuildDriver for FakeCMake {
    fn configure(&self, config: &BuildConfiguration) -> Result<String> {
        self.seen.lock().unwrap().push(config.clone());
        Ok("-- Configuring done\n-- Generating done".to_string())
    }

    fn compile(&self, config: &BuildConfiguration) -> Result<String> {
        if self.outcome == BuildOutcome::CompileFails {
            return Err(Error::CompileError {
                exit_code: Some(2),
                output: "GraphQLService.cpp: error: expected ';'".to_string(),
            });
        }

        let lib = config.build_dir.join("lib");
        write_file(&lib.join("libgraphqlpeg.a"), "peg");
        write_file(&lib.join("libgraphqlservice.a"), "service");
        if self.outcome != BuildOutcome::MissingJson {
            write_file(&lib.join("libgraphqljson.a"), "json");
        }
        write_file(&lib.join("libgraphqlresponse.a"), "not packaged");

        if config.defines.get("GRAPHQL_BUILD_SCHEMAGEN").map(String::as_str) == Some("ON") {
            write_file(&config.build_dir.join("bin/schemagen"), "#!/bin/sh\n");
        }
        Ok("[100%] Built target graphqlservice".to_string())
    }
}

/// Bundled recipe with `overrides` applied
pub fn cppgraphqlgen(overrides: &[(&str, &str)]) -> (Recipe, OptionValues) {
    let recipe = builtin::cppgraphqlgen().unwrap();
    let options = OptionValues::resolve(&recipe.metadata, overrides).unwrap();
    (recipe, options)
}

/// Kitchen config rooted in `dir`
pub fn kitchen_config(dir: &Path) -> KitchenConfig {
    let mut config = KitchenConfig::new(dir.join("work"), dir.join("package"));
    config.jobs = 2;
    config
}
