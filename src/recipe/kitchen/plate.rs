// src/recipe/kitchen/plate.rs

//! Plate: assemble build outputs into the package layout
//!
//! Every copy rule is matched before anything is copied. A required rule
//! that matches nothing aborts the assembly with the destination untouched,
//! so a package directory is either complete or absent.

use crate::error::{Error, Result};
use crate::hash::sha256_file;
use crate::recipe::format::{ArtifactRoot, CopyRule, PackageInfo, RecipeMetadata, Role};
use crate::recipe::options::OptionValues;
use chrono::{DateTime, Utc};
use glob::{MatchOptions, Pattern};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Name of the manifest written at the package root
pub const MANIFEST_FILE: &str = "MANIFEST.json";

/// `*` crosses directory separators, matching fnmatch-style copy rules
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Copy rules grouped by destination role
#[derive(Debug, Clone, Default)]
pub struct PackageLayout {
    rules: BTreeMap<Role, Vec<CopyRule>>,
}

impl PackageLayout {
    /// Layout for `metadata` with rules gated by disabled options dropped
    pub fn new(metadata: &RecipeMetadata, options: &OptionValues) -> Self {
        let mut rules: BTreeMap<Role, Vec<CopyRule>> = BTreeMap::new();
        for rule in &metadata.copy_rules {
            if let Some(gate) = &rule.when {
                if !options.is_enabled(gate) {
                    debug!("Skipping {} rule '{}': {} is off", rule.role, rule.pattern, gate);
                    continue;
                }
            }
            rules.entry(rule.role).or_default().push(rule.clone());
        }
        Self { rules }
    }

    pub fn rules(&self, role: Role) -> &[CopyRule] {
        self.rules.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.rules.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.values().all(Vec::is_empty)
    }
}

/// The two trees copy rules read from
#[derive(Debug, Clone)]
pub struct ArtifactRoots {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
}

impl ArtifactRoots {
    pub fn resolve(&self, rule: &CopyRule) -> PathBuf {
        let root = match rule.root {
            ArtifactRoot::Source => &self.source_dir,
            ArtifactRoot::Build => &self.build_dir,
        };
        if rule.src.is_empty() {
            root.clone()
        } else {
            root.join(&rule.src)
        }
    }
}

/// One file in the assembled package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackagedFile {
    pub role: Role,
    /// Path relative to the package root
    pub path: PathBuf,
    pub size: u64,
    pub sha256: String,
}

/// Contents of `MANIFEST.json`
#[derive(Debug, Clone, Serialize)]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    pub options: OptionValues,
    pub info: PackageInfo,
    pub files: Vec<PackagedFile>,
    pub created_at: DateTime<Utc>,
}

impl PackageManifest {
    pub fn files_in(&self, role: Role) -> impl Iterator<Item = &PackagedFile> {
        self.files.iter().filter(move |f| f.role == role)
    }
}

/// A matched file waiting to be copied
#[derive(Debug)]
struct PlannedCopy {
    role: Role,
    from: PathBuf,
}

/// Copy everything `layout` selects from `roots` into `dest`
///
/// `dest` must be absent or empty. Raises `MissingArtifactError` for the
/// first required rule with no match, before any file is written.
pub fn assemble(
    metadata: &RecipeMetadata,
    options: &OptionValues,
    layout: &PackageLayout,
    roots: &ArtifactRoots,
    dest: &Path,
) -> Result<PackageManifest> {
    // Keyed by destination so later rules override earlier ones
    let mut plan: BTreeMap<PathBuf, PlannedCopy> = BTreeMap::new();

    for role in layout.roles() {
        for rule in layout.rules(role) {
            let search_root = roots.resolve(rule);
            let matched = match_rule(rule, &search_root)?;

            if matched.is_empty() {
                if rule.optional {
                    debug!("Optional {} rule '{}' matched nothing", role, rule.pattern);
                    continue;
                }
                return Err(Error::MissingArtifactError {
                    role: role.to_string(),
                    pattern: rule.pattern.clone(),
                    root: search_root,
                });
            }

            debug!(
                "{} rule '{}' matched {} file(s) under {}",
                role,
                rule.pattern,
                matched.len(),
                search_root.display()
            );
            for relative in matched {
                let from = search_root.join(&relative);
                plan.insert(Path::new(role.dir_name()).join(relative), PlannedCopy { role, from });
            }
        }
    }

    ensure_empty(dest)?;
    fs::create_dir_all(dest)?;

    let mut files = Vec::with_capacity(plan.len());
    for (relative, copy) in plan {
        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let size = fs::copy(&copy.from, &target)?;
        files.push(PackagedFile {
            role: copy.role,
            path: relative,
            size,
            sha256: sha256_file(&target)?,
        });
    }

    let manifest = PackageManifest {
        name: metadata.package.name.clone(),
        version: metadata.package.version.clone(),
        options: options.clone(),
        info: metadata.info.clone(),
        files,
        created_at: Utc::now(),
    };
    fs::write(
        dest.join(MANIFEST_FILE),
        serde_json::to_string_pretty(&manifest)?,
    )?;

    info!(
        "Plated {} {} into {} ({} files)",
        manifest.name,
        manifest.version,
        dest.display(),
        manifest.files.len()
    );

    Ok(manifest)
}

/// Relative paths of regular files under `root` matching the rule's pattern
fn match_rule(rule: &CopyRule, root: &Path) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(&rule.pattern).map_err(|e| {
        Error::RecipeParse(format!("invalid copy pattern '{}': {}", rule.pattern, e))
    })?;

    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut matched = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        if pattern.matches_with(&slash_path(relative), MATCH_OPTIONS) {
            matched.push(relative.to_path_buf());
        }
    }
    Ok(matched)
}

/// Path with `/` separators regardless of platform
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Fail unless `dest` is absent or an empty directory
pub fn ensure_empty(dest: &Path) -> Result<()> {
    if dest.exists() && fs::read_dir(dest)?.next().is_some() {
        return Err(Error::PackageDirNotEmpty {
            path: dest.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::parser::parse_recipe;

    const RECIPE: &str = r#"
[package]
name = "demo"
version = "1.0"

[source]
git = "https://example.com/demo.git"
revision = "v%(version)s"

[options.tool]
values = [true, false]
default = true

[[copy]]
role = "include"
root = "source"
src = "include"
pattern = "demo/*"

[[copy]]
role = "lib"
src = "lib"
pattern = "*demo.*"

[[copy]]
role = "include"
src = "include"
pattern = "demo/*"
optional = true

[[copy]]
role = "bin"
src = "bin"
pattern = "tool*"
when = "tool"
"#;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn setup(with_tool: bool) -> (tempfile::TempDir, ArtifactRoots) {
        let dir = tempfile::tempdir().unwrap();
        let roots = ArtifactRoots {
            source_dir: dir.path().join("src"),
            build_dir: dir.path().join("build"),
        };
        write(&roots.source_dir.join("include/demo/a.h"), "a");
        write(&roots.source_dir.join("include/demo/sub/b.h"), "b");
        write(&roots.source_dir.join("include/other.h"), "o");
        write(&roots.build_dir.join("lib/libdemo.a"), "lib");
        write(&roots.build_dir.join("lib/Release/demo.lib"), "win");
        write(&roots.build_dir.join("lib/libother.a"), "x");
        if with_tool {
            write(&roots.build_dir.join("bin/tool"), "#!/bin/sh\n");
        }
        (dir, roots)
    }

    #[test]
    fn test_layout_drops_gated_rules() {
        let meta = parse_recipe(RECIPE).unwrap();
        let on = OptionValues::defaults(&meta);
        assert_eq!(PackageLayout::new(&meta, &on).rules(Role::Bin).len(), 1);

        let off = OptionValues::resolve(&meta, &[("tool", "false")]).unwrap();
        let layout = PackageLayout::new(&meta, &off);
        assert!(layout.rules(Role::Bin).is_empty());
        assert_eq!(layout.rules(Role::Include).len(), 2);
    }

    #[test]
    fn test_assemble_layout() {
        let meta = parse_recipe(RECIPE).unwrap();
        let options = OptionValues::defaults(&meta);
        let (dir, roots) = setup(true);
        let dest = dir.path().join("pkg");

        let manifest =
            assemble(&meta, &options, &PackageLayout::new(&meta, &options), &roots, &dest).unwrap();

        assert!(dest.join("include/demo/a.h").is_file());
        assert!(dest.join("include/demo/sub/b.h").is_file());
        assert!(!dest.join("include/other.h").exists());
        assert!(dest.join("lib/libdemo.a").is_file());
        assert!(dest.join("lib/Release/demo.lib").is_file());
        assert!(!dest.join("lib/libother.a").exists());
        assert_eq!(fs::read_to_string(dest.join("bin/tool")).unwrap(), "#!/bin/sh\n");
        assert!(dest.join(MANIFEST_FILE).is_file());

        assert_eq!(manifest.files.len(), 5);
        assert_eq!(manifest.files_in(Role::Lib).count(), 2);
        let tool = manifest.files_in(Role::Bin).next().unwrap();
        assert_eq!(tool.path, PathBuf::from("bin/tool"));
        assert_eq!(tool.sha256, crate::hash::sha256_bytes(b"#!/bin/sh\n"));
    }

    #[test]
    fn test_missing_required_artifact_copies_nothing() {
        let meta = parse_recipe(RECIPE).unwrap();
        let options = OptionValues::defaults(&meta);
        let (dir, roots) = setup(false);
        let dest = dir.path().join("pkg");

        let err = assemble(&meta, &options, &PackageLayout::new(&meta, &options), &roots, &dest)
            .unwrap_err();
        match err {
            Error::MissingArtifactError { role, pattern, .. } => {
                assert_eq!(role, "bin");
                assert_eq!(pattern, "tool*");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dest.exists());
    }

    #[test]
    fn test_gated_rule_off_skips_missing_tool() {
        let meta = parse_recipe(RECIPE).unwrap();
        let options = OptionValues::resolve(&meta, &[("tool", "off")]).unwrap();
        let (dir, roots) = setup(false);
        let dest = dir.path().join("pkg");

        let manifest =
            assemble(&meta, &options, &PackageLayout::new(&meta, &options), &roots, &dest).unwrap();
        assert_eq!(manifest.files_in(Role::Bin).count(), 0);
        assert!(!dest.join("bin").exists());
    }

    #[test]
    fn test_non_empty_destination_rejected() {
        let meta = parse_recipe(RECIPE).unwrap();
        let options = OptionValues::defaults(&meta);
        let (dir, roots) = setup(true);
        let dest = dir.path().join("pkg");
        write(&dest.join("stale"), "old");

        assert!(matches!(
            assemble(&meta, &options, &PackageLayout::new(&meta, &options), &roots, &dest),
            Err(Error::PackageDirNotEmpty { .. })
        ));
        assert!(!dest.join("lib").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_bit_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let meta = parse_recipe(RECIPE).unwrap();
        let options = OptionValues::defaults(&meta);
        let (dir, roots) = setup(true);
        let tool = roots.build_dir.join("bin/tool");
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        let dest = dir.path().join("pkg");

        assemble(&meta, &options, &PackageLayout::new(&meta, &options), &roots, &dest).unwrap();
        let mode = fs::metadata(dest.join("bin/tool")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
