// src/patch/apply.rs

//! All-or-nothing patch application

use super::parse::stays_inside;
use super::{FileDiff, Hunk, PatchSet};
use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Default number of lines a hunk may drift from its recorded offset
pub const DEFAULT_MAX_DRIFT: usize = 10;

/// What applying a file diff does to the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Modified,
    Created,
    Deleted,
}

/// One file touched by an applied patch
#[derive(Debug, Clone)]
pub struct PatchedFile {
    /// Path relative to the patched tree
    pub path: PathBuf,
    pub action: FileAction,
    /// Content before patching (empty for created files)
    pub original: String,
    /// Content after patching (empty for deleted files)
    pub patched: String,
}

/// Result of a successful patch application
#[derive(Debug, Clone, Default)]
pub struct AppliedPatch {
    pub files: Vec<PatchedFile>,
}

impl AppliedPatch {
    /// Render the effective change of every touched file as a unified diff
    pub fn render_diff(&self) -> String {
        let mut out = String::new();
        for file in &self.files {
            let diff = diffy::create_patch(&file.original, &file.patched);
            out.push_str(&format!(
                "--- a/{path}\n+++ b/{path}\n",
                path = file.path.display()
            ));
            // diffy emits its own "--- original/+++ modified" header; keep the hunks
            for line in diff.to_string().lines().skip(2) {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

/// File content split into lines, remembering the final newline
#[derive(Debug, Clone)]
struct TextFile {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl TextFile {
    fn parse(content: &str) -> Self {
        if content.is_empty() {
            return Self {
                lines: Vec::new(),
                trailing_newline: false,
            };
        }
        let trailing_newline = content.ends_with('\n');
        let body = content.strip_suffix('\n').unwrap_or(content);
        Self {
            lines: body.split('\n').map(str::to_string).collect(),
            trailing_newline,
        }
    }

    fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        if self.trailing_newline && !self.lines.is_empty() {
            out.push('\n');
        }
        out
    }
}

/// A validated change waiting to be written
struct Planned {
    path: PathBuf,
    action: FileAction,
    original: String,
    patched: String,
}

/// Applies a [`PatchSet`] to a source tree
#[derive(Debug, Clone)]
pub struct PatchApplier {
    max_drift: usize,
}

impl Default for PatchApplier {
    fn default() -> Self {
        Self {
            max_drift: DEFAULT_MAX_DRIFT,
        }
    }
}

impl PatchApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how many lines a hunk may drift from its recorded offset
    pub fn with_max_drift(mut self, max_drift: usize) -> Self {
        self.max_drift = max_drift;
        self
    }

    /// Validate a patch against `base_dir` without writing anything
    pub fn check(&self, base_dir: &Path, patch: &PatchSet) -> Result<()> {
        self.plan(base_dir, patch).map(|_| ())
    }

    /// Apply a patch to `base_dir`
    ///
    /// Every file diff is resolved in memory first. If any hunk fails, no
    /// file is modified. Re-applying a patch that is already present fails
    /// with [`Error::PatchAlreadyAppliedOrConflict`].
    pub fn apply(&self, base_dir: &Path, patch: &PatchSet) -> Result<AppliedPatch> {
        let planned = self.plan(base_dir, patch)?;

        for change in &planned {
            let full_path = base_dir.join(&change.path);
            match change.action {
                FileAction::Deleted => {
                    fs::remove_file(&full_path)?;
                }
                FileAction::Modified | FileAction::Created => {
                    write_atomic(&full_path, change.patched.as_bytes())?;
                }
            }
            debug!("Patched {} ({:?})", change.path.display(), change.action);
        }

        info!(
            "Applied patch {} ({} file(s), {} hunk(s))",
            patch.name,
            planned.len(),
            patch.hunk_count()
        );

        Ok(AppliedPatch {
            files: planned
                .into_iter()
                .map(|p| PatchedFile {
                    path: p.path,
                    action: p.action,
                    original: p.original,
                    patched: p.patched,
                })
                .collect(),
        })
    }

    fn plan(&self, base_dir: &Path, patch: &PatchSet) -> Result<Vec<Planned>> {
        let mut planned: Vec<Planned> = Vec::new();

        for diff in &patch.files {
            if !stays_inside(diff.target()) {
                return Err(Error::PatchApplyError {
                    file: diff.target().to_string(),
                    hunk: 0,
                    reason: "path leaves the source tree".to_string(),
                });
            }
            let rel = PathBuf::from(diff.target());
            let full_path = base_dir.join(&rel);

            // A later diff for the same file applies on top of the earlier one
            let previous = planned.iter().position(|p| p.path == rel);
            let current: Option<String> = match previous {
                Some(idx) if planned[idx].action == FileAction::Deleted => None,
                Some(idx) => Some(planned[idx].patched.clone()),
                None if full_path.is_file() => Some(fs::read_to_string(&full_path)?),
                None => None,
            };

            let (action, patched) = self.resolve(diff, current.as_deref())?;

            match previous {
                Some(idx) => {
                    planned[idx].patched = patched;
                    if action == FileAction::Deleted {
                        planned[idx].action = FileAction::Deleted;
                    }
                }
                None => planned.push(Planned {
                    path: rel,
                    action,
                    original: current.unwrap_or_default(),
                    patched,
                }),
            }
        }

        Ok(planned)
    }

    fn resolve(&self, diff: &FileDiff, current: Option<&str>) -> Result<(FileAction, String)> {
        let target = diff.target().to_string();

        if diff.is_creation() {
            if current.is_some() {
                return Err(Error::PatchAlreadyAppliedOrConflict { file: target });
            }
            let mut file = TextFile {
                lines: Vec::new(),
                trailing_newline: true,
            };
            self.apply_hunks(&target, &mut file, &diff.hunks)?;
            return Ok((FileAction::Created, file.render()));
        }

        let Some(content) = current else {
            return Err(Error::PatchApplyError {
                file: target,
                hunk: 0,
                reason: "file not found".to_string(),
            });
        };

        let mut file = TextFile::parse(content);
        self.apply_hunks(&target, &mut file, &diff.hunks)?;

        if diff.is_deletion() {
            if !file.lines.is_empty() {
                return Err(Error::PatchApplyError {
                    file: target,
                    hunk: diff.hunks.len().saturating_sub(1),
                    reason: "file to delete has content outside the patch".to_string(),
                });
            }
            return Ok((FileAction::Deleted, String::new()));
        }

        Ok((FileAction::Modified, file.render()))
    }

    fn apply_hunks(&self, target: &str, file: &mut TextFile, hunks: &[Hunk]) -> Result<()> {
        // Net line shift (including drift) carried from earlier hunks
        let mut offset: isize = 0;
        // First line a hunk may touch; hunks never overlap
        let mut floor = 0usize;

        for (index, hunk) in hunks.iter().enumerate() {
            let old = hunk.old_image();
            let new = hunk.new_image();
            let expected = (hunk.expected_index() as isize + offset).max(0) as usize;

            // The old image of an insertion survives application, so look for
            // the inserted lines first or a second run would insert them again
            if hunk.is_pure_addition()
                && new.len() > old.len()
                && self.locate(&file.lines, &new, expected, floor).is_some()
            {
                return Err(Error::PatchAlreadyAppliedOrConflict {
                    file: target.to_string(),
                });
            }

            let found = self.locate(&file.lines, &old, expected, floor);

            // A replacement whose result sits closer to the recorded offset
            // than any copy of its old image has already been applied
            if !hunk.is_pure_addition() && !new.is_empty() {
                if let Some(applied) = self.locate(&file.lines, &new, expected, floor) {
                    let nearer = found.is_none_or(|pos| {
                        applied.abs_diff(expected) < pos.abs_diff(expected)
                    });
                    if nearer {
                        return Err(Error::PatchAlreadyAppliedOrConflict {
                            file: target.to_string(),
                        });
                    }
                }
            }

            let Some(pos) = found else {
                return Err(Error::PatchApplyError {
                    file: target.to_string(),
                    hunk: index,
                    reason: format!(
                        "context does not match near line {} (drift limit {})",
                        expected + 1,
                        self.max_drift
                    ),
                });
            };

            if pos != expected {
                debug!(
                    "{}: hunk #{} applied with drift {}",
                    target,
                    index,
                    pos as isize - expected as isize
                );
            }

            file.lines
                .splice(pos..pos + old.len(), new.iter().map(|s| s.to_string()));
            offset = pos as isize - hunk.expected_index() as isize + new.len() as isize
                - old.len() as isize;
            floor = pos + new.len();

            if hunk.new_missing_newline {
                file.trailing_newline = false;
            } else if hunk.old_missing_newline {
                file.trailing_newline = true;
            }
        }

        Ok(())
    }

    /// Find `needle` starting at `expected`, trying the nearest offsets first
    fn locate(&self, lines: &[String], needle: &[&str], expected: usize, floor: usize) -> Option<usize> {
        let fits = |pos: usize| {
            pos >= floor
                && pos + needle.len() <= lines.len()
                && lines[pos..pos + needle.len()]
                    .iter()
                    .zip(needle)
                    .all(|(have, want)| have == want)
        };

        for drift in 0..=self.max_drift {
            let forward = expected.checked_add(drift);
            let backward = if drift > 0 { expected.checked_sub(drift) } else { None };
            if let Some(pos) = forward.into_iter().chain(backward).find(|&pos| fits(pos)) {
                return Some(pos);
            }
        }
        None
    }
}

/// Write through a sibling temp file and rename, keeping permissions
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let permissions = fs::metadata(path).ok().map(|m| m.permissions());
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(content)?;
    if let Some(permissions) = permissions {
        fs::set_permissions(tmp.path(), permissions)?;
    }
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        dir
    }

    fn patch(text: &str) -> PatchSet {
        PatchSet::parse("test.patch", text, 1).unwrap()
    }

    const ORIGINAL: &str = "alpha\nbeta\ngamma\ndelta\nepsilon\n";

    const SIMPLE: &str = "--- a/f.txt
+++ b/f.txt
@@ -2,3 +2,3 @@
 beta
-gamma
+GAMMA
 delta
";

    #[test]
    fn test_apply_matches_hand_patched_reference() {
        let dir = tree(&[("f.txt", ORIGINAL)]);
        let applied = PatchApplier::new().apply(dir.path(), &patch(SIMPLE)).unwrap();
        assert_eq!(applied.files.len(), 1);
        assert_eq!(applied.files[0].action, FileAction::Modified);
        assert_eq!(
            fs::read_to_string(dir.path().join("f.txt")).unwrap(),
            "alpha\nbeta\nGAMMA\ndelta\nepsilon\n"
        );
    }

    #[test]
    fn test_apply_twice_fails() {
        let dir = tree(&[("f.txt", ORIGINAL)]);
        let applier = PatchApplier::new();
        applier.apply(dir.path(), &patch(SIMPLE)).unwrap();
        let err = applier.apply(dir.path(), &patch(SIMPLE)).unwrap_err();
        assert!(matches!(err, Error::PatchAlreadyAppliedOrConflict { .. }));
    }

    #[test]
    fn test_apply_twice_with_repeated_context_fails() {
        let text = "--- a/f.txt\n+++ b/f.txt\n@@ -1,2 +1,2 @@\n-x\n+X\n y\n";
        let dir = tree(&[("f.txt", "x\ny\nx\ny\nz\n")]);
        let applier = PatchApplier::new();

        applier.apply(dir.path(), &patch(text)).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("f.txt")).unwrap(),
            "X\ny\nx\ny\nz\n"
        );

        assert!(matches!(
            applier.apply(dir.path(), &patch(text)),
            Err(Error::PatchAlreadyAppliedOrConflict { .. })
        ));
        assert_eq!(
            fs::read_to_string(dir.path().join("f.txt")).unwrap(),
            "X\ny\nx\ny\nz\n"
        );
    }

    #[test]
    fn test_pure_insertion_twice_fails() {
        let text = "--- a/f.txt\n+++ b/f.txt\n@@ -1,2 +1,3 @@\n alpha\n beta\n+inserted\n";
        let dir = tree(&[("f.txt", ORIGINAL)]);
        let applier = PatchApplier::new();
        applier.apply(dir.path(), &patch(text)).unwrap();
        assert!(matches!(
            applier.apply(dir.path(), &patch(text)),
            Err(Error::PatchAlreadyAppliedOrConflict { .. })
        ));
    }

    #[test]
    fn test_apply_with_drift() {
        let shifted = format!("new first line\nanother\n{}", ORIGINAL);
        let dir = tree(&[("f.txt", &shifted)]);
        PatchApplier::new().apply(dir.path(), &patch(SIMPLE)).unwrap();
        assert!(fs::read_to_string(dir.path().join("f.txt"))
            .unwrap()
            .contains("GAMMA"));
    }

    #[test]
    fn test_drift_beyond_limit_fails() {
        let shifted = format!("x\ny\nz\n{}", ORIGINAL);
        let dir = tree(&[("f.txt", &shifted)]);
        let err = PatchApplier::new()
            .with_max_drift(1)
            .apply(dir.path(), &patch(SIMPLE))
            .unwrap_err();
        assert!(matches!(err, Error::PatchApplyError { hunk: 0, .. }));
    }

    #[test]
    fn test_failed_hunk_modifies_nothing() {
        let text = "--- a/a.txt
+++ b/a.txt
@@ -1,1 +1,1 @@
-one
+ONE
--- a/b.txt
+++ b/b.txt
@@ -1,2 +1,2 @@
 first
-second
+SECOND
@@ -5,1 +5,1 @@
-missing
+MISSING
";
        let dir = tree(&[("a.txt", "one\n"), ("b.txt", "first\nsecond\nthird\n")]);
        let err = PatchApplier::new().apply(dir.path(), &patch(text)).unwrap_err();
        match err {
            Error::PatchApplyError { file, hunk, .. } => {
                assert_eq!(file, "b.txt");
                assert_eq!(hunk, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "one\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("b.txt")).unwrap(),
            "first\nsecond\nthird\n"
        );
    }

    #[test]
    fn test_missing_target_file() {
        let dir = tree(&[]);
        let err = PatchApplier::new().apply(dir.path(), &patch(SIMPLE)).unwrap_err();
        assert!(matches!(err, Error::PatchApplyError { hunk: 0, .. }));
    }

    #[test]
    fn test_create_and_delete() {
        let text = "--- /dev/null
+++ b/sub/new.txt
@@ -0,0 +1,2 @@
+hello
+world
--- a/old.txt
+++ /dev/null
@@ -1,1 +0,0 @@
-bye
";
        let dir = tree(&[("old.txt", "bye\n")]);
        let applied = PatchApplier::new().apply(dir.path(), &patch(text)).unwrap();
        assert_eq!(applied.files[0].action, FileAction::Created);
        assert_eq!(applied.files[1].action, FileAction::Deleted);
        assert_eq!(
            fs::read_to_string(dir.path().join("sub/new.txt")).unwrap(),
            "hello\nworld\n"
        );
        assert!(!dir.path().join("old.txt").exists());
    }

    #[test]
    fn test_create_existing_file_conflicts() {
        let text = "--- /dev/null\n+++ b/new.txt\n@@ -0,0 +1 @@\n+x\n";
        let dir = tree(&[("new.txt", "x\n")]);
        assert!(matches!(
            PatchApplier::new().apply(dir.path(), &patch(text)),
            Err(Error::PatchAlreadyAppliedOrConflict { .. })
        ));
    }

    #[test]
    fn test_missing_newline_at_eof() {
        let text = "--- a/f\n+++ b/f\n@@ -1,2 +1,2 @@\n a\n-b\n+c\n\\ No newline at end of file\n";
        let dir = tree(&[("f", "a\nb\n")]);
        PatchApplier::new().apply(dir.path(), &patch(text)).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("f")).unwrap(), "a\nc");
    }

    #[test]
    fn test_check_does_not_write() {
        let dir = tree(&[("f.txt", ORIGINAL)]);
        PatchApplier::new().check(dir.path(), &patch(SIMPLE)).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("f.txt")).unwrap(), ORIGINAL);
    }

    #[test]
    fn test_render_diff() {
        let dir = tree(&[("f.txt", ORIGINAL)]);
        let applied = PatchApplier::new().apply(dir.path(), &patch(SIMPLE)).unwrap();
        let diff = applied.render_diff();
        assert!(diff.starts_with("--- a/f.txt\n+++ b/f.txt\n"));
        assert!(diff.contains("-gamma"));
        assert!(diff.contains("+GAMMA"));
    }
}
