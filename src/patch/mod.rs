// src/patch/mod.rs

//! Unified diff handling
//!
//! Recipes carry their source modifications as unified diffs. This module
//! parses diff text into a [`PatchSet`] and applies it to a checked-out
//! tree with all-or-nothing semantics:
//!
//! - Every file diff is validated in memory before anything is written
//! - Hunks are matched at their recorded offset, tolerating a small drift
//! - A tree that already carries the patch is rejected instead of being
//!   patched twice
//!
//! Mail headers, diffstat blocks and signature trailers around the diffs
//! (as produced by `git format-patch`) are skipped by the parser.

mod apply;
mod parse;

pub use apply::{AppliedPatch, FileAction, PatchApplier, PatchedFile, DEFAULT_MAX_DRIFT};
pub use parse::parse_patch;

/// A single line inside a hunk, without its line terminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    Context(String),
    Remove(String),
    Add(String),
}

/// A contiguous block of changes within one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// 1-based start line in the original file
    pub old_start: usize,
    pub old_count: usize,
    /// 1-based start line in the patched file
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<HunkLine>,
    /// The original file ends inside this hunk without a newline
    pub old_missing_newline: bool,
    /// The patched file ends inside this hunk without a newline
    pub new_missing_newline: bool,
}

impl Hunk {
    /// Lines the original file must contain (context and removed lines)
    pub fn old_image(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                HunkLine::Context(s) | HunkLine::Remove(s) => Some(s.as_str()),
                HunkLine::Add(_) => None,
            })
            .collect()
    }

    /// Lines the patched file will contain (context and added lines)
    pub fn new_image(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                HunkLine::Context(s) | HunkLine::Add(s) => Some(s.as_str()),
                HunkLine::Remove(_) => None,
            })
            .collect()
    }

    /// True if the hunk only inserts lines
    pub fn is_pure_addition(&self) -> bool {
        !self.lines.iter().any(|l| matches!(l, HunkLine::Remove(_)))
    }

    /// Zero-based line index where the old image is expected
    pub(crate) fn expected_index(&self) -> usize {
        // `-N,0` means "insert after line N"
        if self.old_count == 0 {
            self.old_start
        } else {
            self.old_start.saturating_sub(1)
        }
    }
}

/// All hunks targeting one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Path before the change, `None` when the file is created
    pub old_path: Option<String>,
    /// Path after the change, `None` when the file is deleted
    pub new_path: Option<String>,
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// Path of the file this diff operates on, relative to the tree root
    pub fn target(&self) -> &str {
        self.new_path
            .as_deref()
            .or(self.old_path.as_deref())
            .unwrap_or_default()
    }

    pub fn is_creation(&self) -> bool {
        self.old_path.is_none()
    }

    pub fn is_deletion(&self) -> bool {
        self.new_path.is_none()
    }
}

/// An ordered collection of file diffs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSet {
    /// Name used in logs (usually the patch file name)
    pub name: String,
    pub files: Vec<FileDiff>,
}

impl PatchSet {
    /// Parse diff text, stripping `strip` leading path components
    pub fn parse(name: &str, text: &str, strip: u32) -> crate::Result<Self> {
        let files = parse_patch(text, strip)?;
        Ok(Self {
            name: name.to_string(),
            files,
        })
    }

    /// Total number of hunks across all files
    pub fn hunk_count(&self) -> usize {
        self.files.iter().map(|f| f.hunks.len()).sum()
    }

    /// Target paths in patch order
    pub fn targets(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.target()).collect()
    }
}
