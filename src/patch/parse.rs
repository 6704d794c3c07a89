// src/patch/parse.rs

//! Unified diff parser

use super::{FileDiff, Hunk, HunkLine};
use crate::error::{Error, Result};
use std::path::{Component, Path};

const DEV_NULL: &str = "/dev/null";

/// Parse unified diff text into file diffs
///
/// Anything outside `---`/`+++` headers and their hunks is ignored, which
/// covers `git format-patch` mail headers, diffstats and `-- ` trailers.
/// Hunk bodies are read by the counts in their `@@` header, so trailer
/// lines starting with `-` are never mistaken for removals.
pub fn parse_patch(text: &str, strip: u32) -> Result<Vec<FileDiff>> {
    let lines = split_lines(text);
    let mut files = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let is_header = lines[i].starts_with("--- ")
            && lines.get(i + 1).is_some_and(|next| next.starts_with("+++ "));
        if !is_header {
            i += 1;
            continue;
        }

        let old_path = header_path(&lines[i][4..], strip, i + 1)?;
        let new_path = header_path(&lines[i + 1][4..], strip, i + 2)?;
        if old_path.is_none() && new_path.is_none() {
            return Err(Error::PatchParse {
                line: i + 1,
                reason: "both sides of the diff are /dev/null".to_string(),
            });
        }
        i += 2;

        let mut hunks = Vec::new();
        while i < lines.len() && lines[i].starts_with("@@ ") {
            let (hunk, next) = parse_hunk(&lines, i)?;
            hunks.push(hunk);
            i = next;
        }

        if hunks.is_empty() {
            return Err(Error::PatchParse {
                line: i + 1,
                reason: "file header without hunks".to_string(),
            });
        }

        files.push(FileDiff {
            old_path,
            new_path,
            hunks,
        });
    }

    if files.is_empty() {
        return Err(Error::PatchParse {
            line: 0,
            reason: "no file diffs found".to_string(),
        });
    }

    Ok(files)
}

/// Split on `\n` only, keeping any `\r` so CRLF sources still match
fn split_lines(text: &str) -> Vec<&str> {
    let body = text.strip_suffix('\n').unwrap_or(text);
    if body.is_empty() {
        return Vec::new();
    }
    body.split('\n').collect()
}

/// Extract the path from a `---`/`+++` header, applying the strip level
fn header_path(raw: &str, strip: u32, line: usize) -> Result<Option<String>> {
    // Drop trailing timestamps ("path\t2019-11-30 ...")
    let path = raw.split('\t').next().unwrap_or(raw).trim_end();
    if path == DEV_NULL {
        return Ok(None);
    }

    let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
    let strip = strip as usize;
    if components.len() <= strip {
        return Err(Error::PatchParse {
            line,
            reason: format!("cannot strip {} components from '{}'", strip, path),
        });
    }

    let relative = components[strip..].join("/");
    if (strip == 0 && path.starts_with('/')) || !stays_inside(&relative) {
        return Err(Error::PatchParse {
            line,
            reason: format!("path '{}' leaves the source tree", path),
        });
    }

    Ok(Some(relative))
}

/// True if `relative` names a path below the directory it is joined to
pub(crate) fn stays_inside(relative: &str) -> bool {
    Path::new(relative)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Parse `-start[,count]` / `+start[,count]`
fn parse_range(range: &str) -> Option<(usize, usize)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

fn parse_hunk_header(line: &str) -> Option<(usize, usize, usize, usize)> {
    let rest = line.strip_prefix("@@ -")?;
    let (ranges, _section) = rest.split_once(" @@")?;
    let (old, new) = ranges.split_once(" +")?;
    let (old_start, old_count) = parse_range(old)?;
    let (new_start, new_count) = parse_range(new)?;
    Some((old_start, old_count, new_start, new_count))
}

fn parse_hunk(lines: &[&str], start: usize) -> Result<(Hunk, usize)> {
    let (old_start, old_count, new_start, new_count) =
        parse_hunk_header(lines[start]).ok_or_else(|| Error::PatchParse {
            line: start + 1,
            reason: format!("invalid hunk header '{}'", lines[start]),
        })?;

    let mut hunk = Hunk {
        old_start,
        old_count,
        new_start,
        new_count,
        lines: Vec::new(),
        old_missing_newline: false,
        new_missing_newline: false,
    };

    let mut old_seen = 0;
    let mut new_seen = 0;
    let mut i = start + 1;

    while old_seen < old_count || new_seen < new_count {
        let Some(raw) = lines.get(i) else {
            return Err(Error::PatchParse {
                line: i + 1,
                reason: "unexpected end of patch inside hunk".to_string(),
            });
        };

        match raw.as_bytes().first() {
            // Some tools strip the leading space from blank context lines
            None => {
                hunk.lines.push(HunkLine::Context(String::new()));
                old_seen += 1;
                new_seen += 1;
            }
            Some(b' ') => {
                hunk.lines.push(HunkLine::Context(raw[1..].to_string()));
                old_seen += 1;
                new_seen += 1;
            }
            Some(b'-') => {
                hunk.lines.push(HunkLine::Remove(raw[1..].to_string()));
                old_seen += 1;
            }
            Some(b'+') => {
                hunk.lines.push(HunkLine::Add(raw[1..].to_string()));
                new_seen += 1;
            }
            Some(b'\\') => mark_missing_newline(&mut hunk),
            _ => {
                return Err(Error::PatchParse {
                    line: i + 1,
                    reason: format!("unexpected line in hunk: '{}'", raw),
                });
            }
        }

        if old_seen > old_count || new_seen > new_count {
            return Err(Error::PatchParse {
                line: i + 1,
                reason: "hunk is longer than its header declares".to_string(),
            });
        }
        i += 1;
    }

    // A final "\ No newline at end of file" follows the last counted line
    if lines.get(i).is_some_and(|l| l.starts_with('\\')) {
        mark_missing_newline(&mut hunk);
        i += 1;
    }

    Ok((hunk, i))
}

fn mark_missing_newline(hunk: &mut Hunk) {
    match hunk.lines.last() {
        Some(HunkLine::Context(_)) => {
            hunk.old_missing_newline = true;
            hunk.new_missing_newline = true;
        }
        Some(HunkLine::Remove(_)) => hunk.old_missing_newline = true,
        Some(HunkLine::Add(_)) => hunk.new_missing_newline = true,
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMAT_PATCH: &str = "From 1234 Mon Sep 17 00:00:00 2001
Subject: [PATCH] tweak

---
 a.txt | 2 +-
 1 file changed, 1 insertion(+), 1 deletion(-)

diff --git a/a.txt b/a.txt
index 1111111..2222222 100644
--- a/a.txt
+++ b/a.txt
@@ -1,3 +1,3 @@
 one
-two
+TWO
 three
--
2.7.4
";

    #[test]
    fn test_parse_format_patch_ignores_preamble_and_trailer() {
        let files = parse_patch(FORMAT_PATCH, 1).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].target(), "a.txt");
        let hunk = &files[0].hunks[0];
        assert_eq!(hunk.old_start, 1);
        assert_eq!(hunk.lines.len(), 4);
        assert_eq!(hunk.old_image(), vec!["one", "two", "three"]);
        assert_eq!(hunk.new_image(), vec!["one", "TWO", "three"]);
    }

    #[test]
    fn test_parse_strip_levels() {
        let text = "--- a/src/x.c\t2019-01-01\n+++ b/src/x.c\t2019-01-02\n@@ -1 +1 @@\n-x\n+y\n";
        assert_eq!(parse_patch(text, 1).unwrap()[0].target(), "src/x.c");
        assert_eq!(parse_patch(text, 2).unwrap()[0].target(), "x.c");
        assert!(matches!(
            parse_patch(text, 3),
            Err(Error::PatchParse { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_paths_outside_tree() {
        for header in [
            "--- a/../escaped.txt\n+++ b/../escaped.txt\n",
            "--- a/src/../../x\n+++ b/src/../../x\n",
        ] {
            let text = format!("{header}@@ -1 +1 @@\n-x\n+y\n");
            assert!(matches!(
                parse_patch(&text, 1),
                Err(Error::PatchParse { line: 1, .. })
            ));
        }

        let absolute = "--- /etc/hosts\n+++ /etc/hosts\n@@ -1 +1 @@\n-x\n+y\n";
        assert!(matches!(
            parse_patch(absolute, 0),
            Err(Error::PatchParse { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_creation_and_missing_newline() {
        let text = "--- /dev/null\n+++ b/new.txt\n@@ -0,0 +1,2 @@\n+first\n+last\n\\ No newline at end of file\n";
        let files = parse_patch(text, 1).unwrap();
        assert!(files[0].is_creation());
        assert!(files[0].hunks[0].new_missing_newline);
        assert!(!files[0].hunks[0].old_missing_newline);
    }

    #[test]
    fn test_parse_blank_context_without_space() {
        let text = "--- a/f\n+++ b/f\n@@ -1,3 +1,3 @@\n a\n\n-b\n+c\n";
        let files = parse_patch(text, 1).unwrap();
        assert_eq!(files[0].hunks[0].old_image(), vec!["a", "", "b"]);
    }

    #[test]
    fn test_parse_truncated_hunk() {
        let text = "--- a/f\n+++ b/f\n@@ -1,3 +1,3 @@\n a\n-b\n";
        assert!(matches!(parse_patch(text, 1), Err(Error::PatchParse { .. })));
    }

    #[test]
    fn test_parse_no_diffs() {
        assert!(matches!(
            parse_patch("just some text\n", 1),
            Err(Error::PatchParse { line: 0, .. })
        ));
    }

    #[test]
    fn test_parse_multiple_files_and_hunks() {
        let text = "diff --git a/x b/x
--- a/x
+++ b/x
@@ -1,2 +1,2 @@
-a
+b
 c
@@ -10,1 +10,2 @@
 k
+l
diff --git a/y b/y
--- a/y
+++ b/y
@@ -1 +1 @@
-1
+2
";
        let files = parse_patch(text, 1).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].hunks.len(), 2);
        assert_eq!(files[0].hunks[1].old_start, 10);
        assert_eq!(files[1].target(), "y");
    }
}
