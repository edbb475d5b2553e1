/// Parse unified-diff patches to extract which lines were added in each file.
/// This is used for computing "diff coverage": what percentage of newly
/// added lines are covered by tests.
///
/// Patches are the per-file hunk text returned by a compare API, so there are
/// no `diff --git` / `+++` file headers to track. Anything outside a hunk is
/// ignored.
use std::collections::BTreeMap;

use crate::model::ChangedFile;

/// Map each changed file to its added line numbers (in the new file).
///
/// Files without a patch (binary or too large) are skipped, as are files
/// whose patch adds nothing.
pub fn extract_added_lines(files: &[ChangedFile]) -> BTreeMap<String, Vec<u32>> {
    files
        .iter()
        .filter_map(|file| {
            let patch = file.patch.as_deref()?;
            let lines = parse_patch(patch);
            (!lines.is_empty()).then(|| (file.path.clone(), lines))
        })
        .collect()
}

/// Parse the hunks of a single file's patch and return the added line
/// numbers, ascending.
pub fn parse_patch(patch: &str) -> Vec<u32> {
    let mut added = Vec::new();
    let mut new_line_number: u32 = 0;
    // Lines still expected in the current hunk, per side.
    let mut old_remaining: u32 = 0;
    let mut new_remaining: u32 = 0;

    for line in patch.lines() {
        if line.starts_with("@@ ") {
            if let Some(hunk) = parse_hunk_header(line) {
                new_line_number = hunk.new_start;
                old_remaining = hunk.old_len;
                new_remaining = hunk.new_len;
            }
            continue;
        }

        if old_remaining == 0 && new_remaining == 0 {
            // Between hunks, e.g. a trailing "\ No newline at end of file"
            continue;
        }

        match line.as_bytes().first() {
            Some(b'+') => {
                added.push(new_line_number);
                new_line_number = new_line_number.saturating_add(1);
                new_remaining = new_remaining.saturating_sub(1);
            }
            Some(b'-') => {
                // Deleted line, doesn't advance the new line counter
                old_remaining = old_remaining.saturating_sub(1);
            }
            Some(b'\\') => {
                // "\ No newline at end of file" is diff metadata, not a real line
            }
            _ => {
                // Context line. Some tools strip the leading space of blank
                // context lines, so an empty line counts too.
                new_line_number = new_line_number.saturating_add(1);
                old_remaining = old_remaining.saturating_sub(1);
                new_remaining = new_remaining.saturating_sub(1);
            }
        }
    }

    added
}

#[derive(Debug, PartialEq, Eq)]
struct HunkHeader {
    new_start: u32,
    old_len: u32,
    new_len: u32,
}

/// Parse a hunk header like "@@ -10,5 +20,8 @@ fn context()".
/// An omitted length means a length of one.
fn parse_hunk_header(line: &str) -> Option<HunkHeader> {
    let after_at = line.strip_prefix("@@ ")?;
    let mut parts = after_at.split(' ');
    // "-old_start[,old_len]" then "+new_start[,new_len]"
    let (_, old_len) = parse_range(parts.next()?.strip_prefix('-')?)?;
    let (new_start, new_len) = parse_range(parts.next()?.strip_prefix('+')?)?;
    Some(HunkHeader {
        new_start,
        old_len,
        new_len,
    })
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, len)) => Some((start.parse().ok()?, len.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}
