//! Line-level patch engine built on `similar`.
//!
//! A [`Patch`] is the set of edits turning one text into another, grouped
//! into hunks that carry a few lines of surrounding context. Applying a patch
//! to a third text locates each hunk's old lines (context included) at the
//! nearest matching position and reports per-hunk success, so callers can
//! decide whether a partially applicable patch is acceptable.

use similar::{ChangeTag, DiffTag, TextDiff};

/// Lines of unchanged context kept on each side of an edit.
pub const CONTEXT_LINES: usize = 3;

/// One contiguous edit region.
///
/// `old_lines` and `new_lines` both include the surrounding context lines
/// and keep their line terminators, so concatenating them reproduces the
/// exact text of the region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// Zero-based line index of the region in the text the patch was made from.
    pub old_start: usize,
    pub old_lines: Vec<String>,
    pub new_lines: Vec<String>,
}

/// The outcome of applying a [`Patch`] to some text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchResult {
    /// The text with every applicable hunk applied.
    pub text: String,
    /// One entry per hunk, `true` when that hunk applied.
    pub applied: Vec<bool>,
}

impl PatchResult {
    /// Whether every hunk applied.
    pub fn is_clean(&self) -> bool {
        self.applied.iter().all(|applied| *applied)
    }
}

/// An ordered set of hunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    hunks: Vec<Hunk>,
}

impl Patch {
    /// Compute the patch turning `old` into `new`.
    pub fn make(old: &str, new: &str) -> Self {
        if old == new {
            return Self::default();
        }

        let diff = TextDiff::from_lines(old, new);
        let mut hunks = Vec::new();

        for group in diff.grouped_ops(CONTEXT_LINES) {
            if group.iter().all(|op| op.tag() == DiffTag::Equal) {
                continue;
            }
            let Some(first) = group.first() else {
                continue;
            };

            let mut hunk = Hunk {
                old_start: first.old_range().start,
                old_lines: Vec::new(),
                new_lines: Vec::new(),
            };
            for op in &group {
                for change in diff.iter_changes(op) {
                    let line = change.value().to_string();
                    match change.tag() {
                        ChangeTag::Equal => {
                            hunk.old_lines.push(line.clone());
                            hunk.new_lines.push(line);
                        }
                        ChangeTag::Delete => hunk.old_lines.push(line),
                        ChangeTag::Insert => hunk.new_lines.push(line),
                    }
                }
            }
            hunks.push(hunk);
        }

        Self { hunks }
    }

    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Apply the patch to `target`.
    ///
    /// Hunks are applied in order. Each one is searched for starting at the
    /// position its predecessors' shifts predict, moving outward, and never
    /// before the end of the previously applied hunk. A hunk whose old lines
    /// cannot be found is skipped and reported as failed.
    pub fn apply(&self, target: &str) -> PatchResult {
        let mut lines: Vec<&str> = target.split_inclusive('\n').collect();
        let mut applied = Vec::with_capacity(self.hunks.len());
        let mut floor = 0usize;
        let mut shift = 0isize;

        for hunk in &self.hunks {
            let expected = (hunk.old_start as isize + shift).max(0) as usize;
            match locate(&lines, &hunk.old_lines, expected, floor) {
                Some(at) => {
                    let end = at + hunk.new_lines.len();
                    lines.splice(
                        at..at + hunk.old_lines.len(),
                        hunk.new_lines.iter().map(String::as_str),
                    );
                    shift = end as isize - (hunk.old_start + hunk.old_lines.len()) as isize;
                    floor = end;
                    applied.push(true);
                }
                None => applied.push(false),
            }
        }

        PatchResult {
            text: lines.concat(),
            applied,
        }
    }
}

/// Find `needle` in `lines` at or after `floor`, preferring the position
/// closest to `expected`.
fn locate(lines: &[&str], needle: &[String], expected: usize, floor: usize) -> Option<usize> {
    if needle.len() > lines.len() {
        return None;
    }
    let last = lines.len() - needle.len();
    if floor > last {
        return None;
    }

    let matches_at = |at: usize| {
        lines[at..at + needle.len()]
            .iter()
            .zip(needle)
            .all(|(line, wanted)| *line == wanted.as_str())
    };

    let expected = expected.clamp(floor, last);
    for distance in 0..=(last - floor) {
        let after = expected + distance;
        if after <= last && matches_at(after) {
            return Some(after);
        }
        if distance > 0 {
            if let Some(before) = expected.checked_sub(distance) {
                if before >= floor && matches_at(before) {
                    return Some(before);
                }
            }
        }
    }
    None
}
