//! Read-only revision comparison for display.

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

/// How finely two revisions are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffGranularity {
    #[default]
    Lines,
    Words,
}

/// The kind of a chunk in a diff result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Added,
    Removed,
    Unchanged,
}

impl From<ChangeTag> for DiffKind {
    fn from(tag: ChangeTag) -> Self {
        match tag {
            ChangeTag::Insert => Self::Added,
            ChangeTag::Delete => Self::Removed,
            ChangeTag::Equal => Self::Unchanged,
        }
    }
}

/// A run of text sharing one [`DiffKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffChunk {
    pub kind: DiffKind,
    pub content: String,
}

/// Added/removed counts in units of the chosen granularity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
}

/// Compare `old` and `new`.
///
/// Line granularity yields one chunk per line with the terminator stripped.
/// Word granularity merges adjacent tokens of the same kind into chunks and
/// keeps whitespace, so concatenating the unchanged and added chunks
/// reproduces `new`.
pub fn compute_diff(old: &str, new: &str, granularity: DiffGranularity) -> Vec<DiffChunk> {
    match granularity {
        DiffGranularity::Lines => TextDiff::from_lines(old, new)
            .iter_all_changes()
            .map(|change| DiffChunk {
                kind: change.tag().into(),
                content: change
                    .value()
                    .trim_end_matches(['\n', '\r'])
                    .to_string(),
            })
            .collect(),
        DiffGranularity::Words => {
            let diff = TextDiff::from_words(old, new);
            let mut chunks: Vec<DiffChunk> = Vec::new();
            for change in diff.iter_all_changes() {
                let kind = DiffKind::from(change.tag());
                match chunks.last_mut() {
                    Some(last) if last.kind == kind => last.content.push_str(change.value()),
                    _ => chunks.push(DiffChunk {
                        kind,
                        content: change.value().to_string(),
                    }),
                }
            }
            chunks
        }
    }
}

/// Count added and removed chunks.
pub fn diff_stats(chunks: &[DiffChunk]) -> DiffStats {
    chunks.iter().fold(DiffStats::default(), |mut stats, chunk| {
        match chunk.kind {
            DiffKind::Added => stats.added += 1,
            DiffKind::Removed => stats.removed += 1,
            DiffKind::Unchanged => {}
        }
        stats
    })
}
