//! Merging a user's edit onto the current revision of a document.
//!
//! An edit names the revision it started from (`base`). When that is still
//! the latest revision the edit is taken verbatim. Otherwise the user's
//! changes relative to `base` are replayed onto the latest content; the
//! merge only succeeds when every hunk applies.

use crate::error::CoreError;
use crate::patch::{Patch, PatchResult};
use crate::revision::{Revision, TextRevision};
use crate::types::DbId;

/// Shown when a page edit could not be merged onto the latest revision.
pub const PAGE_CONFLICT_MESSAGE: &str = "Somebody else has modified this page in the meantime. \
    It is not possible to merge all the changes automatically. Stash your version somewhere \
    else and reapply with the latest revision.";

/// Shown when an image upload was based on an outdated revision.
pub const IMAGE_CONFLICT_MESSAGE: &str = "Somebody else has modified this image in the meantime. \
    Please review these changes before uploading your version.";

/// The content a successful merge produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The edit was based on the latest revision and is stored as submitted.
    Accepted(String),
    /// The edit was replayed onto a newer revision.
    Rebased(String),
}

impl MergeOutcome {
    pub fn content(&self) -> &str {
        match self {
            Self::Accepted(content) | Self::Rebased(content) => content,
        }
    }

    pub fn into_content(self) -> String {
        match self {
            Self::Accepted(content) | Self::Rebased(content) => content,
        }
    }

    pub fn was_rebased(&self) -> bool {
        matches!(self, Self::Rebased(_))
    }
}

/// Replay the changes between `base` and `ours` onto `latest`.
pub fn rebase(base: &str, latest: &str, ours: &str) -> PatchResult {
    Patch::make(base, ours).apply(latest)
}

/// Decide what content a page edit should be saved with.
///
/// `base` is the revision the user started from (`None` for a page that did
/// not exist yet), `latest` the document's current revision.
pub fn merge_edit<R: TextRevision>(
    base: Option<&R>,
    latest: Option<&R>,
    edited: &str,
) -> Result<MergeOutcome, CoreError> {
    if base.map(Revision::id) == latest.map(Revision::id) {
        return Ok(MergeOutcome::Accepted(edited.to_string()));
    }

    let (Some(base), Some(latest)) = (base, latest) else {
        return Err(conflict(edited));
    };

    let result = rebase(base.content(), latest.content(), edited);
    if result.is_clean() {
        Ok(MergeOutcome::Rebased(result.text))
    } else {
        Err(conflict(edited))
    }
}

/// Uploads cannot be merged: the base must still be the latest revision.
pub fn ensure_base_is_latest(
    base_id: Option<DbId>,
    latest_id: Option<DbId>,
) -> Result<(), CoreError> {
    if base_id == latest_id {
        Ok(())
    } else {
        Err(CoreError::Conflict(IMAGE_CONFLICT_MESSAGE.to_string()))
    }
}

fn conflict(edited: &str) -> CoreError {
    CoreError::EditConflict {
        message: PAGE_CONFLICT_MESSAGE.to_string(),
        content: edited.to_string(),
    }
}
