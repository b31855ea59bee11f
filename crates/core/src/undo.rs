//! Undoing and reverting past page revisions.
//!
//! Both produce a *proposal*: new content and a description that the user
//! then saves through the normal edit path.

use crate::patch::Patch;
use crate::revision::{Revision, TextRevision};
use crate::types::{DbId, Timestamp};

/// Shown when the inverse of a revision no longer applies to the latest content.
pub const UNDO_CONFLICT_MESSAGE: &str = "It was impossible to automatically undo the change \
    you have selected. Perhaps the page has been modified too much in the meantime. Review \
    the following content comparison, which represents the change you tried to undo, and \
    apply the changes manually to the latest revision.";

/// Result of trying to undo one revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    /// Content to propose for the next edit.
    Proposed(String),
    /// The inverse edit did not apply. The caller should show the change
    /// from `from_revision_id` (absent when the undone revision was the
    /// first one) to `to_revision_id` so it can be applied by hand.
    Conflict {
        from_revision_id: Option<DbId>,
        to_revision_id: DbId,
    },
}

/// Compute the content that undoes `target` on top of `latest`.
///
/// `previous` is the revision created immediately before `target`; when
/// there is none the undo restores empty content.
pub fn propose_undo<R: TextRevision>(target: &R, previous: Option<&R>, latest: &R) -> UndoOutcome {
    let previous_content = previous.map(TextRevision::content).unwrap_or("");
    let inverse = Patch::make(target.content(), previous_content);
    let result = inverse.apply(latest.content());

    if result.is_clean() {
        UndoOutcome::Proposed(result.text)
    } else {
        UndoOutcome::Conflict {
            from_revision_id: previous.map(Revision::id),
            to_revision_id: target.id(),
        }
    }
}

/// Description proposed when undoing a revision.
pub fn undo_description(created_at: Timestamp, author: Option<&str>) -> String {
    match author {
        Some(user) => format!("Undid revision of {} by {user}.", format_time(created_at)),
        None => format!("Undid anonymous revision of {}.", format_time(created_at)),
    }
}

/// Description proposed when reverting to a revision.
pub fn revert_description(created_at: Timestamp, author: Option<&str>) -> String {
    match author {
        Some(user) => format!(
            "Reverted to revision of {} by {user}.",
            format_time(created_at)
        ),
        None => format!(
            "Reverted to anonymous revision of {}.",
            format_time(created_at)
        ),
    }
}

fn format_time(at: Timestamp) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}
