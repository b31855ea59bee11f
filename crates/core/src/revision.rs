//! Capability traits shared by every document that keeps a revision chain.
//!
//! Pages (text revisions) and images (file revisions) both implement
//! [`Revision`]; [`Versioned`] derives the "last revision / last change /
//! last author" attributes from an ordered chain.

use crate::types::{DbId, Timestamp};

/// An immutable, timestamped snapshot belonging to one document.
pub trait Revision {
    fn id(&self) -> DbId;
    fn created_at(&self) -> Timestamp;
    fn author_id(&self) -> Option<DbId>;
    fn description(&self) -> &str;
}

/// A revision whose payload is text.
pub trait TextRevision: Revision {
    fn content(&self) -> &str;
}

/// Total order of revisions within a chain: creation time, then id.
pub fn chain_order<R: Revision>(a: &R, b: &R) -> std::cmp::Ordering {
    a.created_at()
        .cmp(&b.created_at())
        .then_with(|| a.id().cmp(&b.id()))
}

/// Something that owns an ordered chain of revisions.
pub trait Versioned {
    type Revision: Revision;

    /// All revisions, oldest first.
    fn revisions(&self) -> &[Self::Revision];

    fn last_revision(&self) -> Option<&Self::Revision> {
        self.revisions().last()
    }

    fn last_change(&self) -> Option<Timestamp> {
        self.last_revision().map(Revision::created_at)
    }

    fn last_author(&self) -> Option<DbId> {
        self.last_revision().and_then(Revision::author_id)
    }

    /// The revision immediately preceding `id`, if `id` is in the chain and
    /// is not the first one.
    fn previous_revision(&self, id: DbId) -> Option<&Self::Revision> {
        let revisions = self.revisions();
        let position = revisions.iter().position(|r| r.id() == id)?;
        position.checked_sub(1).map(|p| &revisions[p])
    }
}

/// An in-memory revision chain kept in [`chain_order`].
#[derive(Debug, Clone)]
pub struct History<R> {
    revisions: Vec<R>,
}

impl<R: Revision> History<R> {
    pub fn new(mut revisions: Vec<R>) -> Self {
        revisions.sort_by(chain_order);
        Self { revisions }
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    /// Consume the chain, newest first (the order history listings use).
    pub fn into_newest_first(self) -> Vec<R> {
        let mut revisions = self.revisions;
        revisions.reverse();
        revisions
    }
}

impl<R: Revision> Versioned for History<R> {
    type Revision = R;

    fn revisions(&self) -> &[R] {
        &self.revisions
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use chrono::TimeZone;

    /// Minimal text revision for coordinator tests.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Snapshot {
        pub id: DbId,
        pub created_at: Timestamp,
        pub author_id: Option<DbId>,
        pub content: String,
    }

    impl Snapshot {
        pub fn new(id: DbId, content: &str) -> Self {
            Self {
                id,
                created_at: chrono::Utc
                    .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                    .unwrap()
                    + chrono::Duration::minutes(id),
                author_id: None,
                content: content.to_string(),
            }
        }
    }

    impl Revision for Snapshot {
        fn id(&self) -> DbId {
            self.id
        }
        fn created_at(&self) -> Timestamp {
            self.created_at
        }
        fn author_id(&self) -> Option<DbId> {
            self.author_id
        }
        fn description(&self) -> &str {
            ""
        }
    }

    impl TextRevision for Snapshot {
        fn content(&self) -> &str {
            &self.content
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::Snapshot;
    use super::*;

    #[test]
    fn history_sorts_by_creation_time() {
        let history = History::new(vec![
            Snapshot::new(3, "c"),
            Snapshot::new(1, "a"),
            Snapshot::new(2, "b"),
        ]);
        let ids: Vec<_> = history.revisions().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn same_timestamp_breaks_tie_by_id() {
        let mut later = Snapshot::new(1, "a");
        later.id = 9;
        let history = History::new(vec![later, Snapshot::new(1, "a")]);
        assert_eq!(history.last_revision().map(|r| r.id), Some(9));
    }

    #[test]
    fn derived_attributes_come_from_newest_revision() {
        let mut newest = Snapshot::new(2, "b");
        newest.author_id = Some(42);
        let history = History::new(vec![Snapshot::new(1, "a"), newest.clone()]);

        assert_eq!(history.last_revision(), Some(&newest));
        assert_eq!(history.last_change(), Some(newest.created_at));
        assert_eq!(history.last_author(), Some(42));
    }

    #[test]
    fn empty_history_has_no_derived_attributes() {
        let history: History<Snapshot> = History::new(Vec::new());
        assert!(history.is_empty());
        assert!(history.last_revision().is_none());
        assert!(history.last_change().is_none());
        assert!(history.last_author().is_none());
    }

    #[test]
    fn previous_revision_walks_back_one_step() {
        let history = History::new(vec![Snapshot::new(1, "a"), Snapshot::new(2, "b")]);
        assert_eq!(history.previous_revision(2).map(|r| r.id), Some(1));
        assert!(history.previous_revision(1).is_none());
        assert!(history.previous_revision(99).is_none());
    }

    #[test]
    fn newest_first_reverses_chain() {
        let history = History::new(vec![Snapshot::new(1, "a"), Snapshot::new(2, "b")]);
        assert_eq!(history.len(), 2);
        let ids: Vec<_> = history.into_newest_first().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
