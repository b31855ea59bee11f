//! Page and page revision models.
//!
//! Page revisions are immutable text snapshots. Exactly one revision per
//! page carries `is_current`; it is always the newest one.

use std::collections::BTreeSet;

use folio_core::revision::{Revision, TextRevision};
use folio_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::revision_chain::ChainTable;

/// A row from the `pages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Page {
    pub id: DbId,
    pub title: String,
    pub created_at: Timestamp,
}

/// A row from `page_revisions`, with the author's username resolved.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct PageRevision {
    pub id: DbId,
    pub page_id: DbId,
    pub author_id: Option<DbId>,
    pub author_name: Option<String>,
    pub description: String,
    pub content: String,
    pub is_current: bool,
    pub created_at: Timestamp,
}

impl Revision for PageRevision {
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
        &self.description
    }
}

impl TextRevision for PageRevision {
    fn content(&self) -> &str {
        &self.content
    }
}

impl ChainTable for PageRevision {
    const ENTITY: &'static str = "PageRevision";
    const TABLE: &'static str = "page_revisions";
    const OWNER_COLUMN: &'static str = "page_id";
    const COLUMNS: &'static str = "id, page_id, author_id, \
        (SELECT u.username FROM users u WHERE u.id = page_revisions.author_id) AS author_name, \
        description, content, is_current, created_at";
}

/// An edit submitted for a page.
#[derive(Debug, Clone, Default)]
pub struct SavePageRevision {
    /// Stored (display) title of the page.
    pub title: String,
    pub content: String,
    pub description: String,
    /// The revision the edit started from; `None` for a page that did not
    /// exist when editing began.
    pub prev_revision_id: Option<DbId>,
    /// Replacement tag set; `None` leaves the page's tags untouched.
    pub tags: Option<BTreeSet<String>>,
    pub author_id: Option<DbId>,
}

/// Result of saving a page edit.
#[derive(Debug, Clone, Serialize)]
pub struct SavedPage {
    pub page: Page,
    pub revision: PageRevision,
    /// Whether the edit had to be replayed onto a newer revision.
    pub rebased: bool,
    /// Whether this save created the page.
    pub created: bool,
}

/// A page with its current revision metadata, for listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PageListing {
    pub id: DbId,
    pub title: String,
    pub revision_id: DbId,
    pub last_change: Timestamp,
    pub last_author_id: Option<DbId>,
    pub last_author_name: Option<String>,
    pub description: String,
}
