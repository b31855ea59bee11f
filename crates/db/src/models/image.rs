//! Image and image revision models.

use folio_core::revision::Revision;
use folio_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::revision_chain::ChainTable;

/// A row from the `images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Image {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}

/// A row from `image_revisions`, with the author's username resolved.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ImageRevision {
    pub id: DbId,
    pub image_id: DbId,
    pub author_id: Option<DbId>,
    pub author_name: Option<String>,
    pub description: String,
    #[serde(skip_serializing)]
    pub file_path: String,
    pub original_filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub width: i32,
    pub height: i32,
    pub sha256: String,
    pub is_current: bool,
    pub created_at: Timestamp,
}

impl Revision for ImageRevision {
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

impl ChainTable for ImageRevision {
    const ENTITY: &'static str = "ImageRevision";
    const TABLE: &'static str = "image_revisions";
    const OWNER_COLUMN: &'static str = "image_id";
    const COLUMNS: &'static str = "id, image_id, author_id, \
        (SELECT u.username FROM users u WHERE u.id = image_revisions.author_id) AS author_name, \
        description, file_path, original_filename, content_type, size_bytes, width, height, \
        sha256, is_current, created_at";
}

/// A stored upload, ready to be recorded as a revision.
#[derive(Debug, Clone)]
pub struct SaveImageRevision {
    pub description: String,
    pub file_path: String,
    pub original_filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub width: i32,
    pub height: i32,
    pub sha256: String,
    pub author_id: Option<DbId>,
}

/// Result of recording an upload.
#[derive(Debug, Clone, Serialize)]
pub struct SavedImage {
    pub image: Image,
    pub revision: ImageRevision,
}
