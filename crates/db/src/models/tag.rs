//! Tag models.

use folio_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `tags` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tag {
    pub id: DbId,
    pub name: String,
}

/// A tag with the titles of every page carrying it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TagWithPages {
    pub id: DbId,
    pub name: String,
    pub page_titles: Vec<String>,
}
