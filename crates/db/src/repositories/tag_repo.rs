//! Repository for the `tags` and `page_tags` tables.

use std::collections::BTreeSet;

use folio_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::page::Page;
use crate::models::tag::{Tag, TagWithPages};

const COLUMNS: &str = "id, name";

/// Provides tag lookups and page-tag associations.
pub struct TagRepo;

impl TagRepo {
    /// Create a tag or return the existing one with the same name.
    pub async fn create_or_get(conn: &mut PgConnection, name: &str) -> Result<Tag, sqlx::Error> {
        let query = format!(
            "INSERT INTO tags (name) VALUES ($1)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(name)
            .fetch_one(conn)
            .await
    }

    /// Replace the tag set of a page.
    ///
    /// Runs on the caller's connection so a page save and its tag update
    /// commit together.
    pub async fn replace_page_tags(
        conn: &mut PgConnection,
        page_id: DbId,
        tags: &BTreeSet<String>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM page_tags WHERE page_id = $1")
            .bind(page_id)
            .execute(&mut *conn)
            .await?;

        for name in tags {
            let tag = Self::create_or_get(&mut *conn, name).await?;
            sqlx::query(
                "INSERT INTO page_tags (page_id, tag_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(page_id)
            .bind(tag.id)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Tags of one page, alphabetically.
    pub async fn tags_for_page(pool: &PgPool, page_id: DbId) -> Result<Vec<Tag>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.name FROM tags t
             JOIN page_tags pt ON pt.tag_id = t.id
             WHERE pt.page_id = $1
             ORDER BY t.name",
        )
        .bind(page_id)
        .fetch_all(pool)
        .await
    }

    /// Every tag in use, with the titles of the pages carrying it.
    pub async fn list_with_pages(pool: &PgPool) -> Result<Vec<TagWithPages>, sqlx::Error> {
        sqlx::query_as::<_, TagWithPages>(
            "SELECT t.id, t.name, array_agg(p.title::text ORDER BY p.title) AS page_titles
             FROM tags t
             JOIN page_tags pt ON pt.tag_id = t.id
             JOIN pages p ON p.id = pt.page_id
             GROUP BY t.id, t.name
             ORDER BY t.name",
        )
        .fetch_all(pool)
        .await
    }

    /// Pages carrying the named tag, in title order.
    pub async fn pages_for_tag(pool: &PgPool, name: &str) -> Result<Vec<Page>, sqlx::Error> {
        sqlx::query_as::<_, Page>(
            "SELECT p.id, p.title, p.created_at FROM pages p
             JOIN page_tags pt ON pt.page_id = p.id
             JOIN tags t ON t.id = pt.tag_id
             WHERE t.name = $1
             ORDER BY p.title",
        )
        .bind(name)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags WHERE name = $1");
        sqlx::query_as::<_, Tag>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }
}
