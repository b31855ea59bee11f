//! Repository for the `pages` and `page_revisions` tables.
//!
//! Saving is the only write path: it creates the page on first save and
//! appends a revision under a row lock, merging concurrent edits.

use folio_core::error::CoreError;
use folio_core::merge::merge_edit;
use folio_core::search::contains_pattern;
use sqlx::PgPool;

use crate::error::SaveError;
use crate::models::page::{Page, PageListing, PageRevision, SavePageRevision, SavedPage};
use crate::repositories::TagRepo;
use crate::revision_chain::{ChainTable, RevisionChain};

const COLUMNS: &str = "id, title, created_at";

/// Select list for [`PageListing`]: every page joined to its current revision.
const LISTING_SELECT: &str = "\
    SELECT p.id, p.title, r.id AS revision_id, r.created_at AS last_change, \
           r.author_id AS last_author_id, u.username AS last_author_name, r.description \
    FROM pages p \
    JOIN page_revisions r ON r.page_id = p.id AND r.is_current \
    LEFT JOIN users u ON u.id = r.author_id";

/// Revision chain queries for pages.
pub type PageRevisionRepo = RevisionChain<PageRevision>;

/// Provides page lookups, listings, search and the save transaction.
pub struct PageRepo;

impl PageRepo {
    pub async fn find_by_title(pool: &PgPool, title: &str) -> Result<Option<Page>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pages WHERE title = $1");
        sqlx::query_as::<_, Page>(&query)
            .bind(title)
            .fetch_optional(pool)
            .await
    }

    /// All pages in title order.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<PageListing>, sqlx::Error> {
        let query = format!("{LISTING_SELECT} ORDER BY p.title");
        sqlx::query_as::<_, PageListing>(&query)
            .fetch_all(pool)
            .await
    }

    /// Pages by the time of their current revision, newest first.
    pub async fn recent(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PageListing>, sqlx::Error> {
        let query = format!(
            "{LISTING_SELECT}
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, PageListing>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Pages where every term occurs in the title or the current content.
    ///
    /// Matching is a case-insensitive substring match. No terms, no results.
    pub async fn search(
        pool: &PgPool,
        terms: &[String],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PageListing>, sqlx::Error> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let conditions: Vec<String> = (1..=terms.len())
            .map(|i| format!("(p.title ILIKE ${i} OR r.content ILIKE ${i})"))
            .collect();
        let limit_idx = terms.len() + 1;
        let offset_idx = terms.len() + 2;
        let query = format!(
            "{LISTING_SELECT}
             WHERE {}
             ORDER BY p.title
             LIMIT ${limit_idx} OFFSET ${offset_idx}",
            conditions.join(" AND "),
        );

        let mut q = sqlx::query_as::<_, PageListing>(&query);
        for term in terms {
            q = q.bind(contains_pattern(term));
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Save an edit as the page's new current revision.
    ///
    /// The page row is created if missing and locked for the rest of the
    /// transaction. When `prev_revision_id` is no longer the latest
    /// revision the edit is rebased; an edit that cannot be rebased fails
    /// with [`CoreError::EditConflict`] and nothing is written.
    pub async fn save_revision(
        pool: &PgPool,
        input: &SavePageRevision,
    ) -> Result<SavedPage, SaveError> {
        let mut tx = pool.begin().await?;

        let insert = format!(
            "INSERT INTO pages (title) VALUES ($1)
             ON CONFLICT (title) DO NOTHING
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Page>(&insert)
            .bind(&input.title)
            .fetch_optional(&mut *tx)
            .await?;

        let (page, created) = match inserted {
            Some(page) => (page, true),
            None => {
                let lock = format!("SELECT {COLUMNS} FROM pages WHERE title = $1 FOR UPDATE");
                let page = sqlx::query_as::<_, Page>(&lock)
                    .bind(&input.title)
                    .fetch_one(&mut *tx)
                    .await?;
                (page, false)
            }
        };

        let base = match input.prev_revision_id {
            Some(id) => Some(
                PageRevisionRepo::find(&mut *tx, page.id, id)
                    .await?
                    .ok_or(CoreError::NotFound {
                        entity: PageRevision::ENTITY,
                        id,
                    })?,
            ),
            None => None,
        };
        let latest = PageRevisionRepo::latest(&mut *tx, page.id).await?;

        let outcome = merge_edit(base.as_ref(), latest.as_ref(), &input.content)?;
        let rebased = outcome.was_rebased();

        PageRevisionRepo::demote_current(&mut *tx, page.id).await?;

        let insert_revision = format!(
            "INSERT INTO page_revisions (page_id, author_id, description, content)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            PageRevision::COLUMNS
        );
        let revision = sqlx::query_as::<_, PageRevision>(&insert_revision)
            .bind(page.id)
            .bind(input.author_id)
            .bind(&input.description)
            .bind(outcome.into_content())
            .fetch_one(&mut *tx)
            .await?;

        if let Some(tags) = &input.tags {
            TagRepo::replace_page_tags(&mut *tx, page.id, tags).await?;
        }

        tx.commit().await?;

        tracing::info!(
            page_id = page.id,
            revision_id = revision.id,
            rebased,
            created,
            "Page revision saved"
        );

        Ok(SavedPage {
            page,
            revision,
            rebased,
            created,
        })
    }
}
