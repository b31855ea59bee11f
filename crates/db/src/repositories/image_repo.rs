//! Repository for the `images` and `image_revisions` tables.

use folio_core::merge::ensure_base_is_latest;
use folio_core::revision::Revision;
use folio_core::types::DbId;
use sqlx::PgPool;

use crate::error::SaveError;
use crate::models::image::{Image, ImageRevision, SaveImageRevision, SavedImage};
use crate::revision_chain::{ChainTable, RevisionChain};

const COLUMNS: &str = "id, name, created_at";

/// Revision chain queries for images.
pub type ImageRevisionRepo = RevisionChain<ImageRevision>;

/// Provides image lookups and the upload transaction.
pub struct ImageRepo;

impl ImageRepo {
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Image>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM images WHERE name = $1");
        sqlx::query_as::<_, Image>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// All images in name order.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Image>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM images ORDER BY name");
        sqlx::query_as::<_, Image>(&query).fetch_all(pool).await
    }

    /// Record an uploaded file as the image's new current revision.
    ///
    /// Uploads are never merged: `prev_revision_id` must name the current
    /// latest revision (or be `None` for an image with no revisions yet),
    /// otherwise the save fails with a conflict and nothing is written.
    pub async fn save_revision(
        pool: &PgPool,
        name: &str,
        prev_revision_id: Option<DbId>,
        input: &SaveImageRevision,
    ) -> Result<SavedImage, SaveError> {
        let mut tx = pool.begin().await?;

        let insert = format!(
            "INSERT INTO images (name) VALUES ($1)
             ON CONFLICT (name) DO NOTHING
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Image>(&insert)
            .bind(name)
            .fetch_optional(&mut *tx)
            .await?;

        let image = match inserted {
            Some(image) => image,
            None => {
                let lock = format!("SELECT {COLUMNS} FROM images WHERE name = $1 FOR UPDATE");
                sqlx::query_as::<_, Image>(&lock)
                    .bind(name)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        let latest = ImageRevisionRepo::latest(&mut *tx, image.id).await?;
        ensure_base_is_latest(prev_revision_id, latest.as_ref().map(Revision::id))?;

        ImageRevisionRepo::demote_current(&mut *tx, image.id).await?;

        let insert_revision = format!(
            "INSERT INTO image_revisions
                (image_id, author_id, description, file_path, original_filename,
                 content_type, size_bytes, width, height, sha256)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {}",
            ImageRevision::COLUMNS
        );
        let revision = sqlx::query_as::<_, ImageRevision>(&insert_revision)
            .bind(image.id)
            .bind(input.author_id)
            .bind(&input.description)
            .bind(&input.file_path)
            .bind(&input.original_filename)
            .bind(&input.content_type)
            .bind(input.size_bytes)
            .bind(input.width)
            .bind(input.height)
            .bind(&input.sha256)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            image_id = image.id,
            revision_id = revision.id,
            size_bytes = revision.size_bytes,
            "Image revision saved"
        );

        Ok(SavedImage { image, revision })
    }
}
