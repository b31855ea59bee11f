use folio_core::error::CoreError;

/// Failure of a repository operation that also runs domain checks inside
/// its transaction (merging an edit, checking an upload's base revision).
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
