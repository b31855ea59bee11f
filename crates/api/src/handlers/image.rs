//! Handlers for wiki images.
//!
//! Uploads are stored under the configured images directory, named by their
//! SHA-256 digest, and recorded as image revisions. Image names follow the
//! same urlize/deurlize convention as page titles.

use std::path::{Path as FsPath, PathBuf};

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use folio_core::error::CoreError;
use folio_core::hashing::sha256_hex;
use folio_core::image_meta::inspect_image;
use folio_core::revision::{History, Versioned};
use folio_core::title::{deurlize_title, urlize_title, validate_description, validate_image_name};
use folio_core::types::{DbId, Timestamp};
use folio_db::models::image::{Image, ImageRevision, SaveImageRevision, SavedImage};
use folio_db::repositories::{ImageRepo, ImageRevisionRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::Editor;
use crate::response::DataResponse;
use crate::state::AppState;

const DUPLICATE_IMAGE_MESSAGE: &str =
    "An image of the same name already exists. Please enter different name.";

/* --------------------------------------------------------------------------
Response types
-------------------------------------------------------------------------- */

#[derive(Debug, Serialize)]
pub struct ImageView {
    pub image: Image,
    pub url_name: String,
    pub revision: ImageRevision,
}

#[derive(Debug, Serialize)]
pub struct ImageHistoryResponse {
    pub image: Image,
    pub last_change: Option<Timestamp>,
    pub last_author_id: Option<DbId>,
    /// Newest first.
    pub revisions: Vec<ImageRevision>,
}

/* --------------------------------------------------------------------------
Upload parsing and storage
-------------------------------------------------------------------------- */

/// Fields accepted by the upload endpoints.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<(String, Vec<u8>)>,
    name: Option<String>,
    description: String,
    prev_revision_id: Option<DbId>,
}

async fn read_upload_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.file = Some((filename, data.to_vec()));
            }
            "name" | "description" | "prev_revision_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                let text = text.trim().to_string();
                match name.as_str() {
                    "name" if !text.is_empty() => form.name = Some(text),
                    "description" => form.description = text,
                    "prev_revision_id" if !text.is_empty() => {
                        let id = text.parse().map_err(|_| {
                            AppError::BadRequest("prev_revision_id must be an integer".into())
                        })?;
                        form.prev_revision_id = Some(id);
                    }
                    _ => {}
                }
            }
            _ => {} // ignore unknown fields
        }
    }

    Ok(form)
}

/// An upload staged in the images directory, not yet recorded in the database.
///
/// Stored files are named by content and may be shared by several
/// revisions, so they are never removed. New content is written under a
/// per-request temporary name and moved into place once its revision has
/// been committed.
struct StoredUpload {
    /// Content-addressed location of the file.
    path: PathBuf,
    /// Temporary copy to move to `path`; `None` when the content is already stored.
    pending: Option<PathBuf>,
    revision: SaveImageRevision,
}

impl StoredUpload {
    /// Move the staged copy to its content-addressed name.
    async fn publish(&self) -> AppResult<()> {
        if let Some(pending) = &self.pending {
            tokio::fs::rename(pending, &self.path).await.map_err(|e| {
                AppError::InternalError(format!(
                    "Failed to move upload to {}: {e}",
                    self.path.display()
                ))
            })?;
        }
        Ok(())
    }

    /// Drop the staged copy after the database rejected the revision.
    async fn discard(self) {
        if let Some(pending) = self.pending {
            if let Err(e) = tokio::fs::remove_file(&pending).await {
                tracing::warn!(path = %pending.display(), error = %e, "Failed to remove staged upload");
            }
        }
    }
}

async fn store_upload(
    images_path: &FsPath,
    original_filename: String,
    data: Vec<u8>,
    description: String,
    author_id: Option<DbId>,
) -> AppResult<StoredUpload> {
    let info = inspect_image(&data)?;
    let sha256 = sha256_hex(&data);
    let stored_filename = format!("{sha256}.{}", info.extension);

    tokio::fs::create_dir_all(images_path)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    let path = images_path.join(&stored_filename);
    let exists = tokio::fs::try_exists(&path)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    let pending = if exists {
        None
    } else {
        let staged = images_path.join(format!(".{stored_filename}.{}.part", Uuid::new_v4()));
        tokio::fs::write(&staged, &data)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        Some(staged)
    };

    Ok(StoredUpload {
        path,
        pending,
        revision: SaveImageRevision {
            description,
            file_path: stored_filename,
            original_filename,
            content_type: info.content_type.to_string(),
            size_bytes: data.len() as i64,
            width: info.width as i32,
            height: info.height as i32,
            sha256,
            author_id,
        },
    })
}

/// Record the upload, then publish its file. A rejected save only drops the
/// staged copy.
async fn save_upload(
    state: &AppState,
    name: &str,
    prev_revision_id: Option<DbId>,
    upload: StoredUpload,
) -> AppResult<SavedImage> {
    match ImageRepo::save_revision(&state.pool, name, prev_revision_id, &upload.revision).await {
        Ok(saved) => {
            upload.publish().await?;
            Ok(saved)
        }
        Err(e) => {
            upload.discard().await;
            Err(e.into())
        }
    }
}

/* --------------------------------------------------------------------------
Helpers
-------------------------------------------------------------------------- */

fn resolve_name(state: &AppState, raw: &str) -> AppResult<String> {
    let name = deurlize_title(raw.trim(), state.config.wiki.spaces_as_underscores);
    validate_image_name(&name)?;
    Ok(name)
}

async fn ensure_image(pool: &sqlx::PgPool, name: &str) -> AppResult<Image> {
    ImageRepo::find_by_name(pool, name).await?.ok_or_else(|| {
        AppError::Core(CoreError::NamedNotFound {
            entity: "Image",
            name: name.to_string(),
        })
    })
}

async fn ensure_latest(pool: &sqlx::PgPool, image: &Image) -> AppResult<ImageRevision> {
    ImageRevisionRepo::latest(pool, image.id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NamedNotFound {
                entity: "Image",
                name: image.name.clone(),
            })
        })
}

/* --------------------------------------------------------------------------
Handlers
-------------------------------------------------------------------------- */

/// GET /images
pub async fn list_images(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let images = ImageRepo::list_all(&state.pool).await?;
    Ok(Json(DataResponse { data: images }))
}

/// POST /images
///
/// Multipart form with a required `file` and optional `name` and
/// `description`. The name defaults to the uploaded file's name.
pub async fn upload_new_image(
    editor: Editor,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<SavedImage>>)> {
    let form = read_upload_form(multipart).await?;
    let (filename, data) = form
        .file
        .ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;

    let spaces_as_underscores = state.config.wiki.spaces_as_underscores;
    let raw_name = form.name.unwrap_or_else(|| filename.clone());
    let name = deurlize_title(&raw_name, spaces_as_underscores);
    validate_image_name(&name)?;
    validate_description(&form.description)?;

    if ImageRepo::find_by_name(&state.pool, &name).await?.is_some() {
        return Err(AppError::Core(CoreError::Validation(
            DUPLICATE_IMAGE_MESSAGE.into(),
        )));
    }

    let upload = store_upload(
        &state.config.wiki.images_path,
        filename,
        data,
        form.description,
        editor.author_id(),
    )
    .await?;
    let saved = save_upload(&state, &name, None, upload).await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: saved })))
}

/// PUT /images/{name}
///
/// Upload a new revision of an existing image. `prev_revision_id` must be
/// the image's current revision.
pub async fn upload_image_revision(
    editor: Editor,
    State(state): State<AppState>,
    Path(raw_name): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<SavedImage>>> {
    let name = resolve_name(&state, &raw_name)?;
    ensure_image(&state.pool, &name).await?;

    let form = read_upload_form(multipart).await?;
    let (filename, data) = form
        .file
        .ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    validate_description(&form.description)?;

    let upload = store_upload(
        &state.config.wiki.images_path,
        filename,
        data,
        form.description,
        editor.author_id(),
    )
    .await?;
    let saved = save_upload(&state, &name, form.prev_revision_id, upload).await?;

    Ok(Json(DataResponse { data: saved }))
}

/// GET /images/{name}
pub async fn view_image(
    State(state): State<AppState>,
    Path(raw_name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let name = resolve_name(&state, &raw_name)?;
    let image = ensure_image(&state.pool, &name).await?;
    let revision = ensure_latest(&state.pool, &image).await?;

    let view = ImageView {
        url_name: urlize_title(&image.name, state.config.wiki.spaces_as_underscores),
        image,
        revision,
    };
    Ok(Json(DataResponse { data: view }))
}

/// GET /images/{name}/history
pub async fn image_history(
    State(state): State<AppState>,
    Path(raw_name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let name = resolve_name(&state, &raw_name)?;
    let image = ensure_image(&state.pool, &name).await?;
    let history = History::new(ImageRevisionRepo::list(&state.pool, image.id).await?);

    let response = ImageHistoryResponse {
        last_change: history.last_change(),
        last_author_id: history.last_author(),
        revisions: history.into_newest_first(),
        image,
    };
    Ok(Json(DataResponse { data: response }))
}

/// GET /images/{name}/file
///
/// The bytes of the current revision.
pub async fn image_file(
    State(state): State<AppState>,
    Path(raw_name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let name = resolve_name(&state, &raw_name)?;
    let image = ensure_image(&state.pool, &name).await?;
    let revision = ensure_latest(&state.pool, &image).await?;

    let path = state.config.wiki.images_path.join(&revision.file_path);
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        AppError::InternalError(format!("Failed to read {}: {e}", path.display()))
    })?;

    Ok(([(header::CONTENT_TYPE, revision.content_type)], bytes))
}
