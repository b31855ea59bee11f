//! Handlers for wiki pages.
//!
//! Page titles arrive URL-encoded in their "urlized" form (`Main_Page`) and
//! are deurlized before lookup. Saving goes through
//! [`PageRepo::save_revision`], which merges concurrent edits; revert and
//! undo only *propose* content that the client then saves.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use folio_core::diff::{compute_diff, diff_stats, DiffChunk, DiffGranularity, DiffStats};
use folio_core::error::CoreError;
use folio_core::merge::merge_edit;
use folio_core::revision::{History, Versioned};
use folio_core::tags::{edit_string_for_tags, parse_tags};
use folio_core::title::{deurlize_title, urlize_title, validate_description, validate_title};
use folio_core::types::{DbId, Timestamp};
use folio_core::undo::{
    propose_undo, revert_description, undo_description, UndoOutcome, UNDO_CONFLICT_MESSAGE,
};
use folio_db::models::page::{Page, PageRevision, SavePageRevision, SavedPage};
use folio_db::repositories::{PageRepo, PageRevisionRepo, TagRepo};
use folio_db::revision_chain::ChainTable;

use crate::error::{AppError, AppResult, UndoComparison};
use crate::middleware::auth::{Editor, Reader};
use crate::response::DataResponse;
use crate::state::AppState;

/// Shown alongside a revision that is not the page's current one.
pub const OLD_REVISION_NOTICE: &str = "The version you are viewing is not the latest one, \
    but represents an older revision of this page, which may have been significantly \
    modified.";

/* --------------------------------------------------------------------------
Request / response types
-------------------------------------------------------------------------- */

#[derive(Debug, Deserialize)]
pub struct ViewParams {
    /// Any non-empty value returns the content as a `text/plain` download.
    pub raw: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SavePageRequest {
    pub content: String,
    #[serde(default)]
    pub description: String,
    /// Comma-separated tag list; omitted to leave the tags unchanged.
    pub tags: Option<String>,
    /// The revision the edit started from.
    pub prev_revision_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePageRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub description: String,
    pub tags: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DiffParams {
    pub from_revision_id: Option<DbId>,
    pub to_revision_id: Option<DbId>,
    #[serde(default)]
    pub granularity: DiffGranularity,
}

#[derive(Debug, Serialize)]
pub struct PageView {
    pub page: Page,
    pub url_title: String,
    pub revision: PageRevision,
    pub is_latest: bool,
    pub notice: Option<&'static str>,
    pub tags: Vec<String>,
}

/// Initial values for an edit form.
#[derive(Debug, Serialize)]
pub struct EditProposal {
    pub title: String,
    pub url_title: String,
    pub content: String,
    pub description: String,
    /// Tags rendered as an editable comma-separated string.
    pub tags: String,
    /// Revision to send back as `prev_revision_id` when saving.
    pub prev_revision_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub content: String,
    pub rebased: bool,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub page: Page,
    pub last_change: Option<Timestamp>,
    pub last_author_id: Option<DbId>,
    /// Newest first.
    pub revisions: Vec<PageRevision>,
}

#[derive(Debug, Serialize)]
pub struct DiffResponse {
    pub from_revision_id: DbId,
    pub to_revision_id: DbId,
    pub granularity: DiffGranularity,
    pub stats: DiffStats,
    pub chunks: Vec<DiffChunk>,
}

/* --------------------------------------------------------------------------
Helpers
-------------------------------------------------------------------------- */

/// Turn a title from the URL into the stored form and validate it.
fn resolve_title(state: &AppState, raw: &str) -> AppResult<String> {
    let title = deurlize_title(raw.trim(), state.config.wiki.spaces_as_underscores);
    validate_title(&title)?;
    Ok(title)
}

fn url_title(state: &AppState, title: &str) -> String {
    urlize_title(title, state.config.wiki.spaces_as_underscores)
}

async fn ensure_page(pool: &sqlx::PgPool, title: &str) -> AppResult<Page> {
    PageRepo::find_by_title(pool, title).await?.ok_or_else(|| {
        AppError::Core(CoreError::NamedNotFound {
            entity: "Page",
            name: title.to_string(),
        })
    })
}

async fn ensure_revision(pool: &sqlx::PgPool, page: &Page, id: DbId) -> AppResult<PageRevision> {
    PageRevisionRepo::find(pool, page.id, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: PageRevision::ENTITY,
            id,
        }))
}

async fn ensure_latest(pool: &sqlx::PgPool, page: &Page) -> AppResult<PageRevision> {
    PageRevisionRepo::latest(pool, page.id).await?.ok_or_else(|| {
        AppError::Core(CoreError::NamedNotFound {
            entity: "Page",
            name: page.title.clone(),
        })
    })
}

async fn tag_names(pool: &sqlx::PgPool, page_id: DbId) -> AppResult<Vec<String>> {
    Ok(TagRepo::tags_for_page(pool, page_id)
        .await?
        .into_iter()
        .map(|t| t.name)
        .collect())
}

fn parse_optional_tags(
    tags: Option<&str>,
) -> AppResult<Option<std::collections::BTreeSet<String>>> {
    Ok(tags.map(parse_tags).transpose()?)
}

/// Percent-encoded `.txt` filename for a raw download.
fn download_filename(url_title: &str) -> String {
    format!("{}.txt", urlencoding::encode(url_title))
}

async fn render_revision(
    state: &AppState,
    page: Page,
    revision: PageRevision,
    params: &ViewParams,
) -> AppResult<Response> {
    let url = url_title(state, &page.title);

    if params.raw.as_deref().is_some_and(|raw| !raw.is_empty()) {
        let disposition = format!(
            "attachment; filename={}",
            download_filename(&url)
        );
        return Ok((
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            revision.content,
        )
            .into_response());
    }

    let is_latest = revision.is_current;
    let tags = tag_names(&state.pool, page.id).await?;
    let view = PageView {
        url_title: url,
        is_latest,
        notice: (!is_latest).then_some(OLD_REVISION_NOTICE),
        tags,
        page,
        revision,
    };
    Ok(Json(DataResponse { data: view }).into_response())
}

/* --------------------------------------------------------------------------
Viewing
-------------------------------------------------------------------------- */

/// GET /pages/{title}
///
/// The current revision, or its raw text with `?raw=1`.
pub async fn view_page(
    _reader: Reader,
    State(state): State<AppState>,
    Path(raw_title): Path<String>,
    Query(params): Query<ViewParams>,
) -> AppResult<Response> {
    let title = resolve_title(&state, &raw_title)?;
    let page = ensure_page(&state.pool, &title).await?;
    let revision = ensure_latest(&state.pool, &page).await?;
    render_revision(&state, page, revision, &params).await
}

/// GET /pages/{title}/revisions/{revision_id}
pub async fn view_revision(
    _reader: Reader,
    State(state): State<AppState>,
    Path((raw_title, revision_id)): Path<(String, DbId)>,
    Query(params): Query<ViewParams>,
) -> AppResult<Response> {
    let title = resolve_title(&state, &raw_title)?;
    let page = ensure_page(&state.pool, &title).await?;
    let revision = ensure_revision(&state.pool, &page, revision_id).await?;
    render_revision(&state, page, revision, &params).await
}

/// GET /pages/{title}/history
pub async fn page_history(
    _reader: Reader,
    State(state): State<AppState>,
    Path(raw_title): Path<String>,
) -> AppResult<impl IntoResponse> {
    let title = resolve_title(&state, &raw_title)?;
    let page = ensure_page(&state.pool, &title).await?;
    let history = History::new(PageRevisionRepo::list(&state.pool, page.id).await?);

    let response = HistoryResponse {
        last_change: history.last_change(),
        last_author_id: history.last_author(),
        revisions: history.into_newest_first(),
        page,
    };
    Ok(Json(DataResponse { data: response }))
}

/// GET /pages/{title}/diff?from_revision_id=&to_revision_id=&granularity=
pub async fn diff_revisions(
    _reader: Reader,
    State(state): State<AppState>,
    Path(raw_title): Path<String>,
    Query(params): Query<DiffParams>,
) -> AppResult<impl IntoResponse> {
    let (Some(from_id), Some(to_id)) = (params.from_revision_id, params.to_revision_id) else {
        return Err(AppError::BadRequest(
            "Both from_revision_id and to_revision_id are required".into(),
        ));
    };

    let title = resolve_title(&state, &raw_title)?;
    let page = ensure_page(&state.pool, &title).await?;
    let from = ensure_revision(&state.pool, &page, from_id).await?;
    let to = ensure_revision(&state.pool, &page, to_id).await?;

    let chunks = compute_diff(&from.content, &to.content, params.granularity);
    let response = DiffResponse {
        from_revision_id: from.id,
        to_revision_id: to.id,
        granularity: params.granularity,
        stats: diff_stats(&chunks),
        chunks,
    };
    Ok(Json(DataResponse { data: response }))
}

/* --------------------------------------------------------------------------
Editing
-------------------------------------------------------------------------- */

/// GET /pages/{title}/edit
///
/// Edit form values. A page that does not exist yet starts empty.
pub async fn edit_page(
    _editor: Editor,
    State(state): State<AppState>,
    Path(raw_title): Path<String>,
) -> AppResult<impl IntoResponse> {
    let title = resolve_title(&state, &raw_title)?;

    let (content, tags, prev_revision_id) = match PageRepo::find_by_title(&state.pool, &title)
        .await?
    {
        Some(page) => {
            let latest = ensure_latest(&state.pool, &page).await?;
            let tags = tag_names(&state.pool, page.id).await?;
            (
                latest.content,
                edit_string_for_tags(tags.iter().map(String::as_str)),
                Some(latest.id),
            )
        }
        None => (String::new(), String::new(), None),
    };

    let proposal = EditProposal {
        url_title: url_title(&state, &title),
        title,
        content,
        description: String::new(),
        tags,
        prev_revision_id,
    };
    Ok(Json(DataResponse { data: proposal }))
}

/// PUT /pages/{title}
///
/// Save a new revision, creating the page on first save. Returns 201 when
/// the page was created, 200 otherwise, and 409 with the submitted content
/// when the edit could not be merged.
pub async fn save_page(
    editor: Editor,
    State(state): State<AppState>,
    Path(raw_title): Path<String>,
    Json(input): Json<SavePageRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SavedPage>>)> {
    let title = resolve_title(&state, &raw_title)?;
    validate_description(&input.description)?;
    let tags = parse_optional_tags(input.tags.as_deref())?;

    let saved = PageRepo::save_revision(
        &state.pool,
        &SavePageRevision {
            title,
            content: input.content,
            description: input.description,
            prev_revision_id: input.prev_revision_id,
            tags,
            author_id: editor.author_id(),
        },
    )
    .await?;

    let status = if saved.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DataResponse { data: saved })))
}

/// POST /pages/{title}/preview
///
/// Validate and merge an edit exactly as saving would, without storing it.
pub async fn preview_page(
    _editor: Editor,
    State(state): State<AppState>,
    Path(raw_title): Path<String>,
    Json(input): Json<SavePageRequest>,
) -> AppResult<impl IntoResponse> {
    let title = resolve_title(&state, &raw_title)?;
    validate_description(&input.description)?;
    parse_optional_tags(input.tags.as_deref())?;

    let (base, latest) = match PageRepo::find_by_title(&state.pool, &title).await? {
        Some(page) => {
            let base = match input.prev_revision_id {
                Some(id) => Some(ensure_revision(&state.pool, &page, id).await?),
                None => None,
            };
            (base, PageRevisionRepo::latest(&state.pool, page.id).await?)
        }
        None => {
            if let Some(id) = input.prev_revision_id {
                return Err(AppError::Core(CoreError::NotFound {
                    entity: PageRevision::ENTITY,
                    id,
                }));
            }
            (None, None)
        }
    };

    let outcome = merge_edit(base.as_ref(), latest.as_ref(), &input.content)?;
    let preview = PreviewResponse {
        rebased: outcome.was_rebased(),
        content: outcome.into_content(),
    };
    Ok(Json(DataResponse { data: preview }))
}

/// POST /pages
///
/// Create a page under a new title. An existing title is a validation error.
pub async fn create_page(
    editor: Editor,
    State(state): State<AppState>,
    Json(input): Json<CreatePageRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SavedPage>>)> {
    let spaces_as_underscores = state.config.wiki.spaces_as_underscores;
    let title = deurlize_title(
        &urlize_title(input.title.trim(), spaces_as_underscores),
        spaces_as_underscores,
    );
    validate_title(&title)?;
    validate_description(&input.description)?;
    let tags = parse_optional_tags(input.tags.as_deref())?;

    if PageRepo::find_by_title(&state.pool, &title).await?.is_some() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "A page titled '{title}' already exists"
        ))));
    }

    let saved = PageRepo::save_revision(
        &state.pool,
        &SavePageRevision {
            title,
            content: input.content,
            description: input.description,
            prev_revision_id: None,
            tags,
            author_id: editor.author_id(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: saved })))
}

/* --------------------------------------------------------------------------
Revert / undo proposals
-------------------------------------------------------------------------- */

/// GET /pages/{title}/revert/{revision_id}
///
/// Propose restoring an old revision's content verbatim.
pub async fn revert_page(
    _editor: Editor,
    State(state): State<AppState>,
    Path((raw_title, revision_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let title = resolve_title(&state, &raw_title)?;
    let page = ensure_page(&state.pool, &title).await?;
    let source = ensure_revision(&state.pool, &page, revision_id).await?;
    let latest = ensure_latest(&state.pool, &page).await?;
    let tags = tag_names(&state.pool, page.id).await?;

    let proposal = EditProposal {
        url_title: url_title(&state, &page.title),
        title: page.title,
        description: revert_description(source.created_at, source.author_name.as_deref()),
        content: source.content,
        tags: edit_string_for_tags(tags.iter().map(String::as_str)),
        prev_revision_id: Some(latest.id),
    };
    Ok(Json(DataResponse { data: proposal }))
}

/// GET /pages/{title}/undo/{revision_id}
///
/// Propose the latest content with one past revision's change reversed.
/// When the reversal does not apply, responds 409 with the change that was
/// to be undone.
pub async fn undo_page(
    _editor: Editor,
    State(state): State<AppState>,
    Path((raw_title, revision_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let title = resolve_title(&state, &raw_title)?;
    let page = ensure_page(&state.pool, &title).await?;
    let target = ensure_revision(&state.pool, &page, revision_id).await?;
    let previous =
        PageRevisionRepo::previous(&state.pool, page.id, target.created_at, target.id).await?;
    let latest = ensure_latest(&state.pool, &page).await?;

    match propose_undo(&target, previous.as_ref(), &latest) {
        UndoOutcome::Proposed(content) => {
            let tags = tag_names(&state.pool, page.id).await?;
            let proposal = EditProposal {
                url_title: url_title(&state, &page.title),
                title: page.title,
                content,
                description: undo_description(target.created_at, target.author_name.as_deref()),
                tags: edit_string_for_tags(tags.iter().map(String::as_str)),
                prev_revision_id: Some(latest.id),
            };
            Ok(Json(DataResponse { data: proposal }))
        }
        UndoOutcome::Conflict {
            from_revision_id,
            to_revision_id,
        } => {
            let before = previous.as_ref().map(|p| p.content.as_str()).unwrap_or("");
            tracing::debug!(
                page_id = page.id,
                revision_id = to_revision_id,
                "Undo did not apply to latest revision"
            );
            Err(AppError::UndoConflict {
                message: UNDO_CONFLICT_MESSAGE.to_string(),
                comparison: UndoComparison {
                    from_revision_id,
                    to_revision_id,
                    chunks: compute_diff(before, &target.content, DiffGranularity::Lines),
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_filename_escapes_non_ascii() {
        assert_eq!(download_filename("Main_Page"), "Main_Page.txt");
        assert_eq!(download_filename("Caf\u{e9}"), "Caf%C3%A9.txt");
        assert_eq!(download_filename("a;b"), "a%3Bb.txt");
    }
}
