//! Aggregate views: all pages, tags, recent changes and search.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use folio_core::error::CoreError;
use folio_core::search::{
    clamp_limit, clamp_offset, normalize_query, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT,
};
use folio_core::title::anchorize;
use folio_db::models::page::{Page, PageListing};
use folio_db::repositories::{PageRepo, TagRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::Reader;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub terms: Vec<String>,
    pub results: Vec<PageListing>,
}

/// One entry of the tag index.
#[derive(Debug, Serialize)]
pub struct TagEntry {
    pub name: String,
    /// Fragment identifier for this tag on an index page.
    pub anchor: String,
    pub page_titles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TagPages {
    pub tag: String,
    pub pages: Vec<Page>,
}

/// GET /pages
pub async fn list_pages(
    _reader: Reader,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let pages = PageRepo::list_all(&state.pool).await?;
    Ok(Json(DataResponse { data: pages }))
}

/// GET /recent
///
/// Pages ordered by their latest change, newest first.
pub async fn recent_changes(
    _reader: Reader,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
    let offset = clamp_offset(params.offset);
    let pages = PageRepo::recent(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse { data: pages }))
}

/// GET /tags
pub async fn list_tags(
    _reader: Reader,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let tags: Vec<TagEntry> = TagRepo::list_with_pages(&state.pool)
        .await?
        .into_iter()
        .map(|t| TagEntry {
            anchor: anchorize(&t.name),
            name: t.name,
            page_titles: t.page_titles,
        })
        .collect();
    Ok(Json(DataResponse { data: tags }))
}

/// GET /tags/{tag}
pub async fn tag_pages(
    _reader: Reader,
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> AppResult<impl IntoResponse> {
    let tag = TagRepo::find_by_name(&state.pool, &tag)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NamedNotFound {
                entity: "Tag",
                name: tag.clone(),
            })
        })?;
    let pages = TagRepo::pages_for_tag(&state.pool, &tag.name).await?;

    Ok(Json(DataResponse {
        data: TagPages {
            tag: tag.name,
            pages,
        },
    }))
}

/// GET /search?q=
///
/// Every term must occur in the title or current content. A blank query
/// yields no results.
pub async fn search(
    _reader: Reader,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let query = params.q.unwrap_or_default();
    let terms = normalize_query(&query);
    let limit = clamp_limit(params.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
    let offset = clamp_offset(params.offset);

    let results = PageRepo::search(&state.pool, &terms, limit, offset).await?;
    tracing::debug!(terms = terms.len(), hits = results.len(), "Search executed");

    Ok(Json(DataResponse {
        data: SearchResponse {
            query,
            terms,
            results,
        },
    }))
}
