//! Route definitions for wiki pages.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{listing, page};
use crate::state::AppState;

/// Page routes, registered as `/pages`.
///
/// ```text
/// GET    /                                list_pages
/// POST   /                                create_page
/// GET    /{title}                         view_page (?raw=1 for a download)
/// PUT    /{title}                         save_page
/// GET    /{title}/edit                    edit_page
/// POST   /{title}/preview                 preview_page
/// GET    /{title}/history                 page_history
/// GET    /{title}/revisions/{revision_id} view_revision
/// GET    /{title}/diff                    diff_revisions
/// GET    /{title}/revert/{revision_id}    revert_page
/// GET    /{title}/undo/{revision_id}      undo_page
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(listing::list_pages).post(page::create_page))
        .route("/{title}", get(page::view_page).put(page::save_page))
        .route("/{title}/edit", get(page::edit_page))
        .route("/{title}/preview", post(page::preview_page))
        .route("/{title}/history", get(page::page_history))
        .route("/{title}/revisions/{revision_id}", get(page::view_revision))
        .route("/{title}/diff", get(page::diff_revisions))
        .route("/{title}/revert/{revision_id}", get(page::revert_page))
        .route("/{title}/undo/{revision_id}", get(page::undo_page))
}
