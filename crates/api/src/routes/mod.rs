pub mod auth;
pub mod health;
pub mod image;
pub mod page;
pub mod tags;

use axum::extract::State;
use axum::response::Redirect;
use axum::routing::get;
use axum::Router;

use folio_core::title::urlize_title;

use crate::handlers::listing;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/register                                   register (public)
/// /auth/login                                      login (public)
///
/// /pages                                           list, create
/// /pages/{title}                                   view, save
/// /pages/{title}/edit                              edit form values
/// /pages/{title}/preview                           preview an edit (POST)
/// /pages/{title}/history                           revision history
/// /pages/{title}/revisions/{revision_id}           view an old revision
/// /pages/{title}/diff                              compare two revisions
/// /pages/{title}/revert/{revision_id}              revert proposal
/// /pages/{title}/undo/{revision_id}                undo proposal
///
/// /images                                          list, upload new
/// /images/{name}                                   view, upload revision
/// /images/{name}/history                           revision history
/// /images/{name}/file                              current file bytes
///
/// /tags                                            tag index
/// /tags/{tag}                                      pages carrying a tag
/// /recent                                          recent changes
/// /search                                          keyword search (?q=)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/pages", page::router())
        .nest("/images", image::router())
        .nest("/tags", tags::router())
        .route("/recent", get(listing::recent_changes))
        .route("/search", get(listing::search))
}

/// The site root: a redirect to the main page.
pub fn root_router() -> Router<AppState> {
    Router::new().route("/", get(main_page))
}

async fn main_page(State(state): State<AppState>) -> Redirect {
    let wiki = &state.config.wiki;
    Redirect::temporary(&format!(
        "/api/v1/pages/{}",
        urlize_title(&wiki.main_page, wiki.spaces_as_underscores)
    ))
}
