//! Route definitions for tag browsing.

use axum::routing::get;
use axum::Router;

use crate::handlers::listing;
use crate::state::AppState;

/// Tag routes, registered as `/tags`.
///
/// ```text
/// GET /       list_tags
/// GET /{tag}  tag_pages
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(listing::list_tags))
        .route("/{tag}", get(listing::tag_pages))
}
