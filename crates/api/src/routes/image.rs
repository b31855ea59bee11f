//! Route definitions for wiki images.

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

use crate::handlers::image;
use crate::state::AppState;

/// Largest accepted upload request.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Image routes, registered as `/images`.
///
/// ```text
/// GET    /                list_images
/// POST   /                upload_new_image (multipart)
/// GET    /{name}          view_image
/// PUT    /{name}          upload_image_revision (multipart)
/// GET    /{name}/history  image_history
/// GET    /{name}/file     image_file
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(image::list_images).post(image::upload_new_image))
        .route(
            "/{name}",
            get(image::view_image).put(image::upload_image_revision),
        )
        .route("/{name}/history", get(image::image_history))
        .route("/{name}/file", get(image::image_file))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
