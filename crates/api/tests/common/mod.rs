#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use folio_api::auth::jwt::JwtConfig;
use folio_api::config::{ServerConfig, WikiConfig};
use folio_api::router::build_app_router;
use folio_api::state::AppState;

/// Address every request comes from unless a test says otherwise. It is the
/// trusted reader address in [`test_wiki_config`].
pub const LOOPBACK: ([u8; 4], u16) = ([127, 0, 0, 1], 40000);

/// An address that is not trusted to read anonymously.
pub const OUTSIDE: ([u8; 4], u16) = ([203, 0, 113, 7], 40000);

/// Wiki settings for tests: anonymous edits on, loopback trusted.
pub fn test_wiki_config(images_path: &Path) -> WikiConfig {
    WikiConfig {
        images_path: images_path.to_path_buf(),
        ..WikiConfig::default()
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(wiki: WikiConfig) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hs256".to_string(),
            access_token_expiry_mins: 15,
        },
        wiki,
    }
}

/// Build the full application router with the production middleware stack.
///
/// Images go to a shared scratch directory; tests that upload should use
/// [`build_test_app_with`] and their own temporary directory.
pub fn build_test_app(pool: PgPool) -> Router {
    let images = std::env::temp_dir().join("folio-api-tests");
    build_test_app_with(pool, test_wiki_config(&images))
}

pub fn build_test_app_with(pool: PgPool, wiki: WikiConfig) -> Router {
    let config = test_config(wiki);
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send a request as if it arrived from `from`.
pub async fn send_from(
    app: Router,
    mut request: Request<Body>,
    from: ([u8; 4], u16),
) -> Response<Body> {
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(from)));
    app.oneshot(request).await.unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    send_from(app, request, LOOPBACK).await
}

fn json_request(
    method: &str,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request("POST", uri, body, None)).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request("PUT", uri, body, None)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request("PUT", uri, body, Some(token))).await
}

/// Build a `multipart/form-data` request from text fields and one file.
pub fn multipart_request(
    method: &str,
    uri: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> Request<Body> {
    const BOUNDARY: &str = "folio-test-boundary";
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Body helpers
// ---------------------------------------------------------------------------

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Save `content` to `title` on top of `prev_revision_id`, asserting success.
/// Returns the `data` of the response.
pub async fn save_page(
    app: Router,
    title: &str,
    content: &str,
    prev_revision_id: Option<i64>,
) -> serde_json::Value {
    let response = put_json(
        app,
        &format!("/api/v1/pages/{title}"),
        serde_json::json!({
            "content": content,
            "description": "test edit",
            "prev_revision_id": prev_revision_id,
        }),
    )
    .await;
    assert!(
        response.status().is_success(),
        "save failed with {}",
        response.status()
    );
    body_json(response).await["data"].clone()
}

/// A valid 2x3 RGB PNG.
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03, 0x08, 0x02, 0x00, 0x00, 0x00, 0x36, 0x88, 0x49,
    0xd6, 0x00, 0x00, 0x00, 0x0b, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x60, 0xc0, 0x02, 0x00,
    0x00, 0x15, 0x00, 0x01, 0xaa, 0x65, 0x97, 0xc4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44,
    0xae, 0x42, 0x60, 0x82,
];

/// A valid 1x1 RGBA PNG, distinct from [`TINY_PNG`].
pub const ONE_PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0a, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae,
    0x42, 0x60, 0x82,
];
