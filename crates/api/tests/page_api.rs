//! HTTP-level tests for viewing, saving, merging, undoing and reverting pages.

mod common;

use axum::http::StatusCode;
use common::{body_json, body_text, get, post_json, put_json, save_page};
use folio_api::handlers::page::OLD_REVISION_NOTICE;
use sqlx::PgPool;

fn ten_items() -> String {
    (1..=10).map(|i| format!("item {i}\n")).collect()
}

fn revision_id(saved: &serde_json::Value) -> i64 {
    saved["revision"]["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Saving and viewing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_first_save_creates_page(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = put_json(
        app.clone(),
        "/api/v1/pages/Home",
        serde_json::json!({ "content": "Welcome\n", "description": "start" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["created"], true);
    assert_eq!(json["data"]["rebased"], false);
    assert_eq!(json["data"]["page"]["title"], "Home");

    let response = get(app, "/api/v1/pages/Home").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["revision"]["content"], "Welcome\n");
    assert_eq!(json["data"]["revision"]["description"], "start");
    assert_eq!(json["data"]["is_latest"], true);
    assert!(json["data"]["notice"].is_null());
    assert!(json["data"]["revision"]["author_id"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_later_save_returns_ok(pool: PgPool) {
    let app = common::build_test_app(pool);
    let first = save_page(app.clone(), "Home", "one\n", None).await;

    let response = put_json(
        app,
        "/api/v1/pages/Home",
        serde_json::json!({ "content": "two\n", "prev_revision_id": revision_id(&first) }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["created"], false);
    assert_eq!(json["data"]["revision"]["content"], "two\n");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_underscores_in_url_map_to_spaces(pool: PgPool) {
    let app = common::build_test_app(pool);
    let saved = save_page(app.clone(), "Release_Notes", "v1\n", None).await;
    assert_eq!(saved["page"]["title"], "Release Notes");

    let json = body_json(get(app, "/api/v1/pages/Release%20Notes").await).await;
    assert_eq!(json["data"]["url_title"], "Release_Notes");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_raw_view_is_a_text_download(pool: PgPool) {
    let app = common::build_test_app(pool);
    save_page(app.clone(), "Release_Notes", "plain text\n", None).await;

    let response = get(app, "/api/v1/pages/Release_Notes?raw=1").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=Release_Notes.txt"
    );
    assert_eq!(body_text(response).await, "plain text\n");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_page_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app, "/api/v1/pages/Nowhere").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Page 'Nowhere' not found");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_old_revision_carries_notice(pool: PgPool) {
    let app = common::build_test_app(pool);
    let first = save_page(app.clone(), "Home", "one\n", None).await;
    save_page(app.clone(), "Home", "two\n", Some(revision_id(&first))).await;

    let uri = format!("/api/v1/pages/Home/revisions/{}", revision_id(&first));
    let json = body_json(get(app, &uri).await).await;

    assert_eq!(json["data"]["revision"]["content"], "one\n");
    assert_eq!(json["data"]["is_latest"], false);
    assert_eq!(json["data"]["notice"], OLD_REVISION_NOTICE);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_blank_title_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = put_json(
        app,
        "/api/v1/pages/%20",
        serde_json::json!({ "content": "x" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Concurrent edits
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_disjoint_concurrent_edits_are_rebased(pool: PgPool) {
    let app = common::build_test_app(pool);
    let v1 = ten_items();
    let base = revision_id(&save_page(app.clone(), "List", &v1, None).await);
    save_page(
        app.clone(),
        "List",
        &v1.replace("item 2\n", "item two\n"),
        Some(base),
    )
    .await;

    let response = put_json(
        app,
        "/api/v1/pages/List",
        serde_json::json!({
            "content": v1.replace("item 9\n", "item nine\n"),
            "prev_revision_id": base,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["rebased"], true);
    assert_eq!(
        json["data"]["revision"]["content"],
        v1.replace("item 2\n", "item two\n")
            .replace("item 9\n", "item nine\n")
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_overlapping_edit_conflicts_with_submitted_content(pool: PgPool) {
    let app = common::build_test_app(pool);
    let base = revision_id(&save_page(app.clone(), "Greeting", "hello\n", None).await);
    save_page(app.clone(), "Greeting", "hello world\n", Some(base)).await;

    let response = put_json(
        app.clone(),
        "/api/v1/pages/Greeting",
        serde_json::json!({ "content": "hola\n", "prev_revision_id": base }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "EDIT_CONFLICT");
    assert_eq!(json["content"], "hola\n");

    let current = body_json(get(app, "/api/v1/pages/Greeting").await).await;
    assert_eq!(current["data"]["revision"]["content"], "hello world\n");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_save_without_base_on_existing_page_conflicts(pool: PgPool) {
    let app = common::build_test_app(pool);
    save_page(app.clone(), "Home", "one\n", None).await;

    let response = put_json(
        app,
        "/api/v1/pages/Home",
        serde_json::json!({ "content": "blind overwrite\n" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_preview_merges_without_saving(pool: PgPool) {
    let app = common::build_test_app(pool);
    let v1 = ten_items();
    let base = revision_id(&save_page(app.clone(), "List", &v1, None).await);
    save_page(
        app.clone(),
        "List",
        &v1.replace("item 2\n", "item two\n"),
        Some(base),
    )
    .await;

    let response = post_json(
        app.clone(),
        "/api/v1/pages/List/preview",
        serde_json::json!({
            "content": v1.replace("item 9\n", "item nine\n"),
            "prev_revision_id": base,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["rebased"], true);
    assert!(json["data"]["content"]
        .as_str()
        .unwrap()
        .contains("item nine\n"));

    let history = body_json(get(app, "/api/v1/pages/List/history").await).await;
    assert_eq!(history["data"]["revisions"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Creating pages
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_page_rejects_existing_title(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "title": "Fresh Page", "content": "hi\n" });
    let response = post_json(app.clone(), "/api/v1/pages", body.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(app, "/api/v1/pages", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_edit_form_for_new_page_is_empty(pool: PgPool) {
    let app = common::build_test_app(pool);

    let json = body_json(get(app, "/api/v1/pages/Not_Yet/edit").await).await;

    assert_eq!(json["data"]["title"], "Not Yet");
    assert_eq!(json["data"]["content"], "");
    assert!(json["data"]["prev_revision_id"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_edit_form_starts_from_latest(pool: PgPool) {
    let app = common::build_test_app(pool);
    let saved = save_page(app.clone(), "Home", "current\n", None).await;

    let json = body_json(get(app, "/api/v1/pages/Home/edit").await).await;

    assert_eq!(json["data"]["content"], "current\n");
    assert_eq!(json["data"]["prev_revision_id"], revision_id(&saved));
}

// ---------------------------------------------------------------------------
// History and diffs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_history_lists_newest_first(pool: PgPool) {
    let app = common::build_test_app(pool);
    let r1 = revision_id(&save_page(app.clone(), "Home", "1\n", None).await);
    let r2 = revision_id(&save_page(app.clone(), "Home", "2\n", Some(r1)).await);
    let r3 = revision_id(&save_page(app.clone(), "Home", "3\n", Some(r2)).await);

    let json = body_json(get(app, "/api/v1/pages/Home/history").await).await;

    let ids: Vec<i64> = json["data"]["revisions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![r3, r2, r1]);
    assert!(json["data"]["last_change"].is_string());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_diff_reports_changed_lines(pool: PgPool) {
    let app = common::build_test_app(pool);
    let r1 = revision_id(&save_page(app.clone(), "Home", "a\nb\nc\n", None).await);
    let r2 = revision_id(&save_page(app.clone(), "Home", "a\nB\nc\n", Some(r1)).await);

    let uri = format!("/api/v1/pages/Home/diff?from_revision_id={r1}&to_revision_id={r2}");
    let response = get(app, &uri).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["granularity"], "lines");
    assert_eq!(json["data"]["stats"]["added"], 1);
    assert_eq!(json["data"]["stats"]["removed"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_diff_requires_both_revisions(pool: PgPool) {
    let app = common::build_test_app(pool);
    let r1 = revision_id(&save_page(app.clone(), "Home", "a\n", None).await);

    let uri = format!("/api/v1/pages/Home/diff?from_revision_id={r1}");
    let response = get(app, &uri).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Undo and revert
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_undo_reverses_one_change_and_keeps_later_ones(pool: PgPool) {
    let app = common::build_test_app(pool);
    let v1 = ten_items();
    let v2 = v1.replace("item 2\n", "item two\n");
    let v3 = v2.replace("item 9\n", "item nine\n");
    let r1 = revision_id(&save_page(app.clone(), "List", &v1, None).await);
    let r2 = revision_id(&save_page(app.clone(), "List", &v2, Some(r1)).await);
    let r3 = revision_id(&save_page(app.clone(), "List", &v3, Some(r2)).await);

    let response = get(app, &format!("/api/v1/pages/List/undo/{r2}")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["data"]["content"],
        v1.replace("item 9\n", "item nine\n")
    );
    assert_eq!(json["data"]["prev_revision_id"], r3);
    assert!(json["data"]["description"]
        .as_str()
        .unwrap()
        .starts_with("Undid anonymous revision of "));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_undo_conflict_returns_comparison(pool: PgPool) {
    let app = common::build_test_app(pool);
    let r1 = revision_id(&save_page(app.clone(), "Greeting", "greeting\n", None).await);
    let r2 = revision_id(&save_page(app.clone(), "Greeting", "hello\n", Some(r1)).await);
    save_page(app.clone(), "Greeting", "goodbye\n", Some(r2)).await;

    let response = get(app, &format!("/api/v1/pages/Greeting/undo/{r2}")).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNDO_CONFLICT");
    assert_eq!(json["comparison"]["from_revision_id"], r1);
    assert_eq!(json["comparison"]["to_revision_id"], r2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_revert_proposes_old_content_on_top_of_latest(pool: PgPool) {
    let app = common::build_test_app(pool);
    let r1 = revision_id(&save_page(app.clone(), "Home", "original\n", None).await);
    let r2 = revision_id(&save_page(app.clone(), "Home", "vandalised\n", Some(r1)).await);

    let json = body_json(get(app.clone(), &format!("/api/v1/pages/Home/revert/{r1}")).await).await;

    assert_eq!(json["data"]["content"], "original\n");
    assert_eq!(json["data"]["prev_revision_id"], r2);
    assert!(json["data"]["description"]
        .as_str()
        .unwrap()
        .starts_with("Reverted to anonymous revision of "));

    // The proposal is saved through the normal path.
    let response = put_json(
        app,
        "/api/v1/pages/Home",
        serde_json::json!({
            "content": json["data"]["content"],
            "description": json["data"]["description"],
            "prev_revision_id": r2,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_revision_of_another_page_is_not_found(pool: PgPool) {
    let app = common::build_test_app(pool);
    let other = revision_id(&save_page(app.clone(), "Other", "x\n", None).await);
    save_page(app.clone(), "Home", "y\n", None).await;

    let response = get(app, &format!("/api/v1/pages/Home/revert/{other}")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
