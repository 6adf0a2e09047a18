//! Router tests for the entity endpoints.
//!
//! Every test runs the real router in-process over a [`CountingStore`], so
//! it can check both the HTTP contract and whether the store was called.

use axum::http::StatusCode;
use roster_core::{new_entity_id, Entity};
use roster_test_utils::{assertions, fixtures, CountingStore};

#[path = "support/app.rs"]
mod test_app_support;
use test_app_support::{TestApp, TestResult};

fn entities_from(body: serde_json::Value) -> TestResult<Vec<Entity>> {
    Ok(serde_json::from_value(body)?)
}

// ============================================================================
// GET /
// ============================================================================

#[tokio::test]
async fn test_list_before_first_refresh_is_empty_array() -> TestResult {
    let app = TestApp::new(fixtures::seeded_counting_store(&["stored"]));

    let (status, body) = app.get("/").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
    assert_eq!(app.store.calls().total(), 0);
    Ok(())
}

#[tokio::test]
async fn test_list_serves_snapshot_without_store_call() -> TestResult {
    let seeded = fixtures::entities(&["a", "b", "c"]);
    let app = TestApp::new(CountingStore::with_entities(seeded.clone()));
    app.refresher.tick().await;
    let calls_after_tick = app.store.calls();

    let (status, body) = app.get("/").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(entities_from(body)?, seeded);
    assert_eq!(app.store.calls(), calls_after_tick);
    Ok(())
}

#[tokio::test]
async fn test_list_keeps_last_snapshot_during_outage() -> TestResult {
    let app = TestApp::new(fixtures::seeded_counting_store(&["survivor"]));
    app.refresher.tick().await;

    app.store.set_offline(true);
    assert!(!app.refresher.tick().await.is_installed());

    let (status, body) = app.get("/").await?;
    assert_eq!(status, StatusCode::OK);
    let listed = entities_from(body)?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "survivor");
    Ok(())
}

// ============================================================================
// POST /
// ============================================================================

#[tokio::test]
async fn test_create_assigns_id_and_appears_after_one_tick() -> TestResult {
    let app = TestApp::new(CountingStore::new());

    let (status, body) = app.post_json("/", r#"{"title":"a"}"#).await?;
    assert_eq!(status, StatusCode::CREATED);
    let created: Entity = serde_json::from_value(body)?;
    assert_eq!(created.title, "a");

    // Writes bypass the cache.
    let (_, body) = app.get("/").await?;
    assert!(entities_from(body)?.is_empty());

    app.refresher.tick().await;

    let (_, body) = app.get("/").await?;
    let listed = entities_from(body)?;
    assert_eq!(listed.iter().filter(|e| e.id == created.id).count(), 1);
    assertions::assert_contains_once(&app.cache.read(), created.id);
    Ok(())
}

#[tokio::test]
async fn test_create_accepts_empty_title() -> TestResult {
    let app = TestApp::new(CountingStore::new());

    let (status, body) = app.post_json("/", r#"{"title":""}"#).await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "");
    Ok(())
}

#[tokio::test]
async fn test_create_malformed_body_is_400_without_store_call() -> TestResult {
    let app = TestApp::new(CountingStore::new());

    let malformed = [
        "{",
        r#"{"name":"a"}"#,
        r#"{"title":7}"#,
        "[]",
        r#"["a"]"#,
        r#""a""#,
    ];
    for body in malformed {
        let (status, error) = app.post_json("/", body).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(error["code"], "INVALID_INPUT");
        assert!(error["message"].is_string());
    }

    assert_eq!(app.store.calls().insert_one, 0);
    Ok(())
}

#[tokio::test]
async fn test_create_without_json_content_type_is_400() -> TestResult {
    let app = TestApp::new(CountingStore::new());
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/")
        .body(axum::body::Body::from(r#"{"title":"a"}"#))?;

    let (status, error) = app.send(request).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_INPUT");
    assert_eq!(app.store.calls().insert_one, 0);
    Ok(())
}

#[tokio::test]
async fn test_create_store_failure_is_500() -> TestResult {
    let app = TestApp::new(CountingStore::new());
    app.store.set_offline(true);

    let (status, error) = app.post_json("/", r#"{"title":"a"}"#).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error["code"], "STORE_UNAVAILABLE");
    assert_eq!(app.store.calls().insert_one, 1);
    Ok(())
}

// ============================================================================
// PUT /:id
// ============================================================================

#[tokio::test]
async fn test_update_bad_id_is_400_without_store_call() -> TestResult {
    let app = TestApp::new(CountingStore::new());

    let (status, error) = app.put_json("/not-a-uuid", r#"{"title":"x"}"#).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_FORMAT");
    assert_eq!(error["details"]["path_param"], "not-a-uuid");
    assert_eq!(app.store.calls().total(), 0);
    Ok(())
}

#[tokio::test]
async fn test_update_bad_id_and_bad_body_reports_id() -> TestResult {
    let app = TestApp::new(CountingStore::new());

    let (status, error) = app.put_json("/123", "{").await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_FORMAT");
    assert_eq!(app.store.calls().total(), 0);
    Ok(())
}

#[tokio::test]
async fn test_update_unknown_id_is_400_and_cache_unchanged() -> TestResult {
    let app = TestApp::new(fixtures::seeded_counting_store(&["existing"]));
    app.refresher.tick().await;
    let before = app.cache.read();

    let missing = new_entity_id();
    let (status, error) = app
        .put_json(&format!("/{missing}"), r#"{"title":"x"}"#)
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "ENTITY_NOT_FOUND");
    assert!(error["message"]
        .as_str()
        .is_some_and(|m| m.contains(&missing.to_string())));
    assert_eq!(app.store.calls().find_and_replace_one, 1);
    assert_eq!(*app.cache.read(), *before);
    Ok(())
}

#[tokio::test]
async fn test_update_returns_new_entity_and_refresh_shows_it() -> TestResult {
    let existing = fixtures::entity("before");
    let app = TestApp::new(CountingStore::with_entities(vec![existing.clone()]));
    app.refresher.tick().await;

    let (status, body) = app
        .put_json(&format!("/{}", existing.id), r#"{"title":"after"}"#)
        .await?;

    assert_eq!(status, StatusCode::OK);
    let updated: Entity = serde_json::from_value(body)?;
    assert_eq!(updated, Entity::new(existing.id, "after"));

    // Stale until the next tick.
    let (_, body) = app.get("/").await?;
    assert_eq!(entities_from(body)?, vec![existing.clone()]);

    app.refresher.tick().await;
    let (_, body) = app.get("/").await?;
    assert_eq!(entities_from(body)?, vec![updated]);
    Ok(())
}

#[tokio::test]
async fn test_update_malformed_body_is_400_without_store_call() -> TestResult {
    let existing = fixtures::entity("kept");
    let app = TestApp::new(CountingStore::with_entities(vec![existing.clone()]));

    let path = format!("/{}", existing.id);

    for body in [r#"{"titel":"typo"}"#, r#"["a"]"#, "null"] {
        let (status, error) = app.put_json(&path, body).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(error["code"], "INVALID_INPUT");
    }

    assert_eq!(app.store.calls().find_and_replace_one, 0);
    Ok(())
}

#[tokio::test]
async fn test_update_store_failure_is_500() -> TestResult {
    let app = TestApp::new(CountingStore::new());
    app.store.set_offline(true);

    let (status, error) = app
        .put_json(&format!("/{}", new_entity_id()), r#"{"title":"x"}"#)
        .await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error["code"], "STORE_UNAVAILABLE");
    Ok(())
}

// ============================================================================
// GET /health
// ============================================================================

#[tokio::test]
async fn test_health_reports_cache_and_refresher() -> TestResult {
    let app = TestApp::new(fixtures::seeded_counting_store(&["a", "b"]));

    let (status, body) = app.get("/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cache"]["entities"], 0);
    assert!(body["cache"].get("taken_at").is_none());
    assert_eq!(body["refresher"]["phase"], "idle");

    app.refresher.tick().await;
    app.store.set_offline(true);
    app.refresher.tick().await;

    let (status, body) = app.get("/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cache"]["entities"], 2);
    assert!(body["cache"]["taken_at"].is_string());
    assert_eq!(body["refresher"]["ticks"], 2);
    assert_eq!(body["refresher"]["installs"], 1);
    assert_eq!(body["refresher"]["failures"], 1);
    assert_eq!(app.store.calls().fetch_all, 2);
    Ok(())
}
