use super::*;
use dashboard_pages::{console_logs::CONSOLE_LOGS_SESSION_KEY, metrics::METRICS_SESSION_KEY};
use page_state::MemorySessionStorage;
use serde_json::json;

fn catalog() -> ResourceCatalog {
    ResourceCatalog::new(["api", "worker"])
}

#[tokio::test]
async fn bare_visit_follows_restore_redirect_once() {
    let storage = Arc::new(MemorySessionStorage::new());
    storage
        .set(
            METRICS_SESSION_KEY,
            json!({
                "selectedResource": "api",
                "selectedMeter": null,
                "selectedInstrument": null,
                "durationMinutes": 30,
                "viewKind": "graph"
            }),
        )
        .await
        .expect("seed");

    let visited = visit(storage, catalog(), "/metrics".to_string(), None)
        .await
        .expect("visit");

    assert_eq!(visited.redirects, vec!["metrics/resource/api?duration=30".to_string()]);
    assert_eq!(visited.url, "/metrics/resource/api?duration=30");
    assert_eq!(visited.snapshot["selectedResource"], json!("api"));
    assert_eq!(visited.snapshot["durationMinutes"], json!(30));
}

#[tokio::test]
async fn selection_settles_url_and_stored_state() {
    let storage = Arc::new(MemorySessionStorage::new());

    let visited = visit(
        storage.clone(),
        catalog(),
        "/consolelogs".to_string(),
        Some(Some("WORKER".to_string())),
    )
    .await
    .expect("visit");

    assert!(visited.redirects.is_empty());
    assert_eq!(visited.url, "/consolelogs/resource/worker");
    assert_eq!(visited.snapshot, json!({ "selectedResource": "worker" }));
    assert_eq!(
        storage.get(CONSOLE_LOGS_SESSION_KEY).await.expect("get"),
        Some(json!({ "selectedResource": "worker" }))
    );
}

#[tokio::test]
async fn clearing_after_redirect_returns_to_base_path() {
    let storage = Arc::new(MemorySessionStorage::new());
    storage
        .set(CONSOLE_LOGS_SESSION_KEY, json!({ "selectedResource": "api" }))
        .await
        .expect("seed");

    let visited = visit(storage.clone(), catalog(), "/consolelogs".to_string(), Some(None))
        .await
        .expect("visit");

    assert_eq!(visited.redirects, vec!["consolelogs/resource/api".to_string()]);
    assert_eq!(visited.url, "/consolelogs");
    assert_eq!(
        storage.get(CONSOLE_LOGS_SESSION_KEY).await.expect("get"),
        Some(json!({ "selectedResource": null }))
    );
}

#[tokio::test]
async fn unknown_page_is_an_error() {
    let storage = Arc::new(MemorySessionStorage::new());

    let err = visit(storage.clone(), catalog(), "/traces".to_string(), None)
        .await
        .expect_err("no page for traces");

    assert_eq!(err.to_string(), "no dashboard page serves '/traces'");
    assert!(storage.keys().await.is_empty());
}

#[tokio::test]
async fn unknown_resource_is_an_error_and_nothing_is_stored() {
    let storage = Arc::new(MemorySessionStorage::new());

    let err = visit(
        storage.clone(),
        catalog(),
        "/consolelogs".to_string(),
        Some(Some("db".to_string())),
    )
    .await
    .expect_err("unknown resource");

    assert_eq!(err.to_string(), "unknown resource 'db' for consolelogs");
    assert!(storage.keys().await.is_empty());
}
