// tests/history_flows.rs
mod common;

use common::{service_with, FakeGateway};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use leafscan::controllers::HistoryController;
use leafscan::errors::{GatewayError, LeafscanError};
use leafscan::models::AnalysisMode;

fn history_payload(ids: &[&str]) -> Value {
    let entries: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "analysis_type": "symptoms",
                "timestamp": "2025-01-02T10:00:00Z",
                "request_data": { "symptoms_description": "spots" },
                "preview": "Likely fungal..."
            })
        })
        .collect();
    json!({
        "history": entries,
        "total": ids.len(),
        "skip": 0,
        "limit": 50
    })
}

#[tokio::test]
async fn refresh_replaces_the_list_wholesale() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.push_json(history_payload(&["a", "b"]));
    gateway.push_json(history_payload(&["c"]));
    let controller = HistoryController::new(service_with(gateway.clone()));

    controller.refresh().await.unwrap();
    let snapshot = controller.snapshot();
    let ids: Vec<&str> = snapshot.entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
    assert_eq!(snapshot.total, 2);

    controller.refresh().await.unwrap();
    let snapshot = controller.snapshot();
    let ids: Vec<&str> = snapshot.entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["c"]);
    assert_eq!(snapshot.total, 1);

    let calls = gateway.calls();
    assert_eq!(calls[0].path, "/analysis/history");
    assert!(calls[0]
        .query
        .contains(&("limit".to_string(), "50".to_string())));
    assert!(calls[0]
        .query
        .contains(&("skip".to_string(), "0".to_string())));
}

#[tokio::test]
async fn type_filter_is_sent_as_a_query_parameter() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.push_json(history_payload(&["a"]));
    let controller = HistoryController::new(service_with(gateway.clone()));

    controller.set_filter(Some(AnalysisMode::Image));
    controller.refresh().await.unwrap();

    let calls = gateway.calls();
    assert!(calls[0]
        .query
        .contains(&("analysis_type".to_string(), "image".to_string())));
    assert_eq!(controller.snapshot().filter, Some(AnalysisMode::Image));
}

#[tokio::test]
async fn delete_removes_the_entry_only_after_acknowledgement() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.push_json(history_payload(&["a", "b"]));
    gateway.push_json(json!({ "message": "Analysis deleted successfully" }));
    let controller = HistoryController::new(service_with(gateway.clone()));

    controller.refresh().await.unwrap();
    controller.delete("a").await.unwrap();

    let snapshot = controller.snapshot();
    let ids: Vec<&str> = snapshot.entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["b"]);
    assert_eq!(snapshot.total, 1);
    assert_eq!(gateway.calls()[1].method, "DELETE");
    assert_eq!(gateway.calls()[1].path, "/analysis/history/a");
}

#[tokio::test]
async fn failed_delete_leaves_the_list_untouched() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.push_json(history_payload(&["a", "b"]));
    gateway.push_error(GatewayError::http(
        404,
        Some("Analysis not found".to_string()),
    ));
    let controller = HistoryController::new(service_with(gateway.clone()));

    controller.refresh().await.unwrap();
    let err = controller.delete("missing").await.unwrap_err();
    assert!(matches!(err, LeafscanError::Gateway(_)));

    let snapshot = controller.snapshot();
    let ids: Vec<&str> = snapshot.entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
    assert_eq!(snapshot.error.as_deref(), Some("Analysis not found"));
}

#[tokio::test]
async fn at_most_one_entry_is_expanded() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.push_json(history_payload(&["a", "b"]));
    let controller = HistoryController::new(service_with(gateway.clone()));
    controller.refresh().await.unwrap();

    controller.toggle_expanded("a");
    assert_eq!(controller.snapshot().expanded.as_deref(), Some("a"));

    // Expanding another entry collapses the first.
    controller.toggle_expanded("b");
    assert_eq!(controller.snapshot().expanded.as_deref(), Some("b"));

    // Toggling the same id collapses it.
    controller.toggle_expanded("b");
    assert_eq!(controller.snapshot().expanded, None);
}

#[tokio::test]
async fn expansion_is_cleared_when_the_entry_disappears() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.push_json(history_payload(&["a"]));
    gateway.push_json(history_payload(&["b"]));
    let controller = HistoryController::new(service_with(gateway.clone()));

    controller.refresh().await.unwrap();
    controller.toggle_expanded("a");
    controller.refresh().await.unwrap();
    assert_eq!(controller.snapshot().expanded, None);
}

#[tokio::test]
async fn refresh_while_loading_is_rejected() {
    let gateway = Arc::new(FakeGateway::new());
    let gate = gateway.gate_next();
    gateway.push_json(history_payload(&["a"]));
    let controller = Arc::new(HistoryController::new(service_with(gateway.clone())));

    let task = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(controller.snapshot().is_loading);

    let err = controller.refresh().await.unwrap_err();
    assert!(matches!(err, LeafscanError::Busy));

    gate.notify_one();
    task.await.unwrap().unwrap();
    assert!(!controller.snapshot().is_loading);
    assert_eq!(gateway.call_count(), 1);
}

#[tokio::test]
async fn history_detail_is_fetched_by_id() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.push_json(json!({
        "id": "a",
        "analysis_type": "care",
        "timestamp": "2025-01-02T10:00:00Z",
        "request_data": { "plant_type": "Basil" },
        "response_data": { "care_difficulty": "Easy" }
    }));
    let service = service_with(gateway.clone());

    let detail = service.get_history_detail("a").await.unwrap();
    assert_eq!(detail.analysis_type, AnalysisMode::Care);
    assert_eq!(detail.response_data["care_difficulty"], "Easy");
    assert_eq!(gateway.calls()[0].path, "/analysis/history/a");
}

#[tokio::test]
async fn uploaded_images_are_listed_and_deleted() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.push_json(json!({
        "images": [{
            "image_id": "img_1",
            "filename": "leaf.jpg",
            "file_size": 204800,
            "content_type": "image/jpeg",
            "uploaded_at": "2025-01-01T00:00:00Z"
        }],
        "total": 1,
        "skip": 0,
        "limit": 20
    }));
    gateway.push_error(GatewayError::http(500, None));
    let service = service_with(gateway.clone());

    let page = service.get_uploaded_images(20, 0).await.unwrap();
    assert_eq!(page.images.len(), 1);
    assert_eq!(page.images[0].image_id, "img_1");

    let err = service.delete_image("img_1").await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to delete image");
}

#[tokio::test]
async fn image_view_bytes_are_fetched_raw() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.push_bytes(vec![0xFF, 0xD8, 0xFF]);
    let service = service_with(gateway.clone());

    let bytes = service.fetch_image_view("img_1").await.unwrap();
    assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF]);
    assert_eq!(gateway.calls()[0].path, "/analysis/images/img_1/view");
    assert_eq!(
        service.image_view_url("img_1"),
        "http://fake.test/analysis/images/img_1/view"
    );
}
