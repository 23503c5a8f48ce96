use std::sync::Arc;

use lambda_runtime::{Context, LambdaEvent};
use serde_json::{Value, json};
use textstore::api::{AppState, handler, helpers, route};
use textstore::context::OpContext;
use textstore::repository::{MemoryCollection, MemoryTextRepository};
use textstore::telemetry::{RecordingSpanProcessor, TracerProvider};

const REMOTE_PARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

fn state(fault_marker: Option<&str>) -> (AppState, Arc<MemoryCollection>, Arc<RecordingSpanProcessor>) {
    let recorder = Arc::new(RecordingSpanProcessor::default());
    let provider = TracerProvider::builder("persistence-api")
        .with_processor(recorder.clone())
        .build();
    let collection = Arc::new(MemoryCollection::new());
    let state = AppState {
        repo: Arc::new(MemoryTextRepository::in_memory(collection.clone())),
        tracer: provider.tracer("api-tests"),
        fault_marker: fault_marker.map(ToString::to_string),
    };
    (state, collection, recorder)
}

fn request(method: &str, path: &str, body: Option<&str>, headers: Value) -> Value {
    let mut payload = json!({
        "rawPath": path,
        "requestContext": { "http": { "method": method } },
        "headers": headers
    });
    if let Some(body) = body {
        payload["body"] = Value::String(body.to_string());
    }
    payload
}

fn body_of(response: &Value) -> Value {
    serde_json::from_str(response["body"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn test_save_text_returns_status_and_id() {
    let (state, collection, _) = state(None);
    let resp = route(
        &state,
        &OpContext::background(),
        &request("POST", "/save-text", Some(r#"{"text":"hello"}"#), json!({})),
    )
    .await;

    assert_eq!(helpers::status_of(&resp), 200);
    let body = body_of(&resp);
    assert_eq!(body["status"], "Text 'hello' saved");
    assert_eq!(body["id"].as_str().unwrap().len(), 24);
    assert_eq!(collection.len(), 1);
}

#[tokio::test]
async fn test_save_text_rejects_malformed_body() {
    let (state, collection, _) = state(None);
    let ctx = OpContext::background();

    for body in [None, Some(""), Some("not json"), Some(r#"{"text": 5}"#)] {
        let resp = route(&state, &ctx, &request("POST", "/save-text", body, json!({}))).await;
        assert_eq!(helpers::status_of(&resp), 400, "body {body:?}");
        assert!(body_of(&resp)["error"].is_string());
    }
    assert_eq!(collection.calls(), 0);
}

#[tokio::test]
async fn test_fault_marker_fails_without_touching_store() {
    let (state, collection, _) = state(Some("go error"));
    let resp = route(
        &state,
        &OpContext::background(),
        &request(
            "POST",
            "/save-text",
            Some(r#"{"text":"please go error now"}"#),
            json!({}),
        ),
    )
    .await;

    assert_eq!(helpers::status_of(&resp), 500);
    assert_eq!(body_of(&resp)["error"], "Request contains 'go error'");
    assert_eq!(collection.calls(), 0);
}

#[tokio::test]
async fn test_backend_failure_is_server_error() {
    let (state, collection, _) = state(None);
    collection.fail_with("no primary");
    let resp = route(
        &state,
        &OpContext::background(),
        &request("POST", "/save-text", Some(r#"{"text":"hello"}"#), json!({})),
    )
    .await;

    assert_eq!(helpers::status_of(&resp), 500);
    assert!(
        body_of(&resp)["error"]
            .as_str()
            .unwrap()
            .contains("no primary")
    );
}

#[tokio::test]
async fn test_crud_routes_map_repository_outcomes() {
    let (state, _, _) = state(None);
    let ctx = OpContext::background();

    let saved = route(
        &state,
        &ctx,
        &request("POST", "/save-text", Some(r#"{"text":"hello"}"#), json!({})),
    )
    .await;
    let id = body_of(&saved)["id"].as_str().unwrap().to_string();
    let item = format!("/texts/{id}");

    let found = route(&state, &ctx, &request("GET", &item, None, json!({}))).await;
    assert_eq!(helpers::status_of(&found), 200);
    assert_eq!(body_of(&found), json!({ "id": id, "text": "hello" }));

    let updated = route(
        &state,
        &ctx,
        &request("PUT", &item, Some(r#"{"text":"world"}"#), json!({})),
    )
    .await;
    assert_eq!(helpers::status_of(&updated), 200);

    let found = route(&state, &ctx, &request("GET", &item, None, json!({}))).await;
    assert_eq!(body_of(&found)["text"], "world");

    let deleted = route(&state, &ctx, &request("DELETE", &item, None, json!({}))).await;
    assert_eq!(helpers::status_of(&deleted), 200);

    let again = route(&state, &ctx, &request("DELETE", &item, None, json!({}))).await;
    assert_eq!(helpers::status_of(&again), 404);

    let gone = route(&state, &ctx, &request("GET", &item, None, json!({}))).await;
    assert_eq!(helpers::status_of(&gone), 404);

    let invalid = route(&state, &ctx, &request("GET", "/texts/xyz", None, json!({}))).await;
    assert_eq!(helpers::status_of(&invalid), 400);
}

#[tokio::test]
async fn test_unknown_routes_and_methods() {
    let (state, _, _) = state(None);
    let ctx = OpContext::background();

    let resp = route(&state, &ctx, &request("GET", "/save-text", None, json!({}))).await;
    assert_eq!(helpers::status_of(&resp), 405);

    let resp = route(&state, &ctx, &request("POST", "/elsewhere", None, json!({}))).await;
    assert_eq!(helpers::status_of(&resp), 404);
}

#[tokio::test]
async fn test_request_span_continues_remote_trace() {
    let (state, _, recorder) = state(None);
    let payload = request(
        "POST",
        "/save-text",
        Some(r#"{"text":"traced"}"#),
        json!({ "traceparent": REMOTE_PARENT, "baggage": "origin=publisher" }),
    );

    let event = LambdaEvent::new(payload, Context::default());
    let resp = handler(&state, event).await.unwrap();
    assert_eq!(helpers::status_of(&resp), 200);

    let server = recorder.span_named("POST /save-text").unwrap();
    assert_eq!(
        server.context.trace_id.to_hex(),
        "4bf92f3577b34da6a3ce929d0e0e4736"
    );
    assert_eq!(
        server.parent_span_id.map(|id| id.to_hex()).as_deref(),
        Some("00f067aa0ba902b7")
    );

    let op = recorder.span_named("save-text").unwrap();
    assert_eq!(op.context.trace_id, server.context.trace_id);
    assert_eq!(op.parent_span_id, Some(server.context.span_id));
}

#[tokio::test]
async fn test_request_without_traceparent_starts_new_trace() {
    let (state, _, recorder) = state(None);
    let ctx = OpContext::background();
    let payload = request("POST", "/save-text", Some(r#"{"text":"a"}"#), json!({}));

    route(&state, &ctx, &payload).await;
    route(&state, &ctx, &payload).await;

    let servers: Vec<_> = recorder
        .finished_spans()
        .into_iter()
        .filter(|s| s.name == "POST /save-text")
        .collect();
    assert_eq!(servers.len(), 2);
    assert!(servers.iter().all(|s| s.parent_span_id.is_none()));
    assert_ne!(servers[0].context.trace_id, servers[1].context.trace_id);
}
