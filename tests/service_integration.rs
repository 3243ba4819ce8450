//! End-to-end tests of the HTTP surface.
//!
//! Requests are driven straight through the axum `Router` with `tower::ServiceExt::oneshot`, so no
//! socket is bound. The `/events` stream is read from the response body.

#![cfg(feature = "service")]

mod common;

use asset_relay::server::router;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::time::Duration;
use tokio_stream::StreamExt;
use tower::ServiceExt;

fn app() -> Router {
    common::init_logging();
    router(common::service(64), Duration::from_secs(60))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_fqdn(app: &Router, name: &str) -> String {
    let (status, ack) = call(
        app,
        Method::POST,
        "/entity",
        Some(json!({"type": "FQDN", "asset": {"name": name}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{ack}");
    assert_eq!(ack["action"], "upserted");
    ack["subject"].as_str().unwrap().to_string()
}

#[test_log::test(tokio::test)]
async fn test_entity_crud() {
    let app = app();
    let id = create_fqdn(&app, "example.com").await;

    let (status, record) = call(&app, Method::GET, &format!("/entity/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["id"], id.as_str());
    assert_eq!(record["type"], "FQDN");
    assert_eq!(record["asset"]["name"], "example.com");
    assert!(record["created_at"].is_string());

    let (status, ack) = call(
        &app,
        Method::PUT,
        &format!("/entity/{id}"),
        Some(json!({"type": "FQDN", "asset": {"name": "www.example.com"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack, json!({"subject": id, "action": "updated"}));

    let (_, record) = call(&app, Method::GET, &format!("/entity/{id}"), None).await;
    assert_eq!(record["asset"]["name"], "www.example.com");

    let (status, ack) = call(&app, Method::DELETE, &format!("/entity/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack, json!({"subject": id, "action": "deleted"}));

    let (status, body) = call(&app, Method::GET, &format!("/entity/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains(&id));
}

#[test_log::test(tokio::test)]
async fn test_edge_requires_existing_entities() {
    let app = app();
    let a = create_fqdn(&app, "a.example").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/edge",
        Some(json!({
            "type": "SimpleRelation",
            "relation": {"name": "node"},
            "from_entity": a,
            "to_entity": "missing"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Entity 'missing' not found");

    let b = create_fqdn(&app, "b.example").await;
    let (status, ack) = call(
        &app,
        Method::POST,
        "/edge",
        Some(json!({
            "type": "SimpleRelation",
            "relation": {"name": "node"},
            "from_entity": a,
            "to_entity": b
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let edge = ack["subject"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        Method::POST,
        "/edge_tag",
        Some(json!({
            "type": "SimpleProperty",
            "property": {"property_name": "weight", "property_value": "3"},
            "edge": edge
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::POST,
        "/entity_tag",
        Some(json!({
            "type": "SimpleProperty",
            "property": {"property_name": "owner", "property_value": "ops"},
            "entity": edge
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
}

#[test_log::test(tokio::test)]
async fn test_client_errors_are_bad_requests() {
    let app = app();
    let cases = [
        json!({"type": "Bogus", "asset": {}}),
        json!({"asset": {"name": "example.com"}}),
        json!({"type": "FQDN", "asset": {"name": "example.com", "extra": true}}),
    ];
    for body in cases {
        let (status, error) = call(&app, Method::POST, "/entity", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error["error"].is_string());
    }

    let (status, error) = call(&app, Method::POST, "/emit/entity", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "Envelope carries neither an id nor a payload");
}

#[test_log::test(tokio::test)]
async fn test_emit_upsert_and_delete() {
    let app = app();
    let body = json!({"id": "e-7", "type": "FQDN", "asset": {"name": "example.com"}});

    let (status, ack) = call(&app, Method::POST, "/emit/entity", Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack, json!({"subject": "e-7", "action": "upserted"}));

    let (_, ack) = call(&app, Method::POST, "/emit/entity", Some(body)).await;
    assert_eq!(ack["action"], "upserted");

    let (_, ack) = call(&app, Method::POST, "/emit/entity", Some(json!({"id": "e-7"}))).await;
    assert_eq!(ack, json!({"subject": "e-7", "action": "deleted"}));

    let (status, _) = call(&app, Method::POST, "/emit/entity", Some(json!({"id": "e-7"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn test_kinds_lists_registered_discriminators() {
    let app = app();
    let (status, kinds) = call(&app, Method::GET, "/kinds", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kinds["asset"].as_array().unwrap().len(), 21);
    assert_eq!(kinds["relation"].as_array().unwrap().len(), 5);
    assert_eq!(kinds["property"].as_array().unwrap().len(), 4);
    assert!(kinds["asset"].as_array().unwrap().contains(&json!("FQDN")));
}

#[test_log::test(tokio::test)]
async fn test_event_stream_frames() {
    let app = app();
    let response = app
        .clone()
        .oneshot(Request::get("/events").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");

    let id = create_fqdn(&app, "example.com").await;
    call(&app, Method::DELETE, &format!("/entity/{id}"), None).await;

    let mut frames = response.into_body().into_data_stream();
    let mut text = String::new();
    while !text.contains("event: EntityDeleted") {
        let chunk = tokio::time::timeout(Duration::from_secs(5), frames.next())
            .await
            .expect("no frame within 5s")
            .expect("stream ended")
            .unwrap();
        text.push_str(std::str::from_utf8(&chunk).unwrap());
    }

    let created = text.split("\n\n").next().unwrap();
    assert!(created.starts_with("event: EntityCreated\ndata: {"), "{text}");
    let data: Value = serde_json::from_str(created.split("data: ").nth(1).unwrap()).unwrap();
    assert_eq!(data["id"], id.as_str());
    assert_eq!(data["type"], "FQDN");
    assert!(text.ends_with("\n\n"));
}
