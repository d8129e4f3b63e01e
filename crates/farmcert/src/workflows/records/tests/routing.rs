use std::sync::Arc;

use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::workflows::concurrency::Version;
use crate::workflows::records::record_router;

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn put_with_stored_version_returns_next_version() {
    let (service, _) = advisory_service();
    let record = service.create(advisory_fields()).expect("record created");
    let mut changed = advisory_fields();
    changed.advisor = "K. Osei".to_string();

    let mut body = serde_json::to_value(&changed).expect("serializable");
    body["version"] = json!(0);

    let response = record_router("/api/v1/advisories", Arc::new(service))
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/advisories/{}", record.id),
            body,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["version"], json!(1));
    assert_eq!(payload["advisor"], json!("K. Osei"));
}

#[tokio::test]
async fn put_with_stale_version_returns_conflict() {
    let (service, _) = advisory_service();
    let record = service.create(advisory_fields()).expect("record created");
    service
        .edit(&record.id, Version(0), advisory_fields())
        .expect("first edit");

    let mut body = serde_json::to_value(advisory_fields()).expect("serializable");
    body["version"] = json!(0);

    let response = record_router("/api/v1/advisories", Arc::new(service))
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/advisories/{}", record.id),
            body,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["reason"], json!("stale_version"));
}

#[tokio::test]
async fn profile_routes_create_then_reject_bad_input() {
    let router = record_router("/api/v1/profiles", Arc::new(profile_service()));

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/profiles",
            serde_json::to_value(profile_fields()).expect("serializable"),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json_body(response).await;
    let id = created["id"].as_str().expect("id present").to_string();

    let response = router
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/profiles/{id}"),
            json!({ "version": 0, "display_name": "Amara Okafor", "phone": "call me" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["field"], json!("phone"));
}

#[tokio::test]
async fn unknown_record_returns_not_found() {
    let response = record_router("/api/v1/profiles", Arc::new(profile_service()))
        .oneshot(
            Request::get("/api/v1/profiles/prof-missing")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
