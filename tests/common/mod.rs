//! Common test utilities for all integration tests.
//!
//! Provides a seeded in-memory store, router setup, and request helpers.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use std::sync::Arc;

use axum::{body::to_bytes, body::Body, http::Request, response::Response, Router};
use keytree::api::{build_router, ApiState};
use keytree::services::{SecretTreeService, TreeSettings};
use keytree::store::{Fields, MemoryStore};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::ServiceExt;

pub fn fields(value: Value) -> Fields {
    value.as_object().cloned().expect("fixture fields must be a JSON object")
}

/// Two services in dev, one in QA, shared templates, and verification flags.
///
/// `templates/billing/` lists `app.yml`, `db.yml`, `app.yml/`, `db.yml/` and
/// `archive/`, in that order.
pub fn seeded_store() -> MemoryStore {
    MemoryStore::new()
        .with_shared_entry("templates/billing/app.yml", fields(serde_json::json!({})))
        .with_shared_entry("templates/billing/db.yml", fields(serde_json::json!({})))
        .with_shared_entry(
            "templates/billing/app.yml/template-file",
            fields(serde_json::json!({"data": "ZGI6IHt9", "ext": ".yml"})),
        )
        .with_shared_entry(
            "templates/billing/db.yml/template-file",
            fields(serde_json::json!({"data": "aG9zdDog", "ext": ".yml"})),
        )
        .with_shared_entry(
            "templates/billing/archive/old.yml",
            fields(serde_json::json!({"data": "", "ext": ".txt"})),
        )
        .with_entry(
            "dev",
            "values/billing/app.yml",
            fields(serde_json::json!({"db_host": "db.dev.internal", "db_port": "5432"})),
        )
        .with_entry(
            "dev",
            "values/ledger/app.yml",
            fields(serde_json::json!({"region": "eu-west-1"})),
        )
        .with_entry(
            "QA",
            "values/billing/app.yml",
            fields(serde_json::json!({"db_host": "db.qa.internal"})),
        )
        .with_entry("dev", "verification/billing", fields(serde_json::json!({"verified": true})))
        .with_entry("QA", "verification/billing", fields(serde_json::json!({"verified": false})))
}

pub fn service_with(store: MemoryStore, settings: TreeSettings) -> Arc<SecretTreeService> {
    Arc::new(SecretTreeService::new(Arc::new(store), settings))
}

pub fn router_with(store: MemoryStore, settings: TreeSettings) -> Router {
    build_router(ApiState::new(service_with(store, settings)))
}

pub fn router(store: MemoryStore) -> Router {
    router_with(store, TreeSettings::default())
}

pub async fn post_json(router: Router, path: &str, body: Value) -> Response<Body> {
    post_raw(router, path, body.to_string()).await
}

pub async fn post_raw(router: Router, path: &str, body: impl Into<String>) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .expect("build request");

    router.oneshot(request).await.expect("request")
}

pub async fn get(router: Router, path: &str) -> Response<Body> {
    let request = Request::builder().method("GET").uri(path).body(Body::empty()).expect("request");
    router.oneshot(request).await.expect("request")
}

pub async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes =
        to_bytes(response.into_body(), usize::MAX).await.expect("read response body as bytes");
    serde_json::from_slice(&bytes).expect("parse response body as JSON")
}

pub fn rpc(method: &str) -> String {
    format!("{}/{}", keytree::api::SERVICE_PATH, method)
}
