//! Wire contract of the RPC routes: paths, bodies, status codes, and error codes.
//!
//! Every test drives the real router with `oneshot` against an in-memory store.

mod common;

use axum::http::StatusCode;
use keytree::api::error::ErrorBody;
use keytree::store::MemoryStore;
use serde_json::{json, Value};

use common::{get, post_json, post_raw, read_json, router, rpc, seeded_store};

#[tokio::test]
async fn health_reports_ok() {
    let response = get(router(MemoryStore::new()), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = read_json(response).await;
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn list_service_templates_excludes_directories() {
    let response = post_json(
        router(seeded_store()),
        &rpc("ListServiceTemplates"),
        json!({"service": "billing"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = read_json(response).await;
    assert_eq!(body, json!({"templates": ["app.yml", "db.yml"]}));
}

#[tokio::test]
async fn list_service_templates_for_unknown_service_is_empty() {
    let response =
        post_json(router(seeded_store()), &rpc("ListServiceTemplates"), json!({"service": "nope"}))
            .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = read_json(response).await;
    assert_eq!(body, json!({"templates": []}));
}

#[tokio::test]
async fn list_service_templates_warning_is_failed_precondition() {
    let store = seeded_store()
        .with_warnings("templates/billing/", vec!["partial listing".to_string()]);

    let response =
        post_json(router(store), &rpc("ListServiceTemplates"), json!({"service": "billing"}))
            .await;
    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);

    let body: ErrorBody = read_json(response).await;
    assert_eq!(body.code, "failed_precondition");
    assert_eq!(body.msg, "Warnings generated from vault billing");
    assert_eq!(body.meta.get("warnings").map(String::as_str), Some("partial listing"));
}

#[tokio::test]
async fn get_template_returns_data_and_ext() {
    let response = post_json(
        router(seeded_store()),
        &rpc("GetTemplate"),
        json!({"service": "billing", "file": "app.yml"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = read_json(response).await;
    assert_eq!(body, json!({"data": "ZGI6IHt9", "ext": ".yml"}));
}

#[tokio::test]
async fn get_template_missing_file_is_not_found() {
    let response = post_json(
        router(seeded_store()),
        &rpc("GetTemplate"),
        json!({"service": "billing", "file": "missing.yml"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: ErrorBody = read_json(response).await;
    assert_eq!(body.code, "not_found");
    assert_eq!(body.msg, "No file missing.yml under billing");
    assert!(body.meta.is_empty());
}

#[tokio::test]
async fn get_template_with_wrong_field_type_is_internal() {
    let store = MemoryStore::new().with_shared_entry(
        "templates/billing/app.yml/template-file",
        common::fields(json!({"data": 42, "ext": ".yml"})),
    );

    let response = post_json(
        router(store),
        &rpc("GetTemplate"),
        json!({"service": "billing", "file": "app.yml"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: ErrorBody = read_json(response).await;
    assert_eq!(body.code, "internal");
    assert!(body.msg.contains("'data'"), "unexpected msg: {}", body.msg);
}

#[tokio::test]
async fn validate_reads_flag_per_environment() {
    for (env, expected) in [("dev", true), ("QA", false)] {
        let response = post_json(
            router(seeded_store()),
            &rpc("Validate"),
            json!({"service": "billing", "env": env}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = read_json(response).await;
        assert_eq!(body, json!({"isValid": expected}), "env {}", env);
    }
}

#[tokio::test]
async fn validate_missing_record_is_not_found() {
    let response = post_json(
        router(seeded_store()),
        &rpc("Validate"),
        json!({"service": "ledger", "env": "dev"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: ErrorBody = read_json(response).await;
    assert_eq!(body.code, "not_found");
    assert_eq!(body.msg, "No verification for ledger found under dev environment");
}

#[tokio::test]
async fn read_failure_is_unavailable() {
    let store = seeded_store().with_read_error("QA", "verification/billing", "permission denied");

    let response = post_json(
        router(store),
        &rpc("Validate"),
        json!({"service": "billing", "env": "QA"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: ErrorBody = read_json(response).await;
    assert_eq!(body.code, "unavailable");
    assert!(body.msg.contains("permission denied"));
}

#[tokio::test]
async fn get_full_tree_returns_every_environment_in_order() {
    let response = post_json(router(seeded_store()), &rpc("GetFullTree"), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = read_json(response).await;
    assert_eq!(
        body,
        json!({"envs": [
            {"name": "dev", "services": [
                {"name": "billing", "files": [
                    {"name": "app.yml", "values": [
                        {"key": "db_host", "value": "db.dev.internal"},
                        {"key": "db_port", "value": "5432"}
                    ]}
                ]},
                {"name": "ledger", "files": [
                    {"name": "app.yml", "values": [{"key": "region", "value": "eu-west-1"}]}
                ]}
            ]},
            {"name": "QA", "services": [
                {"name": "billing", "files": [
                    {"name": "app.yml", "values": [{"key": "db_host", "value": "db.qa.internal"}]}
                ]}
            ]},
            {"name": "local", "services": []},
            {"name": "secrets", "services": []}
        ]})
    );
}

#[tokio::test]
async fn get_full_tree_ignores_request_body() {
    let response = post_raw(router(MemoryStore::new()), &rpc("GetFullTree"), "").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = read_json(response).await;
    assert_eq!(body["envs"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let response =
        post_raw(router(seeded_store()), &rpc("GetTemplate"), "{\"service\": \"billing\"").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ErrorBody = read_json(response).await;
    assert_eq!(body.code, "malformed");
}

#[tokio::test]
async fn missing_or_unsafe_fields_are_invalid_arguments() {
    let cases = [
        ("ListServiceTemplates", json!({})),
        ("GetTemplate", json!({"service": "billing"})),
        ("GetTemplate", json!({"service": "billing", "file": "../app.yml"})),
        ("Validate", json!({"service": "billing", "env": "dev/extra"})),
    ];

    for (method, request) in cases {
        let response = post_json(router(seeded_store()), &rpc(method), request.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{} {}", method, request);

        let body: ErrorBody = read_json(response).await;
        assert_eq!(body.code, "invalid_argument", "{} {}", method, request);
    }
}

#[tokio::test]
async fn unknown_method_is_not_routed() {
    let response = post_json(router(seeded_store()), &rpc("DeleteEverything"), json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
