//! Full tree materialization through the service and the router.
//!
//! Covers all-or-nothing failure, warning policies, fan-out equivalence, and
//! cancellation.

mod common;

use axum::http::StatusCode;
use keytree::api::error::ErrorBody;
use keytree::services::TreeSettings;
use keytree::store::{MemoryStore, StoreError};
use keytree::tree::{FanOut, ListingWarnings};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

use common::{fields, post_json, read_json, router_with, rpc, seeded_store, service_with};

fn settings(fan_out: FanOut, listing_warnings: ListingWarnings) -> TreeSettings {
    TreeSettings { fan_out, listing_warnings, ..TreeSettings::default() }
}

/// A wider tree so concurrent fan-out has real interleaving to do.
fn wide_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    for env in ["dev", "QA", "local", "secrets"] {
        for service in 0..6 {
            for file in 0..4 {
                store = store.with_entry(
                    env,
                    format!("values/svc-{}/file-{}.yml", service, file),
                    fields(json!({"env": env, "index": format!("{}-{}", service, file)})),
                );
            }
        }
    }
    store
}

#[tokio::test]
async fn concurrent_fan_out_matches_sequential() {
    let cancel = CancellationToken::new();

    let sequential = service_with(wide_store(), settings(FanOut::Sequential, Default::default()))
        .get_full_tree(&cancel)
        .await
        .unwrap();
    let concurrent = service_with(wide_store(), settings(FanOut::Concurrent, Default::default()))
        .get_full_tree(&cancel)
        .await
        .unwrap();

    assert_eq!(sequential, concurrent);
    assert_eq!(sequential.environments.len(), 4);
    assert!(sequential.environments.iter().all(|e| e.services.len() == 6));
}

#[tokio::test]
async fn repeated_requests_return_identical_trees() {
    let service = service_with(seeded_store(), TreeSettings::default());
    let cancel = CancellationToken::new();

    let first = service.get_full_tree(&cancel).await.unwrap();
    let second = service.get_full_tree(&cancel).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn list_failure_in_any_environment_yields_no_tree() {
    for fan_out in [FanOut::Sequential, FanOut::Concurrent] {
        let store = seeded_store().with_list_error("local", "values/", "connection reset");

        let response = post_json(
            router_with(store, settings(fan_out, ListingWarnings::Ignore)),
            &rpc("GetFullTree"),
            json!({}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{}", fan_out);

        let body: ErrorBody = read_json(response).await;
        assert_eq!(body.code, "unavailable");
        assert!(body.msg.contains("connection reset"));
    }
}

#[tokio::test]
async fn read_failure_deep_in_tree_yields_no_tree() {
    let store = seeded_store().with_read_error("QA", "values/billing/app.yml", "sealed");
    let service = service_with(store, TreeSettings::default());

    let err = service.get_full_tree(&CancellationToken::new()).await.unwrap_err();
    match err {
        StoreError::StoreUnavailable { path, message } => {
            assert_eq!(path, "values/billing/app.yml");
            assert_eq!(message, "sealed");
        }
        other => panic!("expected StoreUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn non_string_value_is_malformed() {
    let store = seeded_store()
        .with_entry("QA", "values/ledger/app.yml", fields(json!({"replicas": 3})));
    let service = service_with(store, TreeSettings::default());

    let err = service.get_full_tree(&CancellationToken::new()).await.unwrap_err();
    assert_eq!(err, StoreError::malformed("values/ledger/app.yml", "replicas", "string"));
}

#[tokio::test]
#[traced_test]
async fn listing_warnings_are_logged_and_ignored_by_default() {
    let store = seeded_store().with_warnings("values/", vec!["mount is read-only".to_string()]);
    let service = service_with(store, TreeSettings::default());

    let tree = service.get_full_tree(&CancellationToken::new()).await.unwrap();
    assert_eq!(tree.environments.len(), 4);

    assert!(logs_contain("listing warning"));
    assert!(logs_contain("mount is read-only"));
}

#[tokio::test]
async fn listing_warnings_fail_the_tree_when_fatal() {
    let store = seeded_store().with_warnings("values/billing/", vec!["stale".to_string()]);

    let response = post_json(
        router_with(store, settings(FanOut::Sequential, ListingWarnings::Fatal)),
        &rpc("GetFullTree"),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);

    let body: ErrorBody = read_json(response).await;
    assert_eq!(body.code, "failed_precondition");
    assert_eq!(body.meta.get("warnings").map(String::as_str), Some("stale"));
}

#[tokio::test]
async fn cancelled_request_returns_cancelled() {
    let service = service_with(seeded_store(), TreeSettings::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = service.get_full_tree(&cancel).await.unwrap_err();
    assert_eq!(err, StoreError::Cancelled);
}
