use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::{body::Body, http::Request, http::StatusCode};
use om_api::auth::AuthConfig;
use om_common::db::InMemoryProfileStore;
use tower::ServiceExt;

async fn status_of(app: axum::Router, uri: &str) -> StatusCode {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn readyz_returns_service_unavailable_when_not_ready() {
    let state = om_api::test_state("test-key");
    state.readiness.store(false, Ordering::SeqCst);
    let app = om_api::create_router(state);

    assert_eq!(status_of(app.clone(), "/readyz").await, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(status_of(app, "/health").await, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn readyz_tracks_profile_store_health() {
    let store = Arc::new(InMemoryProfileStore::new());
    let app = om_api::create_router(om_api::test_state_with_store(
        AuthConfig::api_key("test-key"),
        store.clone(),
    ));

    assert_eq!(status_of(app.clone(), "/readyz").await, StatusCode::OK);

    store.set_unavailable(true);
    assert_eq!(status_of(app.clone(), "/readyz").await, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(status_of(app, "/livez").await, StatusCode::OK);
}
