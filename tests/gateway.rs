//! End-to-end gateway routing tests.

mod support;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use support::{MockOrigin, seed_site_shell};
use tavola::{
    infra::gateway::{GatewayState, build_router},
    worker::{OfflineWorker, WorkerConfig},
};
use tower::ServiceExt;

async fn ready_state(origin: Arc<MockOrigin>) -> GatewayState {
    let worker = Arc::new(
        OfflineWorker::new(WorkerConfig::default(), origin).expect("valid worker config"),
    );
    worker.install().await.expect("install succeeds");
    worker.activate().await;
    GatewayState { worker }
}

#[tokio::test]
async fn every_route_reaches_the_worker() {
    let origin = Arc::new(MockOrigin::new());
    seed_site_shell(&origin);
    let state = ready_state(origin.clone()).await;
    let calls_after_install = origin.calls();

    let response = build_router(state)
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/assets/css/main.css")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router answers");

    assert_eq!(response.status(), StatusCode::OK);
    let body = BodyExt::collect(response.into_body())
        .await
        .expect("body collects")
        .to_bytes();
    assert_eq!(&body[..], b"main{display:grid}");
    // Precached shell entry: the gateway answered without touching the origin.
    assert_eq!(origin.calls(), calls_after_install);
}

#[tokio::test]
async fn offline_navigation_through_the_gateway_serves_the_shell() {
    let origin = Arc::new(MockOrigin::new());
    seed_site_shell(&origin);
    let state = ready_state(origin.clone()).await;
    origin.set_offline(true);

    let response = build_router(state)
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/menu.html")
                .header("sec-fetch-mode", "navigate")
                .header(header::ACCEPT, "text/html")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router answers");

    assert_eq!(response.status(), StatusCode::OK);
    let body = BodyExt::collect(response.into_body())
        .await
        .expect("body collects")
        .to_bytes();
    assert_eq!(&body[..], b"<html>tavola shell</html>");
}
