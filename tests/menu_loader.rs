//! Menu feed loader tests.

mod support;

use std::sync::Arc;

use axum::http::StatusCode;
use support::{MockOrigin, ok_response, seed_site_shell};
use tavola::{
    application::menu::MenuLoader,
    domain::menu::{MenuItem, fallback_menu},
    worker::{InterceptedFetch, OfflineWorker, WorkerConfig},
};

const FEED_PATH: &str = "/assets/data/menu.json";

const FEED_BODY: &str = r#"[
    {"id": 1, "name": "Bruschetta al pomodoro", "description": "Grilled bread, tomatoes.", "price": "€ 7", "category": "antipasti", "glyph": "🍅"},
    {"id": 2, "name": "Tagliatelle al ragù", "description": "Hand-cut egg pasta.", "price": "€ 16", "category": "primi", "imgSrc": "/assets/images/tagliatelle.jpg", "imgAlt": "Plate of tagliatelle"},
    {"id": 3, "name": "Tiramisù classico", "description": "Espresso, mascarpone, cocoa.", "price": "€ 8", "category": "dolci", "glyph": "🍰"}
]"#;

fn loader_over(origin: Arc<MockOrigin>) -> MenuLoader {
    MenuLoader::new(origin, FEED_PATH)
}

#[tokio::test]
async fn valid_feed_resolves_to_exactly_its_items() {
    let origin = Arc::new(MockOrigin::new());
    origin.route(FEED_PATH, "application/json", FEED_BODY);
    let loader = loader_over(origin);

    let items = loader.load().await;

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].name, "Bruschetta al pomodoro");
    assert_eq!(items[1].img_src.as_deref(), Some("/assets/images/tagliatelle.jpg"));
    assert_eq!(items[2].category, "dolci");
}

#[tokio::test]
async fn second_load_reuses_the_first_result_without_fetching() {
    let origin = Arc::new(MockOrigin::new());
    origin.route(FEED_PATH, "application/json", FEED_BODY);
    let loader = loader_over(origin.clone());

    let first: Vec<MenuItem> = loader.load().await.to_vec();
    let second = loader.load().await;

    assert_eq!(first.as_slice(), second);
    assert_eq!(origin.calls(), 1, "exactly one feed fetch per process");
}

#[tokio::test]
async fn concurrent_first_loads_share_one_fetch() {
    let origin = Arc::new(MockOrigin::new());
    origin.route(FEED_PATH, "application/json", FEED_BODY);
    let loader = loader_over(origin.clone());

    let (first, second) = tokio::join!(loader.load(), loader.load());

    assert_eq!(first, second);
    assert_eq!(origin.calls(), 1);
}

#[tokio::test]
async fn http_error_status_falls_back_to_the_embedded_list() {
    let origin = Arc::new(MockOrigin::new());
    let mut failure = ok_response("text/html", "internal error");
    failure.status = StatusCode::INTERNAL_SERVER_ERROR;
    origin.route_with(FEED_PATH, failure);
    let loader = loader_over(origin);

    let items = loader.load().await;

    assert_eq!(items, fallback_menu().as_slice());
    assert!(!items.is_empty());
}

#[tokio::test]
async fn network_failure_falls_back_to_the_embedded_list() {
    let origin = Arc::new(MockOrigin::new());
    origin.set_offline(true);
    let loader = loader_over(origin);

    assert_eq!(loader.load().await, fallback_menu().as_slice());
}

#[tokio::test]
async fn non_array_body_falls_back_to_the_embedded_list() {
    let origin = Arc::new(MockOrigin::new());
    origin.route(
        FEED_PATH,
        "application/json",
        r#"{"items": [{"id": 1, "name": "wrapped"}]}"#,
    );
    let loader = loader_over(origin);

    assert_eq!(loader.load().await, fallback_menu().as_slice());
}

#[tokio::test]
async fn ill_formed_items_fall_back_to_the_embedded_list() {
    let origin = Arc::new(MockOrigin::new());
    origin.route(
        FEED_PATH,
        "application/json",
        r#"[{"id": 1, "name": "No price or category"}]"#,
    );
    let loader = loader_over(origin);

    assert_eq!(loader.load().await, fallback_menu().as_slice());
}

#[tokio::test]
async fn empty_feed_falls_back_to_the_embedded_list() {
    let origin = Arc::new(MockOrigin::new());
    origin.route(FEED_PATH, "application/json", "[]");
    let loader = loader_over(origin);

    assert_eq!(loader.load().await, fallback_menu().as_slice());
}

#[tokio::test]
async fn failed_load_does_not_retry_on_later_calls() {
    let origin = Arc::new(MockOrigin::new());
    origin.set_offline(true);
    let loader = loader_over(origin.clone());

    loader.load().await;
    origin.set_offline(false);
    origin.route(FEED_PATH, "application/json", FEED_BODY);

    // One attempt per process: the fallback result is sticky.
    assert_eq!(loader.load().await, fallback_menu().as_slice());
    assert_eq!(origin.calls(), 1);
}

#[tokio::test]
async fn feed_loaded_through_the_worker_lands_in_the_dynamic_cache() {
    let origin = Arc::new(MockOrigin::new());
    seed_site_shell(&origin);
    origin.route(FEED_PATH, "application/json", FEED_BODY);

    let worker = Arc::new(
        OfflineWorker::new(WorkerConfig::default(), origin.clone()).expect("valid worker config"),
    );
    worker.install().await.expect("install succeeds");
    worker.activate().await;

    let loader = MenuLoader::new(Arc::new(InterceptedFetch::new(worker.clone())), FEED_PATH);
    let items = loader.load().await;
    assert_eq!(items.len(), 3);

    // The interception layer cached a copy under the dynamic namespace, so a
    // later load in a fresh process would survive the origin going dark.
    assert!(
        worker
            .store()
            .get(worker.names().dynamic_name(), FEED_PATH)
            .is_some()
    );

    origin.set_offline(true);
    let offline_loader =
        MenuLoader::new(Arc::new(InterceptedFetch::new(worker.clone())), FEED_PATH);
    let offline_items = offline_loader.load().await;
    assert_eq!(offline_items.len(), 3, "cached feed serves offline");
}
