use std::{process, sync::Arc};

use axum::http::{HeaderMap, StatusCode};
use clap::Parser;
use tavola::{
    application::{error::AppError, menu::MenuLoader},
    config,
    infra::{
        gateway::{self, GatewayState},
        net::{Fetch, HttpOrigin},
        telemetry,
    },
    worker::{InterceptedFetch, OfflineWorker, StaticManifest, WorkerConfig},
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let cli = config::CliArgs::parse();
    let settings = config::load(&cli)
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let command = cli
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::CheckManifest(_) => run_check(settings).await,
        config::Command::Menu(_) => run_menu(settings).await,
    }
}

fn build_origin(settings: &config::Settings) -> Result<Arc<HttpOrigin>, AppError> {
    Ok(Arc::new(HttpOrigin::new(
        settings.origin.url.clone(),
        settings.origin.timeout,
    )?))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let origin = build_origin(&settings)?;
    let worker = Arc::new(OfflineWorker::new(
        WorkerConfig::from(&settings.cache),
        origin,
    )?);

    // Lifecycle gates, strictly sequential: no request is answered before
    // install and activate have both settled.
    worker.install().await?;
    worker.activate().await;

    // Warm the menu through the worker so the feed request participates in
    // dynamic caching like any other intercepted asset request.
    let loader = MenuLoader::new(
        Arc::new(InterceptedFetch::new(worker.clone())),
        settings.menu.feed_path.clone(),
    );
    let items = loader.load().await;
    info!(
        target = "tavola::serve",
        items = items.len(),
        "menu warmed at startup"
    );

    gateway::serve(settings.server.listen_addr, GatewayState { worker }).await
}

async fn run_check(settings: config::Settings) -> Result<(), AppError> {
    let origin = build_origin(&settings)?;
    let manifest = StaticManifest::new(settings.cache.manifest.clone())?;

    info!(
        target = "tavola::check",
        origin = %settings.origin.url,
        entries = manifest.len(),
        "probing precache manifest"
    );

    let mut unreachable = 0usize;
    for path in manifest.paths() {
        match origin.get(path, &HeaderMap::new()).await {
            Ok(response) if response.status == StatusCode::OK => {
                info!(target = "tavola::check", path = %path, "ok");
            }
            Ok(response) => {
                unreachable += 1;
                warn!(
                    target = "tavola::check",
                    path = %path,
                    status = %response.status,
                    "unexpected status"
                );
            }
            Err(err) => {
                unreachable += 1;
                warn!(target = "tavola::check", path = %path, error = %err, "unreachable");
            }
        }
    }

    if unreachable > 0 {
        return Err(AppError::validation(format!(
            "{unreachable} manifest entr{} unreachable at the origin; install would fail",
            if unreachable == 1 { "y is" } else { "ies are" }
        )));
    }

    info!(target = "tavola::check", "all manifest entries reachable");
    Ok(())
}

async fn run_menu(settings: config::Settings) -> Result<(), AppError> {
    let origin: Arc<dyn Fetch> = build_origin(&settings)?;
    let loader = MenuLoader::new(origin, settings.menu.feed_path.clone());

    let items = loader.load().await;
    let rendered = serde_json::to_string_pretty(items)
        .map_err(|err| AppError::unexpected(format!("failed to render menu: {err}")))?;
    println!("{rendered}");
    Ok(())
}
