use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod changelog;
mod config;
mod error;
mod github;
mod refresh;
mod render;

use changelog::Changelog;
use config::Config;
use github::GithubClient;

#[derive(Clone)]
struct AppState {
    changelog: Arc<Changelog>,
    cover_image: String,
    repo_name: String,
    max_pages: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // The cache must be fully built before the listener binds; serving
    // without commit data is worse than failing startup.
    let client = GithubClient::new(&config.token)?;
    tracing::info!(
        "building changelog cache for {} ({} pages)",
        config.repo,
        config.max_pages
    );
    let changelog = Arc::new(Changelog::build(client, &config.repo, config.max_pages).await?);

    refresh::spawn(changelog.clone(), config.cache_duration);

    let state = AppState {
        changelog,
        cover_image: config.cover_image,
        repo_name: config.repo_name,
        max_pages: config.max_pages,
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("changelog service listening on {}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(changelog_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<String>,
}

async fn changelog_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let page = requested_page(query.page.as_deref());

    // An out-of-range page renders an empty list, not a server error.
    let entries = state.changelog.display_page(page).unwrap_or_default();

    Html(render::render(&render::ChangelogPage {
        entries: &entries,
        page,
        max_pages: state.max_pages,
        last_update: state.changelog.last_update(),
        cover_image: &state.cover_image,
        repo_name: &state.repo_name,
    }))
}

/// Missing, malformed, or below-range page parameters degrade to page 1.
fn requested_page(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.parse::<usize>().ok())
        .filter(|&page| page >= 1)
        .unwrap_or(1)
}
