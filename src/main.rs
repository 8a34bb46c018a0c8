use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod dto;
mod error;
mod handlers;
mod i18n;
mod models;
mod services;
#[cfg(test)]
mod test_support;

use config::Config;
use db::{postgres::PgJournalStore, JournalStore};
use services::analyzer::Analyzer;
use services::completion::HttpTransport;
use services::journals::JournalService;
use services::rate_limit::{spawn_counter_cleanup_worker, MemoryCounterStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JournalStore>,
    pub config: Arc<Config>,
    pub journals: JournalService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nutrilog_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    // Database
    let pool = db::pool::create_pool(&config.database_url).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let store: Arc<dyn JournalStore> = Arc::new(PgJournalStore::new(pool));

    // LLM quota counters, purged every 5 min
    let counters = MemoryCounterStore::new();
    spawn_counter_cleanup_worker(counters.clone());

    let transport = HttpTransport::new(
        &config.openai_api_url,
        Duration::from_secs(config.llm_timeout_secs),
    )?;
    let analyzer = Analyzer::from_config(&config, Arc::new(counters), Arc::new(transport));

    tracing::info!(
        provider = %config.llm_provider,
        model = %config.openai_model,
        "LLM analyzer configured"
    );

    let state = AppState {
        store: store.clone(),
        config: config.clone(),
        journals: JournalService::new(store, Arc::new(analyzer)),
    };

    let app = build_router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz));

    let protected_routes = Router::new()
        // Journals
        .route("/api/journals/:date", get(handlers::journals::get_journal))
        .route(
            "/api/journals/:date/close",
            post(handlers::journals::close_journal),
        )
        // Meals
        .route(
            "/api/journals/:date/meals",
            post(handlers::meals::create_meal),
        )
        .route(
            "/api/meals/:id",
            get(handlers::meals::get_meal)
                .put(handlers::meals::update_meal)
                .delete(handlers::meals::delete_meal),
        )
        .route("/api/meals/:id/confirm", post(handlers::meals::confirm_meal))
        .route(
            "/api/meals/:id/reprocess",
            post(handlers::meals::reprocess_meal),
        )
        // Exercises
        .route(
            "/api/journals/:date/exercises",
            post(handlers::exercises::create_exercise),
        )
        .route(
            "/api/exercises/:id",
            get(handlers::exercises::get_exercise)
                .put(handlers::exercises::update_exercise)
                .delete(handlers::exercises::delete_exercise),
        )
        .route(
            "/api/exercises/:id/confirm",
            post(handlers::exercises::confirm_exercise),
        )
        .route(
            "/api/exercises/:id/reprocess",
            post(handlers::exercises::reprocess_exercise),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let mut origins: Vec<HeaderValue> = Vec::new();
    match config.frontend_url.parse::<HeaderValue>() {
        Ok(hv) => origins.push(hv),
        Err(_) => tracing::warn!(url = %config.frontend_url, "FRONTEND_URL is not a valid origin"),
    }
    // In dev, also allow LAN access (e.g. testing from another device)
    if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
        for o in extra.split(',') {
            if let Ok(hv) = o.trim().parse::<HeaderValue>() {
                origins.push(hv);
            }
        }
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
