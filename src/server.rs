//! HTTP service.
//!
//! ```text
//!   /api/signin    ─┐
//!   /api/nextdate  ─┴─ public
//!   /api/task      ─┐
//!   /api/tasks      ├─ require_token ── TaskStore
//!   /api/task/done ─┘
//!   /*             ── static files (web dir)
//! ```

#[path = "server/handlers.rs"]
mod handlers;


use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use chrono::NaiveDate;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::config::Config;
use crate::store::{SqliteTaskStore, TaskStore};

/// Shared state behind every handler.
pub struct AppState {
    pub store: Arc<dyn TaskStore>,
    /// Shared password; `None` disables authentication.
    pub password: Option<String>,
    /// Fixed "today" for deterministic runs; `None` uses the local clock.
    pub pinned_today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(store: Arc<dyn TaskStore>, password: Option<String>) -> Self {
        Self { store, password, pinned_today: None }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.pinned_today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.pinned_today.unwrap_or_else(crate::api::today)
    }
}

/// Build the application router. Static assets are served from `web_dir`
/// for every path no API route claims.
pub fn build_router(state: Arc<AppState>, web_dir: Option<&Path>) -> Router {
    let protected = Router::new()
        .route(
            "/api/task",
            post(handlers::add_task)
                .get(handlers::get_task)
                .put(handlers::edit_task)
                .delete(handlers::delete_task),
        )
        .route("/api/tasks", get(handlers::list_tasks))
        .route("/api/task/done", post(handlers::task_done))
        .route_layer(middleware::from_fn_with_state(state.clone(), handlers::require_token));

    let app = Router::new()
        .route("/api/signin", post(handlers::signin))
        .route("/api/nextdate", get(handlers::next_date))
        .merge(protected);

    let app = match web_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };
    app.with_state(state)
}

/// Open the store, bind the port and serve until Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let store = SqliteTaskStore::open(&config.db_file)?;
    info!("task database: {}", config.db_file.display());

    if config.password.is_none() {
        warn!("TODO_PASSWORD is not set, task endpoints are open");
    }
    if !config.web_dir.is_dir() {
        warn!("web directory {} not found, static files disabled", config.web_dir.display());
    }

    let state = Arc::new(AppState::new(Arc::new(store), config.password.clone()));
    let web_dir = config.web_dir.is_dir().then_some(config.web_dir.as_path());
    let app = build_router(state, web_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://localhost:{}", config.port);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl-C: {err}");
    }
}
