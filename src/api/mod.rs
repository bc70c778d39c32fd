//! REST API server module
//!
//! Thin HTTP trigger layer: every POST starts a background task and answers
//! `201` with its loading record, every GET returns the current record.

use crate::{Config, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error_response;
pub mod routes;
pub mod state;

pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Search
/// - `POST /search/single-query` - Start a single query search (FASTA body)
/// - `GET /search/single-query/:id` - Poll a single query search (`?page=`)
/// - `POST /search/multi-query` - Start a multi query search (FASTA body)
/// - `GET /search/multi-query/:id` - Poll a multi query search (`?page=`)
///
/// ## Export
/// - `POST /export/single-query` - Export a single query search result
/// - `GET /export/single-query/:id` - Poll a single query export
/// - `POST /export/multi-query` - Export a multi query search result
/// - `GET /export/multi-query/:id` - Poll a multi query export
/// - `POST /export/text-query` - Export a bitmap selection
/// - `GET /export/text-query/:id` - Poll a text query export
///
/// ## System
/// - `GET /health` - Health check
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        // Search
        .route("/search/single-query", post(routes::create_single_query_search))
        .route("/search/single-query/:id", get(routes::get_single_query_search))
        .route("/search/multi-query", post(routes::create_multi_query_search))
        .route("/search/multi-query/:id", get(routes::get_multi_query_search))
        // Export
        .route("/export/single-query", post(routes::create_single_query_export))
        .route("/export/single-query/:id", get(routes::get_single_query_export))
        .route("/export/multi-query", post(routes::create_multi_query_export))
        .route("/export/multi-query/:id", get(routes::get_multi_query_export))
        .route("/export/text-query", post(routes::create_text_query_export))
        .route("/export/text-query/:id", get(routes::get_text_query_export))
        // System
        .route("/health", get(routes::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config
    if config.api.cors_enabled {
        let cors = build_cors_layer(&config.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin; otherwise only the listed
/// origins are allowed. All methods and headers are allowed.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until the server stops, either due to an error or shutdown.
///
/// # Example
///
/// ```no_run
/// use peptide_tasks::{Config, Database, NoOpAligner, TaskExecutor, api::AppState};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::from_env()?);
/// let db = Arc::new(Database::new(&config.persistence.database_path).await?);
/// let executor = TaskExecutor::new(db, &config.tasks).await?;
/// let state = AppState::new(executor, Arc::new(NoOpAligner), config);
///
/// // Start API server (blocks until shutdown)
/// peptide_tasks::api::start_api_server(state).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(state: AppState) -> Result<()> {
    serve(state, std::future::pending()).await
}

/// Serve the API until `shutdown` resolves, then stop accepting connections
/// and let in-flight requests finish.
pub async fn serve<F>(state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_address = state.config.api.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let app = create_router(state);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
