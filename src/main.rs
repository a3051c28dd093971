mod config;
mod db;
mod errors;
mod handlers;
mod intake;
mod models;
mod store;

use axum::{
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::errors::AppError;

/// Outermost boundary for uncaught faults: any handler panic becomes the
/// generic internal error response, so no request is ever left unanswered.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    AppError::Internal(format!("handler panicked: {}", detail)).into_response()
}

/// Main entry point for the application.
///
/// Initializes logging, configuration, and the database pool, then serves
/// the intake webhook, the dashboard read surfaces, and the update endpoint.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "select_therapy_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database connection pool and bootstrap the leads table
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    // Build application state
    let app_state = std::sync::Arc::new(handlers::AppState {
        db: db.pool.clone(),
        config: config.clone(),
    });

    let app = Router::new()
        .route("/health", get(handlers::health))
        // External intake webhook (shared-secret authenticated)
        .route("/api/v1/webhooks/leads", post(intake::lead_webhook))
        // Dashboard read surfaces (staff-session authenticated)
        .route("/api/v1/leads", get(handlers::list_leads))
        .route("/api/v1/leads/board", get(handlers::board_leads))
        // Partial update, also carries the board's quick status changes
        .route("/api/v1/leads/:id", patch(handlers::update_lead))
        .layer(
            ServiceBuilder::new()
                // Request size limit: 1MB max payload (prevents memory exhaustion)
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
