//! SpendWatch Web Server
//!
//! Axum-based REST API for recording transactions and reviewing fraud alerts.
//!
//! - Every recorded transaction is scored against the user's history
//! - Scoring never fails a write: the transaction is stored either way
//! - Restrictive CORS policy
//! - Input validation (pagination limits, batch limits, amounts)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use spendwatch_core::{Database, Detector};

mod handlers;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Maximum transactions scored in one detect request
pub const MAX_DETECT_BATCH: usize = 1000;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub detector: Detector,
}

/// Create the application router
pub fn create_router(db: Database, detector: Detector, config: ServerConfig) -> Router {
    let state = Arc::new(AppState { db, detector });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Transactions
        .route(
            "/users/:user_id/transactions",
            get(handlers::list_transactions).post(handlers::record_transaction),
        )
        // Scoring without persistence
        .route("/users/:user_id/detect", post(handlers::detect_transactions))
        // Alerts
        .route("/users/:user_id/fraud-alerts", get(handlers::list_fraud_alerts));

    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server
pub async fn serve(db: Database, detector: Detector, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(db, detector, host, port, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    detector: Detector,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    let detection = detector.config();
    info!(
        trees = detection.tree_count,
        contamination = detection.contamination,
        direction = %detection.direction,
        min_history = detection.min_history,
        "Detection configured"
    );

    let app = create_router(db, detector, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
