//! API Routes
//!
//! Configures the Axum router with all endpoints and middleware.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{health_handler, notify_handler, AppState};
use super::middleware::admit_client;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check with lifecycle state
/// - `POST /notifications` - Queue a notification for background delivery
///
/// # Middleware
/// - Admission: per-client token bucket, 429 on deny
/// - Catch-panic: a panicking handler becomes a 500, not a dead connection
/// - CORS: allows any origin (configurable for production)
/// - Tracing: logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/health", get(health_handler))
        .route("/notifications", post(notify_handler))
        .layer(middleware::from_fn_with_state(state.clone(), admit_client))
        .layer(CatchPanicLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
