//! API Module
//!
//! HTTP handlers, admission middleware, and routing.
//!
//! # Endpoints
//! - `GET /health` - Service status, lifecycle state, outstanding work count
//! - `POST /notifications` - Queue a notification for background delivery
//!
//! Every route sits behind the per-client admission filter.

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
