//! Admission Middleware
//!
//! Per-client rate limiting in front of every route. The client identity is
//! the peer IP with the port stripped; requests from an identity whose token
//! bucket is empty are rejected with 429 before reaching any handler.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::api::AppState;
use crate::error::{ApiError, Result};
use crate::throttle::Admission;

/// Runs the admission check for the request's client before handing the
/// request to the rest of the stack.
///
/// An underivable identity (the server was built without connect-info) is an
/// internal error for this one request, never a silent allow or deny.
pub async fn admit_client(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .ok_or_else(|| ApiError::Admission("peer address missing from request".to_string()))?;

    // Identity is the IP only; two connections from the same host share a
    // bucket regardless of source port.
    let client_id = peer.0.ip().to_string();

    let decision = {
        let mut store = state.throttle.write().await;
        store.admit(&client_id)
    };

    match decision {
        Admission::Allow => Ok(next.run(request).await),
        Admission::Deny => Err(ApiError::RateLimited),
    }
}
