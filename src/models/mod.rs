//! Models Module
//!
//! Request and response DTOs for the HTTP API.

mod requests;
mod responses;

pub use requests::NotifyRequest;
pub use responses::{HealthResponse, NotifyResponse};
