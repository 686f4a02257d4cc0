//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Throttle sweep: evicts idle client limiter records at configured intervals

mod sweep;

pub use sweep::spawn_sweep_task;
