//! Furlief daemon library: HTTP API over the waitlist service.

pub mod context;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;

pub use server::{router, AppState};
