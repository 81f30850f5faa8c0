//! # od-api
//!
//! REST API server for orgdesk.
//!
//! This crate provides the HTTP API over the directory, the correspondence
//! registries and the statistics endpoints.

pub mod auth;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::{ApiServer, ApiServerConfig};
pub use state::AppState;
