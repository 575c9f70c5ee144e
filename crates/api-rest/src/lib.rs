//! # API REST
//!
//! REST API implementation for Cartella.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (status codes, JSON error bodies, pagination links, CORS)
//!
//! Uses `api-shared` for wire types and `cartella-core` for all data operations.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod records;
pub mod reports;
pub mod routes;
pub mod startup;
pub mod state;


pub use error::ApiError;
pub use routes::{router, ApiDoc};
pub use state::AppState;
