//! # API Shared
//!
//! Shared definitions for the Cartella APIs.
//!
//! Contains:
//! - Wire types (`dto` module) with their OpenAPI schemas and conversions from core types
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and the CLI so both render records and reports identically.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
