//! HTTP API server for the Assay sample-tracking service.
//!
//! This crate provides the HTTP adapter over the metadata store:
//! - Intake submission and staff-side project creation
//! - Lifecycle field-group updates
//! - Worklist and project detail views
//! - Catalog and client lookups
//! - Health and Prometheus metrics endpoints

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
