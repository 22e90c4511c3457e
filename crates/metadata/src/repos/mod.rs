//! Repository traits for metadata operations.

pub mod catalog;
pub mod clients;
pub mod intakes;
pub mod lifecycle;
pub mod reports;

pub use catalog::{CHEMIST_ROLES, CatalogRepo};
pub use clients::ClientRepo;
pub use intakes::IntakeRepo;
pub use lifecycle::LifecycleRepo;
pub use reports::ReportRepo;
