//! Core domain types and shared logic for the Assay sample-tracking service.
//!
//! This crate defines the data the other crates agree on:
//! - Intake submissions and their validation
//! - Sample measurements (air volume or surface area, never both)
//! - Lifecycle field groups and the analysis-date ordering
//! - Configuration

pub mod config;
pub mod date;
pub mod error;
pub mod intake;
pub mod lifecycle;

pub use date::{parse_calendar_date, parse_optional_date};
pub use error::{Error, Result};
pub use intake::{
    ClientIdentity, IntakeHeader, Measurement, MethodRef, NewProject, NewSample, Submission,
};
pub use lifecycle::{AnalysisDates, AnalysisDatesUpdate, FieldGroup, FieldValue};
