//! HTTP request handlers.

pub mod catalog;
pub mod common;
pub mod health;
pub mod intakes;
pub mod projects;

pub use catalog::*;
pub use common::*;
pub use health::*;
pub use intakes::*;
pub use projects::*;
