//! Common test utilities and fixtures.

pub mod fixtures;
pub mod metadata;
pub mod server;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use metadata::*;
#[allow(unused_imports)]
pub use server::*;
