//! Reference catalogs: analytical methods and employees.
//!
//! These tables are maintained outside the intake engine; the write
//! operations exist for provisioning and tests.

use crate::error::MetadataResult;
use crate::models::{EmployeeRow, MethodRow};
use async_trait::async_trait;

/// Employee roles that can be assigned analysis work.
pub const CHEMIST_ROLES: [&str; 2] = ["Chemist", "Analyst"];

/// Repository for methods and employees.
#[async_trait]
pub trait CatalogRepo: Send + Sync {
    /// Insert a method revision.
    async fn create_method(&self, method: &MethodRow) -> MetadataResult<()>;

    /// List all method revisions ordered by method then revision.
    async fn list_methods(&self) -> MetadataResult<Vec<MethodRow>>;

    /// Method revisions for a compound, descending by method then revision.
    async fn get_compound_methods(&self, compound_name: &str) -> MetadataResult<Vec<MethodRow>>;

    /// Insert an employee and return the new identifier.
    async fn create_employee(&self, name: &str, role: &str) -> MetadataResult<i64>;

    /// Exact name lookup. The lowest identifier wins if a name is shared.
    async fn find_employee_by_name(&self, name: &str) -> MetadataResult<Option<EmployeeRow>>;

    /// Employees with a role in [`CHEMIST_ROLES`], ascending by name.
    async fn list_chemists(&self) -> MetadataResult<Vec<EmployeeRow>>;
}
