//! Client registry: identity resolution by email.

use crate::error::MetadataResult;
use crate::models::ClientRow;
use assay_core::ClientIdentity;
use async_trait::async_trait;

/// Repository for submitting clients.
#[async_trait]
pub trait ClientRepo: Send + Sync {
    /// Upsert a client by email and return its identifier.
    ///
    /// A new email creates a client. A known email keeps its identifier and
    /// takes the supplied name and company. Inside an intake submission the
    /// same upsert runs in the submission's transaction instead.
    async fn resolve_client(&self, identity: &ClientIdentity) -> MetadataResult<i64>;

    /// Get a client by email.
    async fn get_client_by_email(&self, email: &str) -> MetadataResult<Option<ClientRow>>;

    /// Case-insensitive substring search on company, ordered by company then name.
    async fn search_clients(&self, company: &str) -> MetadataResult<Vec<ClientRow>>;
}

/// Build a case-insensitive `LIKE ... ESCAPE '\'` pattern matching `needle` anywhere.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
