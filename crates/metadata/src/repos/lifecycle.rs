//! Lifecycle state updates on the analysis metadata record.

use crate::error::MetadataResult;
use crate::models::AnalysisMetadataRow;
use assay_core::FieldGroup;
use async_trait::async_trait;

/// Repository for the per-report analysis metadata record.
#[async_trait]
pub trait LifecycleRepo: Send + Sync {
    /// Apply one field group, materializing the record first if needed.
    ///
    /// Runs under a row lock on the parent intake. A missing record is
    /// created with default conditions, the default analysis unit and the
    /// intake's declared sample count; then only the group's columns are
    /// written. Unknown report IDs yield `NotFound`.
    async fn apply_field_group(
        &self,
        report_id: i64,
        group: &FieldGroup,
    ) -> MetadataResult<AnalysisMetadataRow>;

    /// Get the metadata record, if it has been materialized.
    async fn get_analysis_metadata(
        &self,
        report_id: i64,
    ) -> MetadataResult<Option<AnalysisMetadataRow>>;
}
