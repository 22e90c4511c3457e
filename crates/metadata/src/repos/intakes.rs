//! Intake aggregate: report creation with its samples.

use crate::error::MetadataResult;
use crate::models::{IntakeRow, SampleRow};
use assay_core::{NewProject, Submission};
use async_trait::async_trait;

/// Repository for intake aggregates.
#[async_trait]
pub trait IntakeRepo: Send + Sync {
    /// Persist a validated submission in one transaction and return the report ID.
    ///
    /// Steps, all inside the transaction: upsert the client by email, insert
    /// the intake (unknown method revision is a reference error), claim a
    /// block of sample sequence numbers from the intake's counter, insert the
    /// samples in input order. Nothing is visible until commit, and any
    /// failure leaves no rows behind, client upsert included.
    async fn submit_intake(&self, submission: &Submission) -> MetadataResult<i64>;

    /// Create an intake for an existing client without samples.
    ///
    /// A due date, when given, materializes the metadata record in the same
    /// transaction.
    async fn create_project(&self, project: &NewProject) -> MetadataResult<i64>;

    /// Get an intake by report ID.
    async fn get_intake(&self, report_id: i64) -> MetadataResult<Option<IntakeRow>>;

    /// Samples of a report ordered by sequence number.
    async fn list_samples(&self, report_id: i64) -> MetadataResult<Vec<SampleRow>>;
}
