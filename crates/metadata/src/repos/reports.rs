//! Read-side report projections.

use crate::error::MetadataResult;
use crate::models::{ProjectDetail, WorklistRow};
use async_trait::async_trait;

/// Repository for the worklist and project detail views.
#[async_trait]
pub trait ReportRepo: Send + Sync {
    /// Reports without an issued report date.
    ///
    /// Ordered by due date ascending with unknown due dates last, then by
    /// report ID descending.
    async fn list_unreported_projects(&self) -> MetadataResult<Vec<WorklistRow>>;

    /// Assemble one project. Unknown report IDs yield `NotFound`.
    async fn get_project_detail(&self, report_id: i64) -> MetadataResult<ProjectDetail>;
}

/// Worklist query shared by both backends; it takes no parameters.
pub(crate) const WORKLIST_SQL: &str = r#"
    SELECT i.report_id, m.project_number, c.name AS client_name, c.company,
           me.compound_name, i.sample_count, m.due_date, m.date_received,
           e.name AS chemist_name, i.created_at
    FROM intakes i
    JOIN clients c ON c.client_id = i.client_id
    JOIN methods me ON me.method_number = i.method_number
                   AND me.revision_number = i.revision_number
    LEFT JOIN analysis_metadata m ON m.report_id = i.report_id
    LEFT JOIN employees e ON e.employee_id = m.prepared_by
    WHERE m.report_date IS NULL
    ORDER BY (m.due_date IS NULL), m.due_date ASC, i.report_id DESC
"#;

/// Project header select; each backend appends its own `WHERE` placeholder.
pub(crate) const PROJECT_HEADER_SELECT: &str = r#"
    SELECT i.report_id, i.sample_count, i.project_location, i.sampled_by,
           i.turnaround, i.created_at,
           c.client_id, c.email AS client_email, c.name AS client_name, c.company,
           me.method_number, me.revision_number, me.compound_name,
           me.air_loq, me.surface_loq,
           m.analysis_unit, m.arrival_conditions, m.storage_conditions,
           m.project_number, m.date_received, m.extraction_date,
           m.analysis_start_date, m.analysis_end_date, m.report_date, m.due_date,
           m.prepared_by, p.name AS prepared_by_name,
           m.reviewed_by, r.name AS reviewed_by_name
    FROM intakes i
    JOIN clients c ON c.client_id = i.client_id
    JOIN methods me ON me.method_number = i.method_number
                   AND me.revision_number = i.revision_number
    LEFT JOIN analysis_metadata m ON m.report_id = i.report_id
    LEFT JOIN employees p ON p.employee_id = m.prepared_by
    LEFT JOIN employees r ON r.employee_id = m.reviewed_by
"#;
