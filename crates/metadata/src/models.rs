//! Database models mapping to the metadata schema.

use assay_core::AnalysisDates;
use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

// =============================================================================
// Reference catalogs
// =============================================================================

/// Analytical method revision with its limits of quantitation.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct MethodRow {
    pub method_number: String,
    pub revision_number: i32,
    pub compound_name: String,
    pub air_loq: Option<f64>,
    pub surface_loq: Option<f64>,
}

/// Lab employee. Chemists and analysts can be assigned to reports.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct EmployeeRow {
    pub employee_id: i64,
    pub name: String,
    pub role: String,
}

// =============================================================================
// Clients
// =============================================================================

/// Submitting client, unique by email.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ClientRow {
    pub client_id: i64,
    pub email: String,
    pub name: String,
    pub company: String,
}

// =============================================================================
// Intake aggregate
// =============================================================================

/// Report aggregate root.
#[derive(Debug, Clone, FromRow)]
pub struct IntakeRow {
    pub report_id: i64,
    pub client_id: i64,
    pub sample_count: i32,
    pub method_number: String,
    pub revision_number: i32,
    pub project_location: Option<String>,
    pub sampled_by: Option<String>,
    pub turnaround: Option<String>,
    /// Highest sample sequence number handed out for this report.
    pub last_sample_seq: i32,
    pub created_at: OffsetDateTime,
}

/// Sample belonging to one report. Exactly one of air volume / surface area is set.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct SampleRow {
    pub report_id: i64,
    pub sample_seq: i32,
    pub label: String,
    pub sample_date: Date,
    pub mass: Option<f64>,
    pub air_volume: Option<f64>,
    pub surface_area: Option<f64>,
}

/// Lazily materialized lifecycle record of a report.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct AnalysisMetadataRow {
    pub report_id: i64,
    pub sample_count: i32,
    pub analysis_unit: String,
    pub arrival_conditions: String,
    pub storage_conditions: String,
    pub project_number: Option<String>,
    pub date_received: Option<Date>,
    pub extraction_date: Option<Date>,
    pub analysis_start_date: Option<Date>,
    pub analysis_end_date: Option<Date>,
    pub report_date: Option<Date>,
    pub due_date: Option<Date>,
    pub prepared_by: Option<i64>,
    pub reviewed_by: Option<i64>,
}

impl AnalysisMetadataRow {
    /// The stored extraction/analysis dates as a checked value.
    pub fn analysis_dates(&self) -> assay_core::Result<AnalysisDates> {
        AnalysisDates::new(
            self.extraction_date,
            self.analysis_start_date,
            self.analysis_end_date,
        )
    }
}

// =============================================================================
// Report views
// =============================================================================

/// One row of the unreported-projects worklist.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct WorklistRow {
    pub report_id: i64,
    pub project_number: Option<String>,
    pub client_name: String,
    pub company: String,
    pub compound_name: String,
    pub sample_count: i32,
    pub due_date: Option<Date>,
    pub date_received: Option<Date>,
    pub chemist_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Intake joined with client, method and (possibly absent) metadata.
///
/// All `AnalysisMetadata` columns are optional here: a report without a
/// metadata record yields nulls rather than an error.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectHeaderRow {
    pub report_id: i64,
    pub sample_count: i32,
    pub project_location: Option<String>,
    pub sampled_by: Option<String>,
    pub turnaround: Option<String>,
    pub created_at: OffsetDateTime,

    pub client_id: i64,
    pub client_email: String,
    pub client_name: String,
    pub company: String,

    pub method_number: String,
    pub revision_number: i32,
    pub compound_name: String,
    pub air_loq: Option<f64>,
    pub surface_loq: Option<f64>,

    pub analysis_unit: Option<String>,
    pub arrival_conditions: Option<String>,
    pub storage_conditions: Option<String>,
    pub project_number: Option<String>,
    pub date_received: Option<Date>,
    pub extraction_date: Option<Date>,
    pub analysis_start_date: Option<Date>,
    pub analysis_end_date: Option<Date>,
    pub report_date: Option<Date>,
    pub due_date: Option<Date>,
    pub prepared_by: Option<i64>,
    pub prepared_by_name: Option<String>,
    pub reviewed_by: Option<i64>,
    pub reviewed_by_name: Option<String>,
}

/// Fully assembled project: header plus samples ordered by sequence number.
#[derive(Debug, Clone)]
pub struct ProjectDetail {
    pub header: ProjectHeaderRow,
    pub samples: Vec<SampleRow>,
}
