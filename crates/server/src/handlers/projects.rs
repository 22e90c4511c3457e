//! Project lifecycle updates and report views.
//!
//! Every `PUT /v1/projects/{id}/...` endpoint maps its body to one
//! [`FieldGroup`] and hands it to the store's upsert-with-defaults. The
//! first update of a report creates its metadata record; later ones touch
//! only their own columns.

use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{parse_json_body, parse_report_id, resolve_employee_id};
use crate::metrics;
use crate::state::AppState;
use assay_core::{AnalysisDatesUpdate, FieldGroup, parse_calendar_date, parse_optional_date};
use assay_metadata::models::{AnalysisMetadataRow, ProjectDetail, SampleRow, WorklistRow};
use axum::Json;
use axum::extract::{Path, Request, State};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

async fn apply_group(
    state: &AppState,
    report_id: i64,
    group: FieldGroup,
) -> ApiResult<Json<AnalysisMetadataRow>> {
    let record = state.metadata.apply_field_group(report_id, &group).await?;
    metrics::record_lifecycle_update(group.name());
    tracing::info!(report_id = report_id, group = group.name(), "analysis metadata updated");
    Ok(Json(record))
}

fn required<T>(value: Option<T>, field: &'static str) -> ApiResult<T> {
    value.ok_or(ApiError::Core(assay_core::Error::MissingField(field)))
}

/// Trimmed text that must be present and non-blank.
fn required_text(value: Option<String>, field: &'static str) -> ApiResult<String> {
    required(
        value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
        field,
    )
}

fn required_date(value: Option<String>, field: &'static str) -> ApiResult<Date> {
    let raw = required(value, field)?;
    Ok(parse_calendar_date(&raw)?)
}

/// Set project number request.
#[derive(Debug, Deserialize)]
pub struct SetProjectNumberRequest {
    pub project_number: Option<String>,
}

/// PUT /v1/projects/{id}/project-number
pub async fn set_project_number(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    req: Request,
) -> ApiResult<Json<AnalysisMetadataRow>> {
    let report_id = parse_report_id(&raw_id)?;
    let body: SetProjectNumberRequest = parse_json_body(&state, req).await?;
    let number = required_text(body.project_number, "project_number")?;
    apply_group(&state, report_id, FieldGroup::ProjectNumber(number)).await
}

/// Set received request. All three fields are required.
#[derive(Debug, Deserialize)]
pub struct SetReceivedRequest {
    pub date_received: Option<String>,
    pub arrival_conditions: Option<String>,
    pub storage_conditions: Option<String>,
}

/// PUT /v1/projects/{id}/received
pub async fn set_received(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    req: Request,
) -> ApiResult<Json<AnalysisMetadataRow>> {
    let report_id = parse_report_id(&raw_id)?;
    let body: SetReceivedRequest = parse_json_body(&state, req).await?;
    let group = FieldGroup::Received {
        date_received: required_date(body.date_received, "date_received")?,
        arrival_conditions: required_text(body.arrival_conditions, "arrival_conditions")?,
        storage_conditions: required_text(body.storage_conditions, "storage_conditions")?,
    };
    apply_group(&state, report_id, group).await
}

/// Set chemist request.
#[derive(Debug, Deserialize)]
pub struct SetChemistRequest {
    pub chemist: Option<String>,
}

/// PUT /v1/projects/{id}/chemist
pub async fn set_chemist(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    req: Request,
) -> ApiResult<Json<AnalysisMetadataRow>> {
    let report_id = parse_report_id(&raw_id)?;
    let body: SetChemistRequest = parse_json_body(&state, req).await?;
    let name = required_text(body.chemist, "chemist")?;
    let employee_id = resolve_employee_id(&state, &name).await?;
    apply_group(&state, report_id, FieldGroup::Chemist(employee_id)).await
}

/// Set reviewer request.
#[derive(Debug, Deserialize)]
pub struct SetReviewerRequest {
    pub reviewer: Option<String>,
}

/// PUT /v1/projects/{id}/reviewer
pub async fn set_reviewer(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    req: Request,
) -> ApiResult<Json<AnalysisMetadataRow>> {
    let report_id = parse_report_id(&raw_id)?;
    let body: SetReviewerRequest = parse_json_body(&state, req).await?;
    let name = required_text(body.reviewer, "reviewer")?;
    let employee_id = resolve_employee_id(&state, &name).await?;
    apply_group(&state, report_id, FieldGroup::Reviewer(employee_id)).await
}

/// Set analysis dates request. Omitted dates keep their stored value.
#[derive(Debug, Deserialize)]
pub struct SetAnalysisDatesRequest {
    pub extraction_date: Option<String>,
    pub analysis_start_date: Option<String>,
    pub analysis_end_date: Option<String>,
}

/// PUT /v1/projects/{id}/analysis-dates
pub async fn set_analysis_dates(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    req: Request,
) -> ApiResult<Json<AnalysisMetadataRow>> {
    let report_id = parse_report_id(&raw_id)?;
    let body: SetAnalysisDatesRequest = parse_json_body(&state, req).await?;
    let update = AnalysisDatesUpdate {
        extraction: parse_optional_date(body.extraction_date.as_deref())?,
        analysis_start: parse_optional_date(body.analysis_start_date.as_deref())?,
        analysis_end: parse_optional_date(body.analysis_end_date.as_deref())?,
    };
    if update == AnalysisDatesUpdate::default() {
        return Err(ApiError::BadRequest(
            "at least one of extraction_date, analysis_start_date, analysis_end_date is required"
                .to_string(),
        ));
    }
    apply_group(&state, report_id, FieldGroup::AnalysisDates(update)).await
}

/// Issue report request.
#[derive(Debug, Deserialize)]
pub struct IssueReportRequest {
    pub report_date: Option<String>,
}

/// PUT /v1/projects/{id}/report - Record the report date; the project leaves the worklist.
pub async fn issue_report(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    req: Request,
) -> ApiResult<Json<AnalysisMetadataRow>> {
    let report_id = parse_report_id(&raw_id)?;
    let body: IssueReportRequest = parse_json_body(&state, req).await?;
    let report_date = required_date(body.report_date, "report_date")?;
    apply_group(&state, report_id, FieldGroup::ReportIssued(report_date)).await
}

/// Set due date request. A null or blank date clears it.
#[derive(Debug, Deserialize)]
pub struct SetDueDateRequest {
    pub due_date: Option<String>,
}

/// PUT /v1/projects/{id}/due-date
pub async fn set_due_date(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    req: Request,
) -> ApiResult<Json<AnalysisMetadataRow>> {
    let report_id = parse_report_id(&raw_id)?;
    let body: SetDueDateRequest = parse_json_body(&state, req).await?;
    let due_date = parse_optional_date(body.due_date.as_deref())?;
    apply_group(&state, report_id, FieldGroup::DueDate(due_date)).await
}

/// GET /v1/projects/unreported - Worklist of projects without a report date.
pub async fn list_unreported_projects(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<WorklistRow>>> {
    let rows = state.metadata.list_unreported_projects().await?;
    Ok(Json(rows))
}

/// Client section of the project detail.
#[derive(Debug, Serialize)]
pub struct ClientSummary {
    pub client_id: i64,
    pub email: String,
    pub name: String,
    pub company: String,
}

/// Method section of the project detail.
#[derive(Debug, Serialize)]
pub struct MethodSummary {
    pub method_number: String,
    pub revision_number: i32,
    pub compound_name: String,
    pub air_loq: Option<f64>,
    pub surface_loq: Option<f64>,
}

/// Analysis metadata section. Every field is null until the record exists.
#[derive(Debug, Serialize)]
pub struct MetadataSummary {
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

/// Fully assembled project.
#[derive(Debug, Serialize)]
pub struct ProjectDetailResponse {
    pub report_id: i64,
    pub sample_count: i32,
    pub project_location: Option<String>,
    pub sampled_by: Option<String>,
    pub turnaround: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub client: ClientSummary,
    pub method: MethodSummary,
    pub metadata: MetadataSummary,
    pub samples: Vec<SampleRow>,
}

impl From<ProjectDetail> for ProjectDetailResponse {
    fn from(detail: ProjectDetail) -> Self {
        let h = detail.header;
        Self {
            report_id: h.report_id,
            sample_count: h.sample_count,
            project_location: h.project_location,
            sampled_by: h.sampled_by,
            turnaround: h.turnaround,
            created_at: h.created_at,
            client: ClientSummary {
                client_id: h.client_id,
                email: h.client_email,
                name: h.client_name,
                company: h.company,
            },
            method: MethodSummary {
                method_number: h.method_number,
                revision_number: h.revision_number,
                compound_name: h.compound_name,
                air_loq: h.air_loq,
                surface_loq: h.surface_loq,
            },
            metadata: MetadataSummary {
                analysis_unit: h.analysis_unit,
                arrival_conditions: h.arrival_conditions,
                storage_conditions: h.storage_conditions,
                project_number: h.project_number,
                date_received: h.date_received,
                extraction_date: h.extraction_date,
                analysis_start_date: h.analysis_start_date,
                analysis_end_date: h.analysis_end_date,
                report_date: h.report_date,
                due_date: h.due_date,
                prepared_by: h.prepared_by,
                prepared_by_name: h.prepared_by_name,
                reviewed_by: h.reviewed_by,
                reviewed_by_name: h.reviewed_by_name,
            },
            samples: detail.samples,
        }
    }
}

/// GET /v1/projects/{id} - One project with client, method, metadata and samples.
pub async fn get_project_detail(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<ProjectDetailResponse>> {
    let report_id = parse_report_id(&raw_id)?;
    let detail = state.metadata.get_project_detail(report_id).await?;
    Ok(Json(detail.into()))
}
