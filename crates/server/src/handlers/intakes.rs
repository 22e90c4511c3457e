//! Intake submission and project creation.

use crate::error::ApiResult;
use crate::handlers::common::parse_json_body;
use crate::metrics;
use crate::state::AppState;
use assay_core::intake::{ProjectDraft, SubmissionDraft};
use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use serde::Serialize;
use std::time::Instant;

/// Response for intake submission and project creation.
#[derive(Debug, Serialize)]
pub struct CreatedReportResponse {
    pub report_id: i64,
}

/// POST /v1/intakes - Submit client info and samples as one new report.
///
/// Validation runs on the whole submission before anything is written, so a
/// rejected request leaves no client, intake or sample behind.
#[tracing::instrument(skip(state, req), fields(report_id))]
pub async fn submit_intake(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<CreatedReportResponse>)> {
    let draft: SubmissionDraft = parse_json_body(&state, req).await?;
    let submission = draft.validate()?;

    let start = Instant::now();
    let report_id = state.metadata.submit_intake(&submission).await?;
    metrics::INTAKE_SUBMIT_DURATION.observe(start.elapsed().as_secs_f64());
    metrics::INTAKES_SUBMITTED.inc();
    metrics::SAMPLES_RECORDED.inc_by(submission.samples.len() as u64);

    tracing::Span::current().record("report_id", report_id);
    tracing::info!(
        report_id = report_id,
        samples = submission.samples.len(),
        company = %submission.header.client.company,
        "intake submitted"
    );

    Ok((StatusCode::CREATED, Json(CreatedReportResponse { report_id })))
}

/// POST /v1/projects - Create a report without samples for an existing client.
#[tracing::instrument(skip(state, req), fields(report_id))]
pub async fn create_project(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<CreatedReportResponse>)> {
    let draft: ProjectDraft = parse_json_body(&state, req).await?;
    let project = draft.validate()?;

    let report_id = state.metadata.create_project(&project).await?;
    metrics::PROJECTS_CREATED.inc();
    if project.due_date.is_some() {
        metrics::record_lifecycle_update("due_date");
    }

    tracing::Span::current().record("report_id", report_id);
    tracing::info!(
        report_id = report_id,
        client_id = project.client_id,
        "project created"
    );

    Ok((StatusCode::CREATED, Json(CreatedReportResponse { report_id })))
}
