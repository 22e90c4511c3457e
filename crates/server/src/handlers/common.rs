//! Shared handler helpers.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use assay_core::lifecycle::NO_EMPLOYEE;
use axum::extract::Request;
use serde::de::DeserializeOwned;

/// Read and deserialize a JSON request body, bounded by the configured limit.
pub async fn parse_json_body<T: DeserializeOwned>(state: &AppState, req: Request) -> ApiResult<T> {
    let bytes = axum::body::to_bytes(req.into_body(), state.max_body_size())
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(format!("invalid JSON: {e}")))
}

/// Resolve an employee name to an ID for chemist/reviewer assignment.
///
/// Callers reject blank names first. The `"N/A"` sentinel and names with no
/// matching employee resolve to `None`, which clears the assignment.
pub async fn resolve_employee_id(state: &AppState, name: &str) -> ApiResult<Option<i64>> {
    let name = name.trim();
    if name == NO_EMPLOYEE {
        return Ok(None);
    }

    match state.metadata.find_employee_by_name(name).await? {
        Some(employee) => Ok(Some(employee.employee_id)),
        None => {
            tracing::debug!(employee = name, "no employee with this name, clearing assignment");
            Ok(None)
        }
    }
}

/// Parse a path report ID.
pub fn parse_report_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("invalid report id: {raw}")))
}
