//! Reference catalog and client lookup endpoints.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use assay_metadata::models::{ClientRow, EmployeeRow, MethodRow};
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

/// GET /v1/methods - All method revisions.
pub async fn list_methods(State(state): State<AppState>) -> ApiResult<Json<Vec<MethodRow>>> {
    let methods = state.metadata.list_methods().await?;
    Ok(Json(methods))
}

/// GET /v1/compounds/{name}/methods - Methods for one compound, newest first.
pub async fn get_compound_methods(
    State(state): State<AppState>,
    Path(compound_name): Path<String>,
) -> ApiResult<Json<Vec<MethodRow>>> {
    let methods = state.metadata.get_compound_methods(&compound_name).await?;
    if methods.is_empty() {
        return Err(ApiError::NotFound(format!(
            "no methods for compound '{compound_name}'"
        )));
    }
    Ok(Json(methods))
}

/// GET /v1/chemists - Employees that can be assigned to a report.
pub async fn list_chemists(State(state): State<AppState>) -> ApiResult<Json<Vec<EmployeeRow>>> {
    let chemists = state.metadata.list_chemists().await?;
    Ok(Json(chemists))
}

/// Query parameters for client search.
#[derive(Debug, Deserialize)]
pub struct SearchClientsQuery {
    pub company: Option<String>,
}

/// GET /v1/clients?company= - Case-insensitive company substring search.
pub async fn search_clients(
    State(state): State<AppState>,
    Query(query): Query<SearchClientsQuery>,
) -> ApiResult<Json<Vec<ClientRow>>> {
    let company = query
        .company
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("company query parameter is required".to_string()))?;

    let clients = state.metadata.search_clients(company).await?;
    Ok(Json(clients))
}
