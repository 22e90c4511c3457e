//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/v1/health", get(handlers::health_check))
        // Reference catalogs
        .route("/v1/methods", get(handlers::list_methods))
        .route(
            "/v1/compounds/{name}/methods",
            get(handlers::get_compound_methods),
        )
        .route("/v1/chemists", get(handlers::list_chemists))
        .route("/v1/clients", get(handlers::search_clients))
        // Intake
        .route("/v1/intakes", post(handlers::submit_intake))
        .route("/v1/projects", post(handlers::create_project))
        // Report views
        .route(
            "/v1/projects/unreported",
            get(handlers::list_unreported_projects),
        )
        .route("/v1/projects/{id}", get(handlers::get_project_detail))
        // Lifecycle field groups
        .route(
            "/v1/projects/{id}/project-number",
            put(handlers::set_project_number),
        )
        .route("/v1/projects/{id}/received", put(handlers::set_received))
        .route("/v1/projects/{id}/chemist", put(handlers::set_chemist))
        .route("/v1/projects/{id}/reviewer", put(handlers::set_reviewer))
        .route(
            "/v1/projects/{id}/analysis-dates",
            put(handlers::set_analysis_dates),
        )
        .route("/v1/projects/{id}/report", put(handlers::issue_report))
        .route("/v1/projects/{id}/due-date", put(handlers::set_due_date));

    let mut router = Router::new().merge(api_routes);

    // The metrics endpoint is unauthenticated; restrict it at the network level.
    if state.config.server.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
