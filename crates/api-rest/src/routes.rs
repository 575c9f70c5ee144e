//! Router assembly and OpenAPI document.

use crate::state::AppState;
use crate::{records, reports};
use api_shared::{HealthRes, HealthService};
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        records::list_records,
        records::get_record,
        records::put_record,
        reports::list_reports,
        reports::create_report,
        reports::get_report,
        reports::delete_report,
        reports::list_quick_reports,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ErrorRes,
        api_shared::RecordRes,
        api_shared::RecordPayloadReq,
        api_shared::ListRecordsRes,
        api_shared::CreateReportReq,
        api_shared::ReportRes,
        api_shared::QuickReportRes,
        api_shared::ReportPageRes,
        api_shared::QuickReportPageRes,
    ))
)]
pub struct ApiDoc;

/// Build the REST router over `state`.
///
/// Routes:
/// - `GET /health`
/// - `GET /patients/:patient_id/records`
/// - `GET|PUT /patients/:patient_id/records/:section`
/// - `GET|POST /patients/:patient_id/reports`
/// - `GET|DELETE /patients/:patient_id/reports/:report_id`
/// - `GET /patients/:patient_id/quick-reports`
/// - Swagger UI at `/swagger-ui`, OpenAPI JSON at `/api-docs/openapi.json`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients/:patient_id/records", get(records::list_records))
        .route(
            "/patients/:patient_id/records/:section",
            get(records::get_record).put(records::put_record),
        )
        .route(
            "/patients/:patient_id/reports",
            get(reports::list_reports).post(reports::create_report),
        )
        .route(
            "/patients/:patient_id/reports/:report_id",
            get(reports::get_report).delete(reports::delete_report),
        )
        .route(
            "/patients/:patient_id/quick-reports",
            get(reports::list_quick_reports),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}
