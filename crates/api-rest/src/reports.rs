//! Report endpoints.
//!
//! Reports are created from the patient's current section records, listed newest first with
//! page-number pagination, read one at a time, and deleted. There is no update.

use crate::error::ApiError;
use crate::state::AppState;
use api_shared::{
    CreateReportReq, ErrorRes, QuickReportPageRes, QuickReportRes, ReportPageRes, ReportRes,
};
use axum::body::Bytes;
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use cartella_core::validation::validate_operator_id;
use cartella_core::{
    paginate, FieldErrors, PageRequest, PatientId, RecordError, ReportId, ResolvedReport,
};
use serde::Deserialize;
use utoipa::IntoParams;

/// Pagination query parameters.
///
/// Kept as raw strings: a malformed `page_size` falls back to the default instead of failing the
/// request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number, or `last`.
    pub page: Option<String>,
    /// Items per page, clamped to the configured maximum.
    pub page_size: Option<String>,
}

impl PageQuery {
    fn to_request(&self, state: &AppState) -> Result<PageRequest, ApiError> {
        Ok(PageRequest::from_query(
            self.page.as_deref(),
            self.page_size.as_deref(),
            state.cfg.page_sizing(),
        )?)
    }
}

/// Reads the optional operator identifier from a report creation body.
///
/// An empty body or `null` means no operator.
fn parse_operator(body: &Bytes) -> Result<Option<u64>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Failed to parse the request body as JSON: {e}")))?;

    let operator = match &value {
        serde_json::Value::Null => return Ok(None),
        serde_json::Value::Object(map) => map.get("operator_id"),
        _ => return Err(RecordError::BodyNotObject.into()),
    };

    match operator {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => validate_operator_id(v).map(Some).map_err(|message| {
            let mut errors = FieldErrors::new();
            errors.add("operator_id", message);
            ApiError::Validation(errors)
        }),
    }
}

#[utoipa::path(
    get,
    path = "/patients/{patient_id}/reports",
    params(
        ("patient_id" = String, Path, description = "Positive integer patient identifier"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Page of reports, newest first", body = ReportPageRes),
        (status = 400, description = "Invalid patient identifier", body = ErrorRes),
        (status = 404, description = "Invalid page", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List a patient's reports with their referenced records.
#[axum::debug_handler]
pub async fn list_reports(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
    Query(query): Query<PageQuery>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<ReportPageRes>, ApiError> {
    let patient_id = PatientId::parse(&patient_id)?;
    let request = query.to_request(&state)?;

    let page = paginate(state.reports.list(patient_id)?, &request)?;
    let page = page.try_map(|report| {
        state
            .reports
            .resolve(report)
            .map(ReportRes::from)
    })?;

    Ok(Json(ReportPageRes::from_page(page, uri.path())))
}

#[utoipa::path(
    post,
    path = "/patients/{patient_id}/reports",
    params(("patient_id" = String, Path, description = "Positive integer patient identifier")),
    request_body = CreateReportReq,
    responses(
        (status = 201, description = "Report created", body = ReportRes),
        (status = 400, description = "Invalid input or no records for the patient", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Create a report from the latest record of every section.
///
/// # Errors
/// - `400 Bad Request` if the patient has no section records, or the body is malformed.
#[axum::debug_handler]
pub async fn create_report(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<ReportRes>), ApiError> {
    let patient_id = PatientId::parse(&patient_id)?;
    let operator_id = parse_operator(&body)?;

    let report = state.reports.create(patient_id, operator_id)?;
    let resolved = state.reports.resolve(report)?;
    Ok((StatusCode::CREATED, Json(resolved.into())))
}

#[utoipa::path(
    get,
    path = "/patients/{patient_id}/reports/{report_id}",
    params(
        ("patient_id" = String, Path, description = "Positive integer patient identifier"),
        ("report_id" = String, Path, description = "Positive integer report identifier")
    ),
    responses(
        (status = 200, description = "The report", body = ReportRes),
        (status = 400, description = "Invalid identifier", body = ErrorRes),
        (status = 404, description = "Report not found", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn get_report(
    State(state): State<AppState>,
    Path((patient_id, report_id)): Path<(String, String)>,
) -> Result<Json<ReportRes>, ApiError> {
    let patient_id = PatientId::parse(&patient_id)?;
    let report_id = ReportId::parse(&report_id)?;

    let report = state.reports.require(patient_id, report_id)?;
    let resolved: ResolvedReport = state.reports.resolve(report)?;
    Ok(Json(resolved.into()))
}

#[utoipa::path(
    delete,
    path = "/patients/{patient_id}/reports/{report_id}",
    params(
        ("patient_id" = String, Path, description = "Positive integer patient identifier"),
        ("report_id" = String, Path, description = "Positive integer report identifier")
    ),
    responses(
        (status = 204, description = "Report deleted"),
        (status = 400, description = "Invalid identifier", body = ErrorRes),
        (status = 404, description = "Report not found", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_report(
    State(state): State<AppState>,
    Path((patient_id, report_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let patient_id = PatientId::parse(&patient_id)?;
    let report_id = ReportId::parse(&report_id)?;

    state.reports.delete(patient_id, report_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/patients/{patient_id}/quick-reports",
    params(
        ("patient_id" = String, Path, description = "Positive integer patient identifier"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Page of report metadata, newest first", body = QuickReportPageRes),
        (status = 400, description = "Invalid patient identifier", body = ErrorRes),
        (status = 404, description = "Invalid page", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List report metadata for a patient without loading the referenced records.
#[axum::debug_handler]
pub async fn list_quick_reports(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
    Query(query): Query<PageQuery>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<QuickReportPageRes>, ApiError> {
    let patient_id = PatientId::parse(&patient_id)?;
    let request = query.to_request(&state)?;

    let page = paginate(state.reports.list(patient_id)?, &request)?;
    let page = page.try_map(|report| Ok::<_, RecordError>(QuickReportRes::from(report)))?;

    Ok(Json(QuickReportPageRes::from_page(page, uri.path())))
}
