//! Section record endpoints.
//!
//! One record per patient and section. `PUT` upserts: `201 Created` for a new record, `200 OK`
//! for an update.

use crate::error::ApiError;
use crate::state::AppState;
use api_shared::{ErrorRes, ListRecordsRes, RecordPayloadReq, RecordRes};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use cartella_core::{PatientId, Section, UpsertOutcome};

#[utoipa::path(
    get,
    path = "/patients/{patient_id}/records",
    params(("patient_id" = String, Path, description = "Positive integer patient identifier")),
    responses(
        (status = 200, description = "All records of the patient", body = ListRecordsRes),
        (status = 400, description = "Invalid patient identifier", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List every section record of a patient, in catalogue order.
#[axum::debug_handler]
pub async fn list_records(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<Json<ListRecordsRes>, ApiError> {
    let patient_id = PatientId::parse(&patient_id)?;
    let records = state.records.list(patient_id)?;
    Ok(Json(ListRecordsRes {
        records: records.into_iter().map(RecordRes::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/patients/{patient_id}/records/{section}",
    params(
        ("patient_id" = String, Path, description = "Positive integer patient identifier"),
        ("section" = String, Path, description = "Section name, e.g. `vital_signs`")
    ),
    responses(
        (status = 200, description = "The section record", body = RecordRes),
        (status = 400, description = "Invalid patient identifier", body = ErrorRes),
        (status = 404, description = "Unknown section or no record", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Read a patient's record for one section.
///
/// # Errors
/// - `400 Bad Request` if `patient_id` is not a positive integer.
/// - `404 Not Found` if the section is unknown or the patient has no record for it.
#[axum::debug_handler]
pub async fn get_record(
    State(state): State<AppState>,
    Path((patient_id, section)): Path<(String, String)>,
) -> Result<Json<RecordRes>, ApiError> {
    let patient_id = PatientId::parse(&patient_id)?;
    let section = Section::parse(&section)?;
    let record = state.records.require(patient_id, section)?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    put,
    path = "/patients/{patient_id}/records/{section}",
    params(
        ("patient_id" = String, Path, description = "Positive integer patient identifier"),
        ("section" = String, Path, description = "Section name, e.g. `vital_signs`")
    ),
    request_body = RecordPayloadReq,
    responses(
        (status = 200, description = "Record updated", body = RecordRes),
        (status = 201, description = "Record created", body = RecordRes),
        (status = 400, description = "Invalid identifier or payload", body = ErrorRes),
        (status = 404, description = "Unknown section", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Create or update a patient's record for one section.
///
/// Any `patient_id` in the body is ignored in favour of the path value.
#[axum::debug_handler]
pub async fn put_record(
    State(state): State<AppState>,
    Path((patient_id, section)): Path<(String, String)>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordRes>), ApiError> {
    let patient_id = PatientId::parse(&patient_id)?;
    let section = Section::parse(&section)?;
    let Json(payload) = body?;

    let (record, outcome) = state.records.upsert(patient_id, section, &payload)?;
    let status = match outcome {
        UpsertOutcome::Created => StatusCode::CREATED,
        UpsertOutcome::Updated => StatusCode::OK,
    };
    Ok((status, Json(record.into())))
}
