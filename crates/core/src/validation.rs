//! Payload validation for section records.
//!
//! Incoming request bodies are free-form JSON. This module checks them against a section's field
//! schema and produces normalised values ready to be stored, or a per-field list of error
//! messages.
//!
//! Rules:
//! - the body must be a JSON object;
//! - required fields must be present and non-null on every write (create and update alike);
//! - optional fields may be omitted (left unchanged) or `null` (cleared);
//! - fields the schema does not know are ignored, including any `patient_id` in the body;
//! - text is trimmed before length checks; blank text is rejected.

use crate::section::{FieldKind, FieldSpec, Section};
use crate::{RecordError, RecordResult};
use cartella_types::NonEmptyText;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const OPERATOR_FIELD: &str = "operator_id";

/// Field name to error messages, serialised as a JSON object of string arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

/// How a write affects a single optional value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldUpdate<T> {
    /// Not present in the payload.
    #[default]
    Keep,
    /// Present as `null`.
    Clear,
    Set(T),
}

impl<T: Copy> FieldUpdate<T> {
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            FieldUpdate::Keep => current,
            FieldUpdate::Clear => None,
            FieldUpdate::Set(v) => Some(v),
        }
    }
}

/// A payload that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPayload {
    pub operator_id: FieldUpdate<u64>,
    /// Normalised values of the schema fields present in the payload. `Value::Null` means clear.
    pub fields: Map<String, Value>,
}

impl ValidatedPayload {
    /// Merges this payload over `current`. Cleared fields are removed.
    pub fn merge_into(&self, current: &mut Map<String, Value>) {
        for (name, value) in &self.fields {
            if value.is_null() {
                current.remove(name);
            } else {
                current.insert(name.clone(), value.clone());
            }
        }
    }
}

/// Validates a record payload against the schema of `section`.
///
/// # Errors
///
/// Returns `RecordError::Validation` carrying every field error found, or
/// `RecordError::BodyNotObject` if the payload is not a JSON object.
pub fn validate_payload(section: Section, payload: &Value) -> RecordResult<ValidatedPayload> {
    let object = payload.as_object().ok_or(RecordError::BodyNotObject)?;

    let mut errors = FieldErrors::new();
    let mut fields = Map::new();

    let operator_id = match object.get(OPERATOR_FIELD) {
        None => FieldUpdate::Keep,
        Some(Value::Null) => FieldUpdate::Clear,
        Some(value) => match validate_operator_id(value) {
            Ok(id) => FieldUpdate::Set(id),
            Err(message) => {
                errors.add(OPERATOR_FIELD, message);
                FieldUpdate::Keep
            }
        },
    };

    for spec in section.fields() {
        match object.get(spec.name) {
            None if spec.required => errors.add(spec.name, REQUIRED),
            None => {}
            Some(Value::Null) if spec.required => errors.add(spec.name, NOT_NULL),
            Some(Value::Null) => {
                fields.insert(spec.name.to_string(), Value::Null);
            }
            Some(value) => match validate_field(spec, value) {
                Ok(normalised) => {
                    fields.insert(spec.name.to_string(), normalised);
                }
                Err(messages) => {
                    for message in messages {
                        errors.add(spec.name, message);
                    }
                }
            },
        }
    }

    let ignored: Vec<&str> = object
        .keys()
        .map(String::as_str)
        .filter(|k| *k != OPERATOR_FIELD && section.field(k).is_none())
        .collect();
    if !ignored.is_empty() {
        tracing::debug!(section = %section, ?ignored, "ignoring unknown payload fields");
    }

    if !errors.is_empty() {
        return Err(RecordError::Validation(errors));
    }

    Ok(ValidatedPayload {
        operator_id,
        fields,
    })
}

/// Validates an operator identifier supplied in a request body.
///
/// Returns the error message to report against the field on failure.
pub fn validate_operator_id(value: &Value) -> Result<u64, String> {
    let n = as_integer(value).ok_or_else(|| "A valid integer is required.".to_string())?;
    if n < 1 {
        return Err("Ensure this value is greater than or equal to 1.".into());
    }
    Ok(n as u64)
}

fn validate_field(spec: &FieldSpec, value: &Value) -> Result<Value, Vec<String>> {
    match spec.kind {
        FieldKind::Text { max_len } => validate_text(value, max_len).map_err(|m| vec![m]),
        FieldKind::TextList {
            max_item_len,
            min_items,
        } => validate_text_list(value, max_item_len, min_items),
        FieldKind::Integer { min, max } => {
            let n = as_integer(value).ok_or_else(|| vec!["A valid integer is required.".into()])?;
            check_range(n as f64, min as f64, max as f64)?;
            Ok(Value::from(n))
        }
        FieldKind::Decimal { min, max } => {
            let n = as_decimal(value).ok_or_else(|| vec!["A valid number is required.".into()])?;
            check_range(n, min, max)?;
            Number::from_f64(n)
                .map(Value::Number)
                .ok_or_else(|| vec!["A valid number is required.".into()])
        }
        FieldKind::Boolean => as_boolean(value)
            .map(Value::Bool)
            .ok_or_else(|| vec!["Must be a valid boolean.".into()]),
        FieldKind::Date => value
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .ok_or_else(|| {
                vec!["Date has wrong format. Use one of these formats instead: YYYY-MM-DD.".into()]
            }),
        FieldKind::DateTime => value
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|dt| {
                Value::String(
                    dt.with_timezone(&Utc)
                        .to_rfc3339_opts(SecondsFormat::AutoSi, true),
                )
            })
            .ok_or_else(|| {
                vec![
                    "Datetime has wrong format. Use one of these formats instead: \
                     YYYY-MM-DDThh:mm:ss[.uuuuuu](+HH:MM|-HH:MM|Z)."
                        .into(),
                ]
            }),
        FieldKind::Choice(choices) => {
            let s = value
                .as_str()
                .ok_or_else(|| vec![format!("\"{value}\" is not a valid choice.")])?;
            if choices.contains(&s) {
                Ok(Value::String(s.to_string()))
            } else {
                Err(vec![format!("\"{s}\" is not a valid choice.")])
            }
        }
    }
}

fn validate_text(value: &Value, max_len: usize) -> Result<Value, String> {
    let raw = value.as_str().ok_or_else(|| "Not a valid string.".to_string())?;
    let text = NonEmptyText::new(raw).map_err(|_| "This field may not be blank.".to_string())?;
    if text.as_str().chars().count() > max_len {
        return Err(format!(
            "Ensure this field has no more than {max_len} characters."
        ));
    }
    Ok(Value::String(text.into_inner()))
}

fn validate_text_list(
    value: &Value,
    max_item_len: usize,
    min_items: usize,
) -> Result<Value, Vec<String>> {
    let items = value.as_array().ok_or_else(|| {
        vec![format!(
            "Expected a list of items but got type \"{}\".",
            json_type_name(value)
        )]
    })?;

    if items.len() < min_items {
        return Err(vec!["This list may not be empty.".into()]);
    }

    let mut out = Vec::with_capacity(items.len());
    let mut messages = Vec::new();
    for (i, item) in items.iter().enumerate() {
        match validate_text(item, max_item_len) {
            Ok(v) => out.push(v),
            Err(m) => messages.push(format!("Item {i}: {m}")),
        }
    }

    if messages.is_empty() {
        Ok(Value::Array(out))
    } else {
        Err(messages)
    }
}

fn check_range(n: f64, min: f64, max: f64) -> Result<(), Vec<String>> {
    if n < min {
        return Err(vec![format!(
            "Ensure this value is greater than or equal to {min}."
        )]);
    }
    if n > max {
        return Err(vec![format!(
            "Ensure this value is less than or equal to {max}."
        )]);
    }
    Ok(())
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn as_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" | "True" | "1" => Some(true),
            "false" | "False" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_errors(result: RecordResult<ValidatedPayload>) -> FieldErrors {
        match result {
            Err(RecordError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_non_object_payloads() {
        for payload in [json!([1, 2]), json!("text"), json!(null)] {
            let err = validate_payload(Section::Anamnesis, &payload).unwrap_err();
            assert!(matches!(err, RecordError::BodyNotObject), "{payload}");
            assert_eq!(err.to_string(), "Request body must be a JSON object");
        }
    }

    #[test]
    fn test_reports_missing_required_fields() {
        let errors = field_errors(validate_payload(
            Section::VitalSigns,
            &json!({ "systolic_bp": 120 }),
        ));
        assert_eq!(errors.get("diastolic_bp").unwrap(), [REQUIRED]);
        assert_eq!(errors.get("heart_rate").unwrap(), [REQUIRED]);
        assert!(errors.get("systolic_bp").is_none());
    }

    #[test]
    fn test_required_field_may_not_be_null() {
        let errors = field_errors(validate_payload(
            Section::PhysicalExamination,
            &json!({ "general_appearance": null }),
        ));
        assert_eq!(errors.get("general_appearance").unwrap(), [NOT_NULL]);
    }

    #[test]
    fn test_normalises_valid_vital_signs() {
        let payload = validate_payload(
            Section::VitalSigns,
            &json!({
                "systolic_bp": "120",
                "diastolic_bp": 80,
                "heart_rate": 72.0,
                "temperature": 36.6,
                "measured_at": "2024-03-01T10:15:00+01:00",
                "patient_id": 999,
                "unexpected": true
            }),
        )
        .expect("payload should validate");

        assert_eq!(payload.fields["systolic_bp"], json!(120));
        assert_eq!(payload.fields["heart_rate"], json!(72));
        assert_eq!(payload.fields["temperature"], json!(36.6));
        assert_eq!(payload.fields["measured_at"], json!("2024-03-01T09:15:00Z"));
        assert!(!payload.fields.contains_key("patient_id"));
        assert!(!payload.fields.contains_key("unexpected"));
        assert_eq!(payload.operator_id, FieldUpdate::Keep);
    }

    #[test]
    fn test_range_checks() {
        let errors = field_errors(validate_payload(
            Section::VitalSigns,
            &json!({ "systolic_bp": 10, "diastolic_bp": 500, "heart_rate": "fast" }),
        ));
        assert_eq!(
            errors.get("systolic_bp").unwrap(),
            ["Ensure this value is greater than or equal to 40."]
        );
        assert_eq!(
            errors.get("diastolic_bp").unwrap(),
            ["Ensure this value is less than or equal to 200."]
        );
        assert_eq!(
            errors.get("heart_rate").unwrap(),
            ["A valid integer is required."]
        );
    }

    #[test]
    fn test_text_is_trimmed_and_blank_rejected() {
        let payload = validate_payload(
            Section::Diagnosis,
            &json!({ "primary_diagnosis": "  Asthma  ", "status": "confirmed" }),
        )
        .unwrap();
        assert_eq!(payload.fields["primary_diagnosis"], json!("Asthma"));

        let errors = field_errors(validate_payload(
            Section::Diagnosis,
            &json!({ "primary_diagnosis": "   ", "icd10_code": "J45.909-EXTRA", "status": "maybe" }),
        ));
        assert_eq!(
            errors.get("primary_diagnosis").unwrap(),
            ["This field may not be blank."]
        );
        assert_eq!(
            errors.get("icd10_code").unwrap(),
            ["Ensure this field has no more than 10 characters."]
        );
        assert_eq!(
            errors.get("status").unwrap(),
            ["\"maybe\" is not a valid choice."]
        );
    }

    #[test]
    fn test_dates_must_be_iso_formatted() {
        let errors = field_errors(validate_payload(
            Section::Diagnosis,
            &json!({ "primary_diagnosis": "Flu", "diagnosed_on": "01/02/2024" }),
        ));
        assert!(errors.get("diagnosed_on").is_some());

        let payload = validate_payload(
            Section::Diagnosis,
            &json!({ "primary_diagnosis": "Flu", "diagnosed_on": "2024-02-01" }),
        )
        .unwrap();
        assert_eq!(payload.fields["diagnosed_on"], json!("2024-02-01"));
    }

    #[test]
    fn test_text_lists() {
        let errors = field_errors(validate_payload(
            Section::Therapy,
            &json!({ "medications": [] }),
        ));
        assert_eq!(
            errors.get("medications").unwrap(),
            ["This list may not be empty."]
        );

        let errors = field_errors(validate_payload(
            Section::Therapy,
            &json!({ "medications": "aspirin" }),
        ));
        assert_eq!(
            errors.get("medications").unwrap(),
            ["Expected a list of items but got type \"str\"."]
        );

        let errors = field_errors(validate_payload(
            Section::Therapy,
            &json!({ "medications": ["aspirin", ""] }),
        ));
        assert_eq!(
            errors.get("medications").unwrap(),
            ["Item 1: This field may not be blank."]
        );

        // Allergies may be an empty list.
        assert!(validate_payload(Section::Anamnesis, &json!({ "allergies": [] })).is_ok());
    }

    #[test]
    fn test_operator_id_updates() {
        let set = validate_payload(Section::Anamnesis, &json!({ "operator_id": 7 })).unwrap();
        assert_eq!(set.operator_id, FieldUpdate::Set(7));
        assert_eq!(set.operator_id.apply(Some(3)), Some(7));

        let clear = validate_payload(Section::Anamnesis, &json!({ "operator_id": null })).unwrap();
        assert_eq!(clear.operator_id.apply(Some(3)), None);

        let errors = field_errors(validate_payload(
            Section::Anamnesis,
            &json!({ "operator_id": 0 }),
        ));
        assert_eq!(
            errors.get("operator_id").unwrap(),
            ["Ensure this value is greater than or equal to 1."]
        );
    }

    #[test]
    fn test_merge_into_overwrites_and_clears() {
        let mut current = Map::new();
        current.insert("family_history".into(), json!("Diabetes"));
        current.insert("smoker".into(), json!(true));

        let payload = validate_payload(
            Section::Anamnesis,
            &json!({ "smoker": null, "allergies": ["penicillin"] }),
        )
        .unwrap();
        payload.merge_into(&mut current);

        assert_eq!(current["family_history"], json!("Diabetes"));
        assert!(!current.contains_key("smoker"));
        assert_eq!(current["allergies"], json!(["penicillin"]));
    }
}
