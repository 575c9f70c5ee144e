//! Record sections and their field schemas.
//!
//! A patient's medical record is split into a fixed catalogue of sections. Each section holds at
//! most one record per patient, and each record's payload is checked against the section's field
//! schema (see [`crate::validation`]).

use crate::{RecordError, RecordResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The sections of a patient record, in catalogue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Anamnesis,
    VitalSigns,
    PhysicalExamination,
    Diagnosis,
    Therapy,
}

/// The value type a field accepts, with its constraints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text { max_len: usize },
    TextList { max_item_len: usize, min_items: usize },
    Integer { min: i64, max: i64 },
    Decimal { min: f64, max: f64 },
    Boolean,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// RFC 3339 timestamp.
    DateTime,
    Choice(&'static [&'static str]),
}

/// A single field in a section schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: true,
    }
}

const fn optional(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: false,
    }
}

const ANAMNESIS_FIELDS: &[FieldSpec] = &[
    optional("family_history", FieldKind::Text { max_len: 4000 }),
    optional("past_medical_history", FieldKind::Text { max_len: 4000 }),
    optional(
        "allergies",
        FieldKind::TextList {
            max_item_len: 200,
            min_items: 0,
        },
    ),
    optional("smoker", FieldKind::Boolean),
];

const VITAL_SIGNS_FIELDS: &[FieldSpec] = &[
    required("systolic_bp", FieldKind::Integer { min: 40, max: 300 }),
    required("diastolic_bp", FieldKind::Integer { min: 20, max: 200 }),
    required("heart_rate", FieldKind::Integer { min: 20, max: 250 }),
    optional(
        "temperature",
        FieldKind::Decimal {
            min: 30.0,
            max: 45.0,
        },
    ),
    optional("spo2", FieldKind::Integer { min: 0, max: 100 }),
    optional("measured_at", FieldKind::DateTime),
];

const PHYSICAL_EXAMINATION_FIELDS: &[FieldSpec] = &[
    required("general_appearance", FieldKind::Text { max_len: 2000 }),
    optional("findings", FieldKind::Text { max_len: 4000 }),
];

const DIAGNOSIS_FIELDS: &[FieldSpec] = &[
    required("primary_diagnosis", FieldKind::Text { max_len: 500 }),
    optional("icd10_code", FieldKind::Text { max_len: 10 }),
    optional(
        "status",
        FieldKind::Choice(&["provisional", "confirmed", "ruled_out"]),
    ),
    optional("diagnosed_on", FieldKind::Date),
];

const THERAPY_FIELDS: &[FieldSpec] = &[
    required(
        "medications",
        FieldKind::TextList {
            max_item_len: 200,
            min_items: 1,
        },
    ),
    optional("notes", FieldKind::Text { max_len: 4000 }),
    optional("start_date", FieldKind::Date),
];

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Anamnesis,
        Section::VitalSigns,
        Section::PhysicalExamination,
        Section::Diagnosis,
        Section::Therapy,
    ];

    /// Name used in URLs, JSON and file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Anamnesis => "anamnesis",
            Section::VitalSigns => "vital_signs",
            Section::PhysicalExamination => "physical_examination",
            Section::Diagnosis => "diagnosis",
            Section::Therapy => "therapy",
        }
    }

    /// Human readable name used in messages.
    pub fn title(self) -> &'static str {
        match self {
            Section::Anamnesis => "Anamnesis",
            Section::VitalSigns => "Vital signs",
            Section::PhysicalExamination => "Physical examination",
            Section::Diagnosis => "Diagnosis",
            Section::Therapy => "Therapy",
        }
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Section::Anamnesis => ANAMNESIS_FIELDS,
            Section::VitalSigns => VITAL_SIGNS_FIELDS,
            Section::PhysicalExamination => PHYSICAL_EXAMINATION_FIELDS,
            Section::Diagnosis => DIAGNOSIS_FIELDS,
            Section::Therapy => THERAPY_FIELDS,
        }
    }

    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// Parses a section name supplied by a client.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::UnknownSection` if the name is not in the catalogue.
    pub fn parse(input: &str) -> RecordResult<Self> {
        Section::ALL
            .into_iter()
            .find(|s| s.as_str() == input)
            .ok_or_else(|| RecordError::UnknownSection(input.to_string()))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_catalogue_names() {
        for section in Section::ALL {
            assert_eq!(Section::parse(section.as_str()).unwrap(), section);
        }
    }

    #[test]
    fn test_parse_rejects_unknown_and_differently_cased_names() {
        for input in ["", "labs", "VitalSigns", "Vital_Signs"] {
            let err = Section::parse(input).expect_err("should reject");
            assert!(matches!(err, RecordError::UnknownSection(ref s) if s == input));
        }
    }

    #[test]
    fn test_serde_uses_snake_case_names() {
        let json = serde_json::to_string(&Section::PhysicalExamination).unwrap();
        assert_eq!(json, "\"physical_examination\"");
        let section: Section = serde_json::from_str("\"vital_signs\"").unwrap();
        assert_eq!(section, Section::VitalSigns);
    }

    #[test]
    fn test_schemas_have_unique_field_names() {
        for section in Section::ALL {
            let fields = section.fields();
            for (i, a) in fields.iter().enumerate() {
                assert!(
                    fields[i + 1..].iter().all(|b| b.name != a.name),
                    "duplicate field {} in {}",
                    a.name,
                    section
                );
                assert_ne!(a.name, "operator_id", "operator_id is common to all sections");
            }
        }
    }

    #[test]
    fn test_field_lookup() {
        let spec = Section::VitalSigns.field("heart_rate").unwrap();
        assert!(spec.required);
        assert_eq!(spec.kind, FieldKind::Integer { min: 20, max: 250 });
        assert!(Section::VitalSigns.field("medications").is_none());
    }
}
