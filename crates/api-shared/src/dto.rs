//! Wire types for the Cartella APIs.
//!
//! Timestamps are rendered as RFC 3339 strings and identifiers as plain integers. Conversions from
//! core types live here so every surface serialises records and reports the same way.

use cartella_core::{Page, Report, ResolvedReport, SectionRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
    /// Per-field messages, present for validation failures only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecordRes {
    pub id: String,
    pub patient_id: u64,
    pub section: String,
    pub operator_id: Option<u64>,
    /// Section-specific values.
    #[schema(value_type = Object)]
    pub fields: serde_json::Map<String, serde_json::Value>,
    pub version: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SectionRecord> for RecordRes {
    fn from(record: SectionRecord) -> Self {
        Self {
            id: record.id,
            patient_id: record.patient_id.get(),
            section: record.section.to_string(),
            operator_id: record.operator_id,
            fields: record.fields,
            version: record.version,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

/// Request body for a record write.
///
/// Besides `operator_id`, the body carries the fields of the addressed section at the top level,
/// for example `{"systolic_bp": 120, "diastolic_bp": 80, "heart_rate": 70}` for `vital_signs`.
/// Unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RecordPayloadReq {
    pub operator_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListRecordsRes {
    pub records: Vec<RecordRes>,
}

/// Request body for report creation. The body itself is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateReportReq {
    pub operator_id: Option<u64>,
}

/// A report with the records it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReportRes {
    pub patient_id: u64,
    pub report_id: u64,
    pub operator_id: Option<u64>,
    pub created_at: String,
    /// Section name to the referenced record, as currently stored.
    pub sections: BTreeMap<String, RecordRes>,
    /// Section name to the record version the report was created from.
    pub snapshot_versions: BTreeMap<String, u64>,
}

impl From<ResolvedReport> for ReportRes {
    fn from(resolved: ResolvedReport) -> Self {
        let ResolvedReport { report, records } = resolved;
        let snapshot_versions = report
            .references
            .iter()
            .map(|(section, reference)| (section.to_string(), reference.version))
            .collect();
        Self {
            patient_id: report.patient_id.get(),
            report_id: report.report_id.get(),
            operator_id: report.operator_id,
            created_at: report.created_at.to_rfc3339(),
            sections: records
                .into_iter()
                .map(|(section, record)| (section.to_string(), RecordRes::from(record)))
                .collect(),
            snapshot_versions,
        }
    }
}

/// Report metadata without record contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuickReportRes {
    pub patient_id: u64,
    pub report_id: u64,
    pub operator_id: Option<u64>,
    pub created_at: String,
    pub sections: Vec<String>,
}

impl From<Report> for QuickReportRes {
    fn from(report: Report) -> Self {
        Self {
            patient_id: report.patient_id.get(),
            report_id: report.report_id.get(),
            operator_id: report.operator_id,
            created_at: report.created_at.to_rfc3339(),
            sections: report.sections().iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportPageRes {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<ReportRes>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuickReportPageRes {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<QuickReportRes>,
}

/// Builds the `next`/`previous` links of a page.
///
/// Links are relative to `path` and carry both `page` and `page_size`.
pub fn page_links<T>(page: &Page<T>, path: &str) -> (Option<String>, Option<String>) {
    let link = |n: u64| format!("{path}?page={n}&page_size={}", page.page_size);
    (
        page.next_number().map(link),
        page.previous_number().map(link),
    )
}

impl ReportPageRes {
    pub fn from_page(page: Page<ReportRes>, path: &str) -> Self {
        let (next, previous) = page_links(&page, path);
        Self {
            count: page.total,
            next,
            previous,
            results: page.items,
        }
    }
}

impl QuickReportPageRes {
    pub fn from_page(page: Page<QuickReportRes>, path: &str) -> Self {
        let (next, previous) = page_links(&page, path);
        Self {
            count: page.total,
            next,
            previous,
            results: page.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartella_core::{paginate, PageNumber, PageRequest, PatientId, RecordRef, ReportId, Section};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn sample_record() -> SectionRecord {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let mut fields = serde_json::Map::new();
        fields.insert("primary_diagnosis".into(), json!("Asthma"));
        SectionRecord {
            id: "a".repeat(32),
            patient_id: PatientId::new(12).unwrap(),
            section: Section::Diagnosis,
            operator_id: Some(3),
            fields,
            version: 2,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_record_res_renders_plain_values() {
        let res = RecordRes::from(sample_record());
        let value = serde_json::to_value(&res).unwrap();
        assert_eq!(value["patient_id"], json!(12));
        assert_eq!(value["section"], json!("diagnosis"));
        assert_eq!(value["fields"]["primary_diagnosis"], json!("Asthma"));
        assert_eq!(value["created_at"], json!("2024-05-01T08:30:00+00:00"));
    }

    #[test]
    fn test_quick_report_lists_section_names() {
        let record = sample_record();
        let mut references = BTreeMap::new();
        references.insert(
            Section::Diagnosis,
            RecordRef {
                record_id: record.id,
                version: record.version,
            },
        );
        let report = Report {
            patient_id: PatientId::new(12).unwrap(),
            report_id: ReportId::new(4).unwrap(),
            operator_id: None,
            created_at: record.created_at,
            references,
        };

        let quick = QuickReportRes::from(report);
        assert_eq!(quick.report_id, 4);
        assert_eq!(quick.sections, vec!["diagnosis".to_string()]);
    }

    #[test]
    fn test_report_res_carries_snapshot_versions() {
        let mut record = sample_record();
        let mut references = BTreeMap::new();
        references.insert(
            Section::Diagnosis,
            RecordRef {
                record_id: record.id.clone(),
                version: record.version,
            },
        );
        let report = Report {
            patient_id: PatientId::new(12).unwrap(),
            report_id: ReportId::new(1).unwrap(),
            operator_id: Some(3),
            created_at: record.created_at,
            references,
        };
        record.version = 5;
        let mut records = BTreeMap::new();
        records.insert(Section::Diagnosis, record);

        let res = ReportRes::from(ResolvedReport { report, records });
        assert_eq!(res.snapshot_versions["diagnosis"], 2);
        assert_eq!(res.sections["diagnosis"].version, 5);
    }

    #[test]
    fn test_error_res_omits_fields_when_absent() {
        let value = serde_json::to_value(ErrorRes::new("Invalid page.")).unwrap();
        assert_eq!(value, json!({ "error": "Invalid page." }));
    }

    #[test]
    fn test_page_links() {
        let request = PageRequest {
            page: PageNumber::Number(2),
            page_size: 2,
        };
        let page = paginate(vec![1, 2, 3, 4, 5], &request).unwrap();
        let (next, previous) = page_links(&page, "/patients/1/reports");
        assert_eq!(next.as_deref(), Some("/patients/1/reports?page=3&page_size=2"));
        assert_eq!(
            previous.as_deref(),
            Some("/patients/1/reports?page=1&page_size=2")
        );
    }
}
