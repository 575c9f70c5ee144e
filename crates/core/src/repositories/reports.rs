//! Patient reports.
//!
//! A report is a numbered snapshot that references the latest record of every section a patient
//! has at the moment the report is created. Report numbers are allocated per patient in
//! increasing order: the next number is one past the highest stored one.
//!
//! ## Storage Layout
//!
//! ```text
//! reports/
//!   <patient_id>/
//!     1.json
//!     2.json
//! ```
//!
//! Report files are created exclusively, so two concurrent creations for the same patient cannot
//! be given the same number: the loser moves on to the following number.

use crate::config::CoreConfig;
use crate::constants::REPORT_ID_ALLOCATION_ATTEMPTS;
use crate::error::{RecordError, RecordResult};
use crate::repositories::records::{RecordService, SectionRecord};
use crate::section::Section;
use crate::store::{document_path, DocumentStore};
use cartella_types::{PatientId, ReportId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Reference from a report to the section record it snapshotted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub record_id: String,
    /// Version of the record when the report was created.
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub patient_id: PatientId,
    pub report_id: ReportId,
    pub operator_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub references: BTreeMap<Section, RecordRef>,
}

impl Report {
    pub fn sections(&self) -> Vec<Section> {
        self.references.keys().copied().collect()
    }
}

/// A report with its references resolved to the current records.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReport {
    pub report: Report,
    pub records: BTreeMap<Section, SectionRecord>,
}

#[derive(Clone, Debug)]
pub struct ReportService {
    cfg: Arc<CoreConfig>,
    store: DocumentStore,
    records: RecordService,
}

impl ReportService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            records: RecordService::new(cfg.clone()),
            cfg,
            store: DocumentStore::new(),
        }
    }

    fn patient_dir(&self, patient_id: PatientId) -> PathBuf {
        self.cfg.reports_dir().join(patient_id.to_string())
    }

    fn report_path(&self, patient_id: PatientId, report_id: ReportId) -> PathBuf {
        document_path(&self.patient_dir(patient_id), report_id)
    }

    /// Stored report ids for the patient, ascending. Files whose name is not a report id are
    /// skipped.
    fn report_ids(&self, patient_id: PatientId) -> RecordResult<Vec<ReportId>> {
        let mut ids: Vec<ReportId> = self
            .store
            .list(&self.patient_dir(patient_id))?
            .iter()
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()))
            .filter_map(|stem| stem.parse().ok())
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// The id the next report for this patient will receive.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::ReportIdExhausted` if the highest stored id is `u64::MAX`.
    pub fn next_report_id(&self, patient_id: PatientId) -> RecordResult<ReportId> {
        match self.report_ids(patient_id)?.last() {
            None => Ok(ReportId::new(1)?),
            Some(last) => last
                .next()
                .ok_or(RecordError::ReportIdExhausted(patient_id)),
        }
    }

    /// Creates a report referencing the latest record of every section.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NoSectionRecords` if the patient has no section records, and
    /// `RecordError::ReportIdAllocation` if no free id was found after repeated collisions.
    pub fn create(&self, patient_id: PatientId, operator_id: Option<u64>) -> RecordResult<Report> {
        let latest = self.records.latest_records(patient_id)?;
        if latest.is_empty() {
            return Err(RecordError::NoSectionRecords);
        }

        let references: BTreeMap<Section, RecordRef> = latest
            .into_iter()
            .map(|(section, record)| {
                (
                    section,
                    RecordRef {
                        record_id: record.id,
                        version: record.version,
                    },
                )
            })
            .collect();

        let mut report_id = self.next_report_id(patient_id)?;
        for _attempt in 0..REPORT_ID_ALLOCATION_ATTEMPTS {
            let report = Report {
                patient_id,
                report_id,
                operator_id,
                created_at: Utc::now(),
                references: references.clone(),
            };

            if self
                .store
                .create_new(&self.report_path(patient_id, report_id), &report)?
            {
                tracing::info!("created report {} for patient {}", report_id, patient_id);
                return Ok(report);
            }

            tracing::debug!(
                "report id {} for patient {} already taken, retrying",
                report_id,
                patient_id
            );
            report_id = report_id
                .next()
                .ok_or(RecordError::ReportIdExhausted(patient_id))?;
        }

        Err(RecordError::ReportIdAllocation {
            patient_id,
            attempts: REPORT_ID_ALLOCATION_ATTEMPTS,
        })
    }

    pub fn get(&self, patient_id: PatientId, report_id: ReportId) -> RecordResult<Option<Report>> {
        self.store.read(&self.report_path(patient_id, report_id))
    }

    /// # Errors
    ///
    /// Returns `RecordError::ReportNotFound` if the report does not exist.
    pub fn require(&self, patient_id: PatientId, report_id: ReportId) -> RecordResult<Report> {
        self.get(patient_id, report_id)?
            .ok_or(RecordError::ReportNotFound {
                patient_id,
                report_id,
            })
    }

    /// All of the patient's reports, newest (highest id) first.
    ///
    /// Unreadable report documents are logged and skipped.
    pub fn list(&self, patient_id: PatientId) -> RecordResult<Vec<Report>> {
        let mut reports = Vec::new();
        for report_id in self.report_ids(patient_id)?.into_iter().rev() {
            match self.get(patient_id, report_id) {
                Ok(Some(report)) => reports.push(report),
                // Deleted between listing and reading.
                Ok(None) => {}
                Err(RecordError::Deserialization { path, source }) => {
                    tracing::warn!("failed to parse report: {} - {}", path.display(), source);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(reports)
    }

    /// # Errors
    ///
    /// Returns `RecordError::ReportNotFound` if the report does not exist.
    pub fn delete(&self, patient_id: PatientId, report_id: ReportId) -> RecordResult<()> {
        if self
            .store
            .remove(&self.report_path(patient_id, report_id))?
        {
            tracing::info!("deleted report {} for patient {}", report_id, patient_id);
            Ok(())
        } else {
            Err(RecordError::ReportNotFound {
                patient_id,
                report_id,
            })
        }
    }

    /// Looks up the records a report references.
    ///
    /// References that no longer point at the stored record are logged and left out.
    pub fn resolve(&self, report: Report) -> RecordResult<ResolvedReport> {
        let mut records = BTreeMap::new();
        for (section, reference) in &report.references {
            match self.records.get(report.patient_id, *section)? {
                Some(record) if record.id == reference.record_id => {
                    records.insert(*section, record);
                }
                _ => tracing::warn!(
                    "report {} for patient {} references missing {} record {}",
                    report.report_id,
                    report.patient_id,
                    section,
                    reference.record_id
                ),
            }
        }
        Ok(ResolvedReport { report, records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageSizing;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn test_cfg(patient_data_dir: &std::path::Path) -> Arc<CoreConfig> {
        Arc::new(CoreConfig::new(
            patient_data_dir.to_path_buf(),
            PageSizing::default(),
        ))
    }

    fn patient(id: u64) -> PatientId {
        PatientId::new(id).unwrap()
    }

    fn report(id: u64) -> ReportId {
        ReportId::new(id).unwrap()
    }

    fn seed_diagnosis(cfg: &Arc<CoreConfig>, patient_id: PatientId) -> SectionRecord {
        RecordService::new(cfg.clone())
            .upsert(
                patient_id,
                Section::Diagnosis,
                &json!({ "primary_diagnosis": "Hypertension" }),
            )
            .expect("seeding record should succeed")
            .0
    }

    #[test]
    fn test_create_without_records_is_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = ReportService::new(test_cfg(temp_dir.path()));

        let err = service.create(patient(1), None).unwrap_err();
        assert!(matches!(err, RecordError::NoSectionRecords));
        assert_eq!(err.to_string(), "No records found for this patient");
        assert!(service.list(patient(1)).unwrap().is_empty());
    }

    #[test]
    fn test_create_snapshots_latest_records() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(temp_dir.path());
        let record = seed_diagnosis(&cfg, patient(1));
        let service = ReportService::new(cfg);

        let created = service.create(patient(1), Some(9)).expect("create should succeed");
        assert_eq!(created.report_id, report(1));
        assert_eq!(created.operator_id, Some(9));
        assert_eq!(created.sections(), vec![Section::Diagnosis]);
        assert_eq!(
            created.references[&Section::Diagnosis],
            RecordRef {
                record_id: record.id,
                version: 1
            }
        );
        assert!(temp_dir.path().join("reports/1/1.json").is_file());
    }

    #[test]
    fn test_report_ids_increase_per_patient() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(temp_dir.path());
        seed_diagnosis(&cfg, patient(1));
        seed_diagnosis(&cfg, patient(2));
        let service = ReportService::new(cfg);

        let ids: Vec<u64> = (0..3)
            .map(|_| service.create(patient(1), None).unwrap().report_id.get())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(service.create(patient(2), None).unwrap().report_id, report(1));
        assert_eq!(service.next_report_id(patient(1)).unwrap(), report(4));
    }

    #[test]
    fn test_next_id_follows_highest_not_count() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(temp_dir.path());
        seed_diagnosis(&cfg, patient(1));
        let service = ReportService::new(cfg);

        for _ in 0..3 {
            service.create(patient(1), None).unwrap();
        }
        service.delete(patient(1), report(1)).unwrap();
        assert_eq!(service.create(patient(1), None).unwrap().report_id, report(4));

        service.delete(patient(1), report(4)).unwrap();
        assert_eq!(service.next_report_id(patient(1)).unwrap(), report(4));
    }

    #[test]
    fn test_list_is_newest_first() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(temp_dir.path());
        seed_diagnosis(&cfg, patient(1));
        let service = ReportService::new(cfg);

        for _ in 0..11 {
            service.create(patient(1), None).unwrap();
        }
        let ids: Vec<u64> = service
            .list(patient(1))
            .unwrap()
            .iter()
            .map(|r| r.report_id.get())
            .collect();
        assert_eq!(ids, (1..=11).rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_list_skips_corrupt_reports() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(temp_dir.path());
        seed_diagnosis(&cfg, patient(1));
        let service = ReportService::new(cfg);

        service.create(patient(1), None).unwrap();
        fs::write(temp_dir.path().join("reports/1/2.json"), "{ broken").unwrap();
        fs::write(temp_dir.path().join("reports/1/readme.json"), "{}").unwrap();

        let reports = service.list(patient(1)).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].report_id, report(1));
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(temp_dir.path());
        seed_diagnosis(&cfg, patient(1));
        let service = ReportService::new(cfg);

        service.create(patient(1), None).unwrap();
        service.delete(patient(1), report(1)).expect("delete should succeed");

        let err = service.require(patient(1), report(1)).unwrap_err();
        assert_eq!(err.to_string(), "Report 1 not found for patient 1");
        assert!(matches!(
            service.delete(patient(1), report(1)),
            Err(RecordError::ReportNotFound { .. })
        ));
    }

    #[test]
    fn test_create_never_overwrites_an_existing_report_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(temp_dir.path());
        seed_diagnosis(&cfg, patient(1));
        let service = ReportService::new(cfg);

        service.create(patient(1), None).unwrap();
        let stray = temp_dir.path().join("reports/1/2.json");
        fs::write(&stray, "{}").unwrap();
        assert_eq!(
            service.report_ids(patient(1)).unwrap(),
            vec![report(1), report(2)]
        );

        let created = service.create(patient(1), None).unwrap();
        assert_eq!(created.report_id, report(3));
        assert_eq!(fs::read_to_string(&stray).unwrap(), "{}");
    }

    #[test]
    fn test_resolve_returns_current_records_and_drops_dangling() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(temp_dir.path());
        seed_diagnosis(&cfg, patient(1));
        let records = RecordService::new(cfg.clone());
        records
            .upsert(patient(1), Section::Therapy, &json!({ "medications": ["ramipril"] }))
            .unwrap();
        let service = ReportService::new(cfg);

        let mut created = service.create(patient(1), None).unwrap();
        created
            .references
            .get_mut(&Section::Therapy)
            .unwrap()
            .record_id = "0".repeat(32);

        let resolved = service.resolve(created).unwrap();
        assert_eq!(resolved.records.len(), 1);
        assert_eq!(
            resolved.records[&Section::Diagnosis].fields["primary_diagnosis"],
            json!("Hypertension")
        );
    }
}
