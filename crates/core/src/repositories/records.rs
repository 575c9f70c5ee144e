//! Section record management.
//!
//! Each patient has at most one record per [`Section`]. Writes are upserts: a PUT creates the
//! record when it does not exist yet and otherwise updates it in place, bumping its version.
//!
//! ## Storage Layout
//!
//! ```text
//! records/
//!   <patient_id>/
//!     anamnesis.json
//!     vital_signs.json
//!     ...
//! ```

use crate::config::CoreConfig;
use crate::error::{RecordError, RecordResult};
use crate::section::Section;
use crate::store::{document_path, DocumentStore};
use crate::validation::{validate_payload, ValidatedPayload};
use cartella_types::PatientId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// A patient's record for one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRecord {
    /// Stable identifier, 32 lowercase hex characters.
    pub id: String,
    pub patient_id: PatientId,
    pub section: Section,
    pub operator_id: Option<u64>,
    pub fields: Map<String, Value>,
    /// Starts at 1 and increases by one on every update.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whether an upsert created a new record or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

#[derive(Clone, Debug)]
pub struct RecordService {
    cfg: Arc<CoreConfig>,
    store: DocumentStore,
}

impl RecordService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            store: DocumentStore::new(),
        }
    }

    fn patient_dir(&self, patient_id: PatientId) -> PathBuf {
        self.cfg.records_dir().join(patient_id.to_string())
    }

    fn record_path(&self, patient_id: PatientId, section: Section) -> PathBuf {
        document_path(&self.patient_dir(patient_id), section)
    }

    /// Returns the patient's record for `section`, if there is one.
    ///
    /// A stored document whose patient or section does not match its location is ignored with a
    /// warning.
    pub fn get(&self, patient_id: PatientId, section: Section) -> RecordResult<Option<SectionRecord>> {
        let path = self.record_path(patient_id, section);
        let record: Option<SectionRecord> = self.store.read(&path)?;

        Ok(record.filter(|r| {
            let matches = r.patient_id == patient_id && r.section == section;
            if !matches {
                tracing::warn!(
                    "ignoring misplaced record document: {} (patient {}, section {})",
                    path.display(),
                    r.patient_id,
                    r.section
                );
            }
            matches
        }))
    }

    /// Like [`RecordService::get`], but a missing record is an error.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::RecordNotFound` if the patient has no record for `section`.
    pub fn require(&self, patient_id: PatientId, section: Section) -> RecordResult<SectionRecord> {
        self.get(patient_id, section)?
            .ok_or(RecordError::RecordNotFound {
                section,
                patient_id,
            })
    }

    /// Validates `payload` and creates or updates the patient's record for `section`.
    ///
    /// On update, validated fields overwrite stored ones, fields sent as `null` are cleared and
    /// omitted optional fields are kept. A new record is created exclusively: if another writer
    /// creates it first, this write is applied to that record as an update.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Validation` or `RecordError::BodyNotObject` for a bad payload, and
    /// storage errors if the record cannot be read or written.
    pub fn upsert(
        &self,
        patient_id: PatientId,
        section: Section,
        payload: &Value,
    ) -> RecordResult<(SectionRecord, UpsertOutcome)> {
        let validated = validate_payload(section, payload)?;
        let path = self.record_path(patient_id, section);

        let current = match self.get(patient_id, section)? {
            Some(record) => Some(record),
            None => {
                let record = new_record(patient_id, section, &validated);
                if self.store.create_new(&path, &record)? {
                    tracing::info!("created {} record for patient {}", section, patient_id);
                    return Ok((record, UpsertOutcome::Created));
                }
                tracing::debug!(
                    "{} record for patient {} already exists, updating it",
                    section,
                    patient_id
                );
                self.get(patient_id, section)?
            }
        };

        // The path is held by a document for another patient or section.
        let Some(mut existing) = current else {
            let record = new_record(patient_id, section, &validated);
            self.store.write(&path, &record)?;
            tracing::info!("created {} record for patient {}", section, patient_id);
            return Ok((record, UpsertOutcome::Created));
        };

        validated.merge_into(&mut existing.fields);
        existing.operator_id = validated.operator_id.apply(existing.operator_id);
        existing.version += 1;
        existing.updated_at = Utc::now();
        self.store.write(&path, &existing)?;

        Ok((existing, UpsertOutcome::Updated))
    }

    /// All of the patient's records, in catalogue order.
    pub fn list(&self, patient_id: PatientId) -> RecordResult<Vec<SectionRecord>> {
        let mut records = Vec::new();
        for section in Section::ALL {
            if let Some(record) = self.get(patient_id, section)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// The latest record of every section that has one.
    pub fn latest_records(
        &self,
        patient_id: PatientId,
    ) -> RecordResult<BTreeMap<Section, SectionRecord>> {
        Ok(self
            .list(patient_id)?
            .into_iter()
            .map(|r| (r.section, r))
            .collect())
    }
}

fn new_record(patient_id: PatientId, section: Section, validated: &ValidatedPayload) -> SectionRecord {
    let now = Utc::now();
    let mut fields = Map::new();
    validated.merge_into(&mut fields);
    SectionRecord {
        id: uuid::Uuid::new_v4().simple().to_string(),
        patient_id,
        section,
        operator_id: validated.operator_id.apply(None),
        fields,
        version: 1,
        created_at: now,
        updated_at: now,
    }
}
