use crate::section::Section;
use crate::validation::FieldErrors;
use cartella_types::{IdError, PatientId, ReportId};

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("Request body must be a JSON object")]
    BodyNotObject,
    #[error(transparent)]
    InvalidId(#[from] IdError),
    #[error("Unknown section: {0}")]
    UnknownSection(String),
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("{} not found for patient {patient_id}", .section.title())]
    RecordNotFound {
        section: Section,
        patient_id: PatientId,
    },
    #[error("Report {report_id} not found for patient {patient_id}")]
    ReportNotFound {
        patient_id: PatientId,
        report_id: ReportId,
    },
    #[error("No records found for this patient")]
    NoSectionRecords,
    #[error("Invalid page.")]
    InvalidPage,

    #[error("failed to allocate a report id for patient {patient_id} after {attempts} attempts")]
    ReportIdAllocation {
        patient_id: PatientId,
        attempts: usize,
    },
    #[error("report id space exhausted for patient {0}")]
    ReportIdExhausted(PatientId),

    #[error("Patient data directory does not exist: {}", .0.display())]
    MissingDataDir(std::path::PathBuf),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read document: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write document: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to remove document: {0}")]
    FileRemove(std::io::Error),
    #[error("failed to serialize document: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize document {path}: {source}", path = .path.display())]
    Deserialization {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl RecordError {
    /// True for errors caused by the caller's input rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RecordError::InvalidInput(_)
                | RecordError::BodyNotObject
                | RecordError::InvalidId(_)
                | RecordError::Validation(_)
                | RecordError::NoSectionRecords
        )
    }

    /// True for errors meaning the addressed resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RecordError::UnknownSection(_)
                | RecordError::RecordNotFound { .. }
                | RecordError::ReportNotFound { .. }
                | RecordError::InvalidPage
        )
    }
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;
