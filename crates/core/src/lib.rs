//! # Cartella Core
//!
//! Core business logic for the Cartella patient record service.
//!
//! This crate contains pure data operations and file management:
//! - Per-section patient records with schema validation and upsert semantics
//! - Reports that snapshot the latest record of every section
//! - Page-number pagination of report listings
//! - JSON document storage under `PATIENT_DATA_DIR`
//!
//! **No API concerns**: HTTP servers, status codes and wire formats belong in `api-rest` or
//! `api-shared`.

pub mod config;
pub mod constants;
pub mod error;
pub mod pagination;
pub mod repositories;
pub mod section;
pub mod store;
pub mod validation;

pub use cartella_types::{IdError, NonEmptyText, PatientId, ReportId, TextError};
pub use config::{CoreConfig, PageSizing};
pub use constants::DEFAULT_PATIENT_DATA_DIR;
pub use error::{RecordError, RecordResult};
pub use pagination::{paginate, Page, PageNumber, PageRequest};
pub use repositories::records::{RecordService, SectionRecord, UpsertOutcome};
pub use repositories::reports::{RecordRef, Report, ReportService, ResolvedReport};
pub use section::{FieldKind, FieldSpec, Section};
pub use validation::{FieldErrors, FieldUpdate, ValidatedPayload};
