//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. Request
//! handling never reads process-wide environment variables.

use crate::constants::{
    DEFAULT_PAGE_SIZE, DEFAULT_PATIENT_DATA_DIR, MAX_PAGE_SIZE, RECORDS_DIR_NAME, REPORTS_DIR_NAME,
};
use crate::{RecordError, RecordResult};
use std::path::{Path, PathBuf};

/// Default and maximum page sizes for paginated listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageSizing {
    default: usize,
    max: usize,
}

impl PageSizing {
    /// Create page sizing limits.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::InvalidInput` if either value is zero or the default exceeds the
    /// maximum.
    pub fn new(default: usize, max: usize) -> RecordResult<Self> {
        if default == 0 || max == 0 {
            return Err(RecordError::InvalidInput(
                "page sizes must be greater than zero".into(),
            ));
        }
        if default > max {
            return Err(RecordError::InvalidInput(format!(
                "default page size {default} exceeds maximum page size {max}"
            )));
        }
        Ok(Self { default, max })
    }

    pub fn default_size(&self) -> usize {
        self.default
    }

    pub fn max_size(&self) -> usize {
        self.max
    }
}

impl Default for PageSizing {
    fn default() -> Self {
        Self {
            default: DEFAULT_PAGE_SIZE,
            max: MAX_PAGE_SIZE,
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    patient_data_dir: PathBuf,
    page_sizing: PageSizing,
}

impl CoreConfig {
    pub fn new(patient_data_dir: PathBuf, page_sizing: PageSizing) -> Self {
        Self {
            patient_data_dir,
            page_sizing,
        }
    }

    pub fn patient_data_dir(&self) -> &Path {
        &self.patient_data_dir
    }

    pub fn records_dir(&self) -> PathBuf {
        self.patient_data_dir.join(RECORDS_DIR_NAME)
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.patient_data_dir.join(REPORTS_DIR_NAME)
    }

    pub fn page_sizing(&self) -> PageSizing {
        self.page_sizing
    }
}

/// Parse a page size from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns `fallback`.
///
/// # Errors
///
/// Returns `RecordError::InvalidInput` if the value is present but not a positive integer.
pub fn page_size_from_env_value(value: Option<String>, fallback: usize) -> RecordResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(fallback),
        Some(v) => match v.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(RecordError::InvalidInput(format!(
                "page size must be a positive integer, got: '{v}'"
            ))),
        },
    }
}

/// Build a [`CoreConfig`] from raw environment values.
///
/// `patient_data_dir` falls back to [`DEFAULT_PATIENT_DATA_DIR`]; the page sizes fall back to
/// [`DEFAULT_PAGE_SIZE`] and [`MAX_PAGE_SIZE`].
///
/// # Errors
///
/// Returns `RecordError::MissingDataDir` if the directory does not exist, and
/// `RecordError::InvalidInput` for unusable page sizes.
pub fn core_config_from_env_values(
    patient_data_dir: Option<String>,
    page_size: Option<String>,
    max_page_size: Option<String>,
) -> RecordResult<CoreConfig> {
    let patient_data_dir = PathBuf::from(
        patient_data_dir
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATIENT_DATA_DIR.into()),
    );
    if !patient_data_dir.is_dir() {
        return Err(RecordError::MissingDataDir(patient_data_dir));
    }

    let sizing = PageSizing::new(
        page_size_from_env_value(page_size, DEFAULT_PAGE_SIZE)?,
        page_size_from_env_value(max_page_size, MAX_PAGE_SIZE)?,
    )?;
    Ok(CoreConfig::new(patient_data_dir, sizing))
}

/// Build a [`CoreConfig`] from `PATIENT_DATA_DIR`, `CARTELLA_PAGE_SIZE` and
/// `CARTELLA_MAX_PAGE_SIZE`.
///
/// Reads the process environment, so call it once at startup.
pub fn core_config_from_env() -> RecordResult<CoreConfig> {
    core_config_from_env_values(
        std::env::var("PATIENT_DATA_DIR").ok(),
        std::env::var("CARTELLA_PAGE_SIZE").ok(),
        std::env::var("CARTELLA_MAX_PAGE_SIZE").ok(),
    )
}
