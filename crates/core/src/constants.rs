//! Constants used throughout the Cartella core crate.
//!
//! Path names and pagination defaults live here so the storage layout and API limits are defined
//! in one place.

/// Default directory for patient data storage when no explicit directory is configured.
pub const DEFAULT_PATIENT_DATA_DIR: &str = "patient_data";

/// Directory name for section record storage.
pub const RECORDS_DIR_NAME: &str = "records";

/// Directory name for report storage.
pub const REPORTS_DIR_NAME: &str = "reports";

/// Extension of every stored document.
pub const DOCUMENT_EXTENSION: &str = "json";

/// Page size used when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Upper bound on the page size a client may request.
pub const MAX_PAGE_SIZE: usize = 100;

/// Number of consecutive report ids tried before giving up on allocation.
pub const REPORT_ID_ALLOCATION_ATTEMPTS: usize = 5;
