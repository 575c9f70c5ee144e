use cartella_core::{CoreConfig, RecordService, ReportService};
use std::sync::Arc;

/// Application state for the REST API server
///
/// Shared by all request handlers. Services are cheap to clone and hold the configuration
/// resolved at startup.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub records: RecordService,
    pub reports: ReportService,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            records: RecordService::new(cfg.clone()),
            reports: ReportService::new(cfg.clone()),
            cfg,
        }
    }
}
