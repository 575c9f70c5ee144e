use crate::dto::HealthRes;

/// Simple health service shared by the REST API and its tests.
///
/// Provides a standardised way to check the health status of the Cartella service.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Check health without creating an instance.
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Cartella REST API is alive".into(),
        }
    }
}
