use crate::error::RemoteError;
use crate::types::ErrorRecord;

/// Service-level queries that are not about a particular certificate.
pub trait ServiceDiagnostics: Send + Sync {
    /// Check whether `app_identifier` is subscribed to the service. The answer
    /// is a service result code.
    fn check_subscription(&self, app_identifier: &str) -> Result<Option<String>, RemoteError>;

    /// The service's own record of how its last call went.
    fn last_error(&self) -> Result<ErrorRecord, RemoteError>;
}
