use crate::error::RemoteError;
use crate::types::*;

/// Read-only certificate and token queries.
pub trait CertQuery: Send + Sync {
    /// Fetch the certificate stored at `index`.
    fn get_certificate(&self, index: i32) -> Result<Option<Certificate>, RemoteError>;

    /// Number of certificates stored on the token.
    fn certificate_count(&self) -> Result<i32, RemoteError>;

    /// Number of certificates that can still be stored on the token.
    fn free_slot_count(&self) -> Result<i32, RemoteError>;

    /// List every certificate on the token.
    fn list_certificates(&self) -> Result<Option<Vec<Certificate>>, RemoteError>;

    /// List certificates on the token matching `filter`.
    fn list_certificates_filtered(
        &self,
        filter: &CertificateFilter,
    ) -> Result<Option<Vec<Certificate>>, RemoteError>;

    /// List certificates found on external storage.
    fn list_external_certificates(&self) -> Result<Option<Vec<Certificate>>, RemoteError>;

    /// Token free memory and serial number.
    fn token_info(&self) -> Result<Option<TokenInfo>, RemoteError>;
}
