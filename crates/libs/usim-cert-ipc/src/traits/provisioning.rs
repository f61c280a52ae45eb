use crate::error::RemoteError;

/// Operations that change what is stored on the token.
pub trait CertProvisioning: Send + Sync {
    fn issue_certificate(
        &self,
        ca_index: i32,
        ref_number: &str,
        auth_code: &str,
        passcode: &[u8],
    ) -> Result<bool, RemoteError>;

    fn update_certificate(
        &self,
        index: i32,
        ca_index: i32,
        passcode: &[u8],
    ) -> Result<bool, RemoteError>;

    /// Copy a certificate and key pair from external storage onto the token.
    fn import_certificate(
        &self,
        cert_path: &str,
        key_path: &str,
        cert_passcode: &[u8],
        passcode: &[u8],
    ) -> Result<bool, RemoteError>;

    fn delete_certificate(&self, index: i32, passcode: &[u8]) -> Result<bool, RemoteError>;
}
