use crate::error::RemoteError;

/// Signing with the private key of a stored certificate.
pub trait CertSigning: Send + Sync {
    /// Raw PKCS#1 signature over `plaintext`.
    fn sign_pkcs1(
        &self,
        plaintext: &[u8],
        index: i32,
        passcode: &[u8],
        timestamp: &str,
    ) -> Result<Option<Vec<u8>>, RemoteError>;

    /// PKCS#7 signed-data envelope over `plaintext`.
    fn sign_pkcs7(
        &self,
        plaintext: &[u8],
        index: i32,
        passcode: &[u8],
        timestamp: &str,
    ) -> Result<Option<Vec<u8>>, RemoteError>;

    /// Append an unauthenticated attribute to a PKCS#7 envelope.
    fn add_unauthenticated_attribute(
        &self,
        signed: &[u8],
        oid: &str,
        value: &[u8],
    ) -> Result<Option<Vec<u8>>, RemoteError>;

    /// Random value (R) bound to the private key, used for identity checks.
    fn private_key_random(&self, index: i32, passcode: &[u8])
        -> Result<Option<Vec<u8>>, RemoteError>;
}
