use crate::error::RemoteError;
use crate::traits::*;
use crate::types::*;

/// A certificate manager that returns `NotImplemented` for every method.
///
/// Useful as a bound handle while wiring a transport, before any real remote
/// calls exist.
pub struct StubCertManager;

impl CertQuery for StubCertManager {
    fn get_certificate(&self, _index: i32) -> Result<Option<Certificate>, RemoteError> {
        Err(RemoteError::not_implemented("get_certificate"))
    }

    fn certificate_count(&self) -> Result<i32, RemoteError> {
        Err(RemoteError::not_implemented("certificate_count"))
    }

    fn free_slot_count(&self) -> Result<i32, RemoteError> {
        Err(RemoteError::not_implemented("free_slot_count"))
    }

    fn list_certificates(&self) -> Result<Option<Vec<Certificate>>, RemoteError> {
        Err(RemoteError::not_implemented("list_certificates"))
    }

    fn list_certificates_filtered(
        &self,
        _filter: &CertificateFilter,
    ) -> Result<Option<Vec<Certificate>>, RemoteError> {
        Err(RemoteError::not_implemented("list_certificates_filtered"))
    }

    fn list_external_certificates(&self) -> Result<Option<Vec<Certificate>>, RemoteError> {
        Err(RemoteError::not_implemented("list_external_certificates"))
    }

    fn token_info(&self) -> Result<Option<TokenInfo>, RemoteError> {
        Err(RemoteError::not_implemented("token_info"))
    }
}

impl CertSigning for StubCertManager {
    fn sign_pkcs1(
        &self,
        _plaintext: &[u8],
        _index: i32,
        _passcode: &[u8],
        _timestamp: &str,
    ) -> Result<Option<Vec<u8>>, RemoteError> {
        Err(RemoteError::not_implemented("sign_pkcs1"))
    }

    fn sign_pkcs7(
        &self,
        _plaintext: &[u8],
        _index: i32,
        _passcode: &[u8],
        _timestamp: &str,
    ) -> Result<Option<Vec<u8>>, RemoteError> {
        Err(RemoteError::not_implemented("sign_pkcs7"))
    }

    fn add_unauthenticated_attribute(
        &self,
        _signed: &[u8],
        _oid: &str,
        _value: &[u8],
    ) -> Result<Option<Vec<u8>>, RemoteError> {
        Err(RemoteError::not_implemented("add_unauthenticated_attribute"))
    }

    fn private_key_random(
        &self,
        _index: i32,
        _passcode: &[u8],
    ) -> Result<Option<Vec<u8>>, RemoteError> {
        Err(RemoteError::not_implemented("private_key_random"))
    }
}

impl CertProvisioning for StubCertManager {
    fn issue_certificate(
        &self,
        _ca_index: i32,
        _ref_number: &str,
        _auth_code: &str,
        _passcode: &[u8],
    ) -> Result<bool, RemoteError> {
        Err(RemoteError::not_implemented("issue_certificate"))
    }

    fn update_certificate(
        &self,
        _index: i32,
        _ca_index: i32,
        _passcode: &[u8],
    ) -> Result<bool, RemoteError> {
        Err(RemoteError::not_implemented("update_certificate"))
    }

    fn import_certificate(
        &self,
        _cert_path: &str,
        _key_path: &str,
        _cert_passcode: &[u8],
        _passcode: &[u8],
    ) -> Result<bool, RemoteError> {
        Err(RemoteError::not_implemented("import_certificate"))
    }

    fn delete_certificate(&self, _index: i32, _passcode: &[u8]) -> Result<bool, RemoteError> {
        Err(RemoteError::not_implemented("delete_certificate"))
    }
}

impl ServiceDiagnostics for StubCertManager {
    fn check_subscription(&self, _app_identifier: &str) -> Result<Option<String>, RemoteError> {
        Err(RemoteError::not_implemented("check_subscription"))
    }

    fn last_error(&self) -> Result<ErrorRecord, RemoteError> {
        Err(RemoteError::not_implemented("last_error"))
    }
}
