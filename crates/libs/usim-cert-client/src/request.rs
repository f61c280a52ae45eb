use std::fmt;

use usim_cert_ipc::{CertManager, CertificateAuthority, CertificateFilter, RemoteError};
use zeroize::Zeroizing;

use crate::result::{ResultEnvelope, ResultKind};

type Secret = Zeroizing<Vec<u8>>;

/// Names of the remote procedures the proxy can call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum RemoteMethod {
    GetCertificate,
    CertificateCount,
    FreeSlotCount,
    ListCertificates,
    ListCertificatesFiltered,
    ListExternalCertificates,
    SignPkcs1,
    SignPkcs7,
    AddUnauthenticatedAttribute,
    PrivateKeyRandom,
    TokenInfo,
    IssueCertificate,
    UpdateCertificate,
    ImportCertificate,
    DeleteCertificate,
    CheckSubscription,
}

impl RemoteMethod {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::GetCertificate => "get_certificate",
            Self::CertificateCount => "certificate_count",
            Self::FreeSlotCount => "free_slot_count",
            Self::ListCertificates => "list_certificates",
            Self::ListCertificatesFiltered => "list_certificates_filtered",
            Self::ListExternalCertificates => "list_external_certificates",
            Self::SignPkcs1 => "sign_pkcs1",
            Self::SignPkcs7 => "sign_pkcs7",
            Self::AddUnauthenticatedAttribute => "add_unauthenticated_attribute",
            Self::PrivateKeyRandom => "private_key_random",
            Self::TokenInfo => "token_info",
            Self::IssueCertificate => "issue_certificate",
            Self::UpdateCertificate => "update_certificate",
            Self::ImportCertificate => "import_certificate",
            Self::DeleteCertificate => "delete_certificate",
            Self::CheckSubscription => "check_subscription",
        }
    }

    pub(crate) fn result_kind(self) -> ResultKind {
        match self {
            Self::GetCertificate => ResultKind::Certificate,
            Self::CertificateCount | Self::FreeSlotCount => ResultKind::Count,
            Self::ListCertificates
            | Self::ListCertificatesFiltered
            | Self::ListExternalCertificates => ResultKind::CertificateList,
            Self::SignPkcs1
            | Self::SignPkcs7
            | Self::AddUnauthenticatedAttribute
            | Self::PrivateKeyRandom => ResultKind::SignedBytes,
            Self::TokenInfo => ResultKind::TokenInfo,
            Self::IssueCertificate
            | Self::UpdateCertificate
            | Self::ImportCertificate
            | Self::DeleteCertificate => ResultKind::Outcome,
            Self::CheckSubscription => ResultKind::Text,
        }
    }
}

impl fmt::Display for RemoteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) struct SignArgs {
    pub(crate) plaintext: Vec<u8>,
    pub(crate) index: i32,
    pub(crate) passcode: Secret,
    pub(crate) timestamp: String,
}

/// A remote call together with its arguments. Secrets are wiped on drop.
pub(crate) enum Request {
    GetCertificate { index: i32 },
    CertificateCount,
    FreeSlotCount,
    ListCertificates,
    ListCertificatesFiltered { filter: CertificateFilter },
    ListExternalCertificates,
    SignPkcs1(SignArgs),
    SignPkcs7(SignArgs),
    AddUnauthenticatedAttribute { signed: Vec<u8>, oid: String, value: Vec<u8> },
    PrivateKeyRandom { index: i32, passcode: Secret },
    TokenInfo,
    IssueCertificate {
        ca: CertificateAuthority,
        ref_number: String,
        auth_code: String,
        passcode: Secret,
    },
    UpdateCertificate { index: i32, ca: CertificateAuthority, passcode: Secret },
    ImportCertificate {
        cert_path: String,
        key_path: String,
        cert_passcode: Secret,
        passcode: Secret,
    },
    DeleteCertificate { index: i32, passcode: Secret },
    CheckSubscription { app_identifier: String },
}

impl Request {
    pub(crate) fn method(&self) -> RemoteMethod {
        match self {
            Self::GetCertificate { .. } => RemoteMethod::GetCertificate,
            Self::CertificateCount => RemoteMethod::CertificateCount,
            Self::FreeSlotCount => RemoteMethod::FreeSlotCount,
            Self::ListCertificates => RemoteMethod::ListCertificates,
            Self::ListCertificatesFiltered { .. } => RemoteMethod::ListCertificatesFiltered,
            Self::ListExternalCertificates => RemoteMethod::ListExternalCertificates,
            Self::SignPkcs1(_) => RemoteMethod::SignPkcs1,
            Self::SignPkcs7(_) => RemoteMethod::SignPkcs7,
            Self::AddUnauthenticatedAttribute { .. } => RemoteMethod::AddUnauthenticatedAttribute,
            Self::PrivateKeyRandom { .. } => RemoteMethod::PrivateKeyRandom,
            Self::TokenInfo => RemoteMethod::TokenInfo,
            Self::IssueCertificate { .. } => RemoteMethod::IssueCertificate,
            Self::UpdateCertificate { .. } => RemoteMethod::UpdateCertificate,
            Self::ImportCertificate { .. } => RemoteMethod::ImportCertificate,
            Self::DeleteCertificate { .. } => RemoteMethod::DeleteCertificate,
            Self::CheckSubscription { .. } => RemoteMethod::CheckSubscription,
        }
    }

    /// Perform the blocking remote call.
    pub(crate) fn invoke(&self, remote: &dyn CertManager) -> Result<ResultEnvelope, RemoteError> {
        use ResultEnvelope as R;
        Ok(match self {
            Self::GetCertificate { index } => R::Certificate(remote.get_certificate(*index)?),
            Self::CertificateCount => R::Count(remote.certificate_count()?),
            Self::FreeSlotCount => R::Count(remote.free_slot_count()?),
            Self::ListCertificates => R::CertificateList(remote.list_certificates()?),
            Self::ListCertificatesFiltered { filter } => {
                R::CertificateList(remote.list_certificates_filtered(filter)?)
            }
            Self::ListExternalCertificates => {
                R::CertificateList(remote.list_external_certificates()?)
            }
            Self::SignPkcs1(args) => R::SignedBytes(remote.sign_pkcs1(
                &args.plaintext,
                args.index,
                &args.passcode,
                &args.timestamp,
            )?),
            Self::SignPkcs7(args) => R::SignedBytes(remote.sign_pkcs7(
                &args.plaintext,
                args.index,
                &args.passcode,
                &args.timestamp,
            )?),
            Self::AddUnauthenticatedAttribute { signed, oid, value } => {
                R::SignedBytes(remote.add_unauthenticated_attribute(signed, oid, value)?)
            }
            Self::PrivateKeyRandom { index, passcode } => {
                R::SignedBytes(remote.private_key_random(*index, passcode)?)
            }
            Self::TokenInfo => R::TokenInfo(remote.token_info()?),
            Self::IssueCertificate { ca, ref_number, auth_code, passcode } => R::Outcome(
                remote.issue_certificate(ca.index(), ref_number, auth_code, passcode)?,
            ),
            Self::UpdateCertificate { index, ca, passcode } => {
                R::Outcome(remote.update_certificate(*index, ca.index(), passcode)?)
            }
            Self::ImportCertificate { cert_path, key_path, cert_passcode, passcode } => R::Outcome(
                remote.import_certificate(cert_path, key_path, cert_passcode, passcode)?,
            ),
            Self::DeleteCertificate { index, passcode } => {
                R::Outcome(remote.delete_certificate(*index, passcode)?)
            }
            Self::CheckSubscription { app_identifier } => {
                R::Text(remote.check_subscription(app_identifier)?)
            }
        })
    }
}

// Arguments may hold passcodes and plaintext; only the method is printed.
impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request").field("method", &self.method()).finish_non_exhaustive()
    }
}
