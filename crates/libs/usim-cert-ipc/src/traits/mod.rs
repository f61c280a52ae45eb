mod diagnostics;
mod provisioning;
mod query;
mod signing;

pub use diagnostics::ServiceDiagnostics;
pub use provisioning::CertProvisioning;
pub use query::CertQuery;
pub use signing::CertSigning;

/// Composite trait encompassing the whole remote certificate surface.
///
/// Automatically implemented for any type that implements all four
/// sub-traits. Use `Arc<dyn CertManager>` as the bound handle type.
///
/// Every method blocks until the remote process answers, so callers must
/// never invoke them on a thread that has to stay responsive.
pub trait CertManager: CertQuery + CertSigning + CertProvisioning + ServiceDiagnostics {}

impl<T> CertManager for T where
    T: CertQuery + CertSigning + CertProvisioning + ServiceDiagnostics
{
}
