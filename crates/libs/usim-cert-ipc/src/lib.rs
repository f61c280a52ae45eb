//! Interface boundary for the USIM certificate service.
//!
//! The certificate service lives in a separate process. This crate defines
//! everything a client needs to talk to it without knowing how the calls are
//! marshalled:
//!
//! - **Boundary types** exchanged with the service (certificates, token info,
//!   error records, list filters, CA indices)
//! - **Blocking trait definitions** for the remote operation surface
//! - **`StubCertManager`** answering `NotImplemented` to every call
//! - **`RemoteError`**, the cross-process fault raised by a failed call
//!
//! # Trait hierarchy
//!
//! Four focused traits combine into one composite:
//!
//! - [`CertQuery`]: certificate lookup, counts, listings, token info
//! - [`CertSigning`]: PKCS#1/PKCS#7 signing and signature post-processing
//! - [`CertProvisioning`]: issue, update, import, delete
//! - [`ServiceDiagnostics`]: subscription check and the remote last-error
//! - [`CertManager`]: composite (auto-implemented for all four)

pub mod error;
pub mod traits;
pub mod types;

pub use error::{code, message, RemoteError};
pub use traits::{CertManager, CertProvisioning, CertQuery, CertSigning, ServiceDiagnostics};
pub use types::*;

mod stub;
pub use stub::StubCertManager;
