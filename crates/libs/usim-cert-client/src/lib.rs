//! Client-side proxy for the USIM certificate service.
//!
//! [`CertService`] is the facade callers use. Each operation takes a
//! completion callback and produces exactly one result:
//!
//! - synchronously, with a failure sentinel, when the service is not ready
//!   (not connected, or another request is still in flight);
//! - otherwise asynchronously, after the blocking remote call has run on a
//!   [`BackgroundExecutor`] and the [`DeliveryPump`] has handed the result
//!   back to the caller's own context.
//!
//! Only one request is in flight at a time. Disconnecting abandons it; its
//! late result is dropped and the callback is never invoked.
//!
//! After every operation, [`CertService::last_error`] tells the caller whether
//! the service was not connected, busy, unreachable, or answered with its own
//! error record.

mod binder;
mod config;
mod dispatcher;
mod error;
mod executor;
mod lifecycle;
mod request;
mod result;
mod router;
mod service;

pub use binder::{ConnectionEvents, ServiceBinder};
pub use config::{EndpointDescriptor, ServiceConfig, DEFAULT_ENDPOINT, DEFAULT_WORKER_THREAD_NAME};
pub use error::{BindError, ConfigError};
pub use executor::{BackgroundExecutor, BackgroundJob, ThreadExecutor, TokioBlockingExecutor};
pub use lifecycle::ConnectionState;
pub use result::COUNT_UNAVAILABLE;
pub use router::DeliveryPump;
pub use service::{CertService, ConnectOutcome};

pub use usim_cert_ipc::{
    code, message, CertManager, Certificate, CertificateAuthority, CertificateFilter,
    ErrorRecord, RemoteError, TokenInfo,
};
