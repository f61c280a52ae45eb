use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use usim_cert_ipc::ErrorRecord;

/// Last-write-wins diagnostics shared by every operation.
///
/// Readers must look at it right after the operation they care about returns
/// or calls back; the next operation overwrites it.
#[derive(Debug)]
pub(crate) struct ErrorState {
    record: Mutex<ErrorRecord>,
}

impl Default for ErrorState {
    fn default() -> Self {
        Self { record: Mutex::new(ErrorRecord::normal()) }
    }
}

impl ErrorState {
    pub(crate) fn set(&self, record: ErrorRecord) {
        *self.record.lock().expect("error record mutex poisoned") = record;
    }

    pub(crate) fn get(&self) -> ErrorRecord {
        self.record.lock().expect("error record mutex poisoned").clone()
    }
}

/// The transport refused to start binding to the endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BindError {
    #[error("endpoint not found: {endpoint}")]
    EndpointNotFound { endpoint: String },

    #[error("binding refused: {reason}")]
    Refused { reason: String },
}

impl BindError {
    pub fn refused(reason: impl Into<String>) -> Self {
        Self::Refused { reason: reason.into() }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { field, reason: reason.into() }
    }
}
