use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_ENDPOINT: &str = "com.sumion.usim.intent.CERT_SERVICE";
pub const DEFAULT_WORKER_THREAD_NAME: &str = "usim-cert-call";

/// Well-known identifier used to ask the transport for a binding to the
/// certificate service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointDescriptor(String);

impl EndpointDescriptor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self(endpoint.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EndpointDescriptor {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl fmt::Display for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub endpoint: EndpointDescriptor,
    /// Identifier presented to the service by the subscription check.
    pub app_identifier: String,
    /// Name given to threads started by [`ThreadExecutor`](crate::ThreadExecutor).
    pub worker_thread_name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointDescriptor::default(),
            app_identifier: String::new(),
            worker_thread_name: DEFAULT_WORKER_THREAD_NAME.to_owned(),
        }
    }
}

impl ServiceConfig {
    pub fn new(app_identifier: impl Into<String>) -> Self {
        Self { app_identifier: app_identifier.into(), ..Self::default() }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = EndpointDescriptor::new(endpoint);
        self
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.as_str().trim().is_empty() {
            return Err(ConfigError::invalid("endpoint", "must not be empty"));
        }
        if self.app_identifier.trim().is_empty() {
            return Err(ConfigError::invalid("app_identifier", "must not be empty"));
        }
        if self.worker_thread_name.contains('\0') {
            return Err(ConfigError::invalid("worker_thread_name", "must not contain NUL"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_fill_missing_fields() {
        let config =
            ServiceConfig::from_toml_str("app_identifier = \"com.example.bank\"\n").expect("parse");
        assert_eq!(config.endpoint.as_str(), DEFAULT_ENDPOINT);
        assert_eq!(config.worker_thread_name, DEFAULT_WORKER_THREAD_NAME);
        assert_eq!(config.app_identifier, "com.example.bank");
    }

    #[test]
    fn explicit_endpoint_is_kept() {
        let raw = r#"
            endpoint = "org.example.cert"
            app_identifier = "com.example.bank"
            worker_thread_name = "cert-io"
        "#;
        let config = ServiceConfig::from_toml_str(raw).expect("parse");
        assert_eq!(config.endpoint, EndpointDescriptor::new("org.example.cert"));
        assert_eq!(config.worker_thread_name, "cert-io");
    }

    #[test]
    fn missing_app_identifier_is_rejected() {
        let err = ServiceConfig::from_toml_str("").expect_err("must reject");
        assert!(matches!(err, ConfigError::Invalid { field: "app_identifier", .. }));
    }

    #[test]
    fn blank_endpoint_is_rejected() {
        let err = ServiceConfig::new("app").with_endpoint("  ").validate().expect_err("reject");
        assert!(matches!(err, ConfigError::Invalid { field: "endpoint", .. }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ServiceConfig::from_toml_str("app_identifier = \"a\"\nretries = 3\n")
            .expect_err("must reject");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "app_identifier = \"com.example.wallet\"").expect("write");
        let config = ServiceConfig::from_file(file.path()).expect("load");
        assert_eq!(config.app_identifier, "com.example.wallet");
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.toml");
        let err = ServiceConfig::from_file(&path).expect_err("must fail");
        match err {
            ConfigError::Io { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}
