/// Result codes shared by the service and its clients.
///
/// The remote endpoint reports its own codes through
/// [`ServiceDiagnostics::last_error`](crate::ServiceDiagnostics::last_error);
/// the three below are the ones a client produces by itself.
pub mod code {
    pub const NORMAL: &str = "USIM_NORMAL";
    pub const SERVICE_CONNECT: &str = "USIM_SERVICE_CONNECT";
    pub const IN_USE: &str = "USIM_IN_USE";
}

/// Human readable messages paired with [`code`].
pub mod message {
    pub const NORMAL: &str = "request completed normally";
    pub const SERVICE_CONNECT: &str = "certificate service is not connected";
    pub const IN_USE: &str = "another certificate service request is in progress";
}

/// A failed cross-process call.
///
/// Every variant means the remote procedure could not be completed; none of
/// them carries a domain outcome. Domain failures (wrong passcode, bad index)
/// come back as a normal return plus a non-normal remote error record.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("remote endpoint disconnected")]
    Disconnected,

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("not implemented: {method}")]
    NotImplemented { method: String },
}

impl RemoteError {
    /// Convenience constructor for `NotImplemented`.
    pub fn not_implemented(method: impl Into<String>) -> Self {
        Self::NotImplemented { method: method.into() }
    }

    /// Convenience constructor for `Transport`.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }
}
