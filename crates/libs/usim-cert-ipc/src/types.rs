use serde::{Deserialize, Serialize};

use crate::error::{code, message};

// ── Diagnostics ───────────────────────────────────────────────────────────────

/// Code/message pair describing the outcome of the last operation.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorRecord {
    pub code: String,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }

    pub fn normal() -> Self {
        Self::new(code::NORMAL, message::NORMAL)
    }

    pub fn service_connect() -> Self {
        Self::new(code::SERVICE_CONNECT, message::SERVICE_CONNECT)
    }

    pub fn in_use() -> Self {
        Self::new(code::IN_USE, message::IN_USE)
    }

    pub fn is_normal(&self) -> bool {
        self.code == code::NORMAL
    }
}

// ── Certificates ──────────────────────────────────────────────────────────────

/// A certificate stored on the USIM or on external storage.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub struct Certificate {
    /// Slot index on the token; external certificates use `-1`.
    pub index: i32,
    pub subject_dn: String,
    pub issuer_dn: String,
    pub serial_number: String,
    pub not_before: String,
    pub not_after: String,
    #[serde(default)]
    pub der: Vec<u8>,
}

impl Certificate {
    pub fn new(
        index: i32,
        subject_dn: impl Into<String>,
        issuer_dn: impl Into<String>,
        serial_number: impl Into<String>,
    ) -> Self {
        Self {
            index,
            subject_dn: subject_dn.into(),
            issuer_dn: issuer_dn.into(),
            serial_number: serial_number.into(),
            ..Self::default()
        }
    }
}

/// Filter for the filtered certificate listing. Empty strings match anything.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateFilter {
    pub subject_dn: String,
    pub issuer_dn: String,
    pub serial_number: String,
    pub include_expired: bool,
}

// ── Token ─────────────────────────────────────────────────────────────────────

/// Free space and serial number (ICCID) of the USIM token.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenInfo {
    pub free_memory: i64,
    pub serial_number: Vec<u8>,
}

impl TokenInfo {
    pub fn new(free_memory: i64, serial_number: impl Into<Vec<u8>>) -> Self {
        Self { free_memory, serial_number: serial_number.into() }
    }
}

// ── Certificate authorities ───────────────────────────────────────────────────

/// Certificate authority targeted by issue and update requests.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CertificateAuthority {
    YesSign,
    CrossCert,
    SignKorea,
    Initech,
    SignGate,
}

impl CertificateAuthority {
    /// Index the service uses for this authority.
    pub fn index(self) -> i32 {
        match self {
            Self::YesSign => 1,
            Self::CrossCert => 2,
            Self::SignKorea => 3,
            Self::Initech => 4,
            Self::SignGate => 5,
        }
    }

    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            1 => Some(Self::YesSign),
            2 => Some(Self::CrossCert),
            3 => Some(Self::SignKorea),
            4 => Some(Self::Initech),
            5 => Some(Self::SignGate),
            _ => None,
        }
    }
}
