//! Error types for bloodlink.

pub mod classify;

pub use classify::{classify, classify_body, is_terminal};

use strum::{EnumString, IntoStaticStr};
use thiserror::Error;

/// Closed set of failure kinds reported by the backend (or synthesized locally).
///
/// Every failed [`execute`](crate::client::AuthenticatedClient::execute) call
/// resolves to exactly one of these. Anything that cannot be recognised
/// becomes [`ErrorKind::UnknownError`].
#[derive(Error, Debug, Clone, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    #[error("Username not found")]
    UsernameNotFound,

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Access token expired")]
    AccessTokenExpired,

    #[error("Session expired")]
    SessionExpired,

    #[error("Invalid request")]
    InvalidRequest,

    #[error("Not authenticated")]
    NoAuth,

    #[error("Service error")]
    ServiceError,

    #[error("Duplicate record{}", detail_suffix(.detail))]
    DuplicateRecord { detail: Option<String> },

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Unknown error")]
    UnknownError,
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// Message literals as they appear in `error.message` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum WireMessage {
    UsernameNotFound,
    IncorrectPassword,
    AccessTokenExpired,
    SessionExpired,
    InvalidRequest,
    NoAuth,
    ServiceError,
    DuplicateRecord,
    PermissionDenied,
}

/// Broad grouping used to decide how a failure is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Retried transparently after a credential refresh.
    AuthRecoverable,
    /// May end the session, depending on the HTTP status it arrived with.
    AuthTerminal,
    /// Returned to the caller verbatim; no session state changes.
    RequestSemantic,
    /// Malformed payloads and transport failures.
    Unknown,
}

impl ErrorKind {
    /// Wire literal for this kind (`"ACCESS_TOKEN_EXPIRED"`, ...).
    pub fn literal(&self) -> &'static str {
        self.into()
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AccessTokenExpired => ErrorCategory::AuthRecoverable,
            Self::SessionExpired | Self::NoAuth => ErrorCategory::AuthTerminal,
            Self::UnknownError => ErrorCategory::Unknown,
            Self::UsernameNotFound
            | Self::IncorrectPassword
            | Self::InvalidRequest
            | Self::ServiceError
            | Self::DuplicateRecord { .. }
            | Self::PermissionDenied => ErrorCategory::RequestSemantic,
        }
    }

    /// Whether the observer should treat this outcome as "logged out".
    pub fn ends_session(&self) -> bool {
        self.category() == ErrorCategory::AuthTerminal
    }
}

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Convenience alias for executor results.
pub type Result<T> = std::result::Result<T, ErrorKind>;
