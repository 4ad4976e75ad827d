// ── Core error types ──
//
// Reconciliation-level errors. Resources never see HTTP plumbing directly:
// the `From<decort_api::Error>` impl folds transport failures into the
// kinds the host displays.

use strum::{Display, IntoStaticStr};
use thiserror::Error;

/// Coarse classification shown to the user next to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum ErrorKind {
    AuthError,
    TransportError,
    #[strum(serialize = "APIError")]
    ApiError,
    NotFound,
    ValidationError,
    Conflict,
    Timeout,
    ConfigError,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Transport failure: {message}")]
    Transport { message: String },

    #[error("Operation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Platform errors ──────────────────────────────────────────────
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    // ── Declared-state errors ────────────────────────────────────────
    #[error("{message}")]
    Validation { message: String },

    #[error("Unknown resource type: {name}")]
    UnknownResourceType { name: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Unexpected platform response: {message}")]
    Deserialization { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, identifier: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            identifier: identifier.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth { .. } => ErrorKind::AuthError,
            Self::Transport { .. } => ErrorKind::TransportError,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Api { .. } | Self::Deserialization { .. } => ErrorKind::ApiError,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Validation { .. } | Self::UnknownResourceType { .. } => {
                ErrorKind::ValidationError
            }
            Self::Config { .. } => ErrorKind::ConfigError,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<decort_api::Error> for CoreError {
    fn from(err: decort_api::Error) -> Self {
        use decort_api::Error as ApiErr;

        if err.is_not_found() {
            let body = match &err {
                ApiErr::Api { body, .. } => body.clone(),
                _ => String::new(),
            };
            return Self::NotFound {
                entity: "resource".into(),
                identifier: body,
            };
        }

        match err {
            ApiErr::Authentication { message } => Self::Auth { message },
            e @ ApiErr::MissingCredential { .. } => Self::Config {
                message: e.to_string(),
            },
            ApiErr::Transport(e) => Self::Transport {
                message: e.to_string(),
            },
            ApiErr::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiErr::Cancelled => Self::Transport {
                message: "request cancelled".into(),
            },
            ApiErr::Timeout { timeout_secs } => Self::Timeout { timeout_secs },
            ApiErr::Tls(msg) => Self::Transport {
                message: format!("TLS error: {msg}"),
            },
            ApiErr::Api { status: 409, body } => Self::Conflict { message: body },
            ApiErr::Api { status, body } => Self::Api { status, body },
            ApiErr::Deserialization { message, .. } => Self::Deserialization { message },
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Deserialization {
            message: err.to_string(),
        }
    }
}
