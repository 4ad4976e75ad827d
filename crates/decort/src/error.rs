//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use decort_config::ConfigError;
use decort_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the platform: {message}")]
    #[diagnostic(
        code(decort::transport),
        help("Check controller_url and network access. Use --insecure for self-signed certificates.")
    )]
    Transport { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(decort::auth_failed),
        help(
            "Verify the profile's authenticator and credentials.\n\
             Secrets are read from DECORT_PASSWORD / DECORT_APP_SECRET / DECORT_TOKEN,\n\
             then the system keyring (service 'decort'), then the profile."
        )
    )]
    AuthFailed { message: String },

    // ── Platform ─────────────────────────────────────────────────────
    #[error("API error (HTTP {status}): {body}")]
    #[diagnostic(code(decort::api_error))]
    Api { status: u16, body: String },

    #[error("{entity} not found: {identifier}")]
    #[diagnostic(code(decort::not_found))]
    NotFound { entity: String, identifier: String },

    #[error("{message}")]
    #[diagnostic(code(decort::conflict))]
    Conflict { message: String },

    #[error("Operation timed out after {seconds}s")]
    #[diagnostic(
        code(decort::timeout),
        help("The platform may still finish the operation; run `decort read` to refresh state.")
    )]
    Timeout { seconds: u64 },

    #[error("Unexpected platform response: {message}")]
    #[diagnostic(code(decort::deserialization))]
    Deserialization { message: String },

    // ── Declarations ─────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(decort::validation))]
    Validation { message: String },

    #[error("Unknown type '{name}'")]
    #[diagnostic(
        code(decort::unknown_type),
        help("Run: decort resources to list the available types")
    )]
    UnknownType { name: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(decort::profile_not_found),
        help("Available profiles: {available}\nConfig file: {path}")
    )]
    ProfileNotFound {
        name: String,
        available: String,
        path: String,
    },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(decort::config))]
    Config { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error("Cannot access {}", path.display())]
    #[diagnostic(code(decort::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    #[diagnostic(code(decort::json), help("Check the JSON file contents and try again."))]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Transport { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::UnknownType { .. }
            | Self::ProfileNotFound { .. }
            | Self::Config { .. }
            | Self::Json { .. } => exit_code::USAGE,
            Self::Api { .. } | Self::Deserialization { .. } | Self::Io { .. } => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Auth { message } => Self::AuthFailed { message },
            CoreError::Transport { message } => Self::Transport { message },
            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::Api { status, body } => Self::Api { status, body },
            CoreError::NotFound { entity, identifier } => Self::NotFound { entity, identifier },
            CoreError::Conflict { message } => Self::Conflict { message },
            CoreError::Validation { message } => Self::Validation { message },
            CoreError::UnknownResourceType { name } => Self::UnknownType { name },
            CoreError::Deserialization { message } => Self::Deserialization { message },
            CoreError::Config { message } => Self::Config { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}
