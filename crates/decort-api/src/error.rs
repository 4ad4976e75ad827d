use thiserror::Error;

/// Top-level error type for the `decort-api` crate.
///
/// Covers every failure mode of a platform call: credential exchange,
/// transport, cancellation, and non-success HTTP responses.
/// `decort-core` maps these into reconciliation diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The authenticator refused the credentials or returned something
    /// that does not look like a token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Configuration is missing a setting the selected auth flow needs.
    #[error("Missing credential setting '{field}' for {authenticator} authentication")]
    MissingCredential {
        authenticator: &'static str,
        field: &'static str,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The caller's cancellation token fired while the request was in flight.
    #[error("Request cancelled")]
    Cancelled,

    /// The caller's deadline passed while the request was in flight.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Platform ────────────────────────────────────────────────────
    /// The platform answered with HTTP status >= 400.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Response body could not be decoded, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the platform reported the target as missing.
    ///
    /// The platform is inconsistent here: some endpoints answer 404, others
    /// answer 400/500 with a "not found" message in the body.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api { status: 404, .. } => true,
            Self::Api { body, .. } => {
                let lower = body.to_ascii_lowercase();
                lower.contains("not found") || lower.contains("does not exist")
            }
            _ => false,
        }
    }
}
