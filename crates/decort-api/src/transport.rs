// HTTP client construction.
//
// The platform client and the authenticator exchange share one
// `reqwest::Client`, so TLS and timeout settings live here.

use std::time::Duration;

use crate::error::Error;

const USER_AGENT: &str = concat!("decort-provider/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Accept any certificate (`allow_insecure_tls`).
    DangerAcceptInvalid,
}

impl TlsMode {
    /// Map the provider's `allow_insecure_tls` switch onto a mode.
    pub fn from_insecure(allow_insecure_tls: bool) -> Self {
        if allow_insecure_tls {
            Self::DangerAcceptInvalid
        } else {
            Self::System
        }
    }
}

/// Settings the `reqwest::Client` is built from.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Upper bound for a single HTTP exchange. Callback scopes usually
    /// fire well before this.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(600),
        }
    }
}

impl TransportConfig {
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        if self.tls == TlsMode::DangerAcceptInvalid {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
