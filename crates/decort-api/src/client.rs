// DECORT platform HTTP client
//
// The single choke point for every resource: authenticated form-encoded
// calls against `{controller_url}/restmachine{path}`. The platform uses POST
// for reads as well as mutations and answers with a bare id, a bare JSON
// scalar, or a JSON document; callers get the raw body back.

use std::time::Duration;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{Authenticator, Credentials, TokenSource, join_path};
use crate::error::Error;
use crate::params::FormParams;
use crate::scope::Scope;
use crate::transport::{TlsMode, TransportConfig};

/// Path prefix under which the platform serves its API groups.
const API_PREFIX: &str = "/restmachine";

/// Form key carrying the legacy session key.
const LEGACY_AUTH_KEY: &str = "authkey";

/// Everything needed to reach and authenticate with one platform.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Platform base URL, e.g. `https://cloud.example.com`.
    pub controller_url: Url,
    /// SSO / authenticator base URL (oauth2; optional for legacy).
    pub oauth2_url: Option<Url>,
    pub credentials: Credentials,
    pub tls: TlsMode,
    /// Upper bound for one HTTP exchange.
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(controller_url: Url, credentials: Credentials) -> Self {
        Self {
            controller_url,
            oauth2_url: None,
            credentials,
            tls: TlsMode::System,
            request_timeout: TransportConfig::default().timeout,
        }
    }

    pub fn with_oauth2_url(mut self, url: Url) -> Self {
        self.oauth2_url = Some(url);
        self
    }

    pub fn with_insecure_tls(mut self, allow_insecure_tls: bool) -> Self {
        self.tls = TlsMode::from_insecure(allow_insecure_tls);
        self
    }

    fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls,
            timeout: self.request_timeout,
        }
    }
}

/// Shared, long-lived client for the platform API.
///
/// Stateless per call apart from the token cache, so one instance behind an
/// `Arc` serves every resource concurrently.
pub struct DecortClient {
    http: reqwest::Client,
    controller_url: Url,
    tokens: TokenSource,
}

impl DecortClient {
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let http = config.transport().build_client()?;
        let tokens = TokenSource::new(
            http.clone(),
            config.controller_url.clone(),
            config.oauth2_url.clone(),
            config.credentials.clone(),
        );
        Ok(Self {
            http,
            controller_url: config.controller_url,
            tokens,
        })
    }

    pub fn controller_url(&self) -> &Url {
        &self.controller_url
    }

    pub fn authenticator(&self) -> Authenticator {
        self.tokens.authenticator()
    }

    pub fn token_source(&self) -> &TokenSource {
        &self.tokens
    }

    fn url(&self, relative_path: &str) -> Result<Url, Error> {
        let path = if relative_path.starts_with('/') {
            format!("{API_PREFIX}{relative_path}")
        } else {
            format!("{API_PREFIX}/{relative_path}")
        };
        join_path(&self.controller_url, &path)
    }

    /// Perform one authenticated call and return the raw response body.
    ///
    /// The request is raced against `scope`; cancellation aborts it.
    pub async fn api_call(
        &self,
        scope: &Scope,
        method: Method,
        relative_path: &str,
        params: &FormParams,
    ) -> Result<String, Error> {
        let url = self.url(relative_path)?;
        let token = self.tokens.token(scope).await?;

        let mut form = params.clone();
        let mut builder = self
            .http
            .request(method.clone(), url)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            );

        if self.tokens.authenticator() == Authenticator::Legacy {
            form.push(LEGACY_AUTH_KEY, token.expose_secret());
        } else {
            let mut value = HeaderValue::from_str(&format!("bearer {}", token.expose_secret()))
                .map_err(|e| Error::Authentication {
                    message: format!("token is not a valid header value: {e}"),
                })?;
            value.set_sensitive(true);
            builder = builder.header(AUTHORIZATION, value);
        }

        debug!(%method, path = relative_path, params = %params, "platform call");
        let request = builder.body(form.encode());

        scope
            .run(async {
                let resp = request.send().await?;
                let status = resp.status();
                let body = resp.text().await?;
                trace!(path = relative_path, %status, bytes = body.len(), "platform response");

                if status.is_client_error() || status.is_server_error() {
                    return Err(Error::Api {
                        status: status.as_u16(),
                        body,
                    });
                }
                Ok(body)
            })
            .await
    }

    /// `POST` shorthand; the platform uses it for every operation.
    pub async fn post(
        &self,
        scope: &Scope,
        relative_path: &str,
        params: &FormParams,
    ) -> Result<String, Error> {
        self.api_call(scope, Method::POST, relative_path, params)
            .await
    }

    /// `POST` and decode the body as JSON.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        scope: &Scope,
        relative_path: &str,
        params: &FormParams,
    ) -> Result<T, Error> {
        let body = self.post(scope, relative_path, params).await?;
        decode_json(&body)
    }
}

/// Decode a JSON body, keeping a preview of the text on failure.
pub(crate) fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}

/// Parse a bare decimal id, tolerating surrounding whitespace and quotes.
pub fn parse_id(body: &str) -> Result<u64, Error> {
    let trimmed = body.trim().trim_matches('"');
    trimmed.parse().map_err(|_| Error::Deserialization {
        message: format!("expected a numeric id, got {trimmed:?}"),
        body: body.to_owned(),
    })
}

/// Parse a bare JSON boolean result (`true` / `false`).
pub fn parse_bool(body: &str) -> Result<bool, Error> {
    match body.trim().trim_matches('"') {
        "true" | "True" => Ok(true),
        "false" | "False" => Ok(false),
        other => Err(Error::Deserialization {
            message: format!("expected a boolean, got {other:?}"),
            body: body.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_bare_and_quoted() {
        assert_eq!(parse_id("101").ok(), Some(101));
        assert_eq!(parse_id(" 101\n").ok(), Some(101));
        assert_eq!(parse_id("\"55\"").ok(), Some(55));
        assert!(parse_id("{\"id\":1}").is_err());
    }

    #[test]
    fn parse_bool_accepts_json_scalars() {
        assert_eq!(parse_bool("true").ok(), Some(true));
        assert_eq!(parse_bool("false\n").ok(), Some(false));
        assert!(parse_bool("1").is_err());
    }
}
