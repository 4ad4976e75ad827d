// Credential exchange and token caching
//
// Turns configured credentials into the token attached to every platform
// call. The token is fetched once per process and shared by all callers;
// concurrent first callers wait on a single exchange.

use secrecy::{ExposeSecret, SecretString};
use strum::{Display, EnumString, IntoStaticStr};
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::params::FormParams;
use crate::scope::Scope;

const OAUTH2_TOKEN_PATH: &str = "/v1/oauth/access_token";
const LEGACY_AUTH_PATH: &str = "/restmachine/cloudapi/user/authenticate";

/// Which token flow to use.
///
/// Marker enum (no data) -- the actual secrets live in [`Credentials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Authenticator {
    /// User/password exchanged for a session key, sent as `authkey`.
    Legacy,
    /// Application id/secret exchanged for a JWT at the SSO endpoint.
    #[strum(serialize = "oauth2")]
    OAuth2,
    /// Pre-issued JWT used verbatim.
    Bearer,
}

/// Credentials for authenticating with the platform.
///
/// Each variant carries the secret material needed for its flow.
#[derive(Debug, Clone)]
pub enum Credentials {
    Legacy {
        user: String,
        password: SecretString,
    },
    OAuth2 {
        app_id: String,
        app_secret: SecretString,
    },
    Bearer {
        token: SecretString,
    },
}

impl Credentials {
    pub fn authenticator(&self) -> Authenticator {
        match self {
            Self::Legacy { .. } => Authenticator::Legacy,
            Self::OAuth2 { .. } => Authenticator::OAuth2,
            Self::Bearer { .. } => Authenticator::Bearer,
        }
    }
}

/// Exchanges credentials for a token and caches it for the process lifetime.
pub struct TokenSource {
    http: reqwest::Client,
    controller_url: Url,
    oauth2_url: Option<Url>,
    credentials: Credentials,
    cached: OnceCell<SecretString>,
}

impl TokenSource {
    pub fn new(
        http: reqwest::Client,
        controller_url: Url,
        oauth2_url: Option<Url>,
        credentials: Credentials,
    ) -> Self {
        Self {
            http,
            controller_url,
            oauth2_url,
            credentials,
            cached: OnceCell::new(),
        }
    }

    pub fn authenticator(&self) -> Authenticator {
        self.credentials.authenticator()
    }

    /// Whether a token has already been obtained.
    pub fn is_cached(&self) -> bool {
        self.cached.initialized()
    }

    /// Return the cached token, performing the exchange on first use.
    ///
    /// A failed exchange leaves the cache empty so the next caller retries.
    pub async fn token(&self, scope: &Scope) -> Result<&SecretString, Error> {
        self.cached.get_or_try_init(|| self.exchange(scope)).await
    }

    async fn exchange(&self, scope: &Scope) -> Result<SecretString, Error> {
        match &self.credentials {
            Credentials::Bearer { token } => {
                if token.expose_secret().trim().is_empty() {
                    return Err(Error::MissingCredential {
                        authenticator: "bearer",
                        field: "token",
                    });
                }
                debug!("using pre-issued bearer token");
                Ok(token.clone())
            }
            Credentials::OAuth2 { app_id, app_secret } => {
                let base = self.oauth2_url.as_ref().ok_or(Error::MissingCredential {
                    authenticator: "oauth2",
                    field: "oauth2_url",
                })?;
                let url = join_path(base, OAUTH2_TOKEN_PATH)?;

                let mut form = FormParams::new();
                form.push("grant_type", "client_credentials")
                    .push("client_id", app_id.as_str())
                    .push("client_secret", app_secret.expose_secret())
                    .push("response_type", "id_token");

                debug!(%url, "exchanging application credentials for JWT");
                let body = self.post_form(scope, url, &form).await?;
                let jwt = unquote(&body);
                if !looks_like_jwt(jwt) {
                    return Err(Error::Authentication {
                        message: "authenticator response is not a JWT".into(),
                    });
                }
                debug!("JWT obtained");
                Ok(SecretString::from(jwt.to_owned()))
            }
            Credentials::Legacy { user, password } => {
                let base = self.oauth2_url.as_ref().unwrap_or(&self.controller_url);
                let url = join_path(base, LEGACY_AUTH_PATH)?;

                let mut form = FormParams::new();
                form.push("username", user.as_str())
                    .push("password", password.expose_secret());

                debug!(%url, user = %user, "authenticating with legacy user/password");
                let body = self.post_form(scope, url, &form).await?;
                let session = unquote(&body);
                if session.is_empty() || session.contains(char::is_whitespace) {
                    return Err(Error::Authentication {
                        message: "legacy authenticator returned an empty or malformed session key"
                            .into(),
                    });
                }
                debug!("legacy session key obtained");
                Ok(SecretString::from(session.to_owned()))
            }
        }
    }

    async fn post_form(&self, scope: &Scope, url: Url, form: &FormParams) -> Result<String, Error> {
        let request = self
            .http
            .post(url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(form.encode());

        scope
            .run(async {
                let resp = request.send().await?;
                let status = resp.status();
                let body = resp.text().await?;
                if status.is_client_error() || status.is_server_error() {
                    return Err(Error::Authentication {
                        message: format!(
                            "authenticator rejected credentials (HTTP {status}): {}",
                            preview(&body)
                        ),
                    });
                }
                Ok(body)
            })
            .await
    }
}

/// Append an absolute path to a base URL, keeping any path prefix the base has.
pub(crate) fn join_path(base: &Url, path: &str) -> Result<Url, Error> {
    let full = format!("{}{path}", base.as_str().trim_end_matches('/'));
    Ok(Url::parse(&full)?)
}

/// Strip whitespace and one layer of JSON string quoting.
fn unquote(body: &str) -> &str {
    let trimmed = body.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
}

/// Three non-empty dot-separated base64url segments.
pub fn looks_like_jwt(candidate: &str) -> bool {
    let segments: Vec<&str> = candidate.split('.').collect();
    segments.len() == 3
        && segments.iter().all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'='))
        })
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(idx, _)| idx);
    &body[..end]
}
