//! Provider configuration for DECORT tools.
//!
//! TOML profiles, credential resolution (env, keyring, plaintext), and
//! translation into `decort_api::ClientConfig` plus the provider options
//! the reconcilers read.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use decort_api::{Authenticator, ClientConfig, Credentials};
use decort_core::ProviderOptions;

/// Keyring service under which secrets are stored.
pub const KEYRING_SERVICE: &str = "decort";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' is missing required setting '{field}'")]
    Missing { profile: String, field: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub allow_insecure_tls: bool,

    /// Per-request HTTP timeout in seconds. Unset leaves the client's own
    /// ceiling in place, which sits above every operation budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// One platform endpoint and the credentials used against it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// `legacy`, `oauth2` or `bearer`.
    #[serde(default = "default_authenticator")]
    pub authenticator: String,

    /// Platform base URL, e.g. "https://cloud.example.com".
    #[serde(default)]
    pub controller_url: String,

    /// SSO base URL; required for oauth2.
    pub oauth2_url: Option<String>,

    pub user: Option<String>,

    /// Plaintext password (prefer keyring or `DECORT_PASSWORD`).
    pub password: Option<String>,

    pub app_id: Option<String>,

    /// Plaintext application secret (prefer keyring or `DECORT_APP_SECRET`).
    pub app_secret: Option<String>,

    /// Pre-issued JWT (prefer keyring or `DECORT_TOKEN`).
    pub token: Option<String>,

    /// Override of `defaults.allow_insecure_tls`.
    pub allow_insecure_tls: Option<bool>,

    /// Override of `defaults.timeout`.
    pub timeout: Option<u64>,

    #[serde(default)]
    pub recreate_destroyed_disks: bool,
}

fn default_authenticator() -> String {
    "oauth2".into()
}

impl Config {
    /// Pick a profile by name, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into());
        match self.profiles.get(&name) {
            Some(profile) => Ok((name, profile)),
            None => Err(ConfigError::UnknownProfile { name }),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "decort", "decort").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("decort");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config: built-in defaults, then the TOML file, then
/// `DECORT_` environment variables (`__` separates nested keys).
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("DECORT_").split("__").only(&[
            "default_profile",
            "defaults.allow_insecure_tls",
            "defaults.timeout",
        ]));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Where secrets are looked up before falling back to the profile.
pub trait SecretStore {
    fn env(&self, key: &str) -> Option<String>;
    fn keyring(&self, profile: &str, field: &str) -> Option<String>;
}

/// Process environment plus the system keyring.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSecrets;

impl SecretStore for SystemSecrets {
    fn env(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn keyring(&self, profile: &str, field: &str) -> Option<String> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile}/{field}")).ok()?;
        entry.get_password().ok()
    }
}

/// Env var, then keyring, then plaintext in the profile.
fn resolve_secret(
    store: &dyn SecretStore,
    profile_name: &str,
    field: &str,
    env_key: &str,
    plaintext: Option<&str>,
) -> Result<SecretString, ConfigError> {
    store
        .env(env_key)
        .or_else(|| store.keyring(profile_name, field))
        .or_else(|| plaintext.filter(|s| !s.is_empty()).map(str::to_owned))
        .map(SecretString::from)
        .ok_or_else(|| missing(profile_name, field))
}

fn required(
    store: &dyn SecretStore,
    profile_name: &str,
    field: &str,
    env_key: &str,
    value: Option<&str>,
) -> Result<String, ConfigError> {
    store
        .env(env_key)
        .or_else(|| value.filter(|s| !s.is_empty()).map(str::to_owned))
        .ok_or_else(|| missing(profile_name, field))
}

fn missing(profile: &str, field: &str) -> ConfigError {
    ConfigError::Missing {
        profile: profile.into(),
        field: field.into(),
    }
}

pub fn authenticator(profile: &Profile) -> Result<Authenticator, ConfigError> {
    profile
        .authenticator
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "authenticator".into(),
            reason: format!(
                "expected 'legacy', 'oauth2', or 'bearer', got '{}'",
                profile.authenticator
            ),
        })
}

/// Resolve the credentials a profile's authenticator needs.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
    store: &dyn SecretStore,
) -> Result<Credentials, ConfigError> {
    match authenticator(profile)? {
        Authenticator::Legacy => Ok(Credentials::Legacy {
            user: required(
                store,
                profile_name,
                "user",
                "DECORT_USER",
                profile.user.as_deref(),
            )?,
            password: resolve_secret(
                store,
                profile_name,
                "password",
                "DECORT_PASSWORD",
                profile.password.as_deref(),
            )?,
        }),
        Authenticator::OAuth2 => Ok(Credentials::OAuth2 {
            app_id: required(
                store,
                profile_name,
                "app_id",
                "DECORT_APP_ID",
                profile.app_id.as_deref(),
            )?,
            app_secret: resolve_secret(
                store,
                profile_name,
                "app_secret",
                "DECORT_APP_SECRET",
                profile.app_secret.as_deref(),
            )?,
        }),
        Authenticator::Bearer => Ok(Credentials::Bearer {
            token: resolve_secret(
                store,
                profile_name,
                "token",
                "DECORT_TOKEN",
                profile.token.as_deref(),
            )?,
        }),
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

/// Build a `ClientConfig` from a profile and the global defaults.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    store: &dyn SecretStore,
) -> Result<ClientConfig, ConfigError> {
    if profile.controller_url.is_empty() {
        return Err(missing(profile_name, "controller_url"));
    }
    let controller_url = parse_url("controller_url", &profile.controller_url)?;
    let credentials = resolve_credentials(profile, profile_name, store)?;

    let oauth2_url = profile
        .oauth2_url
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|raw| parse_url("oauth2_url", raw))
        .transpose()?;
    if oauth2_url.is_none() && credentials.authenticator() == Authenticator::OAuth2 {
        return Err(missing(profile_name, "oauth2_url"));
    }

    let mut config = ClientConfig::new(controller_url, credentials)
        .with_insecure_tls(profile.allow_insecure_tls.unwrap_or(defaults.allow_insecure_tls));
    if let Some(url) = oauth2_url {
        config = config.with_oauth2_url(url);
    }
    if let Some(secs) = profile.timeout.or(defaults.timeout) {
        config.request_timeout = Duration::from_secs(secs);
    }
    Ok(config)
}

pub fn provider_options(profile: &Profile) -> ProviderOptions {
    ProviderOptions {
        recreate_destroyed_disks: profile.recreate_destroyed_disks,
    }
}
