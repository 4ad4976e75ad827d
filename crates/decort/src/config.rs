//! CLI-aware wrappers over `decort-config`: profile selection with flag
//! overrides, and provider construction.

use std::sync::Arc;

use secrecy::SecretString;
use url::Url;

use decort_api::{ClientConfig, Credentials, DecortClient};
use decort_config::{
    Config, ConfigError, Profile, SystemSecrets, config_path, load_config,
    profile_to_client_config, provider_options,
};
use decort_core::{CoreError, Provider, ProviderOptions};

use crate::cli::GlobalOpts;
use crate::error::CliError;

fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config(global.config_file.as_deref())?)
}

/// The active profile with `--controller-url` / `--insecure` applied.
///
/// Without a matching profile, `--controller-url` alone selects a bearer
/// profile whose token comes from `DECORT_TOKEN` or the keyring.
fn resolve_profile(global: &GlobalOpts, cfg: &Config) -> Result<(String, Profile), CliError> {
    let (name, mut profile) = match cfg.profile(global.profile.as_deref()) {
        Ok((name, profile)) => (name, profile.clone()),
        Err(ConfigError::UnknownProfile { name }) if global.controller_url.is_some() => (
            name,
            Profile {
                authenticator: "bearer".into(),
                ..Profile::default()
            },
        ),
        Err(ConfigError::UnknownProfile { name }) => {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(cfg),
                path: global
                    .config_file
                    .clone()
                    .unwrap_or_else(config_path)
                    .display()
                    .to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(url) = &global.controller_url {
        profile.controller_url.clone_from(url);
    }
    if global.insecure {
        profile.allow_insecure_tls = Some(true);
    }
    Ok((name, profile))
}

fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Provider bound to the active profile's platform and credentials.
pub fn build_provider(global: &GlobalOpts) -> Result<Provider, CliError> {
    let cfg = load(global)?;
    let (name, profile) = resolve_profile(global, &cfg)?;
    let client_config = profile_to_client_config(&profile, &name, &cfg.defaults, &SystemSecrets)?;
    tracing::debug!(
        profile = %name,
        controller_url = %client_config.controller_url,
        authenticator = %client_config.credentials.authenticator(),
        "resolved profile"
    );
    let client = DecortClient::new(client_config).map_err(CoreError::from)?;
    Ok(Provider::new(Arc::new(client), provider_options(&profile)))
}

/// Provider for commands that never reach the platform (schemas, plan
/// checks). Its client has no credentials, so any call fails.
pub fn catalog_provider() -> Result<Provider, CliError> {
    let url = Url::parse("http://localhost/").map_err(|e| CliError::Config {
        message: e.to_string(),
    })?;
    let config = ClientConfig::new(
        url,
        Credentials::Bearer {
            token: SecretString::from(String::new()),
        },
    );
    let client = DecortClient::new(config).map_err(CoreError::from)?;
    Ok(Provider::new(Arc::new(client), ProviderOptions::default()))
}
