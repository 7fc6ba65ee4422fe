//! CLI configuration -- thin layer over `wayfare_config`.
//!
//! Adds resolution that respects `GlobalOpts` overrides (`--api-url`,
//! `--token`, `--insecure`, `--timeout`) on top of the stored profile.

use std::time::Duration;

use secrecy::SecretString;

use wayfare_core::{AuthCredentials, ConsoleConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use wayfare_config::{Config, Profile, config_path, load_config_or_default, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref())
}

/// Build the `ConsoleConfig` for a data command.
///
/// A stored profile is used when present, with flags layered on top.
/// Without one, `--api-url` and `--token` must both be given.
pub fn build_console_config(global: &GlobalOpts, cfg: &Config) -> Result<ConsoleConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            names.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        None => Profile::default(),
    };

    resolve_profile(&profile, &profile_name, global)
}

/// Translate a `Profile` + global flags into a `ConsoleConfig`.
///
/// Flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<ConsoleConfig, CliError> {
    let mut profile = profile.clone();
    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }
    if profile.api_url.trim().is_empty() {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(secs) = global.timeout {
        profile.timeout = Some(secs);
    }

    let token = match global.token {
        Some(ref token) => SecretString::from(token.clone()),
        None => wayfare_config::resolve_token(&profile, profile_name)?,
    };

    let mut config =
        wayfare_config::build_console_config(&profile, AuthCredentials::Token(token))?;
    // One-shot commands never refresh in the background.
    config.refresh_interval_secs = 0;
    Ok(config)
}

/// Human-readable TLS mode for `config show`.
pub fn describe_tls(tls: &TlsVerification) -> String {
    match tls {
        TlsVerification::SystemDefaults => "system roots".into(),
        TlsVerification::CustomCa(path) => format!("custom CA ({})", path.display()),
        TlsVerification::DangerAcceptInvalid => "accept invalid certificates".into(),
    }
}

/// Seconds, for display.
pub fn describe_timeout(timeout: Duration) -> String {
    format!("{}s", timeout.as_secs())
}
