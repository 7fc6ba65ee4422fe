//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};
use serde::Serialize;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

/// `config show` view. Tokens are never printed, only where they live.
#[derive(Debug, Serialize)]
struct ConfigView<'a> {
    path: String,
    default_profile: Option<&'a str>,
    output: &'a str,
    color: &'a str,
    timeout: u64,
    profiles: Vec<ProfileView<'a>>,
}

#[derive(Debug, Serialize)]
struct ProfileView<'a> {
    name: &'a str,
    api_url: &'a str,
    token: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_env: Option<&'a str>,
    insecure: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_interval: Option<u64>,
}

impl<'a> ConfigView<'a> {
    fn new(cfg: &'a Config) -> Self {
        let mut profiles: Vec<ProfileView<'a>> = cfg
            .profiles
            .iter()
            .map(|(name, p)| ProfileView {
                name,
                api_url: &p.api_url,
                token: if p.token.is_some() {
                    "plaintext"
                } else if p.token_env.is_some() {
                    "env"
                } else {
                    "keyring"
                },
                token_env: p.token_env.as_deref(),
                insecure: p.insecure.unwrap_or(false),
                timeout: p.timeout,
                refresh_interval: p.refresh_interval,
            })
            .collect();
        profiles.sort_by(|a, b| a.name.cmp(b.name));

        Self {
            path: config::config_path().display().to_string(),
            default_profile: cfg.default_profile.as_deref(),
            output: &cfg.defaults.output,
            color: &cfg.defaults.color,
            timeout: cfg.defaults.timeout,
            profiles,
        }
    }

    fn detail(&self) -> String {
        let mut lines = vec![
            format!("Config path:     {}", self.path),
            format!(
                "Default profile: {}",
                self.default_profile.unwrap_or("(none)")
            ),
            format!(
                "Defaults:        output={} color={} timeout={}s",
                self.output, self.color, self.timeout
            ),
        ];
        if self.profiles.is_empty() {
            lines.push("Profiles:        (none, run `wayfare config init`)".into());
        }
        for p in &self.profiles {
            let marker = if Some(p.name) == self.default_profile {
                "*"
            } else {
                " "
            };
            lines.push(format!(
                "{marker} {:<12} {}  token: {}{}",
                p.name,
                p.api_url,
                p.token,
                if p.insecure { "  (insecure)" } else { "" }
            ));
        }
        lines.join("\n")
    }
}

/// Prompt for a token without echo. Empty input is rejected.
fn prompt_token() -> Result<String, CliError> {
    let token = rpassword::prompt_password("API token: ").map_err(prompt_err)?;
    if token.trim().is_empty() {
        return Err(CliError::Validation {
            field: "token".into(),
            reason: "token cannot be empty".into(),
        });
    }
    Ok(token.trim().to_owned())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let view = ConfigView::new(&cfg);
            let out = output::render_single(
                global.output,
                &view,
                ConfigView::detail,
                |v| v.path.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetToken => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let token = match global.token {
                Some(ref token) => token.clone(),
                None => prompt_token()?,
            };
            wayfare_config::store_token(&profile_name, &token)?;
            if !global.quiet {
                eprintln!("✓ Token for '{profile_name}' stored in system keyring");
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
                names.sort_unstable();
                return Err(CliError::ProfileNotFound {
                    name,
                    available: if names.is_empty() {
                        "(none)".into()
                    } else {
                        names.join(", ")
                    },
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }
    }
}

/// Interactive wizard: one profile, token in keyring or config.
fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("Wayfare CLI configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let mut cfg = config::load_config_or_default();

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default(global.profile.clone().unwrap_or_else(|| "default".into()))
        .interact_text()
        .map_err(prompt_err)?;

    if cfg.profiles.contains_key(&profile_name) {
        let overwrite = Confirm::new()
            .with_prompt(format!("Profile '{profile_name}' exists. Overwrite?"))
            .default(false)
            .interact()
            .map_err(prompt_err)?;
        if !overwrite {
            eprintln!("Aborted, nothing written.");
            return Ok(());
        }
    }

    let api_url: String = Input::new()
        .with_prompt("API base URL")
        .default(
            global
                .api_url
                .clone()
                .unwrap_or_else(|| "https://admin.example.com/api".into()),
        )
        .validate_with(|input: &String| -> Result<(), String> {
            url::Url::parse(input)
                .map(|_| ())
                .map_err(|e| format!("invalid URL: {e}"))
        })
        .interact_text()
        .map_err(prompt_err)?;

    let token = prompt_token()?;

    let store_choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let store_selection = Select::new()
        .with_prompt("Where to store the token?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let plaintext = if store_selection == 0 {
        wayfare_config::store_token(&profile_name, &token)?;
        eprintln!("   ✓ Token stored in system keyring");
        None
    } else {
        Some(token)
    };

    let profile = Profile {
        api_url,
        token: plaintext,
        insecure: global.insecure.then_some(true),
        ..Profile::default()
    };
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: wayfare list locations");
    Ok(())
}
