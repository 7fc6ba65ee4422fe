//! `wayfare-tui`: terminal console for the Wayfare travel admin API.
//!
//! Built on [ratatui](https://ratatui.rs). Catalog screens (1-6) list the
//! store's slices as they are fetched and refreshed; screen 7 drafts a
//! new cab price with server-searched pickers.
//!
//! Logs go to a file (default `/tmp/wayfare-tui.log`) so they never
//! corrupt the terminal. Connection settings come from the same profiles
//! the `wayfare` CLI uses.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use wayfare_core::Console;

use crate::app::App;

/// Terminal console for the Wayfare travel catalog.
#[derive(Parser, Debug)]
#[command(name = "wayfare-tui", version, about)]
struct Cli {
    /// Config profile to connect with (defaults to the configured default)
    #[arg(short, long, env = "WAYFARE_PROFILE")]
    profile: Option<String>,

    /// Log file path
    #[arg(long, default_value = "/tmp/wayfare-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-only tracing. Hold the guard for the whole run so logs flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("wayfare_tui={level},wayfare_core={level}"))
    });

    let dir = cli
        .log_file
        .parent()
        .unwrap_or_else(|| std::path::Path::new("/tmp"));
    let file = cli
        .log_file
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("wayfare-tui.log"));

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Resolve the profile and build the console. Keeps the profile's refresh
/// interval, unlike the one-shot CLI.
fn connect(requested: Option<&str>) -> Result<(Console, String)> {
    let cfg = wayfare_config::load_config().wrap_err("could not load config")?;
    let name = cfg.profile_name(requested);
    let profile = cfg
        .profile(&name)
        .wrap_err("run `wayfare config init` to create a profile")?;
    let config = wayfare_config::profile_to_console_config(profile, &name)
        .wrap_err_with(|| format!("profile '{name}' is incomplete"))?;
    let console = Console::new(&config).wrap_err("could not build the API client")?;
    Ok((console, name))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let (console, profile) = connect(cli.profile.as_deref())?;
    info!(%profile, "starting wayfare-tui");

    App::new(console, profile).run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["wayfare-tui", "-vv", "-p", "prod"]).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.profile.as_deref(), Some("prod"));
        assert_eq!(cli.log_file, PathBuf::from("/tmp/wayfare-tui.log"));
    }
}
