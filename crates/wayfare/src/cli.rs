//! Clap derive structures for the `wayfare` CLI.
//!
//! Defines the command tree, global flags, and shared value types.

use clap::{Args, Parser, Subcommand, ValueEnum};
use strum::IntoEnumIterator;

use wayfare_core::ResourceKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// wayfare -- browse the booking administration API from a terminal
#[derive(Debug, Parser)]
#[command(
    name = "wayfare",
    version,
    about = "Browse and search Wayfare booking data from the command line",
    long_about = "Command-line access to the Wayfare administration API.\n\n\
        Lists catalog, pricing, trip and access records, fetches single\n\
        records by id, and runs the same search-and-pick flow the console\n\
        pickers use.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "WAYFARE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, env = "WAYFARE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// API access token (overrides profile and keyring)
    #[arg(long, env = "WAYFARE_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "WAYFARE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "WAYFARE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "WAYFARE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List records of one resource
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one record by id
    Get(GetArgs),

    /// Run a picker search and print the options it would offer
    #[command(alias = "s")]
    Search(SearchArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Resource argument ────────────────────────────────────────────────

/// Parse a resource name (`cab-types`, `cab_types`, `Hotels`, ...).
fn parse_resource(s: &str) -> Result<ResourceKind, String> {
    s.parse::<ResourceKind>().map_err(|_| {
        let known: Vec<&str> = ResourceKind::iter().map(ResourceKind::path).collect();
        format!("unknown resource '{s}' (expected one of: {})", known.join(", "))
    })
}

/// A `KEY=VALUE` query parameter.
fn parse_param(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_owned(), v.to_owned())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

// ── Command arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Resource to list (e.g. hotels, cab-types, locations)
    #[arg(value_parser = parse_resource)]
    pub resource: ResourceKind,

    /// Free-text search, sent as the `q` parameter
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Extra query parameter, repeatable
    #[arg(long = "param", short = 'P', value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Print at most N rows
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Resource the record belongs to
    #[arg(value_parser = parse_resource)]
    pub resource: ResourceKind,

    /// Record id (numeric or string)
    pub id: String,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Resource to search
    #[arg(value_parser = parse_resource)]
    pub resource: ResourceKind,

    /// Search text
    pub query: String,

    /// Offer a "create" option for the typed text when nothing matches exactly
    #[arg(long)]
    pub creatable: bool,

    /// Extra query parameter applied to every search, repeatable
    #[arg(long = "param", short = 'P', value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a profile with guided setup
    Init,

    /// Display the current configuration
    Show,

    /// Store the active profile's token in the system keyring
    SetToken,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
