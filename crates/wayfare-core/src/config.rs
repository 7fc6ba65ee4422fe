// ── Runtime connection configuration ──
//
// Describes *how* to reach the administration API. Carries credentials
// and tuning but never touches disk; the CLI/TUI builds a `ConsoleConfig`
// (usually through wayfare-config) and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// How requests authenticate.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Personal access token sent as `Authorization: Bearer`.
    Token(SecretString),
    /// No credentials (public endpoints, local mocks).
    Anonymous,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (staging hosts with self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for one API endpoint.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// API base URL (e.g., `https://admin.example.com/api`).
    pub api_url: Url,
    pub auth: AuthCredentials,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// How often the background refresh re-fetches (seconds). 0 = never.
    pub refresh_interval_secs: u64,
}

impl ConsoleConfig {
    pub fn new(api_url: Url, auth: AuthCredentials) -> Self {
        Self {
            api_url,
            auth,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            refresh_interval_secs: 0,
        }
    }
}
