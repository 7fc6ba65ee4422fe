// ── Core error types ──
//
// User-facing errors from wayfare-core. Consumers never see reqwest or
// serde errors directly; `From<wayfare_api::Error>` translates them.
// CoreError is `Clone` because a failure is both reduced into the store
// and handed back to the caller that started the fetch.

use thiserror::Error;
pub use wayfare_api::FieldErrors;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {resource} {identifier}")]
    NotFound {
        resource: String,
        identifier: String,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed {
        message: String,
        field_errors: FieldErrors,
    },

    #[error("Could not decode {resource}: {message}")]
    Decode { resource: String, message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Field-level validation messages for inline form display.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::ValidationFailed { field_errors, .. } if !field_errors.is_empty() => {
                Some(field_errors)
            }
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<wayfare_api::Error> for CoreError {
    fn from(err: wayfare_api::Error) -> Self {
        match err {
            wayfare_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            wayfare_api::Error::Forbidden { message } => CoreError::PermissionDenied { message },
            wayfare_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            wayfare_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            wayfare_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            wayfare_api::Error::RateLimited { retry_after_secs } => CoreError::Api {
                message: format!("Rate limited -- retry after {retry_after_secs}s"),
                status: Some(429),
            },
            wayfare_api::Error::NotFound { path } => CoreError::NotFound {
                resource: "resource".into(),
                identifier: path,
            },
            wayfare_api::Error::Validation {
                message,
                field_errors,
            } => CoreError::ValidationFailed {
                message,
                field_errors,
            },
            wayfare_api::Error::Status { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            wayfare_api::Error::Deserialization { message, body: _ } => CoreError::Decode {
                resource: "response".into(),
                message,
            },
        }
    }
}
