// ── Transport boundary ──
//
// The store only needs "perform a request, get JSON or a typed failure".
// `Transport` is that seam; `ApiClient` is the production implementation
// and tests substitute an in-memory fake.

pub use futures_util::future::BoxFuture;
use serde_json::Value;
use wayfare_api::transport::{TlsMode, TransportConfig};
use wayfare_api::ApiClient;

use crate::config::{AuthCredentials, ConsoleConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::EntityId;
use crate::params::ListParams;

/// Network access as seen by the store.
pub trait Transport: Send + Sync + 'static {
    /// `GET {path}?{params}`, yielding the raw records.
    fn list<'a>(
        &'a self,
        path: &'a str,
        params: &'a ListParams,
    ) -> BoxFuture<'a, Result<Vec<Value>, CoreError>>;

    /// `GET {path}/{id}`.
    fn get<'a>(&'a self, path: &'a str, id: &'a EntityId) -> BoxFuture<'a, Result<Value, CoreError>>;
}

impl Transport for ApiClient {
    fn list<'a>(
        &'a self,
        path: &'a str,
        params: &'a ListParams,
    ) -> BoxFuture<'a, Result<Vec<Value>, CoreError>> {
        Box::pin(async move {
            let query = params.to_query();
            Ok(ApiClient::list::<Value>(self, path, &query).await?)
        })
    }

    fn get<'a>(&'a self, path: &'a str, id: &'a EntityId) -> BoxFuture<'a, Result<Value, CoreError>> {
        Box::pin(async move {
            let id = id.to_string();
            ApiClient::get::<Value>(self, path, &id)
                .await
                .map_err(|e| match e {
                    wayfare_api::Error::NotFound { path } => CoreError::NotFound {
                        resource: path,
                        identifier: id.clone(),
                    },
                    other => other.into(),
                })
        })
    }
}

/// Map core TLS/timeout settings onto the api crate's transport config.
pub fn build_transport(config: &ConsoleConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
    }
}

/// Build the HTTP client described by `config`.
pub fn connect(config: &ConsoleConfig) -> Result<ApiClient, CoreError> {
    let transport = build_transport(config);
    let client = match &config.auth {
        AuthCredentials::Token(token) => {
            ApiClient::from_token(config.api_url.as_str(), token, &transport)?
        }
        AuthCredentials::Anonymous => {
            ApiClient::from_reqwest(config.api_url.as_str(), transport.build_client()?)?
        }
    };
    Ok(client)
}
