// REST API HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, bearer-token headers,
// list/item envelope unwrapping and status-code normalization. Endpoint
// paths are supplied by the caller; this module only knows transport
// mechanics.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, FieldErrors};
use crate::transport::TransportConfig;

const BODY_PREVIEW_LEN: usize = 200;

/// List responses arrive either as a bare array or wrapped in `{ "data": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// Single-record responses: `{ "data": {...} }` or the bare object.
#[derive(Deserialize)]
#[serde(untagged)]
enum Record<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Record<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// Error body shape: `{ "message": "...", "errors": { "field": ["msg"] } }`.
#[derive(Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: BTreeMap<String, Messages>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Messages {
    Many(Vec<String>),
    One(String),
}

impl From<Messages> for Vec<String> {
    fn from(m: Messages) -> Self {
        match m {
            Messages::Many(v) => v,
            Messages::One(s) => vec![s],
        }
    }
}

/// Raw HTTP client for the administration REST API.
///
/// All methods return unwrapped payloads -- envelopes are stripped and
/// non-success statuses are converted to [`Error`] before the caller sees
/// them.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client that authenticates every request with a bearer token.
    pub fn from_token(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| Error::Authentication {
                message: "token contains characters not allowed in an HTTP header".into(),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = transport.build_client_with_headers(headers)?;
        Self::from_reqwest(base_url, http)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// No headers are added; useful for tests and for callers that manage
    /// authentication themselves.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Join a resource path onto the base URL: `{base}/{path}`.
    pub(crate) fn resource_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// List a resource collection.
    ///
    /// `GET {base}/{path}?{query}`
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Vec<T>, Error> {
        let url = self.resource_url(path)?;
        debug!(%url, params = query.len(), "GET list");

        let resp = self.http.get(url).query(query).send().await?;
        let body = Self::read_body(resp).await?;
        let listing: Listing<T> = decode(&body)?;
        Ok(listing.into_vec())
    }

    /// Fetch a single record by id.
    ///
    /// `GET {base}/{path}/{id}`
    pub async fn get<T: DeserializeOwned>(&self, path: &str, id: &str) -> Result<T, Error> {
        let path = format!("{}/{id}", path.trim_end_matches('/'));
        let url = self.resource_url(&path)?;
        debug!(%url, "GET item");

        let resp = self.http.get(url).send().await?;
        let body = Self::read_body(resp).await?;
        let record: Record<T> = decode(&body)?;
        Ok(record.into_inner())
    }

    // ── Response handling ────────────────────────────────────────────

    /// Return the body text of a successful response, or the normalized
    /// error for any other status.
    async fn read_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        let path = resp.url().path().to_owned();

        if status.is_success() {
            let body = resp.text().await?;
            trace!(%status, bytes = body.len(), "response body received");
            return Ok(body);
        }

        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = resp.text().await.unwrap_or_default();
        debug!(%status, %path, "request failed");

        Err(normalize_error(status, path, retry_after, &body))
    }
}

/// Map a non-success status and its body into an [`Error`].
fn normalize_error(status: StatusCode, path: String, retry_after: Option<u64>, body: &str) -> Error {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .clone()
        .unwrap_or_else(|| preview(body).to_owned());

    match status {
        StatusCode::UNAUTHORIZED => Error::Authentication { message },
        StatusCode::FORBIDDEN => Error::Forbidden { message },
        StatusCode::NOT_FOUND => Error::NotFound { path },
        StatusCode::UNPROCESSABLE_ENTITY => {
            let field_errors: FieldErrors = parsed
                .errors
                .into_iter()
                .map(|(field, msgs)| (field, msgs.into()))
                .collect();
            Error::Validation {
                message,
                field_errors,
            }
        }
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited {
            retry_after_secs: retry_after.unwrap_or(1),
        },
        other => Error::Status {
            status: other.as_u16(),
            message,
        },
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    })
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
