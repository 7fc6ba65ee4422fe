// wayfare-api: Async Rust client for the Wayfare administration REST API

pub mod client;
pub mod error;
pub mod transport;

pub use client::ApiClient;
pub use error::{Error, FieldErrors};
pub use transport::{TlsMode, TransportConfig};
