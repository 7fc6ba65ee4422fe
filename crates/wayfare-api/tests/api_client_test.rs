#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wayfare_api::{ApiClient, Error, TransportConfig};

#[derive(Debug, Deserialize, PartialEq)]
struct CabType {
    id: u64,
    name: String,
}

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_bare_array() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cab-types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Sedan" },
            { "id": 2, "name": "SUV", "capacity": 6 },
        ])))
        .mount(&server)
        .await;

    let items: Vec<CabType> = client.list("cab-types", &[]).await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "Sedan");
    assert_eq!(items[1].id, 2);
}

#[tokio::test]
async fn test_list_data_envelope_with_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/locations"))
        .and(query_param("q", "Ja"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": 2, "name": "Jaipur" }],
            "meta": { "total": 1 }
        })))
        .mount(&server)
        .await;

    let items: Vec<CabType> = client
        .list("locations", &[("q".into(), "Ja".into())])
        .await
        .unwrap();

    assert_eq!(
        items,
        vec![CabType {
            id: 2,
            name: "Jaipur".into()
        }]
    );
}

#[tokio::test]
async fn test_get_item_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cab-types/7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": 7, "name": "Tempo" } })),
        )
        .mount(&server)
        .await;

    let item: CabType = client.get("cab-types", "7").await.unwrap();
    assert_eq!(item.id, 7);
    assert_eq!(item.name, "Tempo");
}

#[tokio::test]
async fn test_bearer_token_attached() {
    let server = MockServer::start().await;
    let token = SecretString::from("s3cr3t".to_string());
    let client = ApiClient::from_token(&server.uri(), &token, &TransportConfig::default()).unwrap();

    Mock::given(method("GET"))
        .and(path("/roles"))
        .and(header("authorization", "Bearer s3cr3t"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let items: Vec<CabType> = client.list("roles", &[]).await.unwrap();
    assert!(items.is_empty());
}

// ── Error-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Unauthenticated." })),
        )
        .mount(&server)
        .await;

    let result: Result<Vec<CabType>, Error> = client.list("users", &[]).await;
    match result {
        Err(Error::Authentication { message }) => assert_eq!(message, "Unauthenticated."),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_validation_error_carries_fields() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cab-prices"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "The given data was invalid.",
            "errors": { "cab_type_id": ["The cab type field is required."] }
        })))
        .mount(&server)
        .await;

    let err = client
        .list::<CabType>("cab-prices", &[])
        .await
        .unwrap_err();

    let fields = err.field_errors().unwrap();
    assert_eq!(
        fields["cab_type_id"],
        vec!["The cab type field is required.".to_string()]
    );
}

#[tokio::test]
async fn test_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/hotels/99"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.get::<CabType>("hotels", "99").await.unwrap_err();
    assert!(err.is_not_found(), "expected not found, got: {err:?}");
}

#[tokio::test]
async fn test_rate_limited_reads_retry_after() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/meal-plans"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "12"))
        .mount(&server)
        .await;

    let err = client.list::<CabType>("meal-plans", &[]).await.unwrap_err();
    assert!(matches!(err, Error::RateLimited { retry_after_secs: 12 }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_malformed_body_keeps_raw_text() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/room-types"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.list::<CabType>("room-types", &[]).await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert_eq!(body, "<html>oops</html>"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}
