//! Integration tests for the Panaderia HTTP client

#![cfg(feature = "client")]

use panaderia_core::{SessionStore, TokenSource};
use panaderia_http::client::{ClientError, FetchClient, FetchOptions, RequestBody};
use panaderia_http::types::{
    LoginRequest, ProductTypeInput, ProductTypeQuery, ProductTypeStatus, RegisterRequest,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct StaticToken(Option<&'static str>);

impl TokenSource for StaticToken {
    fn access_token(&self) -> Option<String> {
        self.0.map(str::to_string)
    }
}

fn client_with_token(server: &MockServer, token: Option<&'static str>) -> FetchClient {
    FetchClient::builder()
        .base_url(server.uri())
        .token_source(Arc::new(StaticToken(token)))
        .build()
        .unwrap()
}

async fn only_request_header(server: &MockServer, name: &str) -> Option<String> {
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    requests[0]
        .headers
        .get(name)
        .map(|v| v.to_str().unwrap().to_string())
}

#[tokio::test]
async fn test_success_returns_parsed_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ping/"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"a":1}"#))
        .mount(&mock_server)
        .await;

    let client = FetchClient::new(mock_server.uri()).unwrap();
    let value = client
        .fetch_json("/v1/ping/", FetchOptions::get())
        .await
        .unwrap();
    assert_eq!(value, json!({"a": 1}));
}

#[tokio::test]
async fn test_error_status_carries_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/missing/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "not found"})))
        .mount(&mock_server)
        .await;

    let client = FetchClient::new(mock_server.uri()).unwrap();
    let err = client
        .fetch_json("v1/missing/", FetchOptions::get())
        .await
        .unwrap_err();

    let api = err.api().expect("api error");
    assert_eq!(api.status, 404);
    assert_eq!(api.detail(), Some("not found"));
    assert_eq!(api.data, json!({"detail": "not found"}));
}

#[tokio::test]
async fn test_no_content_is_null() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/tipo-producto/4/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = FetchClient::new(mock_server.uri()).unwrap();
    let value = client
        .fetch_json("v1/tipo-producto/4/", FetchOptions::delete())
        .await
        .unwrap();
    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn test_malformed_json_kept_as_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/html/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<h1>Bad Gateway</h1>"))
        .mount(&mock_server)
        .await;

    let client = FetchClient::new(mock_server.uri()).unwrap();
    let err = client
        .fetch_json("v1/html/", FetchOptions::get())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert_eq!(err.api().unwrap().data, json!("<h1>Bad Gateway</h1>"));
}

#[tokio::test]
async fn test_empty_error_body_is_null() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = FetchClient::new(mock_server.uri()).unwrap();
    let err = client
        .fetch_json("v1/anything/", FetchOptions::get())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.api().unwrap().data, Value::Null);
}

#[tokio::test]
async fn test_whitespace_body_kept_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("  \n"))
        .mount(&mock_server)
        .await;

    let client = FetchClient::new(mock_server.uri()).unwrap();
    let value = client
        .fetch_json("v1/anything/", FetchOptions::get())
        .await
        .unwrap();
    assert_eq!(value, json!("  \n"));
}

#[tokio::test]
async fn test_auth_attaches_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/private/"))
        .and(header("authorization", "Bearer tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_with_token(&mock_server, Some("tok123"));
    let value = client
        .fetch_json("v1/private/", FetchOptions::get().authenticated())
        .await
        .unwrap();
    assert_eq!(value["ok"], true);
}

#[tokio::test]
async fn test_auth_without_token_sends_no_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = client_with_token(&mock_server, None);
    client
        .fetch_json("v1/private/", FetchOptions::get().authenticated())
        .await
        .unwrap();
    assert_eq!(only_request_header(&mock_server, "authorization").await, None);
}

#[tokio::test]
async fn test_unauthenticated_request_skips_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = client_with_token(&mock_server, Some("tok123"));
    client
        .fetch_json("v1/public/", FetchOptions::get())
        .await
        .unwrap();
    assert_eq!(only_request_header(&mock_server, "authorization").await, None);
}

#[tokio::test]
async fn test_caller_authorization_is_kept() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("authorization", "Token custom"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_with_token(&mock_server, Some("tok123"));
    client
        .fetch_json(
            "v1/private/",
            FetchOptions::get()
                .authenticated()
                .header(AUTHORIZATION, HeaderValue::from_static("Token custom")),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_json_body_sets_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/echo/"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"nombre": "Pan"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = FetchClient::new(mock_server.uri()).unwrap();
    let value = client
        .fetch_json(
            "v1/echo/",
            FetchOptions::post(RequestBody::Json(json!({"nombre": "Pan"}))),
        )
        .await
        .unwrap();
    assert_eq!(value["id"], 1);
}

#[tokio::test]
async fn test_caller_content_type_is_kept() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = FetchClient::new(mock_server.uri()).unwrap();
    client
        .fetch_json(
            "v1/echo/",
            FetchOptions::post(RequestBody::Json(json!({})))
                .header(CONTENT_TYPE, HeaderValue::from_static("application/vnd.api+json")),
        )
        .await
        .unwrap();
    assert_eq!(
        only_request_header(&mock_server, "content-type").await.as_deref(),
        Some("application/vnd.api+json")
    );
}

#[tokio::test]
async fn test_text_body_passes_through() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = FetchClient::new(mock_server.uri()).unwrap();
    client
        .fetch_json("v1/raw/", FetchOptions::post(RequestBody::Text("hola".into())))
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests[0].body, b"hola");
    assert!(requests[0].headers.get("content-type").is_none());
}

#[tokio::test]
async fn test_query_pairs_are_encoded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/tipo-producto/"))
        .and(query_param("search", "pan dulce"))
        .and(query_param("estado", "Activo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_with_token(&mock_server, Some("tok"));
    let query = ProductTypeQuery {
        search: Some("pan dulce".into()),
        estado: Some(ProductTypeStatus::Activo),
    };
    let page = client.list_product_types(&query, None).await.unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn test_cancellation_aborts_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let client = FetchClient::new(mock_server.uri()).unwrap();
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = client
        .fetch_json("v1/slow/", FetchOptions::get().cancel_with(token))
        .await
        .unwrap_err();
    assert!(err.is_aborted());
}

#[tokio::test]
async fn test_transport_failure_is_request_error() {
    let mock_server = MockServer::start().await;
    let uri = mock_server.uri();
    drop(mock_server);

    let client = FetchClient::new(uri).unwrap();
    let err = client
        .fetch_json("v1/ping/", FetchOptions::get())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Request(_)));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_sign_in_stores_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/login/"))
        .and(body_json(json!({"email": "ana@example.com", "password": "secreto1!"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "a1",
            "refresh": "r1",
            "user": {"email": "ana@example.com", "nombre_completo": "Ana Paz"},
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/login/logs/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/tipo-producto/"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Sin resultados."})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(SessionStore::in_memory());
    let client = FetchClient::builder()
        .base_url(mock_server.uri())
        .token_source(store.clone())
        .build()
        .unwrap();

    let session = client
        .sign_in(&store, &LoginRequest::new(" Ana@Example.com", "secreto1!"), true)
        .await
        .unwrap();
    assert!(session.is_authenticated);
    assert!(session.remember);
    assert_eq!(session.refresh_token.as_deref(), Some("r1"));

    let page = client
        .list_product_types(&ProductTypeQuery::default(), None)
        .await
        .unwrap();
    assert_eq!(page.message.as_deref(), Some("Sin resultados."));
}

#[tokio::test]
async fn test_failed_sign_in_leaves_store_untouched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/login/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "No active account found with the given credentials",
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/login/logs/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = SessionStore::in_memory();
    let client = FetchClient::new(mock_server.uri()).unwrap();
    let err = client
        .sign_in(&store, &LoginRequest::new("ana@example.com", "nope"), false)
        .await
        .unwrap_err();
    assert!(err.is_auth_expired());
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn test_register_endpoint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/register/"))
        .and(body_json(json!({
            "nombre_completo": "Ana Paz",
            "email": "ana@example.com",
            "password": "secreto1!",
            "password2": "secreto1!",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Registro exitoso",
            "next": "/login",
        })))
        .mount(&mock_server)
        .await;

    let client = FetchClient::new(mock_server.uri()).unwrap();
    let response = client
        .register(&RegisterRequest::new(
            "Ana Paz ",
            "ANA@example.com",
            "secreto1!",
            "secreto1!",
        ))
        .await
        .unwrap();
    assert_eq!(response.next.as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_refresh_session_keeps_tier() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh/"))
        .and(body_json(json!({"refresh": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .mount(&mock_server)
        .await;

    let store = SessionStore::in_memory();
    store.set_session(
        panaderia_core::SessionPayload::tokens("a1", Some("r1".into())),
        panaderia_core::SessionOptions::remember(true),
    );

    let client = FetchClient::new(mock_server.uri()).unwrap();
    let session = client.refresh_session(&store).await.unwrap().unwrap();
    assert_eq!(session.access_token(), Some("a2"));
    assert_eq!(session.refresh_token.as_deref(), Some("r1"));
    assert!(session.remember);
}

#[tokio::test]
async fn test_product_type_mutations() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/tipo-producto/"))
        .and(body_json(json!({"nombre": "Pan", "descripcion": "", "activo": true})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Tipo de producto creado correctamente.",
            "id": 9,
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/v1/tipo-producto/9/estado/"))
        .and(body_json(json!({"activo": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Tipo de producto desactivado correctamente.",
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/v1/tipo-producto/9/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "No se encontró el tipo de producto solicitado.",
        })))
        .mount(&mock_server)
        .await;

    let client = client_with_token(&mock_server, Some("tok"));

    let created = client
        .create_product_type(&ProductTypeInput::new(" Pan ", "", true))
        .await
        .unwrap();
    assert_eq!(created.id, 9);

    let response = client.set_product_type_active(9, false).await.unwrap();
    assert_eq!(
        response.text(),
        Some("Tipo de producto desactivado correctamente.")
    );

    let err = client
        .update_product_type(9, &ProductTypeInput::new("Pan", "x", true))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}
