//! Integration tests for the reqwest transport
//!
//! Runs the client against a local mock server to check URLs, query strings,
//! bodies, status translation and caching over real HTTP.

use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use http_cache_client::{
    CacheOptions, CacheStrategy, ClientConfig, ErrorKind, HttpClient, HttpError, RequestOptions,
    endpoints,
};

fn client_for(server: &MockServer) -> HttpClient {
    HttpClient::new(ClientConfig::new(format!("{}/", server.uri()))).expect("client should build")
}

#[tokio::test]
async fn test_get_with_query_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/params"))
        .and(query_param("q", "test"))
        .and(query_param("page", "2"))
        .and(header("x-trace", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": 123 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result: Value = client
        .get(
            "params",
            RequestOptions::new()
                .param("q", "test")
                .param("page", 2)
                .header("x-trace", "abc"),
        )
        .await
        .unwrap();

    assert_eq!(result, json!({ "data": 123 }));
}

#[tokio::test]
async fn test_cached_get_hits_server_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first: Value = client.get(&endpoints::todos::list(), RequestOptions::new()).await.unwrap();
    let second: Value = client.get(&endpoints::todos::list(), RequestOptions::new()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(client.cache().len(), 1);
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/todos"))
        .and(body_json(json!({ "title": "ship it" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 9 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let created: Value = client
        .post("/todos", &json!({ "title": "ship it" }), RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(created, json!({ "id": 9 }));
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn test_server_error_message_from_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "Server Error" })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get::<Value>("/error", RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Server);
    assert!(matches!(
        err,
        HttpError::Server { status: 500, ref message } if message == "Server Error"
    ));
}

#[tokio::test]
async fn test_not_found_is_client_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Page not found" })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get::<Value>("/missing", RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Client);
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("Page not found"));
}

#[tokio::test]
async fn test_plain_text_error_body_becomes_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/todos/1"))
        .respond_with(ResponseTemplate::new(409).set_body_string("locked"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .delete::<Value>(&endpoints::todos::by_id(1), RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::Client { status: 409, ref message } if message == "locked"));
}

#[tokio::test]
async fn test_timeout_is_unknown_kind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get::<Value>("/slow", RequestOptions::new().timeout(Duration::from_millis(50)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_network_first_survives_server_going_away() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let options = || {
        RequestOptions::new().cache(CacheOptions::new().strategy(CacheStrategy::NetworkFirst))
    };

    let _: Value = client.get(&endpoints::users::me(), options()).await.unwrap();
    let fallback: Value = client.get(&endpoints::users::me(), options()).await.unwrap();

    assert_eq!(fallback, json!({ "id": 1 }));
}

#[tokio::test]
async fn test_connection_refused_is_unknown_kind() {
    let client = HttpClient::new(ClientConfig::new("http://127.0.0.1:1")).unwrap();

    let err = client
        .get::<Value>("/anything", RequestOptions::new().timeout(Duration::from_secs(2)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unknown);
}
