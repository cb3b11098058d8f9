use httpmock::prelude::*;
use pricewatch::error::{is_transport_error, ApiError};
use pricewatch::http::transport::Transport;
use pricewatch::{Client, Config, ConfigProperties, InMemoryCache, Method, NoCache, Request};
use serde_json::json;
use std::sync::Arc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config(server: &MockServer) -> Config {
    Config::default().with_base_url(format!("{}/api", server.base_url()))
}

fn client(server: &MockServer) -> Client<Transport, InMemoryCache, Config> {
    init_logging();
    Client::from_config(config(server))
}

#[tokio::test]
async fn test_cached_call_twice_hits_server_once() {
    let server = MockServer::start_async().await;
    let body_str = r#"[{"id": 4, "name": "Samsung TV"}]"#;
    let server_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/favorites");
            then.status(200)
                .header("content-type", "application/json")
                .body(body_str);
        })
        .await;

    let client = client(&server);
    let first = client.cached_call(&Request::get("favorites")).await.unwrap();
    let second = client.cached_call(&Request::get("/favorites")).await.unwrap();

    assert!(first.ok());
    assert_eq!(json!([{"id": 4, "name": "Samsung TV"}]), first.json());
    assert_eq!(first.json(), second.json());
    server_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_call_sends_json_content_type_and_body() {
    let server = MockServer::start_async().await;
    let server_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/price-alerts")
                .header("content-type", "application/json")
                .json_body(json!({"product_id": 7, "target_price": 1500}));
            then.status(201).body(r#"{"id": 42}"#);
        })
        .await;

    let client = client(&server);
    let request = Request::new("price-alerts", Method::POST)
        .with_json(&json!({"product_id": 7, "target_price": 1500}))
        .unwrap();
    let response = client.call(&request).await.unwrap();
    assert_eq!(201, response.status());
    assert_eq!(json!({"id": 42}), response.json());
    server_mock.assert_async().await;
}

#[tokio::test]
async fn test_get_with_json_body_sends_the_body() {
    let server = MockServer::start_async().await;
    let tv_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/search").body_contains("tv");
            then.status(200).body(r#"{"hit": "tv"}"#);
        })
        .await;
    let phone_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/search").body_contains("phone");
            then.status(200).body(r#"{"hit": "phone"}"#);
        })
        .await;

    let client = client(&server);
    let tv = Request::get("search").with_json(&json!({"q": "tv"})).unwrap();
    let phone = Request::get("search")
        .with_json(&json!({"q": "phone"}))
        .unwrap();
    assert_eq!(json!({"hit": "tv"}), client.cached_call(&tv).await.unwrap().json());
    assert_eq!(
        json!({"hit": "phone"}),
        client.cached_call(&phone).await.unwrap().json()
    );
    // both are cached under their own key now
    assert_eq!(json!({"hit": "tv"}), client.cached_call(&tv).await.unwrap().json());
    tv_mock.assert_hits_async(1).await;
    phone_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_delete_then_cached_get_goes_to_server() {
    let server = MockServer::start_async().await;
    let delete_mock = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/price-alerts/42");
            then.status(204);
        })
        .await;
    let list_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/price-alerts");
            then.status(200).body("[]");
        })
        .await;

    let client = client(&server);
    let deleted = client
        .call(&Request::new("price-alerts/42", Method::DELETE))
        .await
        .unwrap();
    assert!(deleted.ok());
    // empty 204 body decodes to an empty object
    assert_eq!(json!({}), deleted.json());

    let alerts = client
        .cached_call(&Request::get("price-alerts"))
        .await
        .unwrap();
    assert_eq!(json!([]), alerts.json());
    delete_mock.assert_hits_async(1).await;
    list_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_error_status_is_returned_and_not_cached() {
    let server = MockServer::start_async().await;
    let server_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/favorites");
            then.status(500).body(r#"{"detail": "Database unavailable"}"#);
        })
        .await;

    let client = client(&server);
    for _ in 0..2 {
        let response = client.cached_call(&Request::get("favorites")).await.unwrap();
        assert!(!response.ok());
        assert_eq!(500, response.status());
    }
    server_mock.assert_hits_async(2).await;

    let response = client.call(&Request::get("favorites")).await.unwrap();
    match response.into_data().unwrap_err().downcast_ref::<ApiError>() {
        Some(ApiError::RemoteError { status, detail }) => {
            assert_eq!(500, *status);
            assert_eq!("Database unavailable", detail);
        }
        _ => panic!("Expected remote error"),
    }
}

#[tokio::test]
async fn test_invalidate_forces_fresh_read() {
    let server = MockServer::start_async().await;
    let alerts_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/price-alerts/count");
            then.status(200).body(r#"{"count": 3}"#);
        })
        .await;
    let favorites_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/favorites");
            then.status(200).body("[]");
        })
        .await;

    let client = client(&server);
    client
        .cached_call(&Request::get("price-alerts/count"))
        .await
        .unwrap();
    client.cached_call(&Request::get("favorites")).await.unwrap();
    assert_eq!(1, client.invalidate("price-alerts").unwrap());
    client
        .cached_call(&Request::get("price-alerts/count"))
        .await
        .unwrap();
    client.cached_call(&Request::get("favorites")).await.unwrap();

    alerts_mock.assert_hits_async(2).await;
    favorites_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_session_cookie_is_sent_on_later_requests() {
    let server = MockServer::start_async().await;
    let login_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/login");
            then.status(200)
                .header("set-cookie", "session=abc123; Path=/")
                .body(r#"{"message": "ok"}"#);
        })
        .await;
    let session_mock = server
        .mock_async(|when, then| {
            // the jar may send cookie attributes along with the pair
            when.method(GET)
                .path("/api/verify-session")
                .matches(|req: &HttpMockRequest| {
                    req.headers.iter().flatten().any(|(name, value)| {
                        name.eq_ignore_ascii_case("cookie")
                            && value.split(';').any(|pair| pair.trim() == "session=abc123")
                    })
                });
            then.status(200).body(r#"{"valid": true}"#);
        })
        .await;

    let client = client(&server);
    let request = Request::new("login", Method::POST)
        .with_json(&json!({"email": "a@b.c", "password": "secret"}))
        .unwrap();
    assert!(client.call(&request).await.unwrap().ok());
    assert!(client.check_authenticated().await);
    login_mock.assert_async().await;
    session_mock.assert_async().await;
}

#[tokio::test]
async fn test_check_authenticated_false_on_401() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/verify-session");
            then.status(401).body(r#"{"detail": "Not authenticated"}"#);
        })
        .await;
    assert!(!client(&server).check_authenticated().await);
}

#[tokio::test]
async fn test_server_down_is_transport_error() {
    init_logging();
    let config = Config::default().with_base_url("http://127.0.0.1:9/api");
    let runner = Arc::new(Transport::new(&config));
    let client = Client::new(runner, NoCache, config);
    let request = Request::get("favorites").with_max_retries(0);
    let err = client.call_with_retry(&request).await.unwrap_err();
    assert!(is_transport_error(&err));
    assert!(!client.check_authenticated().await);
}

#[tokio::test]
async fn test_clients_share_cache_through_arc() {
    let server = MockServer::start_async().await;
    let server_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/products");
            then.status(200).body(r#"{"items": []}"#);
        })
        .await;

    let cache = Arc::new(InMemoryCache::new(config(&server).cache_ttl()));
    let runner = Arc::new(Transport::new(&config(&server)));
    let first = Client::new(runner.clone(), cache.clone(), config(&server));
    let second = Client::new(runner, cache.clone(), config(&server));
    first.cached_call(&Request::get("products")).await.unwrap();
    let response = second.cached_call(&Request::get("products")).await.unwrap();
    assert_eq!(json!({"items": []}), response.json());
    assert_eq!(1, cache.len());
    server_mock.assert_hits_async(1).await;
}
