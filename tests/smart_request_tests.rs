//! Tests for the smart dispatcher against a scripted transport.

use parking_lot::Mutex;
use route_rest_client::mocks::{MockResponse, MockTokenProvider, MockTransport};
use route_rest_client::{
    ClientOptions, ClientRegistry, DataBag, HttpMethod, RefreshSettings, RequestOptions,
    RestApiClient, RestApiClientBuilder, RestClientEvent, Route, RouteMap,
    RouteRefreshTokenProvider,
};
use serde_json::json;
use std::sync::Arc;

fn routes() -> RouteMap {
    RouteMap::new()
        .with_version("1")
        .with_route(
            "getUser",
            Route::new(HttpMethod::Get, "/users/{id}").with_headers(["authorization"]),
        )
        .with_route(
            "renewToken",
            Route::new(HttpMethod::Post, "/auth/refresh").with_body(["refresh_token"]),
        )
}

fn bag(value: serde_json::Value) -> DataBag {
    value.as_object().cloned().unwrap()
}

async fn client(transport: &Arc<MockTransport>, options: ClientOptions) -> RestApiClient {
    RestApiClientBuilder::from_options(options)
        .route_map(routes())
        .transport(transport.clone())
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_get_with_token_injection() {
    let transport = Arc::new(MockTransport::new());
    transport.queue_json(&json!({"id": 42, "name": "Ada"}));
    let client = client(
        &transport,
        ClientOptions::builder().base_url("https://api.example.com").build(),
    )
    .await;
    client.set_token_provider(Some(Arc::new(MockTokenProvider::new("T", "R"))));

    let options = RequestOptions::new("getUser").with_field("id", 42);
    let response = client.send_smart_request(options.clone()).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.json_data.unwrap()["name"], json!("Ada"));

    let request = transport.last_request().unwrap();
    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(request.url, "https://api.example.com/users/42");
    assert_eq!(request.header("authorization"), Some("T"));
    assert_eq!(options.data, Some(bag(json!({"id": 42}))));
}

#[tokio::test]
async fn test_expired_token_is_renewed_through_route() {
    let transport = Arc::new(MockTransport::new());
    transport.queue(MockResponse::error(401, "token expired"));
    transport.queue_json(&json!({"access_token": "T2", "refresh_token": "R2"}));
    transport.queue_json(&json!({"id": 42}));

    let client = client(
        &transport,
        ClientOptions::builder()
            .base_url("https://api.example.com")
            .retry_route("getUser", Some(bag(json!({"id": 42}))))
            .build(),
    )
    .await;
    let provider = Arc::new(RouteRefreshTokenProvider::new(
        RefreshSettings::new("renewToken"),
        "T1",
        Some("R1".to_string()),
    ));
    client.set_token_provider(Some(provider.clone()));

    let response = client
        .send_smart_request(RequestOptions::new("getUser").with_field("id", 42))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(provider.generation(), 1);

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].header("authorization"), Some("T1"));
    assert_eq!(requests[1].url, "https://api.example.com/auth/refresh");
    assert_eq!(requests[2].header("authorization"), Some("T2"));
}

#[tokio::test]
async fn test_route_map_update_takes_effect_for_next_call() {
    let transport = Arc::new(MockTransport::new());
    let client = client(
        &transport,
        ClientOptions::builder()
            .base_url("https://api.example.com")
            .route_map_url("https://api.example.com/routes")
            .build(),
    )
    .await;

    transport.queue_json(&json!({
        "version": "2",
        "routes": {"getUser": {"method": "GET", "path": "/v2/users/{id}"}}
    }));
    transport.queue_json(&json!({}));

    let before = client.route_map();
    client.update_route_map().await.unwrap();
    assert!(!Arc::ptr_eq(&before, &client.route_map()));

    client
        .send_smart_request(RequestOptions::new("getUser").with_field("id", 7))
        .await
        .unwrap();

    assert_eq!(
        transport.last_request().unwrap().url,
        "https://api.example.com/v2/users/7"
    );
    assert!(client.route_map().route("renewToken").is_none());
}

#[tokio::test]
async fn test_listener_removal() {
    let transport = Arc::new(MockTransport::new());
    transport.set_default(MockResponse::json(&json!({})));
    let client = client(
        &transport,
        ClientOptions::builder().base_url("https://api.example.com").build(),
    )
    .await;

    let count = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&count);
    let id = client.add_event_listener(RestClientEvent::ResponseReceive, move |_| {
        *counter.lock() += 1;
    });

    let options = RequestOptions::new("getUser").with_field("id", 1);
    client.send_smart_request(options.clone()).await.unwrap();
    assert!(client.remove_event_listener(id));
    client.send_smart_request(options).await.unwrap();

    assert_eq!(*count.lock(), 1);
}

#[tokio::test]
async fn test_registry_shares_clients_across_tasks() {
    let transport = Arc::new(MockTransport::new());
    transport.queue_json(&json!({"routes": {"ping": {"method": "GET", "path": "/ping"}}}));
    transport.set_default(MockResponse::json(&json!({"ok": true})));
    let registry = Arc::new(ClientRegistry::new());

    registry
        .create_instance_with(
            RestApiClient::builder()
                .name("api")
                .base_url("https://api.example.com")
                .route_map_path("/routes")
                .transport(transport.clone()),
        )
        .await
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                let client = registry.get_instance("api").unwrap();
                client
                    .send_smart_request(RequestOptions::new("ping"))
                    .await
                    .unwrap()
                    .status
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }
    // One route map fetch plus four calls.
    assert_eq!(transport.request_count(), 5);
}
