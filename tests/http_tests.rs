//! End-to-end tests over HTTP with the reqwest transport.

use route_rest_client::{
    ClientOptions, ClientRegistry, RefreshSettings, RequestOptions, RouteRefreshTokenProvider,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_route_map(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/routes.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "1",
            "dateModified": "2026-01-01",
            "routes": {
                "getUser": {
                    "method": "GET",
                    "path": "/users/{id}",
                    "queries": ["fields"],
                    "headers": ["authorization"]
                },
                "createUser": {
                    "method": "POST",
                    "path": "/users",
                    "headers": ["authorization"],
                    "body": ["name"]
                },
                "renewToken": {
                    "method": "POST",
                    "path": "/auth/refresh",
                    "body": ["refresh_token"]
                }
            }
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn options(server: &MockServer) -> ClientOptions {
    ClientOptions::builder()
        .name("users")
        .api_version("v1")
        .host(server.uri())
        .base_path("/api")
        .route_map_path("/{apiVersion}/routes.json")
        .build()
}

#[tokio::test]
async fn test_route_map_fetch_and_get() {
    let server = MockServer::start().await;
    mount_route_map(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/users/42"))
        .and(query_param("fields", "name,email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
        .mount(&server)
        .await;

    let registry = ClientRegistry::new();
    let client = registry.create_instance(options(&server)).await.unwrap();
    // Cached: the route map is not fetched twice.
    registry.create_instance(options(&server)).await.unwrap();

    assert_eq!(client.route_map().date_modified.as_deref(), Some("2026-01-01"));

    let response = client
        .send_smart_request(
            RequestOptions::new("getUser")
                .with_field("id", 42)
                .with_field("fields", "name,email"),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.json_data, Some(json!({"id": 42})));
}

#[tokio::test]
async fn test_post_body_and_token_renewal() {
    let server = MockServer::start().await;
    mount_route_map(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/users"))
        .and(header("authorization", "stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({"refresh_token": "R1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/users"))
        .and(header("authorization", "fresh"))
        .and(body_json(json!({"name": "Ada"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let mut data = serde_json::Map::new();
    data.insert("name".to_string(), json!("Ada"));
    let mut options = options(&server);
    options.route_name = Some("createUser".to_string());
    options.data = Some(data);

    let registry = ClientRegistry::new();
    let client = registry.create_instance(options).await.unwrap();
    client.set_token_provider(Some(Arc::new(RouteRefreshTokenProvider::new(
        RefreshSettings::new("renewToken"),
        "stale",
        Some("R1".to_string()),
    ))));

    let response = client
        .send_smart_request(RequestOptions::new("createUser").with_field("name", "Ada"))
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.json_data, Some(json!({"id": 7})));
}

#[tokio::test]
async fn test_unreachable_host_is_connection_error() {
    let server = MockServer::start().await;
    mount_route_map(&server).await;

    let registry = ClientRegistry::new();
    let client = registry.create_instance(options(&server)).await.unwrap();
    client.set_route_map(
        route_rest_client::RouteMap::new().with_route(
            "down",
            route_rest_client::Route::new(
                route_rest_client::HttpMethod::Get,
                "http://127.0.0.1:9/down",
            ),
        ),
    );

    let response = client
        .send_smart_request(RequestOptions::new("down"))
        .await
        .unwrap();

    assert!(response.is_connection_error());
}
