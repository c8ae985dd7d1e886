//! Integration tests for the directions client

use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use tourcast_engine::routing::{RouteRequest, RoutingClient, RoutingError};
use tourcast_engine::secrets::SecretString;

fn client(server: &MockServer) -> RoutingClient {
    RoutingClient::new(
        server.uri(),
        Some(SecretString::from("kakao-test-key")),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_first_route_is_returned() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/directions"))
        .and(header("authorization", "KakaoAK kakao-test-key"))
        .and(query_param("origin", "127.0276,37.4979"))
        .and(query_param("destination", "127.0473,37.5088"))
        .and(query_param("waypoints", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trans_id": "abc",
            "routes": [
                {"result_code": 0, "summary": {"distance": 3200, "duration": 780}},
                {"result_code": 0, "summary": {"distance": 4100, "duration": 900}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let route = client(&server)
        .directions(&RouteRequest::new("127.0276,37.4979", "127.0473,37.5088"))
        .await
        .unwrap();

    assert_eq!(route["summary"]["distance"], 3200);
}

#[tokio::test]
async fn test_empty_destination_makes_no_upstream_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"routes": []})))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .directions(&RouteRequest::new("127.0276,37.4979", ""))
        .await
        .unwrap_err();

    assert!(matches!(err, RoutingError::MissingEndpoint));
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_no_routes_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/directions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"trans_id": "abc"})))
        .mount(&server)
        .await;

    let err = client(&server)
        .directions(&RouteRequest::new("127.0,37.5", "127.1,37.6"))
        .await
        .unwrap_err();

    assert!(matches!(err, RoutingError::NoRoutes));
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn test_upstream_failure_carries_status_and_details() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/directions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("wrong appKey"))
        .mount(&server)
        .await;

    let err = client(&server)
        .directions(
            &RouteRequest::new("127.0,37.5", "127.1,37.6").with_waypoints("127.05,37.55"),
        )
        .await
        .unwrap_err();

    match &err {
        RoutingError::Upstream { status, details } => {
            assert_eq!(*status, 401);
            assert_eq!(details, "wrong appKey");
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(err.status_code(), 500);
}
