// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0

//! HTTP surface tests driving the axum router in-process.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use config_server_core::domain::server_config::CertificateDefaults;
use config_server_core::infrastructure::InMemoryConfigurationStore;
use config_server_core::presentation::{app, AppState, JwtVerifier};
use jsonwebtoken::{encode, get_current_timestamp, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn router() -> Router {
    app(AppState::new(
        Arc::new(InMemoryConfigurationStore::new()),
        CertificateDefaults::default(),
        None,
    ))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_put_and_get_by_name() {
    let router = router();

    let (status, put) = send(&router, json_request("PUT", "/v1/data", json!({"name": "smurf", "value": "blue"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(put["name"], "smurf");
    assert_eq!(put["value"], "blue");
    assert!(put["id"].is_string());
    assert!(put.get("checksum").is_none());

    send(&router, json_request("PUT", "/v1/data/", json!({"name": "smurf", "value": {"hat": "white"}}))).await;

    let (status, body) = send(&router, empty_request("GET", "/v1/data?name=smurf")).await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["value"], json!({"hat": "white"}));
    assert_eq!(data[1]["value"], "blue");
}

#[tokio::test]
async fn test_get_by_id() {
    let router = router();
    let (_, put) = send(&router, json_request("PUT", "/v1/data", json!({"name": "smurf", "value": null}))).await;
    let id = put["id"].as_str().unwrap().to_string();

    let (status, body) = send(&router, empty_request("GET", &format!("/v1/data/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": id, "name": "smurf", "value": null}));

    let (status, body) = send(&router, empty_request("GET", "/v1/data/8675309")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "ID '8675309' not found"}));
}

#[tokio::test]
async fn test_error_payloads() {
    let router = router();

    let (status, body) = send(&router, empty_request("GET", "/v1/data?name=smurf")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Name 'smurf' not found"}));

    let (status, body) = send(&router, json_request("PUT", "/v1/data", json!({"name": "sm!urf", "value": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "Name must consist of alphanumeric, underscores, dashes, and forward slashes"})
    );

    let (status, body) = send(
        &router,
        json_request("POST", "/v1/data", json!({"name": "leaf", "type": "certificate"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing required CA name"}));

    let (status, _) = send(&router, json_request("POST", "/v1/data", json!({"name": "x", "type": "rsa"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&router, empty_request("GET", "/v1/data")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unsupported_media_type() {
    let router = router();
    let request = Request::builder()
        .method("PUT")
        .uri("/v1/data")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(r#"{"name": "smurf", "value": "blue"}"#))
        .unwrap();

    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body, json!({"error": "Unsupported Media Type - Accepts application/json only"}));

    let (status, _) = send(&router, empty_request("POST", "/v1/data")).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_malformed_json() {
    let router = router();
    let request = Request::builder()
        .method("PUT")
        .uri("/v1/data")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_generate_and_converge() {
    let router = router();
    let request = json!({"name": "pw", "type": "password", "parameters": {"length": 12}, "mode": "converge"});

    let (status, first) = send(&router, json_request("POST", "/v1/data", request.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["value"].as_str().unwrap().len(), 12);

    let (_, second) = send(&router, json_request("POST", "/v1/data/", request)).await;
    assert_eq!(first, second);

    let (status, ca) = send(&router, json_request("POST", "/v1/data", json!({"name": "ca", "type": "root-certificate-ca"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ca["value"]["certificate"].as_str().unwrap().starts_with("-----BEGIN CERTIFICATE-----"));
    assert!(ca["value"]["private_key"].is_string());
    assert_eq!(ca["value"]["ca"], ca["value"]["certificate"]);
}

#[tokio::test]
async fn test_delete() {
    let router = router();
    send(&router, json_request("PUT", "/v1/data", json!({"name": "smurf", "value": "blue"}))).await;

    let (status, body) = send(&router, empty_request("DELETE", "/v1/data?name=smurf")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&router, empty_request("DELETE", "/v1/data?name=smurf")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Name 'smurf' not found"}));
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&router(), empty_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_bearer_token_required_when_configured() {
    let key = rcgen::KeyPair::generate_for(&rcgen::PKCS_ED25519).unwrap();
    let verifier = JwtVerifier::from_pem(Algorithm::EdDSA, key.public_key_pem().as_bytes(), None).unwrap();
    let router = app(AppState::new(
        Arc::new(InMemoryConfigurationStore::new()),
        CertificateDefaults::default(),
        Some(verifier),
    ));

    let (status, body) = send(&router, empty_request("GET", "/v1/data?name=smurf")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let bad = Request::builder()
        .uri("/v1/data?name=smurf")
        .header(header::AUTHORIZATION, "Bearer garbage")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&router, bad).await.0, StatusCode::UNAUTHORIZED);

    let encoding = EncodingKey::from_ed_pem(key.serialize_pem().as_bytes()).unwrap();
    let token = encode(
        &Header::new(Algorithm::EdDSA),
        &json!({"sub": "operator", "exp": get_current_timestamp() + 600}),
        &encoding,
    )
    .unwrap();
    for scheme in ["Bearer", "bearer", "BEARER"] {
        let good = Request::builder()
            .uri("/v1/data?name=smurf")
            .header(header::AUTHORIZATION, format!("{} {}", scheme, token))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&router, good).await.0, StatusCode::NOT_FOUND, "{}", scheme);
    }

    let basic = Request::builder()
        .uri("/v1/data?name=smurf")
        .header(header::AUTHORIZATION, format!("Basic {}", token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&router, basic).await.0, StatusCode::UNAUTHORIZED);

    // Health stays open
    assert_eq!(send(&router, empty_request("GET", "/health")).await.0, StatusCode::OK);
}
