//! Integration tests for the Rational Onion HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.
//! Settings are passed to the router directly, so no test touches the
//! process environment.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::{HeaderName, HeaderValue, header};
use axum_test::TestServer;
use rational_onion::api::{
    API_KEY_HEADER, AppState, CreateRelationshipResponse, ErrorBody, HealthResponse,
    InsertArgumentRequest, InsertArgumentResponse, RootResponse, StatusResponse, WELCOME_MESSAGE,
    create_router,
};
use rational_onion::settings::{Backend, Settings};
use rational_onion_core::{GraphView, Session, VerificationReport, VerificationStatus};
use serde_json::json;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Settings for an unauthenticated, unlimited in-memory server.
fn test_settings() -> Settings {
    Settings {
        backend: Backend::Memory,
        rate_limit: "off".to_string(),
        ..Settings::default()
    }
}

fn server_with(settings: Settings) -> TestServer {
    let state = AppState::new(Session::new(), settings);
    TestServer::new(create_router(state).unwrap()).unwrap()
}

/// Create a test server with a fresh in-memory session.
fn create_test_server() -> TestServer {
    server_with(test_settings())
}

fn argument(claim: &str, grounds: &str, warrant: &str) -> InsertArgumentRequest {
    InsertArgumentRequest {
        claim: claim.to_string(),
        grounds: grounds.to_string(),
        warrant: warrant.to_string(),
        rebuttal: None,
    }
}

async fn insert(server: &TestServer, claim: &str) -> String {
    let response = server
        .post("/insert-argument")
        .json(&argument(claim, "grounds", "warrant"))
        .await;
    response.assert_status_ok();
    let body: InsertArgumentResponse = response.json();
    body.argument_id.to_string()
}

async fn relate(server: &TestServer, source: &str, target: &str, kind: &str) {
    server
        .post("/create-relationship")
        .json(&json!({
            "source_id": source,
            "target_id": target,
            "relationship_type": kind,
        }))
        .await
        .assert_status_ok();
}

// =============================================================================
// SERVICE ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_root_welcome() {
    let server = create_test_server();

    let response = server.get("/").await;

    response.assert_status_ok();
    let root: RootResponse = response.json();
    assert_eq!(root.message, WELCOME_MESSAGE);
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_counts() {
    let server = create_test_server();
    insert(&server, "Main").await;

    let response = server.get("/status").await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.node_count, 3);
    assert_eq!(status.edge_count, 2);
    assert_eq!(status.backend, "memory");
    assert!(!status.persistent);
    assert!(!status.auth_enabled);
}

// =============================================================================
// INSERT ARGUMENT TESTS
// =============================================================================

#[tokio::test]
async fn test_insert_echoes_components() {
    let server = create_test_server();

    let request = InsertArgumentRequest {
        rebuttal: Some("R1".to_string()),
        ..argument("Main", "G1", "W1")
    };
    let response = server.post("/insert-argument").json(&request).await;

    response.assert_status_ok();
    let body: InsertArgumentResponse = response.json();
    assert_eq!(body.message, "Argument successfully inserted.");
    assert_eq!(body.claim, "Main");
    assert_eq!(body.grounds, "G1");
    assert_eq!(body.warrant, "W1");
    assert_eq!(body.rebuttal.as_deref(), Some("R1"));
    assert!(!body.argument_id.is_blank());
}

#[tokio::test]
async fn test_insert_empty_claim_rejected() {
    let server = create_test_server();

    let response = server
        .post("/insert-argument")
        .json(&argument("", "G1", "W1"))
        .await;

    assert_eq!(response.status_code().as_u16(), 422);
    let body: ErrorBody = response.json();
    assert_eq!(body.detail.error_type, "validation_error");
    assert_eq!(
        body.detail.details.get("field").map(String::as_str),
        Some("claim")
    );
}

#[tokio::test]
async fn test_insert_claim_length_boundary() {
    let server = create_test_server();

    server
        .post("/insert-argument")
        .json(&argument(&"c".repeat(500), "G1", "W1"))
        .await
        .assert_status_ok();

    let response = server
        .post("/insert-argument")
        .json(&argument(&"c".repeat(501), "G1", "W1"))
        .await;
    assert_eq!(response.status_code().as_u16(), 422);
}

#[tokio::test]
async fn test_insert_missing_field_is_validation_error() {
    let server = create_test_server();

    let response = server
        .post("/insert-argument")
        .json(&json!({"claim": "Main", "grounds": "G1"}))
        .await;

    assert_eq!(response.status_code().as_u16(), 422);
    let body: ErrorBody = response.json();
    assert_eq!(body.detail.error_type, "validation_error");
}

// =============================================================================
// CREATE RELATIONSHIP TESTS
// =============================================================================

#[tokio::test]
async fn test_relationship_created() {
    let server = create_test_server();
    let first = insert(&server, "Main").await;
    let second = insert(&server, "Second").await;

    let response = server
        .post("/create-relationship")
        .json(&json!({
            "source_id": second,
            "target_id": first,
            "relationship_type": "SUPPORTS",
        }))
        .await;

    response.assert_status_ok();
    let body: CreateRelationshipResponse = response.json();
    assert!(!body.relationship_id.as_str().is_empty());
}

#[tokio::test]
async fn test_relationship_unknown_type() {
    let server = create_test_server();
    let first = insert(&server, "Main").await;
    let second = insert(&server, "Second").await;

    let response = server
        .post("/create-relationship")
        .json(&json!({
            "source_id": second,
            "target_id": first,
            "relationship_type": "FOO",
        }))
        .await;

    assert_eq!(response.status_code().as_u16(), 422);
    let body: ErrorBody = response.json();
    assert_eq!(
        body.detail.details.get("field").map(String::as_str),
        Some("relationship_type")
    );
}

#[tokio::test]
async fn test_relationship_self_loop() {
    let server = create_test_server();
    let first = insert(&server, "Main").await;

    let response = server
        .post("/create-relationship")
        .json(&json!({
            "source_id": first,
            "target_id": first,
            "relationship_type": "SUPPORTS",
        }))
        .await;

    assert_eq!(response.status_code().as_u16(), 422);
    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.edge_count, 2);
}

#[tokio::test]
async fn test_relationship_missing_ids_name_the_field() {
    let server = create_test_server();
    let first = insert(&server, "Main").await;

    let cases = [
        (json!({"target_id": first, "relationship_type": "SUPPORTS"}), "source_id"),
        (json!({"source_id": first, "relationship_type": "SUPPORTS"}), "target_id"),
    ];
    for (body, field) in cases {
        let response = server.post("/create-relationship").json(&body).await;

        assert_eq!(response.status_code().as_u16(), 422);
        let error: ErrorBody = response.json();
        assert_eq!(error.detail.error_type, "validation_error");
        assert_eq!(
            error.detail.details.get("field").map(String::as_str),
            Some(field)
        );
    }
}

#[tokio::test]
async fn test_relationship_missing_node() {
    let server = create_test_server();
    let first = insert(&server, "Main").await;

    let response = server
        .post("/create-relationship")
        .json(&json!({
            "source_id": first,
            "target_id": "node-missing",
            "relationship_type": "SUPPORTS",
        }))
        .await;

    assert_eq!(response.status_code().as_u16(), 422);
    let body: ErrorBody = response.json();
    assert!(body.detail.message.contains("node-missing"));
}

// =============================================================================
// VERIFICATION TESTS
// =============================================================================

#[tokio::test]
async fn test_verify_empty_graph() {
    let server = create_test_server();

    let response = server.get("/verify-argument-structure").await;

    response.assert_status_ok();
    let report: VerificationReport = response.json();
    assert!(report.is_valid);
    assert!(!report.has_cycles);
    assert!(report.orphaned_nodes.is_empty());
}

#[tokio::test]
async fn test_verify_scenario() {
    let server = create_test_server();
    let first = insert(&server, "Main").await;
    let second = insert(&server, "Second").await;
    relate(&server, &second, &first, "SUPPORTS").await;

    let report: VerificationReport = server.get("/verify-argument-structure").await.json();
    assert_eq!(report.status, VerificationStatus::Success);
    assert!(!report.has_cycles);

    let response = server
        .post("/verify-argument-structure")
        .json(&json!({"argument_id": first}))
        .await;
    response.assert_status_ok();
    let scoped: VerificationReport = response.json();
    assert!(scoped.is_valid);
    assert_eq!(
        scoped.argument_id.as_ref().map(|id| id.to_string()),
        Some(first)
    );
}

#[tokio::test]
async fn test_verify_reports_cycle() {
    let server = create_test_server();
    let a = insert(&server, "A").await;
    let b = insert(&server, "B").await;
    relate(&server, &a, &b, "SUPPORTS").await;
    relate(&server, &b, &a, "SUPPORTS").await;

    let response = server.get("/verify-argument-structure").await;
    response.assert_status_ok();
    let report: VerificationReport = response.json();
    assert!(report.has_cycles);
    assert!(!report.is_valid);
    assert_eq!(report.status, VerificationStatus::Failure);

    let strict = server
        .get("/verify-argument-structure")
        .add_query_param("strict", "true")
        .await;
    strict.assert_status_bad_request();
    let body: ErrorBody = strict.json();
    assert_eq!(body.detail.error_type, "graph_error");
    assert_eq!(
        body.detail.details.get("has_cycles").map(String::as_str),
        Some("true")
    );
}

#[tokio::test]
async fn test_verify_without_body() {
    let server = create_test_server();

    let response = server.post("/verify-argument-structure").await;

    assert_eq!(response.status_code().as_u16(), 422);
    let body: ErrorBody = response.json();
    assert_eq!(body.detail.message, "Request body is required");
}

#[tokio::test]
async fn test_verify_without_argument_id() {
    let server = create_test_server();

    for payload in [json!({}), json!({"argument_id": ""})] {
        let response = server
            .post("/verify-argument-structure")
            .json(&payload)
            .await;

        assert_eq!(response.status_code().as_u16(), 422);
        let body: ErrorBody = response.json();
        assert_eq!(body.detail.message, "Argument ID is required");
    }
}

#[tokio::test]
async fn test_verify_unknown_argument() {
    let server = create_test_server();

    let response = server
        .post("/verify-argument-structure")
        .json(&json!({"argument_id": "node-404"}))
        .await;

    assert_eq!(response.status_code().as_u16(), 404);
    let body: ErrorBody = response.json();
    assert_eq!(body.detail.error_type, "not_found");
}

// =============================================================================
// VISUALIZATION TESTS
// =============================================================================

#[tokio::test]
async fn test_visualize_graph() {
    let server = create_test_server();
    insert(&server, "Main").await;

    let response = server.get("/visualize-argument-dag").await;

    response.assert_status_ok();
    let view: GraphView = response.json();
    assert_eq!(view.nodes.len(), 3);
    assert_eq!(view.edges.len(), 2);

    let raw: serde_json::Value = response.json();
    let kinds: Vec<&str> = raw["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"Claim"));
    assert!(
        raw["edges"]
            .as_array()
            .unwrap()
            .iter()
            .any(|e| e["type"] == "SUPPORTS")
    );
}

// =============================================================================
// AUTHENTICATION TESTS
// =============================================================================

fn create_auth_test_server(api_key: &str) -> TestServer {
    server_with(Settings {
        api_keys: vec![api_key.to_string()],
        ..test_settings()
    })
}

#[tokio::test]
async fn test_auth_missing_key() {
    let server = create_auth_test_server("test-secret-key-12345");

    let response = server.get("/status").await;

    assert_eq!(response.status_code().as_u16(), 401);
    let body: ErrorBody = response.json();
    assert_eq!(body.detail.error_type, "authentication_error");
}

#[tokio::test]
async fn test_auth_invalid_key() {
    let server = create_auth_test_server("test-secret-key-12345");

    let response = server
        .get("/status")
        .add_header(
            HeaderName::from_static(API_KEY_HEADER),
            HeaderValue::from_static("wrong-key"),
        )
        .await;

    assert_eq!(response.status_code().as_u16(), 401);
    let body: ErrorBody = response.json();
    assert_eq!(body.detail.message, "Invalid API key");
}

#[tokio::test]
async fn test_auth_valid_api_key_header() {
    let api_key = "test-secret-key-12345";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/status")
        .add_header(
            HeaderName::from_static(API_KEY_HEADER),
            api_key.parse::<HeaderValue>().unwrap(),
        )
        .await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert!(status.auth_enabled);
}

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let api_key = "test-secret-key-12345";
    let server = create_auth_test_server(api_key);

    let response = server
        .post("/insert-argument")
        .add_header(
            header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse::<HeaderValue>()
                .unwrap(),
        )
        .json(&argument("Main", "G1", "W1"))
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_public_paths() {
    let server = create_auth_test_server("test-secret-key-12345");

    server.get("/health").await.assert_status_ok();
    server.get("/").await.assert_status_ok();
}

// =============================================================================
// RATE LIMIT AND POOL TESTS
// =============================================================================

#[tokio::test]
async fn test_rate_limit_exceeded() {
    let server = server_with(Settings {
        rate_limit: "2/hour".to_string(),
        ..test_settings()
    });

    server.get("/health").await.assert_status_ok();
    server.get("/health").await.assert_status_ok();

    let response = server.get("/health").await;
    assert_eq!(response.status_code().as_u16(), 429);
    let body: ErrorBody = response.json();
    assert_eq!(body.detail.error_type, "rate_limit_error");
    assert_eq!(
        body.detail.details.get("limit").map(String::as_str),
        Some("2/hour")
    );
}

#[tokio::test]
async fn test_pool_timeout_is_service_unavailable() {
    let state = AppState::new(
        Session::new(),
        Settings {
            pool_size: 1,
            acquire_timeout_ms: 20,
            ..test_settings()
        },
    );
    let server = TestServer::new(create_router(state.clone()).unwrap()).unwrap();

    let _held = state.pool.write().await.unwrap();
    let response = server.get("/status").await;

    assert_eq!(response.status_code().as_u16(), 503);
    let body: ErrorBody = response.json();
    assert_eq!(body.detail.error_type, "database_error");
    assert_eq!(
        body.detail.details.get("operation").map(String::as_str),
        Some("acquire_store")
    );
}
