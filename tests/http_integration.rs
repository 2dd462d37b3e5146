//! Integration tests for the control-plane HTTP transport using wiremock
//!
//! These tests drive `HttpTransport` and complete resource flows against
//! mocked endpoints: authorization, error-body parsing, empty bodies and
//! the not-found conventions of each handler variant.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{bearer_token, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use restform::client::{Credentials, HttpTransport, DEFAULT_TIMEOUT};
use restform::engine::{HttpMethod, Record, RecordExt, ResourceData, Transport, TransportError};
use restform::resources;

fn transport(server: &MockServer) -> HttpTransport {
    HttpTransport::new(
        &server.uri(),
        Credentials::from_token("test-token"),
        DEFAULT_TIMEOUT,
    )
    .expect("transport should build")
}

/// Transport-level behavior
mod transport_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_sends_bearer_token_and_returns_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/roles/r1"))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "r1"})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport(&server);
        let url = transport.context().endpoint("/api/v1/roles/r1");
        let body = transport
            .execute(HttpMethod::Get, &url, None)
            .await
            .expect("request should succeed");

        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["id"], "r1");
    }

    #[tokio::test]
    async fn test_post_sends_json_payload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/roles"))
            .and(body_json(json!({"name": "ops"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "r1"})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport(&server);
        let url = transport.context().endpoint("/api/v1/roles");
        let result = transport
            .execute(HttpMethod::Post, &url, Some(&json!({"name": "ops"})))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_error_status_carries_message_from_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/roles/missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({
                    "error": {
                        "code": 404,
                        "message": "role not found"
                    }
                })),
            )
            .mount(&server)
            .await;

        let transport = transport(&server);
        let url = transport.context().endpoint("/api/v1/roles/missing");
        let err = transport.execute(HttpMethod::Get, &url, None).await.unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert_eq!(err.message(), "role not found");
    }

    #[tokio::test]
    async fn test_error_without_body_uses_reason_phrase() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = transport(&server);
        let url = transport.context().endpoint("/api/v1/roles/r1");
        let err = transport
            .execute(HttpMethod::Delete, &url, None)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert_eq!(err.message(), "Service Unavailable");
    }

    #[tokio::test]
    async fn test_no_content_returns_empty_body() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let transport = transport(&server);
        let url = transport.context().endpoint("/api/v1/roles/r1");
        let body = transport
            .execute(HttpMethod::Delete, &url, None)
            .await
            .unwrap();

        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_a_network_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(
            &server.uri(),
            Credentials::anonymous(),
            Duration::from_millis(200),
        )
        .unwrap();
        let url = transport.context().endpoint("/slow");
        let err = transport.execute(HttpMethod::Get, &url, None).await.unwrap_err();

        assert!(matches!(err, TransportError::Network { .. }));
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_connection_refused_is_a_network_error() {
        // Nothing listens on a port released right after binding it.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let uri = format!("http://127.0.0.1:{}", port);
        let transport = HttpTransport::new(&uri, Credentials::anonymous(), DEFAULT_TIMEOUT).unwrap();
        let url = transport.context().endpoint("/api/v1/roles");
        let err = transport.execute(HttpMethod::Get, &url, None).await.unwrap_err();

        assert!(matches!(err, TransportError::Network { .. }));
    }
}

/// Complete flows through registered resources
mod flow_tests {
    use super::*;
    use resources::repository::{DESCRIPTION, KEY, PACKAGE_TYPE, PUBLIC};

    #[tokio::test]
    async fn test_repository_create_flow() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/repositories"))
            .and(bearer_token("test-token"))
            .and(body_json(json!({
                "key": "libs",
                "packageType": "maven",
                "public": false
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/repositories/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 7,
                "key": "libs",
                "description": "release artifacts",
                "packageType": "maven",
                "public": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let handler = resources::handler_for("repository").unwrap();
        let mut record = ResourceData::new()
            .with(KEY, "libs".to_string())
            .with(PACKAGE_TYPE, "maven".to_string());

        let diagnostics = handler.create(&mut record, &transport(&server)).await;

        assert!(diagnostics.is_empty(), "{}", diagnostics);
        assert_eq!(record.id(), "7");
        assert_eq!(
            record.get_attr(DESCRIPTION).unwrap().as_deref(),
            Some("release artifacts")
        );
        assert_eq!(record.get_attr(PUBLIC).unwrap(), Some(false));
    }

    #[tokio::test]
    async fn test_repository_read_404_clears_identity() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/repositories/7"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "repository not found"})),
            )
            .mount(&server)
            .await;

        let handler = resources::handler_for("repository").unwrap();
        let mut record = ResourceData::new().with_id("7");

        let diagnostics = handler.read(&mut record, &transport(&server)).await;

        assert!(diagnostics.is_empty());
        assert!(!record.has_id());
    }

    #[tokio::test]
    async fn test_repository_conflict_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({"message": "key already taken"})),
            )
            .mount(&server)
            .await;

        let handler = resources::handler_for("repository").unwrap();
        let mut record = ResourceData::new()
            .with(KEY, "libs".to_string())
            .with(PACKAGE_TYPE, "maven".to_string());

        let diagnostics = handler.create(&mut record, &transport(&server)).await;

        assert!(diagnostics.has_errors());
        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(diagnostic.summary, "Unable to create repository");
        assert!(diagnostic.detail.contains("HTTP 409: key already taken"));
    }

    #[tokio::test]
    async fn test_role_update_uses_patch() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/api/v1/roles/r1"))
            .and(body_json(json!({"name": "ops", "permissions": ["read"]})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/roles/r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "r1",
                "name": "ops",
                "permissions": ["read"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let handler = resources::handler_for("role").unwrap();
        let mut record = ResourceData::new()
            .with_id("r1")
            .with(resources::role::NAME, "ops".to_string())
            .with(
                resources::role::PERMISSIONS,
                ["read".to_string()].into_iter().collect(),
            );

        let diagnostics = handler.update(&mut record, &transport(&server)).await;

        assert!(diagnostics.is_empty(), "{}", diagnostics);
    }

    #[tokio::test]
    async fn test_policy_missing_reported_as_bad_request() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/v1/policies/security/p1"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "policy not found: p1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let handler = resources::handler_for("policy").unwrap();
        let mut record = ResourceData::new()
            .with_id("p1")
            .with(resources::policy::POLICY_TYPE, "security".to_string());

        let diagnostics = handler.delete(&mut record, &transport(&server)).await;

        assert!(diagnostics.is_empty());
        assert!(!record.has_id());
    }

    #[tokio::test]
    async fn test_policy_missing_matched_outside_message_field() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/v1/policies/security/p1"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "message": "invalid request",
                "details": [{"reason": "policy not found: p1"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let handler = resources::handler_for("policy").unwrap();
        let mut record = ResourceData::new()
            .with_id("p1")
            .with(resources::policy::POLICY_TYPE, "security".to_string());

        let diagnostics = handler.delete(&mut record, &transport(&server)).await;

        assert!(diagnostics.is_empty(), "{}", diagnostics);
        assert!(!record.has_id());
    }

    #[tokio::test]
    async fn test_repositories_data_source_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/repositories"))
            .and(query_param("packageType", "npm"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"items": [{"key": "left-pad"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let handler = resources::handler_for("repositories").unwrap();
        let mut record = ResourceData::new()
            .with(resources::repositories::PACKAGE_TYPE, "npm".to_string());

        let diagnostics = handler.read(&mut record, &transport(&server)).await;

        assert!(diagnostics.is_empty(), "{}", diagnostics);
        assert_eq!(
            record.require(resources::repositories::KEYS).unwrap(),
            vec!["left-pad"]
        );
    }

    #[tokio::test]
    async fn test_api_token_revoke() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/tokens/t1/revoke"))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "OK"})))
            .expect(1)
            .mount(&server)
            .await;

        let handler = resources::handler_for("api_token").unwrap();
        let mut record = ResourceData::new().with_id("t1");

        let diagnostics = handler.delete(&mut record, &transport(&server)).await;

        assert!(diagnostics.is_empty(), "{}", diagnostics);
        assert_eq!(record.id(), "t1");
    }
}
