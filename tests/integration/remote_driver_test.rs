// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use outreach::domain::services::action_driver::{Action, ActionDriver, ActionError};
use outreach::domain::services::session_store::SessionBlob;
use outreach::infrastructure::drivers::remote::RemoteActionDriver;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn driver_for(server: &MockServer) -> RemoteActionDriver {
    RemoteActionDriver::new(&format!("{}/driver", server.uri()), Duration::from_secs(2)).unwrap()
}

fn dm(target: &str) -> Action {
    Action::SendDirectMessage {
        target: target.to_string(),
        message: "hello".to_string(),
    }
}

#[tokio::test]
async fn test_login_returns_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/driver/sessions/login"))
        .and(body_partial_json(json!({ "account_id": "acct-a" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "session": { "cookie": "sid=1" } })),
        )
        .mount(&server)
        .await;

    let session = driver_for(&server).login("acct-a", "secret").await.unwrap();
    assert_eq!(session, SessionBlob(json!({ "cookie": "sid=1" })));
}

/// 登录被拒绝映射为认证错误
#[tokio::test]
async fn test_login_unauthorized_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/driver/sessions/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "bad password" })))
        .mount(&server)
        .await;

    let err = driver_for(&server)
        .login("acct-a", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::Authentication(ref m) if m == "bad password"));
    assert!(err.is_session_fatal());
}

#[tokio::test]
async fn test_perform_maps_status_codes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/driver/actions"))
        .and(body_partial_json(json!({ "action": { "target": "alice" } })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "detail": "delivered" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/driver/actions"))
        .and(body_partial_json(json!({ "action": { "target": "ghost" } })))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({ "error": "user not found" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/driver/actions"))
        .and(body_partial_json(json!({ "action": { "target": "expired" } })))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/driver/actions"))
        .and(body_partial_json(json!({ "action": { "target": "broken" } })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let driver = driver_for(&server);

    let outcome = driver.perform("acct-a", &dm("alice")).await.unwrap();
    assert_eq!(outcome.detail.as_deref(), Some("delivered"));
    assert!(outcome.items.is_empty());

    let err = driver.perform("acct-a", &dm("ghost")).await.unwrap_err();
    assert!(matches!(err, ActionError::Rejected(ref m) if m == "user not found"));
    assert!(!err.is_session_fatal());

    let err = driver.perform("acct-a", &dm("expired")).await.unwrap_err();
    assert!(matches!(err, ActionError::SessionExpired(_)));

    let err = driver.perform("acct-a", &dm("broken")).await.unwrap_err();
    assert!(matches!(err, ActionError::Transport(_)));
}

/// 会话检查失败时视为未登录
#[tokio::test]
async fn test_is_authenticated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/driver/sessions/check"))
        .and(body_partial_json(json!({ "account_id": "acct-a" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "authenticated": true })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/driver/sessions/check"))
        .and(body_partial_json(json!({ "account_id": "acct-b" })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let driver = driver_for(&server);
    let session = SessionBlob(json!({ "cookie": "sid=1" }));

    assert!(driver.is_authenticated("acct-a", &session).await);
    assert!(!driver.is_authenticated("acct-b", &session).await);
}

/// 空响应体的恢复请求视为成功
#[tokio::test]
async fn test_resume_accepts_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/driver/sessions/resume"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let session = SessionBlob(json!({ "cookie": "sid=1" }));
    driver_for(&server)
        .resume("acct-a", &session)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/actions"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let driver =
        RemoteActionDriver::new(&server.uri(), Duration::from_millis(200)).unwrap();
    let err = driver.perform("acct-a", &dm("alice")).await.unwrap_err();
    assert!(matches!(err, ActionError::Timeout));
}
