// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use outreach::domain::services::network_rotator::{Identity, IdentityProbe};
use outreach::infrastructure::tether::ip_probe::HttpIdentityProbe;
use std::net::IpAddr;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn probe_for(server: &MockServer) -> HttpIdentityProbe {
    HttpIdentityProbe::new(format!("{}/ip", server.uri()), Duration::from_millis(500)).unwrap()
}

#[tokio::test]
async fn test_probe_parses_plain_text_ip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_string("198.51.100.7\n"))
        .mount(&server)
        .await;

    let identity = probe_for(&server).await.current().await;
    assert_eq!(
        identity,
        Identity::Known("198.51.100.7".parse::<IpAddr>().unwrap())
    );
}

/// 非 2xx 响应视为未知身份
#[tokio::test]
async fn test_probe_error_status_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert_eq!(probe_for(&server).await.current().await, Identity::Unknown);
}

#[tokio::test]
async fn test_probe_garbage_body_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
        .mount(&server)
        .await;

    assert_eq!(probe_for(&server).await.current().await, Identity::Unknown);
}

/// 超时视为未知身份
#[tokio::test]
async fn test_probe_timeout_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("198.51.100.7")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    assert_eq!(probe_for(&server).await.current().await, Identity::Unknown);
}
