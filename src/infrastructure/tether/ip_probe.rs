// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::error;

use crate::config::settings::TetherSettings;
use crate::domain::services::network_rotator::{Identity, IdentityProbe};

/// 通过 HTTP 查询外网 IP
///
/// 查询服务返回纯文本 IP 地址，任何失败都视为 `Unknown`
#[derive(Debug, Clone)]
pub struct HttpIdentityProbe {
    client: Client,
    url: String,
}

impl HttpIdentityProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_settings(settings: &TetherSettings) -> Result<Self, reqwest::Error> {
        Self::new(
            settings.ip_lookup_url.clone(),
            Duration::from_millis(settings.lookup_timeout_ms),
        )
    }

    async fn fetch(&self) -> Result<String, reqwest::Error> {
        self.client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl IdentityProbe for HttpIdentityProbe {
    async fn current(&self) -> Identity {
        match self.fetch().await {
            Ok(body) => Identity::parse(&body),
            Err(e) => {
                error!("IP lookup failed: {}", e);
                Identity::Unknown
            }
        }
    }
}
