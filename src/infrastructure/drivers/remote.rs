// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::domain::services::action_driver::{Action, ActionDriver, ActionError, ActionOutcome};
use crate::domain::services::session_store::SessionBlob;

/// 远程动作驱动
///
/// 把每个动作以 JSON 形式发送给自动化 sidecar，由 sidecar 负责浏览器
/// 或会话 API 的全部细节。
///
/// 接口约定（均为 POST）：
/// - `sessions/login` `{account_id, secret}` → `{session}`
/// - `sessions/check` `{account_id, session}` → `{authenticated}`
/// - `sessions/resume` `{account_id, session}`
/// - `sessions/release` `{account_id}`
/// - `actions` `{account_id, action}` → `ActionOutcome`
///
/// 401 表示会话失效，其余 4xx 表示动作被拒绝。
#[derive(Debug, Clone)]
pub struct RemoteActionDriver {
    client: Client,
    base: Url,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    account_id: &'a str,
    secret: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    session: SessionBlob,
}

#[derive(Serialize)]
struct SessionRequest<'a> {
    account_id: &'a str,
    session: &'a SessionBlob,
}

#[derive(Deserialize)]
struct CheckResponse {
    authenticated: bool,
}

#[derive(Serialize)]
struct AccountRequest<'a> {
    account_id: &'a str,
}

#[derive(Serialize)]
struct ActionRequest<'a> {
    account_id: &'a str,
    action: &'a Action,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl RemoteActionDriver {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ActionError> {
        // 末尾补 '/'，保证 join 时保留基础路径
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base = Url::parse(&normalized)
            .map_err(|e| ActionError::Transport(format!("invalid driver url {base_url}: {e}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ActionError::Transport(e.to_string()))?;
        Ok(Self { client, base })
    }

    async fn post<B, R>(
        &self,
        path: &str,
        body: &B,
        unauthorized: fn(String) -> ActionError,
    ) -> Result<R, ActionError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = self
            .base
            .join(path)
            .map_err(|e| ActionError::Transport(e.to_string()))?;
        debug!(%url, "Calling automation driver");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if status.is_success() {
            let text = response.text().await.map_err(map_transport)?;
            // 空响应体按 JSON null 处理
            let text = if text.trim().is_empty() { "null" } else { text.as_str() };
            return serde_json::from_str(text).map_err(|e| {
                ActionError::Transport(format!("unexpected driver response: {e}"))
            });
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or(text);

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => unauthorized(message),
            s if s.is_client_error() => ActionError::Rejected(message),
            s => ActionError::Transport(format!("driver returned {s}: {message}")),
        })
    }
}

fn map_transport(e: reqwest::Error) -> ActionError {
    if e.is_timeout() {
        ActionError::Timeout
    } else {
        ActionError::Transport(e.to_string())
    }
}

#[async_trait]
impl ActionDriver for RemoteActionDriver {
    fn name(&self) -> &str {
        "remote"
    }

    async fn is_authenticated(&self, account_id: &str, session: &SessionBlob) -> bool {
        let body = SessionRequest {
            account_id,
            session,
        };
        match self
            .post::<_, CheckResponse>("sessions/check", &body, ActionError::SessionExpired)
            .await
        {
            Ok(resp) => resp.authenticated,
            Err(e) => {
                warn!(account_id, error = %e, "Session check failed");
                false
            }
        }
    }

    async fn login(&self, account_id: &str, secret: &str) -> Result<SessionBlob, ActionError> {
        let body = LoginRequest { account_id, secret };
        let resp: LoginResponse = self
            .post("sessions/login", &body, ActionError::Authentication)
            .await?;
        Ok(resp.session)
    }

    async fn resume(&self, account_id: &str, session: &SessionBlob) -> Result<(), ActionError> {
        let body = SessionRequest {
            account_id,
            session,
        };
        let _: serde_json::Value = self
            .post("sessions/resume", &body, ActionError::SessionExpired)
            .await?;
        Ok(())
    }

    async fn perform(
        &self,
        account_id: &str,
        action: &Action,
    ) -> Result<ActionOutcome, ActionError> {
        let body = ActionRequest { account_id, action };
        self.post("actions", &body, ActionError::SessionExpired).await
    }

    async fn release(&self, account_id: &str) {
        let body = AccountRequest { account_id };
        if let Err(e) = self
            .post::<_, serde_json::Value>("sessions/release", &body, ActionError::SessionExpired)
            .await
        {
            warn!(account_id, error = %e, "Failed to release driver session");
        }
    }
}
