// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::services::action_driver::{Action, ActionDriver, ActionError, ActionOutcome};
use crate::domain::services::session_store::SessionBlob;

const DRIVER_NAME: &str = "simulated";

/// 模拟动作驱动
///
/// 不访问任何外部服务。登录总是签发新 token，动作在已登录的账号上
/// 立即成功，除非目标被标记为不可达。
#[derive(Debug, Default)]
pub struct SimulatedActionDriver {
    /// 当前打开的会话：account_id -> token
    sessions: DashMap<String, String>,
    /// 私信会失败的目标
    unreachable: DashSet<String>,
    /// 登录会被拒绝的账号
    locked_accounts: DashSet<String>,
}

impl SimulatedActionDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让发往 `target` 的私信失败
    pub fn with_unreachable<I, S>(self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for t in targets {
            self.unreachable.insert(t.into());
        }
        self
    }

    /// 让 `account_id` 的登录失败
    pub fn with_locked_account(self, account_id: impl Into<String>) -> Self {
        self.locked_accounts.insert(account_id.into());
        self
    }

    /// 当前打开的会话数量
    pub fn open_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn token_of(session: &SessionBlob) -> Option<&str> {
        session.0.get("token").and_then(|v| v.as_str())
    }
}

#[async_trait]
impl ActionDriver for SimulatedActionDriver {
    fn name(&self) -> &str {
        DRIVER_NAME
    }

    async fn is_authenticated(&self, account_id: &str, session: &SessionBlob) -> bool {
        session.0.get("driver").and_then(|v| v.as_str()) == Some(DRIVER_NAME)
            && session.0.get("account_id").and_then(|v| v.as_str()) == Some(account_id)
            && Self::token_of(session).is_some()
    }

    async fn login(&self, account_id: &str, secret: &str) -> Result<SessionBlob, ActionError> {
        if secret.is_empty() || self.locked_accounts.contains(account_id) {
            return Err(ActionError::Authentication(format!(
                "login rejected for {account_id}"
            )));
        }

        let token = Uuid::new_v4().to_string();
        self.sessions.insert(account_id.to_string(), token.clone());
        info!(account_id, "Simulated login");

        Ok(SessionBlob(json!({
            "driver": DRIVER_NAME,
            "account_id": account_id,
            "token": token,
        })))
    }

    async fn resume(&self, account_id: &str, session: &SessionBlob) -> Result<(), ActionError> {
        if self.locked_accounts.contains(account_id) {
            return Err(ActionError::SessionExpired(format!(
                "session for {account_id} was revoked"
            )));
        }
        let token = Self::token_of(session)
            .ok_or_else(|| ActionError::SessionExpired("session has no token".to_string()))?;
        self.sessions
            .insert(account_id.to_string(), token.to_string());
        debug!(account_id, "Simulated session resumed");
        Ok(())
    }

    async fn perform(
        &self,
        account_id: &str,
        action: &Action,
    ) -> Result<ActionOutcome, ActionError> {
        if !self.sessions.contains_key(account_id) {
            return Err(ActionError::SessionExpired(format!(
                "no open session for {account_id}"
            )));
        }

        match action {
            Action::SendDirectMessage { target, .. } => {
                if self.unreachable.contains(target) {
                    return Err(ActionError::Rejected(format!(
                        "{target} cannot receive messages"
                    )));
                }
                Ok(ActionOutcome {
                    detail: Some(format!("message delivered to {target}")),
                    ..Default::default()
                })
            }
            Action::Publish { media_urls, .. } => Ok(ActionOutcome {
                url: Some(format!("https://simulated.invalid/p/{}", Uuid::new_v4().simple())),
                detail: Some(format!("published with {} media", media_urls.len())),
                ..Default::default()
            }),
            Action::Search { keyword, limit } => {
                let items = (0..*limit)
                    .map(|i| json!({ "keyword": keyword, "rank": i + 1 }))
                    .collect();
                Ok(ActionOutcome {
                    items,
                    ..Default::default()
                })
            }
        }
    }

    async fn release(&self, account_id: &str) {
        self.sessions.remove(account_id);
        debug!(account_id, "Simulated session released");
    }
}
