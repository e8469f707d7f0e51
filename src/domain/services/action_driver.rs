// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::services::session_store::SessionBlob;

/// 动作驱动错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// 登录失败，账号凭据无效或被拒绝
    #[error("Authentication failed: {0}")]
    Authentication(String),
    /// 会话在执行过程中失效
    #[error("Session expired: {0}")]
    SessionExpired(String),
    /// 目标服务拒绝了本次动作
    #[error("Action rejected: {0}")]
    Rejected(String),
    /// 与驱动或目标服务通信失败
    #[error("Driver transport error: {0}")]
    Transport(String),
    /// 超时
    #[error("Action timed out")]
    Timeout,
}

impl ActionError {
    /// 判断错误是否影响整个账号组
    ///
    /// # 返回值
    ///
    /// 认证或会话失效时返回true，此时同组剩余作业都无法执行
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            ActionError::Authentication(_) | ActionError::SessionExpired(_)
        )
    }
}

/// 单个自动化动作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// 向目标账号发送私信
    SendDirectMessage { target: String, message: String },
    /// 发布帖子
    Publish {
        caption: String,
        media_urls: Vec<String>,
    },
    /// 按关键词搜索帖子
    Search { keyword: String, limit: u32 },
}

impl Action {
    /// 用于日志和指标的动作名称
    pub fn name(&self) -> &'static str {
        match self {
            Action::SendDirectMessage { .. } => "send_direct_message",
            Action::Publish { .. } => "publish",
            Action::Search { .. } => "search",
        }
    }
}

/// 动作执行结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// 结果链接，例如新帖子的地址
    #[serde(default)]
    pub url: Option<String>,
    /// 附加说明
    #[serde(default)]
    pub detail: Option<String>,
    /// 搜索类动作返回的条目
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

/// 动作驱动特质
///
/// 封装与目标服务交互的全部协议细节。执行器只依赖这个接口，
/// 不关心背后是模拟会话、远程自动化服务还是其他实现。
///
/// 同一账号的调用由执行器串行发起，实现无需处理同账号并发。
#[async_trait]
pub trait ActionDriver: Send + Sync {
    /// 驱动名称
    fn name(&self) -> &str;

    /// 检查已保存的会话是否仍然有效
    async fn is_authenticated(&self, account_id: &str, session: &SessionBlob) -> bool;

    /// 使用凭据登录，返回新的会话
    async fn login(&self, account_id: &str, secret: &str) -> Result<SessionBlob, ActionError>;

    /// 用已保存的会话恢复登录状态
    async fn resume(&self, account_id: &str, session: &SessionBlob) -> Result<(), ActionError>;

    /// 执行一个动作
    async fn perform(&self, account_id: &str, action: &Action)
        -> Result<ActionOutcome, ActionError>;

    /// 释放账号占用的会话资源
    async fn release(&self, account_id: &str);
}
