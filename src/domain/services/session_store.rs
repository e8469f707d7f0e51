// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 会话数据
///
/// 对执行器不透明，只有动作驱动理解其内容（cookie、token 等）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionBlob(pub serde_json::Value);

/// 会话存储错误类型
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// 账号标识不能安全地映射为存储键
    #[error("Invalid account identifier: {0}")]
    InvalidAccount(String),
}

/// 会话存储特质
///
/// 按账号持久化和恢复认证状态
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 读取账号的会话，不存在时返回 `None`
    async fn load(&self, account_id: &str) -> Result<Option<SessionBlob>, SessionError>;

    /// 保存账号的会话，覆盖旧值
    async fn save(&self, account_id: &str, blob: &SessionBlob) -> Result<(), SessionError>;
}
