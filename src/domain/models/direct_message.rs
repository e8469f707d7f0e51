// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

use crate::domain::models::job::DomainError;

/// 单个私信目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmTarget {
    /// 目标账号句柄
    pub target: String,
    /// 发送内容
    pub message: String,
}

/// 私信作业负载
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmPayload {
    pub targets: Vec<DmTarget>,
}

impl DmPayload {
    /// 从作业负载解析
    pub fn from_value(value: &serde_json::Value) -> Result<Self, DomainError> {
        let payload: DmPayload = serde_json::from_value(value.clone())
            .map_err(|e| DomainError::ValidationError(format!("invalid dm payload: {e}")))?;
        payload.validate()?;
        Ok(payload)
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({ "targets": self.targets })
    }

    /// 校验：至少一个目标，且每个目标和内容都非空
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.targets.is_empty() {
            return Err(DomainError::ValidationError(
                "direct message job needs at least one target".to_string(),
            ));
        }
        for (idx, t) in self.targets.iter().enumerate() {
            if t.target.trim().is_empty() {
                return Err(DomainError::ValidationError(format!(
                    "target #{} has an empty handle",
                    idx + 1
                )));
            }
            if t.message.trim().is_empty() {
                return Err(DomainError::ValidationError(format!(
                    "target #{} ({}) has an empty message",
                    idx + 1,
                    t.target
                )));
            }
        }
        Ok(())
    }

    /// 展示用标题
    pub fn subject(&self) -> String {
        format!("DM ({} targets)", self.targets.len())
    }

    /// 展示用描述
    pub fn description(&self) -> String {
        let handles: Vec<&str> = self.targets.iter().map(|t| t.target.as_str()).collect();
        format!("DM to {}", handles.join(", "))
    }
}

/// 发帖作业负载
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPayload {
    pub caption: String,
    #[serde(default)]
    pub media_urls: Vec<String>,
}

/// 导出作业负载
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub keyword: String,
    #[serde(default = "default_export_limit")]
    pub limit: u32,
}

fn default_export_limit() -> u32 {
    50
}

impl PostPayload {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, DomainError> {
        let payload: PostPayload = serde_json::from_value(value.clone())
            .map_err(|e| DomainError::ValidationError(format!("invalid post payload: {e}")))?;
        payload.validate()?;
        Ok(payload)
    }

    /// 校验：正文非空，媒体地址不能是空白
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.caption.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "post job needs a caption".to_string(),
            ));
        }
        if self.media_urls.iter().any(|u| u.trim().is_empty()) {
            return Err(DomainError::ValidationError(
                "post job has an empty media url".to_string(),
            ));
        }
        Ok(())
    }
}

impl ExportPayload {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, DomainError> {
        let payload: ExportPayload = serde_json::from_value(value.clone())
            .map_err(|e| DomainError::ValidationError(format!("invalid export payload: {e}")))?;
        payload.validate()?;
        Ok(payload)
    }

    /// 校验：关键词非空，数量至少为 1
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.keyword.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "export job needs a keyword".to_string(),
            ));
        }
        if self.limit == 0 {
            return Err(DomainError::ValidationError(
                "export limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
