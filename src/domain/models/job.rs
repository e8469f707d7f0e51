// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::job_log::JobLog;

/// 作业实体
///
/// 表示一个绑定到单个账号的调度工作单元。同一 `account_id` 下的作业
/// 永远不会并发执行，`Processing` 状态充当互斥锁。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// 作业唯一标识符，创建后不可变
    pub id: Uuid,
    /// 作业类型，决定执行路径
    pub kind: JobKind,
    /// 执行该作业所用的账号
    pub account_id: String,
    /// 账号凭据，不会出现在任何响应体中
    #[serde(skip_serializing, default)]
    pub account_secret: String,
    /// 展示用标题，例如 "DM (3 targets)"
    pub subject: String,
    /// 展示用描述
    pub description: Option<String>,
    /// 类型相关的负载数据
    pub payload: serde_json::Value,
    /// 当前生命周期状态
    pub status: JobStatus,
    /// 最早可执行时间
    pub scheduled_at: DateTime<FixedOffset>,
    /// 结果信息，仅在终态转换时写入
    pub result_message: Option<String>,
    /// 结果链接，仅在终态转换时写入
    pub result_url: Option<String>,
    /// 完成时间，仅在终态转换时写入
    pub completed_at: Option<DateTime<FixedOffset>>,
    /// 认领令牌，标识持有该作业的调度批次
    #[serde(skip_serializing, default)]
    pub claim_token: Option<Uuid>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
    /// 更新时间，每次状态变化都会刷新
    pub updated_at: DateTime<FixedOffset>,
}

/// 作业类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// 批量私信，负载为目标列表
    #[default]
    DirectMessage,
    /// 发布帖子
    Post,
    /// 按关键词导出帖子
    Export,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobKind::DirectMessage => write!(f, "direct_message"),
            JobKind::Post => write!(f, "post"),
            JobKind::Export => write!(f, "export"),
        }
    }
}

impl FromStr for JobKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct_message" | "dm" => Ok(JobKind::DirectMessage),
            "post" => Ok(JobKind::Post),
            "export" => Ok(JobKind::Export),
            other => Err(DomainError::ValidationError(format!(
                "unknown job kind: {other}"
            ))),
        }
    }
}

/// 作业状态枚举
///
/// 状态转换遵循以下流程：
/// Pending → Processing → Completed/Failed，Failed → Pending（人工重试）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// 等待调度
    #[default]
    Pending,
    /// 已被认领，正在执行
    Processing,
    /// 执行成功（包括部分成功）
    Completed,
    /// 执行失败
    Failed,
}

impl JobStatus {
    /// 判断状态转换是否合法
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
                | (JobStatus::Failed, JobStatus::Pending)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(DomainError::ValidationError(format!(
                "unknown job status: {other}"
            ))),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 输入数据不符合领域规则
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// 新作业的创建参数
#[derive(Debug, Clone)]
pub struct NewJob {
    pub kind: JobKind,
    pub account_id: String,
    pub account_secret: String,
    pub subject: String,
    pub description: Option<String>,
    pub payload: serde_json::Value,
    pub scheduled_at: DateTime<FixedOffset>,
}

impl NewJob {
    /// 校验创建参数
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.account_id.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "account_id cannot be empty".to_string(),
            ));
        }
        if self.account_secret.is_empty() {
            return Err(DomainError::ValidationError(
                "account_secret cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Job {
    /// 根据创建参数构建一个处于 Pending 状态的作业
    pub fn new(new_job: NewJob) -> Self {
        let now: DateTime<FixedOffset> = Utc::now().into();
        Self {
            id: Uuid::new_v4(),
            kind: new_job.kind,
            account_id: new_job.account_id,
            account_secret: new_job.account_secret,
            subject: new_job.subject,
            description: new_job.description,
            payload: new_job.payload,
            status: JobStatus::Pending,
            scheduled_at: new_job.scheduled_at,
            result_message: None,
            result_url: None,
            completed_at: None,
            claim_token: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 作业列表项
///
/// 列表视图只内联最新一条日志，不包含完整日志数组
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    #[serde(flatten)]
    pub job: Job,
    pub latest_log: Option<JobLog>,
}

/// 作业详情，包含完整的日志历史（按创建时间升序）
#[derive(Debug, Clone, Serialize)]
pub struct JobWithLogs {
    #[serde(flatten)]
    pub job: Job,
    pub logs: Vec<JobLog>,
}
