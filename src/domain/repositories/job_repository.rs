// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Job, JobStatus};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use sea_orm::DbErr;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 当前状态不允许该操作，未做任何修改
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// 作业列表排序字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSortField {
    #[serde(alias = "createdAt")]
    CreatedAt,
    #[default]
    #[serde(alias = "updatedAt")]
    UpdatedAt,
    #[serde(alias = "scheduledAt")]
    ScheduledAt,
    #[serde(alias = "completedAt")]
    CompletedAt,
    Status,
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// 作业列表查询参数
#[derive(Debug, Default, Clone)]
pub struct JobListQuery {
    pub status: Option<JobStatus>,
    /// 在 subject、description、result_message 中做模糊匹配
    pub search: Option<String>,
    pub order_by: JobSortField,
    pub order: SortOrder,
}

/// 作业仓库特质
///
/// 作业存储的唯一事实来源。所有状态变更都会刷新 `updated_at`，
/// 所有条件更新在条件不满足时返回 `Conflict` 且不修改任何数据。
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// 创建新作业
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError>;

    /// 根据ID查找作业
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, RepositoryError>;

    /// 按过滤条件列出作业
    async fn list(&self, query: &JobListQuery) -> Result<Vec<Job>, RepositoryError>;

    /// 查找到期的待处理作业
    ///
    /// 已有 Processing 作业的账号会被排除
    async fn find_due_and_pending(
        &self,
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<Job>, RepositoryError>;

    /// 原子地将一组 Pending 作业转为 Processing
    ///
    /// 只返回本次真正认领到的作业；已被其他批次认领或状态已变化的作业会被跳过
    async fn claim_processing(
        &self,
        ids: &[Uuid],
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<Job>, RepositoryError>;

    /// 将 Processing 作业转为终态
    async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
        result_message: Option<String>,
        result_url: Option<String>,
    ) -> Result<(), RepositoryError>;

    /// 将所有 Processing 作业标记为 Failed，返回受影响的作业ID
    async fn fail_all_processing(&self, message: &str) -> Result<Vec<Uuid>, RepositoryError>;

    /// 将指定作业中仍处于 Processing 的标记为 Failed，返回受影响的作业ID
    async fn fail_processing(
        &self,
        ids: &[Uuid],
        message: &str,
    ) -> Result<Vec<Uuid>, RepositoryError>;

    /// 将 Failed 作业重置为 Pending，并清空结果字段
    async fn reset_for_retry(&self, id: Uuid) -> Result<Job, RepositoryError>;

    /// 删除非 Processing 作业及其日志
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}
