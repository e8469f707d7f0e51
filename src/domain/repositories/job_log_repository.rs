// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job_log::JobLog;
use crate::domain::repositories::job_repository::RepositoryError;
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// 作业日志仓库特质
///
/// 只追加的日志接收端，不提供修改或单条删除
#[async_trait]
pub trait JobLogRepository: Send + Sync {
    /// 追加一条日志
    async fn append(&self, job_id: Uuid, message: &str) -> Result<JobLog, RepositoryError>;

    /// 按时间升序返回作业的全部日志
    async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<JobLog>, RepositoryError>;

    /// 作业的最新一条日志
    async fn latest_for_job(&self, job_id: Uuid) -> Result<Option<JobLog>, RepositoryError>;

    /// 批量获取多个作业的最新日志
    async fn latest_for_jobs(
        &self,
        job_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, JobLog>, RepositoryError>;
}
