// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::domain::models::direct_message::{DmPayload, ExportPayload, PostPayload};
use crate::domain::models::job::{DomainError, Job, JobKind, JobSummary, JobWithLogs, NewJob};
use crate::domain::models::job_log::JobLog;
use crate::domain::repositories::job_log_repository::JobLogRepository;
use crate::domain::repositories::job_repository::{JobListQuery, JobRepository, RepositoryError};

/// 作业服务错误类型
#[derive(Error, Debug)]
pub enum JobServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 作业服务
///
/// 提供面向运营人员的作业操作：创建、查询、重试和删除
pub struct JobService {
    jobs: Arc<dyn JobRepository>,
    logs: Arc<dyn JobLogRepository>,
}

impl JobService {
    pub fn new(jobs: Arc<dyn JobRepository>, logs: Arc<dyn JobLogRepository>) -> Self {
        Self { jobs, logs }
    }

    /// 创建作业并写入注册日志
    ///
    /// # 参数
    ///
    /// * `new_job` - 创建参数，负载按作业类型校验
    ///
    /// # 返回值
    ///
    /// * `Ok(Job)` - 以 Pending 状态创建的作业
    /// * `Err(JobServiceError::Domain)` - 输入不合法，不会创建任何记录
    pub async fn create_job(&self, new_job: NewJob) -> Result<Job, JobServiceError> {
        new_job.validate()?;

        let registered = match new_job.kind {
            JobKind::DirectMessage => {
                let payload = DmPayload::from_value(&new_job.payload)?;
                format!("job registered ({} targets)", payload.targets.len())
            }
            JobKind::Post => {
                PostPayload::from_value(&new_job.payload)?;
                "job registered".to_string()
            }
            JobKind::Export => {
                ExportPayload::from_value(&new_job.payload)?;
                "job registered".to_string()
            }
        };

        let job = self.jobs.create(&Job::new(new_job)).await?;
        self.logs.append(job.id, &registered).await?;

        info!(
            job_id = %job.id,
            account_id = %job.account_id,
            kind = %job.kind,
            scheduled_at = %job.scheduled_at,
            "Job created"
        );
        Ok(job)
    }

    /// 列出作业，每项只附带最新一条日志
    pub async fn list_jobs(&self, query: &JobListQuery) -> Result<Vec<JobSummary>, RepositoryError> {
        let jobs = self.jobs.list(query).await?;
        let ids: Vec<Uuid> = jobs.iter().map(|j| j.id).collect();
        let mut latest = self.logs.latest_for_jobs(&ids).await?;

        Ok(jobs
            .into_iter()
            .map(|job| {
                let latest_log = latest.remove(&job.id);
                JobSummary { job, latest_log }
            })
            .collect())
    }

    /// 获取作业及其完整日志
    pub async fn get_job(&self, id: Uuid) -> Result<JobWithLogs, RepositoryError> {
        let job = self
            .jobs
            .find_by_id(id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let logs = self.logs.list_for_job(id).await?;
        Ok(JobWithLogs { job, logs })
    }

    /// 重试失败的作业
    ///
    /// 只有 Failed 作业可以重试。重复调用时第二次返回 `Conflict`，
    /// 且不会再写入日志。
    pub async fn retry_job(&self, id: Uuid) -> Result<Job, RepositoryError> {
        let job = self.jobs.reset_for_retry(id).await?;
        self.logs.append(id, "retry requested").await?;
        info!(job_id = %id, "Job reset for retry");
        Ok(job)
    }

    /// 删除作业及其日志，Processing 作业会被拒绝
    pub async fn delete_job(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.jobs.delete(id).await?;
        info!(job_id = %id, "Job deleted");
        Ok(())
    }

    /// 作业的全部日志
    pub async fn job_logs(&self, id: Uuid) -> Result<Vec<JobLog>, RepositoryError> {
        self.ensure_exists(id).await?;
        self.logs.list_for_job(id).await
    }

    /// 作业的最新日志
    pub async fn latest_log(&self, id: Uuid) -> Result<Option<JobLog>, RepositoryError> {
        self.ensure_exists(id).await?;
        self.logs.latest_for_job(id).await
    }

    async fn ensure_exists(&self, id: Uuid) -> Result<(), RepositoryError> {
        match self.jobs.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }
}
