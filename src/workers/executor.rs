// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::domain::models::delay_policy::DelayPolicy;
use crate::domain::models::job::{Job, JobKind, JobStatus};
use crate::domain::repositories::job_log_repository::JobLogRepository;
use crate::domain::repositories::job_repository::{JobRepository, RepositoryError};
use crate::domain::services::action_driver::ActionDriver;
use crate::domain::services::network_rotator::NetworkIdentityRotator;
use crate::domain::services::session_store::SessionStore;
use crate::workers::error::ExecutionError;
use crate::workers::handlers::{HandlerOutcome, HandlerRegistry, JobContext};

/// 一次执行的统计结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub completed: usize,
    pub failed: usize,
}

/// 作业执行器
///
/// 接收调度器认领的一批作业，按账号分组后逐组、逐个串行执行。
/// 同一账号的作业绝不会并发，单个账号的失败也不会影响其他账号。
pub struct JobExecutor {
    jobs: Arc<dyn JobRepository>,
    logs: Arc<dyn JobLogRepository>,
    driver: Arc<dyn ActionDriver>,
    sessions: Arc<dyn SessionStore>,
    handlers: HandlerRegistry,
    delay: DelayPolicy,
    rotator: Option<Arc<NetworkIdentityRotator>>,
    rotate_before_dispatch: HashSet<JobKind>,
}

impl JobExecutor {
    /// 创建新的执行器实例
    ///
    /// # 参数
    ///
    /// * `jobs` - 作业仓库
    /// * `logs` - 作业日志仓库
    /// * `driver` - 动作驱动
    /// * `sessions` - 会话存储
    /// * `handlers` - 作业类型处理器
    /// * `delay` - 延迟策略
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        logs: Arc<dyn JobLogRepository>,
        driver: Arc<dyn ActionDriver>,
        sessions: Arc<dyn SessionStore>,
        handlers: HandlerRegistry,
        delay: DelayPolicy,
    ) -> Self {
        Self {
            jobs,
            logs,
            driver,
            sessions,
            handlers,
            delay,
            rotator: None,
            rotate_before_dispatch: HashSet::new(),
        }
    }

    /// 为指定作业类型启用分发前的网络身份轮换
    pub fn with_rotation(
        mut self,
        rotator: Arc<NetworkIdentityRotator>,
        kinds: impl IntoIterator<Item = JobKind>,
    ) -> Self {
        self.rotator = Some(rotator);
        self.rotate_before_dispatch = kinds.into_iter().collect();
        self
    }

    /// 执行一批已认领的作业
    ///
    /// # 返回值
    ///
    /// * `Ok(RunReport)` - 全部作业都已进入终态
    /// * `Err(RepositoryError)` - 作业存储不可用，执行中止
    #[instrument(skip_all, fields(batch = jobs.len()))]
    pub async fn run(&self, jobs: Vec<Job>) -> Result<RunReport, RepositoryError> {
        let mut report = RunReport::default();

        for (account_id, group) in group_by_account(jobs) {
            info!(account_id = %account_id, jobs = group.len(), "Processing account group");
            let result = self.run_group(&account_id, group, &mut report).await;
            self.driver.release(&account_id).await;
            result?;
        }

        info!(
            completed = report.completed,
            failed = report.failed,
            "Batch finished"
        );
        Ok(report)
    }

    async fn run_group(
        &self,
        account_id: &str,
        group: Vec<Job>,
        report: &mut RunReport,
    ) -> Result<(), RepositoryError> {
        let secret = group
            .first()
            .map(|j| j.account_secret.clone())
            .unwrap_or_default();

        let mut group_fatal = self.open_session(account_id, &secret).await.err();
        let total = group.len();

        for (idx, job) in group.iter().enumerate() {
            if let Some(message) = &group_fatal {
                self.fail(job, message, "group_fatal", report).await?;
                continue;
            }

            self.logs.append(job.id, "job started").await?;

            match self.execute(job).await {
                Ok(outcome) => self.complete(job, outcome, report).await?,
                Err(ExecutionError::Repository(e)) => return Err(e),
                Err(ExecutionError::GroupFatal(message)) => {
                    error!(account_id, job_id = %job.id, error = %message, "Account session failed, failing remaining jobs");
                    self.fail(job, &message, "group_fatal", report).await?;
                    group_fatal = Some(message);
                }
                Err(e) => self.fail(job, &e.to_string(), e.reason(), report).await?,
            }

            if idx + 1 < total && group_fatal.is_none() {
                let wait = self.delay.inter_job_delay();
                if !wait.is_zero() {
                    tokio::time::sleep(wait).await;
                }
            }
        }

        Ok(())
    }

    /// 恢复或建立账号会话
    ///
    /// 会话不存在、已失效或恢复失败时使用凭据重新登录
    async fn open_session(&self, account_id: &str, secret: &str) -> Result<(), String> {
        match self.sessions.load(account_id).await {
            Ok(Some(blob)) if self.driver.is_authenticated(account_id, &blob).await => {
                match self.driver.resume(account_id, &blob).await {
                    Ok(()) => {
                        info!(account_id, "Resumed saved session");
                        return Ok(());
                    }
                    Err(e) => warn!(account_id, error = %e, "Saved session rejected, logging in again"),
                }
            }
            Ok(_) => {}
            Err(e) => warn!(account_id, error = %e, "Failed to load saved session"),
        }

        let blob = self
            .driver
            .login(account_id, secret)
            .await
            .map_err(|e| format!("login failed for {account_id}: {e}"))?;

        if let Err(e) = self.sessions.save(account_id, &blob).await {
            warn!(account_id, error = %e, "Failed to persist session");
        }
        info!(account_id, driver = self.driver.name(), "Logged in");
        Ok(())
    }

    async fn execute(&self, job: &Job) -> Result<HandlerOutcome, ExecutionError> {
        let handler = self.handlers.get(job.kind).ok_or_else(|| {
            ExecutionError::Handler(format!("no handler registered for {}", job.kind))
        })?;

        if self.rotate_before_dispatch.contains(&job.kind) {
            if let Some(rotator) = &self.rotator {
                self.logs.append(job.id, "rotating network identity").await?;
                let previous = rotator.current_identity().await;
                let ip = rotator.check_changed(previous).await?;
                self.logs
                    .append(job.id, &format!("network identity changed to {ip}"))
                    .await?;
            }
        }

        let ctx = JobContext {
            job,
            driver: self.driver.as_ref(),
            logs: self.logs.as_ref(),
            delay: self.delay,
        };
        handler.handle(&ctx).await
    }

    async fn complete(
        &self,
        job: &Job,
        outcome: HandlerOutcome,
        report: &mut RunReport,
    ) -> Result<(), RepositoryError> {
        let summary = outcome
            .message
            .clone()
            .unwrap_or_else(|| "completed".to_string());

        self.finish(job, JobStatus::Completed, outcome.message, outcome.url)
            .await?;
        self.logs
            .append(job.id, &format!("job completed: {summary}"))
            .await?;

        metrics::counter!("outreach_jobs_completed_total").increment(1);
        info!(job_id = %job.id, kind = %job.kind, "Job completed");
        report.completed += 1;
        Ok(())
    }

    async fn fail(
        &self,
        job: &Job,
        message: &str,
        reason: &'static str,
        report: &mut RunReport,
    ) -> Result<(), RepositoryError> {
        self.finish(job, JobStatus::Failed, Some(message.to_string()), None)
            .await?;
        self.logs
            .append(job.id, &format!("job failed: {message}"))
            .await?;

        metrics::counter!("outreach_jobs_failed_total", "reason" => reason).increment(1);
        warn!(job_id = %job.id, kind = %job.kind, reason, error = %message, "Job failed");
        report.failed += 1;
        Ok(())
    }

    /// 写入终态；状态已被他处改变时只记录警告
    async fn finish(
        &self,
        job: &Job,
        status: JobStatus,
        message: Option<String>,
        url: Option<String>,
    ) -> Result<(), RepositoryError> {
        match self.jobs.update_status(job.id, status, message, url).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::Database(e)) => Err(RepositoryError::Database(e)),
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Job left processing before it finished");
                Ok(())
            }
        }
    }
}

/// 按账号分组，保持每个账号首次出现的顺序以及组内原有顺序
pub fn group_by_account(jobs: Vec<Job>) -> Vec<(String, Vec<Job>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<Job>)> = Vec::new();

    for job in jobs {
        match index.get(&job.account_id) {
            Some(&i) => groups[i].1.push(job),
            None => {
                index.insert(job.account_id.clone(), groups.len());
                groups.push((job.account_id.clone(), vec![job]));
            }
        }
    }

    groups
}
