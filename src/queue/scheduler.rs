// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::repositories::job_log_repository::JobLogRepository;
use crate::domain::repositories::job_repository::{JobRepository, RepositoryError};
use crate::domain::services::clock::Clock;
use crate::workers::executor::{JobExecutor, RunReport};

/// 崩溃恢复时写入的结果信息
pub const INTERRUPTED_MESSAGE: &str = "interrupted by restart";

/// 批次因作业存储故障中止时写入的结果信息
pub const STORE_FAILURE_MESSAGE: &str = "aborted: job store unavailable";

/// 作业调度器
///
/// 周期性轮询到期的 Pending 作业，原子认领后交给执行器。
/// 轮询是纯拉取式的，不在内存中保留任何定时器。
#[derive(Clone)]
pub struct JobScheduler {
    jobs: Arc<dyn JobRepository>,
    logs: Arc<dyn JobLogRepository>,
    executor: Arc<JobExecutor>,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
    /// 中止批次里尚未写入终态的作业，存储恢复后标记为失败
    stranded: Arc<Mutex<Vec<Uuid>>>,
}

impl JobScheduler {
    /// 创建新的作业调度器实例
    ///
    /// # 参数
    ///
    /// * `jobs` - 作业仓库
    /// * `logs` - 作业日志仓库
    /// * `executor` - 作业执行器
    /// * `clock` - 时钟
    /// * `tick_interval` - 轮询间隔
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        logs: Arc<dyn JobLogRepository>,
        executor: Arc<JobExecutor>,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            jobs,
            logs,
            executor,
            clock,
            tick_interval,
            stranded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 崩溃恢复
    ///
    /// 进程启动时仍处于 Processing 的作业属于上一次运行中断的批次，
    /// 全部标记为 Failed 并写入日志。必须在第一次轮询前调用。
    ///
    /// # 返回值
    ///
    /// 被恢复的作业数量
    pub async fn recover(&self) -> Result<usize, RepositoryError> {
        let ids = self.jobs.fail_all_processing(INTERRUPTED_MESSAGE).await?;

        for id in &ids {
            self.logs
                .append(*id, "job failed: interrupted by restart")
                .await?;
            metrics::counter!("outreach_jobs_failed_total", "reason" => "interrupted")
                .increment(1);
        }

        if !ids.is_empty() {
            warn!("Marked {} interrupted jobs as failed", ids.len());
        }
        Ok(ids.len())
    }

    /// 执行一次轮询
    ///
    /// # 返回值
    ///
    /// * `Ok(None)` - 没有到期作业，或全部被其他批次抢先认领
    /// * `Ok(Some(RunReport))` - 本次认领并执行的结果
    /// * `Err(RepositoryError)` - 作业存储不可用
    ///
    /// 执行中途存储出错时，本批次仍处于 Processing 的作业会被标记为失败；
    /// 当时无法写入的，在之后的轮询中先行处理，处理完成前不会认领新作业。
    pub async fn tick(&self) -> Result<Option<RunReport>, RepositoryError> {
        self.fail_stranded().await?;

        let now = self.clock.now();
        let due = self.jobs.find_due_and_pending(now).await?;
        if due.is_empty() {
            debug!("No due jobs");
            return Ok(None);
        }

        let ids: Vec<_> = due.iter().map(|j| j.id).collect();
        let claimed = self.jobs.claim_processing(&ids, now).await?;
        if claimed.is_empty() {
            debug!("Due jobs were claimed elsewhere");
            return Ok(None);
        }

        metrics::counter!("outreach_jobs_claimed_total").increment(claimed.len() as u64);
        info!(due = due.len(), claimed = claimed.len(), "Claimed jobs");

        let claimed_ids: Vec<Uuid> = claimed.iter().map(|j| j.id).collect();
        match self.executor.run(claimed).await {
            Ok(report) => Ok(Some(report)),
            Err(e) => {
                error!(error = %e, "Batch aborted by job store failure");
                self.stranded.lock().await.extend(claimed_ids);
                if let Err(cleanup) = self.fail_stranded().await {
                    warn!(error = %cleanup, "Aborted jobs will be failed on a later tick");
                }
                Err(e)
            }
        }
    }

    /// 将中止批次里仍处于 Processing 的作业标记为失败
    async fn fail_stranded(&self) -> Result<(), RepositoryError> {
        let mut stranded = self.stranded.lock().await;
        if stranded.is_empty() {
            return Ok(());
        }

        let failed = self
            .jobs
            .fail_processing(&stranded, STORE_FAILURE_MESSAGE)
            .await?;
        stranded.clear();

        for id in &failed {
            if let Err(e) = self
                .logs
                .append(*id, &format!("job failed: {STORE_FAILURE_MESSAGE}"))
                .await
            {
                warn!(job_id = %id, error = %e, "Failed to log aborted job");
            }
            metrics::counter!("outreach_jobs_failed_total", "reason" => "store").increment(1);
        }

        if !failed.is_empty() {
            warn!("Marked {} jobs from an aborted batch as failed", failed.len());
        }
        Ok(())
    }

    /// 启动调度器后台任务
    ///
    /// 轮询在同一个任务中串行执行，执行时间超过间隔时后续轮询顺延，
    /// 不会出现重叠的批次。
    ///
    /// # 返回值
    ///
    /// 返回后台任务的句柄
    pub fn start(&self) -> JoinHandle<()> {
        let scheduler = self.clone();

        tokio::spawn(async move {
            let mut ticker = interval(scheduler.tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                "Job scheduler started, polling every {:?}",
                scheduler.tick_interval
            );

            loop {
                ticker.tick().await;

                if let Err(e) = scheduler.tick().await {
                    error!("Scheduler tick failed: {}", e);
                }
            }
        })
    }
}
