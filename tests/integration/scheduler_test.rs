// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{dm_job, minutes_ago, minutes_from_now, now, post_job, setup_db, FixedClock, TestDb};
use async_trait::async_trait;
use outreach::domain::models::delay_policy::DelayPolicy;
use outreach::domain::models::job::JobStatus;
use outreach::domain::models::job_log::JobLog;
use outreach::domain::repositories::job_log_repository::JobLogRepository;
use outreach::domain::repositories::job_repository::{JobRepository, RepositoryError};
use outreach::infrastructure::drivers::simulated::SimulatedActionDriver;
use outreach::infrastructure::repositories::job_log_repo_impl::JobLogRepositoryImpl;
use outreach::infrastructure::session::file_session_store::FileSessionStore;
use outreach::queue::scheduler::{JobScheduler, INTERRUPTED_MESSAGE, STORE_FAILURE_MESSAGE};
use outreach::workers::executor::RunReport;
use outreach::workers::handlers::HandlerRegistry;
use outreach::workers::JobExecutor;
use sea_orm::DbErr;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

fn build_scheduler(t: &TestDb, sessions_dir: &TempDir) -> JobScheduler {
    let executor = JobExecutor::new(
        t.jobs.clone(),
        t.logs.clone(),
        Arc::new(SimulatedActionDriver::new()),
        Arc::new(FileSessionStore::new(sessions_dir.path())),
        HandlerRegistry::with_defaults(),
        DelayPolicy::none(),
    );

    JobScheduler::new(
        t.jobs.clone(),
        t.logs.clone(),
        Arc::new(executor),
        Arc::new(FixedClock(now())),
        Duration::from_secs(1),
    )
}

/// 启动时遗留的 Processing 作业全部标记为失败并写入日志
#[tokio::test]
async fn test_recover_marks_interrupted_jobs_failed() {
    let t = setup_db().await;
    let dir = TempDir::new().unwrap();
    let scheduler = build_scheduler(&t, &dir);

    let job = t
        .jobs
        .create(&dm_job("acct-a", &["alice"], minutes_ago(3)))
        .await
        .unwrap();
    t.jobs.claim_processing(&[job.id], now()).await.unwrap();

    let recovered = scheduler.recover().await.unwrap();
    assert_eq!(recovered, 1);

    let job = t.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.result_message.as_deref(), Some(INTERRUPTED_MESSAGE));

    let latest = t.logs.latest_for_job(job.id).await.unwrap().unwrap();
    assert_eq!(latest.message, "job failed: interrupted by restart");

    // 恢复后作业可以重试
    let retried = t.jobs.reset_for_retry(job.id).await.unwrap();
    assert_eq!(retried.status, JobStatus::Pending);

    assert_eq!(scheduler.recover().await.unwrap(), 0);
}

/// 一次轮询只执行到期的作业
#[tokio::test]
async fn test_tick_runs_only_due_jobs() {
    let t = setup_db().await;
    let dir = TempDir::new().unwrap();
    let scheduler = build_scheduler(&t, &dir);

    let due_dm = t
        .jobs
        .create(&dm_job("acct-a", &["alice", "bob"], minutes_ago(2)))
        .await
        .unwrap();
    let due_post = t
        .jobs
        .create(&post_job("acct-b", "launch day", minutes_ago(1)))
        .await
        .unwrap();
    let future = t
        .jobs
        .create(&dm_job("acct-a", &["carol"], minutes_from_now(60)))
        .await
        .unwrap();

    let report = scheduler.tick().await.unwrap();
    assert_eq!(
        report,
        Some(RunReport {
            completed: 2,
            failed: 0
        })
    );

    let due_dm = t.jobs.find_by_id(due_dm.id).await.unwrap().unwrap();
    assert_eq!(due_dm.status, JobStatus::Completed);

    let due_post = t.jobs.find_by_id(due_post.id).await.unwrap().unwrap();
    assert_eq!(due_post.status, JobStatus::Completed);
    assert!(due_post
        .result_url
        .as_deref()
        .is_some_and(|url| url.starts_with("https://simulated.invalid/p/")));

    let future = t.jobs.find_by_id(future.id).await.unwrap().unwrap();
    assert_eq!(future.status, JobStatus::Pending);

    // 没有到期作业时什么都不做
    assert_eq!(scheduler.tick().await.unwrap(), None);
}

/// 有账号作业进行中时，该账号的到期作业等到下一轮
#[tokio::test]
async fn test_tick_skips_account_with_processing_job() {
    let t = setup_db().await;
    let dir = TempDir::new().unwrap();
    let scheduler = build_scheduler(&t, &dir);

    let running = t
        .jobs
        .create(&dm_job("acct-a", &["alice"], minutes_ago(5)))
        .await
        .unwrap();
    t.jobs.claim_processing(&[running.id], now()).await.unwrap();

    let waiting = t
        .jobs
        .create(&dm_job("acct-a", &["bob"], minutes_ago(1)))
        .await
        .unwrap();

    assert_eq!(scheduler.tick().await.unwrap(), None);
    let waiting = t.jobs.find_by_id(waiting.id).await.unwrap().unwrap();
    assert_eq!(waiting.status, JobStatus::Pending);
}

/// 前 `failures` 次追加失败的日志仓库
struct FlakyLogs {
    inner: Arc<JobLogRepositoryImpl>,
    failures: AtomicU32,
}

#[async_trait]
impl JobLogRepository for FlakyLogs {
    async fn append(&self, job_id: Uuid, message: &str) -> Result<JobLog, RepositoryError> {
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(RepositoryError::Database(DbErr::Custom(
                "connection reset".to_string(),
            )));
        }
        self.inner.append(job_id, message).await
    }

    async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<JobLog>, RepositoryError> {
        self.inner.list_for_job(job_id).await
    }

    async fn latest_for_job(&self, job_id: Uuid) -> Result<Option<JobLog>, RepositoryError> {
        self.inner.latest_for_job(job_id).await
    }

    async fn latest_for_jobs(
        &self,
        job_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, JobLog>, RepositoryError> {
        self.inner.latest_for_jobs(job_ids).await
    }
}

/// 存储故障中止的批次不会让作业停留在 Processing，账号在下一轮继续调度
#[tokio::test]
async fn test_store_failure_does_not_strand_claimed_jobs() {
    let t = setup_db().await;
    let dir = TempDir::new().unwrap();

    let flaky = Arc::new(FlakyLogs {
        inner: t.logs.clone(),
        failures: AtomicU32::new(1),
    });
    let executor = JobExecutor::new(
        t.jobs.clone(),
        flaky,
        Arc::new(SimulatedActionDriver::new()),
        Arc::new(FileSessionStore::new(dir.path())),
        HandlerRegistry::with_defaults(),
        DelayPolicy::none(),
    );
    let scheduler = JobScheduler::new(
        t.jobs.clone(),
        t.logs.clone(),
        Arc::new(executor),
        Arc::new(FixedClock(now())),
        Duration::from_secs(1),
    );

    let a1 = t
        .jobs
        .create(&dm_job("acct-a", &["alice"], minutes_ago(3)))
        .await
        .unwrap();
    let b1 = t
        .jobs
        .create(&post_job("acct-b", "launch day", minutes_ago(2)))
        .await
        .unwrap();

    let err = scheduler.tick().await.unwrap_err();
    assert!(matches!(err, RepositoryError::Database(_)));

    for id in [a1.id, b1.id] {
        let job = t.jobs.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.result_message.as_deref(), Some(STORE_FAILURE_MESSAGE));

        let latest = t.logs.latest_for_job(id).await.unwrap().unwrap();
        assert_eq!(latest.message, "job failed: aborted: job store unavailable");
    }

    // 失败的作业可由运营人员重试或删除
    t.jobs.reset_for_retry(a1.id).await.unwrap();
    t.jobs.delete(b1.id).await.unwrap();

    let a2 = t
        .jobs
        .create(&post_job("acct-a", "next post", minutes_ago(1)))
        .await
        .unwrap();
    let report = scheduler.tick().await.unwrap();
    assert_eq!(
        report,
        Some(RunReport {
            completed: 2,
            failed: 0
        })
    );

    let a2 = t.jobs.find_by_id(a2.id).await.unwrap().unwrap();
    assert_eq!(a2.status, JobStatus::Completed);
}
