// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{dm_job, minutes_ago, now, post_job, setup_db, TestDb};
use async_trait::async_trait;
use outreach::domain::models::delay_policy::DelayPolicy;
use outreach::domain::models::job::{Job, JobKind, JobStatus};
use outreach::domain::repositories::job_log_repository::JobLogRepository;
use outreach::domain::repositories::job_repository::JobRepository;
use outreach::domain::services::network_rotator::{
    Identity, IdentityProbe, NetworkIdentityRotator, RotationError, RotationTiming, TetherDevice,
};
use outreach::domain::services::session_store::SessionStore;
use outreach::infrastructure::drivers::simulated::SimulatedActionDriver;
use outreach::infrastructure::session::file_session_store::FileSessionStore;
use outreach::workers::executor::RunReport;
use outreach::workers::handlers::HandlerRegistry;
use outreach::workers::JobExecutor;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Harness {
    t: TestDb,
    driver: Arc<SimulatedActionDriver>,
    sessions: Arc<FileSessionStore>,
    executor: JobExecutor,
    _dir: TempDir,
}

fn harness(t: TestDb, driver: SimulatedActionDriver) -> Harness {
    let dir = TempDir::new().unwrap();
    let driver = Arc::new(driver);
    let sessions = Arc::new(FileSessionStore::new(dir.path()));
    let executor = JobExecutor::new(
        t.jobs.clone(),
        t.logs.clone(),
        driver.clone(),
        sessions.clone(),
        HandlerRegistry::with_defaults(),
        DelayPolicy::none(),
    );
    Harness {
        t,
        driver,
        sessions,
        executor,
        _dir: dir,
    }
}

/// 入库并认领，模拟调度器交给执行器的批次
async fn claim(t: &TestDb, jobs: Vec<Job>) -> Vec<Job> {
    let mut ids = Vec::new();
    for job in jobs {
        ids.push(t.jobs.create(&job).await.unwrap().id);
    }
    t.jobs.claim_processing(&ids, now()).await.unwrap()
}

async fn messages(t: &TestDb, job: &Job) -> Vec<String> {
    t.logs
        .list_for_job(job.id)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.message)
        .collect()
}

/// 三个目标中第二个失败：作业完成，结果标明部分成功
#[tokio::test]
async fn test_direct_message_partial_success() {
    let h = harness(
        setup_db().await,
        SimulatedActionDriver::new().with_unreachable(["bob"]),
    );
    let batch = claim(
        &h.t,
        vec![dm_job("acct-a", &["alice", "bob", "carol"], minutes_ago(1))],
    )
    .await;
    let job = batch[0].clone();

    let report = h.executor.run(batch).await.unwrap();
    assert_eq!(
        report,
        RunReport {
            completed: 1,
            failed: 0
        }
    );

    let stored = h.t.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(
        stored.result_message.as_deref(),
        Some("partial success - sent: 2, failed: 1")
    );
    assert!(stored.completed_at.is_some());

    let logs = messages(&h.t, &job).await;
    assert_eq!(logs[0], "job started");
    assert_eq!(logs[1], "[1/3] sent to alice");
    assert!(logs[2].starts_with("[2/3] failed to send to bob"));
    assert_eq!(logs[3], "[3/3] sent to carol");
    assert_eq!(logs[4], "summary - sent: 2, failed: 1");
    assert_eq!(
        logs[5],
        "job completed: partial success - sent: 2, failed: 1"
    );
    assert_eq!(logs.len(), 6);
}

/// 全部目标失败时作业失败
#[tokio::test]
async fn test_direct_message_all_failed() {
    let h = harness(
        setup_db().await,
        SimulatedActionDriver::new().with_unreachable(["alice", "bob"]),
    );
    let batch = claim(&h.t, vec![dm_job("acct-a", &["alice", "bob"], minutes_ago(1))]).await;
    let job = batch[0].clone();

    let report = h.executor.run(batch).await.unwrap();
    assert_eq!(report.failed, 1);

    let stored = h.t.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(
        stored.result_message.as_deref(),
        Some("all 2 direct messages failed")
    );

    let latest = h.t.logs.latest_for_job(job.id).await.unwrap().unwrap();
    assert_eq!(latest.message, "job failed: all 2 direct messages failed");
}

/// 全部成功时结果信息给出发送数量
#[tokio::test]
async fn test_direct_message_all_sent() {
    let h = harness(setup_db().await, SimulatedActionDriver::new());
    let batch = claim(&h.t, vec![dm_job("acct-a", &["alice", "bob"], minutes_ago(1))]).await;
    let job = batch[0].clone();

    h.executor.run(batch).await.unwrap();

    let stored = h.t.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(
        stored.result_message.as_deref(),
        Some("direct messages sent - sent: 2, failed: 0")
    );
}

/// 一个账号登录失败不影响其他账号
#[tokio::test]
async fn test_account_failure_is_isolated() {
    let h = harness(
        setup_db().await,
        SimulatedActionDriver::new().with_locked_account("acct-locked"),
    );
    let batch = claim(
        &h.t,
        vec![
            dm_job("acct-locked", &["alice"], minutes_ago(3)),
            post_job("acct-locked", "first post", minutes_ago(2)),
            dm_job("acct-ok", &["bob"], minutes_ago(1)),
        ],
    )
    .await;
    assert_eq!(batch.len(), 3);

    let report = h.executor.run(batch.clone()).await.unwrap();
    assert_eq!(
        report,
        RunReport {
            completed: 1,
            failed: 2
        }
    );

    for job in batch.iter().filter(|j| j.account_id == "acct-locked") {
        let stored = h.t.jobs.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert!(stored
            .result_message
            .as_deref()
            .is_some_and(|m| m.starts_with("login failed for acct-locked")));
    }

    let ok = batch.iter().find(|j| j.account_id == "acct-ok").unwrap();
    let stored = h.t.jobs.find_by_id(ok.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
}

/// 登录后保存会话，执行结束释放驱动资源
#[tokio::test]
async fn test_session_saved_and_released() {
    let h = harness(setup_db().await, SimulatedActionDriver::new());
    let batch = claim(
        &h.t,
        vec![
            post_job("acct-a", "first", minutes_ago(2)),
            post_job("acct-a", "second", minutes_ago(1)),
        ],
    )
    .await;

    let report = h.executor.run(batch).await.unwrap();
    assert_eq!(report.completed, 2);

    let saved = h.sessions.load("acct-a").await.unwrap();
    assert!(saved.is_some());
    assert_eq!(h.driver.open_sessions(), 0);
}

/// 保存的会话在下一批次中被复用
#[tokio::test]
async fn test_saved_session_is_resumed() {
    let h = harness(setup_db().await, SimulatedActionDriver::new());

    let first = claim(&h.t, vec![post_job("acct-a", "first", minutes_ago(2))]).await;
    h.executor.run(first).await.unwrap();
    let saved = h.sessions.load("acct-a").await.unwrap().unwrap();

    let second = claim(&h.t, vec![post_job("acct-a", "second", minutes_ago(1))]).await;
    let report = h.executor.run(second).await.unwrap();
    assert_eq!(report.completed, 1);

    // 恢复会话不会重新登录，存储内容保持不变
    let after = h.sessions.load("acct-a").await.unwrap().unwrap();
    assert_eq!(saved, after);
}

/// 处理器错误只让当前作业失败，同组后续作业继续执行
#[tokio::test]
async fn test_handler_error_does_not_stop_group() {
    let h = harness(setup_db().await, SimulatedActionDriver::new());
    let mut broken = post_job("acct-a", "broken", minutes_ago(2));
    broken.payload = serde_json::json!({ "unexpected": true });

    let batch = claim(
        &h.t,
        vec![broken, post_job("acct-a", "fine", minutes_ago(1))],
    )
    .await;
    let (first, second) = (batch[0].clone(), batch[1].clone());

    let report = h.executor.run(batch).await.unwrap();
    assert_eq!(
        report,
        RunReport {
            completed: 1,
            failed: 1
        }
    );

    let first = h.t.jobs.find_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(first.status, JobStatus::Failed);
    assert!(first
        .result_message
        .as_deref()
        .is_some_and(|m| m.starts_with("invalid post payload")));

    let second = h.t.jobs.find_by_id(second.id).await.unwrap().unwrap();
    assert_eq!(second.status, JobStatus::Completed);
}

/// 重置次数计数的假设备
struct CountingDevice {
    resets: Arc<AtomicU32>,
}

#[async_trait]
impl TetherDevice for CountingDevice {
    async fn reset(&self) -> Result<(), RotationError> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn devices(&self) -> Result<Vec<String>, RotationError> {
        Ok(vec!["emulator-5554".to_string()])
    }
}

/// `rotates` 为 false 时地址永远不变
struct CountingProbe {
    resets: Arc<AtomicU32>,
    rotates: bool,
}

#[async_trait]
impl IdentityProbe for CountingProbe {
    async fn current(&self) -> Identity {
        let step = if self.rotates {
            self.resets.load(Ordering::SeqCst)
        } else {
            0
        };
        Identity::Known(IpAddr::from([203, 0, 113, (10 + step) as u8]))
    }
}

fn rotating_harness(t: TestDb, rotates: bool) -> (Harness, Arc<AtomicU32>) {
    let resets = Arc::new(AtomicU32::new(0));
    let rotator = Arc::new(NetworkIdentityRotator::new(
        Arc::new(CountingDevice {
            resets: resets.clone(),
        }),
        Arc::new(CountingProbe {
            resets: resets.clone(),
            rotates,
        }),
        RotationTiming {
            propagation_wait: Duration::from_millis(1),
            retry_backoff: Duration::from_millis(1),
            max_attempts: 3,
        },
    ));

    let mut h = harness(t, SimulatedActionDriver::new());
    h.executor = h
        .executor
        .with_rotation(rotator, [JobKind::DirectMessage]);
    (h, resets)
}

/// 配置了轮换的类型在分发前更换网络身份，其他类型不轮换
#[tokio::test]
async fn test_rotation_before_dispatch() {
    let (h, resets) = rotating_harness(setup_db().await, true);
    let batch = claim(
        &h.t,
        vec![
            dm_job("acct-a", &["alice"], minutes_ago(2)),
            post_job("acct-a", "no rotation", minutes_ago(1)),
        ],
    )
    .await;
    let (dm, post) = (batch[0].clone(), batch[1].clone());

    let report = h.executor.run(batch).await.unwrap();
    assert_eq!(report.completed, 2);
    assert_eq!(resets.load(Ordering::SeqCst), 1);

    let logs = messages(&h.t, &dm).await;
    assert_eq!(logs[0], "job started");
    assert_eq!(logs[1], "rotating network identity");
    assert_eq!(logs[2], "network identity changed to 203.0.113.11");

    let logs = messages(&h.t, &post).await;
    assert!(!logs.iter().any(|m| m.contains("rotating")));
}

/// 身份始终不变时只有当前作业失败
#[tokio::test]
async fn test_rotation_failure_fails_only_that_job() {
    let (h, resets) = rotating_harness(setup_db().await, false);
    let batch = claim(
        &h.t,
        vec![
            dm_job("acct-a", &["alice"], minutes_ago(2)),
            post_job("acct-a", "still runs", minutes_ago(1)),
        ],
    )
    .await;
    let (dm, post) = (batch[0].clone(), batch[1].clone());

    let report = h.executor.run(batch).await.unwrap();
    assert_eq!(
        report,
        RunReport {
            completed: 1,
            failed: 1
        }
    );
    assert_eq!(resets.load(Ordering::SeqCst), 3);

    let dm = h.t.jobs.find_by_id(dm.id).await.unwrap().unwrap();
    assert_eq!(dm.status, JobStatus::Failed);
    assert_eq!(
        dm.result_message.as_deref(),
        Some("network rotation failed: Network identity unchanged after 3 attempts")
    );

    let post = h.t.jobs.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(post.status, JobStatus::Completed);
}
