// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use migration::{Migrator, MigratorTrait};
use outreach::domain::models::job::{Job, JobKind, NewJob};
use outreach::domain::services::clock::Clock;
use outreach::infrastructure::repositories::job_log_repo_impl::JobLogRepositoryImpl;
use outreach::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{json, Value};
use std::sync::Arc;

/// 测试用的数据库与仓库
#[allow(dead_code)]
pub struct TestDb {
    pub db: Arc<DatabaseConnection>,
    pub jobs: Arc<JobRepositoryImpl>,
    pub logs: Arc<JobLogRepositoryImpl>,
}

/// 创建已迁移的内存 SQLite 数据库
///
/// 连接池限制为单连接，所有查询共享同一个内存库
pub async fn setup_db() -> TestDb {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let db = Arc::new(db);
    TestDb {
        jobs: Arc::new(JobRepositoryImpl::new(db.clone())),
        logs: Arc::new(JobLogRepositoryImpl::new(db.clone())),
        db,
    }
}

/// 固定时间的时钟
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

pub fn now() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}

pub fn minutes_ago(minutes: i64) -> DateTime<FixedOffset> {
    now() - Duration::minutes(minutes)
}

pub fn minutes_from_now(minutes: i64) -> DateTime<FixedOffset> {
    now() + Duration::minutes(minutes)
}

pub fn dm_payload(targets: &[&str]) -> Value {
    let targets: Vec<Value> = targets
        .iter()
        .map(|t| json!({ "target": t, "message": format!("hello {t}") }))
        .collect();
    json!({ "targets": targets })
}

/// 构造一个私信作业
pub fn dm_job(account_id: &str, targets: &[&str], scheduled_at: DateTime<FixedOffset>) -> Job {
    Job::new(NewJob {
        kind: JobKind::DirectMessage,
        account_id: account_id.to_string(),
        account_secret: "secret".to_string(),
        subject: format!("DM ({} targets)", targets.len()),
        description: Some(format!("DM to {}", targets.join(", "))),
        payload: dm_payload(targets),
        scheduled_at,
    })
}

/// 构造一个发帖作业
pub fn post_job(account_id: &str, caption: &str, scheduled_at: DateTime<FixedOffset>) -> Job {
    Job::new(NewJob {
        kind: JobKind::Post,
        account_id: account_id.to_string(),
        account_secret: "secret".to_string(),
        subject: caption.to_string(),
        description: None,
        payload: json!({ "caption": caption }),
        scheduled_at,
    })
}
