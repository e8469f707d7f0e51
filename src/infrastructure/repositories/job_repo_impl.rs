// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{DomainError, Job, JobStatus};
use crate::domain::repositories::job_repository::{
    JobListQuery, JobRepository, JobSortField, RepositoryError, SortOrder,
};
use crate::infrastructure::database::entities::{job as job_entity, job_log as job_log_entity};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, Query},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, Order,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// 作业仓库实现
///
/// 基于SeaORM实现的作业数据访问层。时间戳统一以 UTC 写入，
/// 保证 SQLite 下的文本比较与时间顺序一致。
#[derive(Clone)]
pub struct JobRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl JobRepositoryImpl {
    /// 创建新的作业仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 条件更新未命中时，区分记录不存在与状态冲突
    async fn miss_reason(&self, id: Uuid, expected: JobStatus) -> RepositoryError {
        match self.find_by_id(id).await {
            Ok(Some(job)) => RepositoryError::Conflict(format!(
                "job {} is {}, expected {}",
                id, job.status, expected
            )),
            Ok(None) => RepositoryError::NotFound,
            Err(e) => e,
        }
    }

    /// 把 Processing 作业标记为 Failed；`ids` 为 None 时处理全部 Processing 作业
    async fn fail_stuck(
        &self,
        ids: Option<&[Uuid]>,
        message: &str,
    ) -> Result<Vec<Uuid>, RepositoryError> {
        let now = now_utc();
        let txn = self.db.begin().await?;

        let mut query = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(JobStatus::Processing.to_string()));
        if let Some(ids) = ids {
            query = query.filter(job_entity::Column::Id.is_in(ids.to_vec()));
        }
        let stuck: Vec<Uuid> = query.all(&txn).await?.into_iter().map(|m| m.id).collect();

        if !stuck.is_empty() {
            job_entity::Entity::update_many()
                .col_expr(
                    job_entity::Column::Status,
                    Expr::value(JobStatus::Failed.to_string()),
                )
                .col_expr(
                    job_entity::Column::ResultMessage,
                    Expr::value(Some(message.to_string())),
                )
                .col_expr(job_entity::Column::CompletedAt, Expr::value(Some(now)))
                .col_expr(job_entity::Column::UpdatedAt, Expr::value(now))
                .filter(job_entity::Column::Id.is_in(stuck.clone()))
                .filter(job_entity::Column::Status.eq(JobStatus::Processing.to_string()))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(stuck)
    }
}

fn to_utc(dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    dt.with_timezone(&Utc).fixed_offset()
}

fn now_utc() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}

/// 库中无法识别的类型或状态按数据损坏处理
fn corrupt_row(id: Uuid, e: DomainError) -> RepositoryError {
    warn!(job_id = %id, error = %e, "Job row holds an unrecognised value");
    RepositoryError::Database(DbErr::Custom(format!("job {id}: {e}")))
}

impl TryFrom<job_entity::Model> for Job {
    type Error = RepositoryError;

    fn try_from(model: job_entity::Model) -> Result<Self, Self::Error> {
        let kind = model.kind.parse().map_err(|e| corrupt_row(model.id, e))?;
        let status = model.status.parse().map_err(|e| corrupt_row(model.id, e))?;

        Ok(Self {
            id: model.id,
            kind,
            account_id: model.account_id,
            account_secret: model.account_secret,
            subject: model.subject,
            description: model.description,
            payload: model.payload,
            status,
            scheduled_at: model.scheduled_at,
            result_message: model.result_message,
            result_url: model.result_url,
            completed_at: model.completed_at,
            claim_token: model.claim_token,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<Job> for job_entity::ActiveModel {
    fn from(job: Job) -> Self {
        Self {
            id: Set(job.id),
            kind: Set(job.kind.to_string()),
            account_id: Set(job.account_id),
            account_secret: Set(job.account_secret),
            subject: Set(job.subject),
            description: Set(job.description),
            payload: Set(job.payload),
            status: Set(job.status.to_string()),
            scheduled_at: Set(to_utc(job.scheduled_at)),
            result_message: Set(job.result_message),
            result_url: Set(job.result_url),
            completed_at: Set(job.completed_at.map(to_utc)),
            claim_token: Set(job.claim_token),
            claimed_at: Set(None),
            created_at: Set(to_utc(job.created_at)),
            updated_at: Set(to_utc(job.updated_at)),
        }
    }
}

fn sort_column(field: JobSortField) -> job_entity::Column {
    match field {
        JobSortField::CreatedAt => job_entity::Column::CreatedAt,
        JobSortField::UpdatedAt => job_entity::Column::UpdatedAt,
        JobSortField::ScheduledAt => job_entity::Column::ScheduledAt,
        JobSortField::CompletedAt => job_entity::Column::CompletedAt,
        JobSortField::Status => job_entity::Column::Status,
    }
}

/// 当前持有 Processing 作业的账号集合
fn busy_accounts() -> sea_orm::sea_query::SelectStatement {
    Query::select()
        .column(job_entity::Column::AccountId)
        .from(job_entity::Entity)
        .and_where(job_entity::Column::Status.eq(JobStatus::Processing.to_string()))
        .to_owned()
}

#[async_trait]
impl JobRepository for JobRepositoryImpl {
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError> {
        let model: job_entity::ActiveModel = job.clone().into();

        let inserted = model.insert(self.db.as_ref()).await?;
        Job::try_from(inserted)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, RepositoryError> {
        let model = job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        model.map(Job::try_from).transpose()
    }

    async fn list(&self, query: &JobListQuery) -> Result<Vec<Job>, RepositoryError> {
        let mut select = job_entity::Entity::find();

        if let Some(status) = query.status {
            select = select.filter(job_entity::Column::Status.eq(status.to_string()));
        }

        if let Some(search) = query.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                select = select.filter(
                    Condition::any()
                        .add(job_entity::Column::Subject.contains(search))
                        .add(job_entity::Column::Description.contains(search))
                        .add(job_entity::Column::ResultMessage.contains(search)),
                );
            }
        }

        let order = match query.order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };

        let models = select
            .order_by(sort_column(query.order_by), order)
            .order_by_asc(job_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        models.into_iter().map(Job::try_from).collect()
    }

    async fn find_due_and_pending(
        &self,
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<Job>, RepositoryError> {
        let models = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(JobStatus::Pending.to_string()))
            .filter(job_entity::Column::ScheduledAt.lte(to_utc(now)))
            .filter(job_entity::Column::AccountId.not_in_subquery(busy_accounts()))
            .order_by_asc(job_entity::Column::ScheduledAt)
            .order_by_asc(job_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        models.into_iter().map(Job::try_from).collect()
    }

    async fn claim_processing(
        &self,
        ids: &[Uuid],
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<Job>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let token = Uuid::new_v4();
        let now = to_utc(now);
        let txn = self.db.begin().await?;

        // 单条条件更新：只有仍为 Pending 且所属账号没有进行中作业的行会被认领
        job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::Status,
                Expr::value(JobStatus::Processing.to_string()),
            )
            .col_expr(job_entity::Column::ClaimToken, Expr::value(Some(token)))
            .col_expr(job_entity::Column::ClaimedAt, Expr::value(Some(now)))
            .col_expr(job_entity::Column::UpdatedAt, Expr::value(now_utc()))
            .filter(job_entity::Column::Id.is_in(ids.to_vec()))
            .filter(job_entity::Column::Status.eq(JobStatus::Pending.to_string()))
            .filter(job_entity::Column::AccountId.not_in_subquery(busy_accounts()))
            .exec(&txn)
            .await?;

        let claimed = job_entity::Entity::find()
            .filter(job_entity::Column::ClaimToken.eq(token))
            .order_by_asc(job_entity::Column::ScheduledAt)
            .order_by_asc(job_entity::Column::CreatedAt)
            .all(&txn)
            .await?;

        txn.commit().await?;

        claimed.into_iter().map(Job::try_from).collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
        result_message: Option<String>,
        result_url: Option<String>,
    ) -> Result<(), RepositoryError> {
        if !JobStatus::Processing.can_transition_to(status) {
            return Err(RepositoryError::Conflict(format!(
                "processing jobs can only move to a terminal status, not {}",
                status
            )));
        }

        let now = now_utc();
        let result = job_entity::Entity::update_many()
            .col_expr(job_entity::Column::Status, Expr::value(status.to_string()))
            .col_expr(job_entity::Column::ResultMessage, Expr::value(result_message))
            .col_expr(job_entity::Column::ResultUrl, Expr::value(result_url))
            .col_expr(job_entity::Column::CompletedAt, Expr::value(Some(now)))
            .col_expr(job_entity::Column::UpdatedAt, Expr::value(now))
            .filter(job_entity::Column::Id.eq(id))
            .filter(job_entity::Column::Status.eq(JobStatus::Processing.to_string()))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(self.miss_reason(id, JobStatus::Processing).await);
        }
        Ok(())
    }

    async fn fail_all_processing(&self, message: &str) -> Result<Vec<Uuid>, RepositoryError> {
        self.fail_stuck(None, message).await
    }

    async fn fail_processing(
        &self,
        ids: &[Uuid],
        message: &str,
    ) -> Result<Vec<Uuid>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.fail_stuck(Some(ids), message).await
    }

    async fn reset_for_retry(&self, id: Uuid) -> Result<Job, RepositoryError> {
        let result = job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::Status,
                Expr::value(JobStatus::Pending.to_string()),
            )
            .col_expr(
                job_entity::Column::ResultMessage,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                job_entity::Column::ResultUrl,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                job_entity::Column::CompletedAt,
                Expr::value(Option::<DateTime<FixedOffset>>::None),
            )
            .col_expr(
                job_entity::Column::ClaimToken,
                Expr::value(Option::<Uuid>::None),
            )
            .col_expr(
                job_entity::Column::ClaimedAt,
                Expr::value(Option::<DateTime<FixedOffset>>::None),
            )
            .col_expr(job_entity::Column::UpdatedAt, Expr::value(now_utc()))
            .filter(job_entity::Column::Id.eq(id))
            .filter(job_entity::Column::Status.eq(JobStatus::Failed.to_string()))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(self.miss_reason(id, JobStatus::Failed).await);
        }

        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;

        let job = job_entity::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if job.status == JobStatus::Processing.to_string() {
            return Err(RepositoryError::Conflict(format!(
                "job {} is processing and cannot be deleted",
                id
            )));
        }

        job_log_entity::Entity::delete_many()
            .filter(job_log_entity::Column::JobId.eq(id))
            .exec(&txn)
            .await?;

        let result = job_entity::Entity::delete_many()
            .filter(job_entity::Column::Id.eq(id))
            .filter(job_entity::Column::Status.ne(JobStatus::Processing.to_string()))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            // 事务回滚，日志保持不变
            return Err(RepositoryError::Conflict(format!(
                "job {} changed state during delete",
                id
            )));
        }

        txn.commit().await?;
        Ok(())
    }
}
