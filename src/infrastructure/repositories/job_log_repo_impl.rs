// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job_log::JobLog;
use crate::domain::repositories::job_log_repository::JobLogRepository;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::infrastructure::database::entities::job_log as job_log_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// 作业日志仓库实现
#[derive(Clone)]
pub struct JobLogRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl JobLogRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<job_log_entity::Model> for JobLog {
    fn from(model: job_log_entity::Model) -> Self {
        Self {
            id: model.id,
            job_id: model.job_id,
            message: model.message,
            created_at: model.created_at,
        }
    }
}

#[async_trait]
impl JobLogRepository for JobLogRepositoryImpl {
    async fn append(&self, job_id: Uuid, message: &str) -> Result<JobLog, RepositoryError> {
        let model = job_log_entity::ActiveModel {
            job_id: Set(job_id),
            message: Set(message.to_string()),
            created_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };

        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<JobLog>, RepositoryError> {
        let models = job_log_entity::Entity::find()
            .filter(job_log_entity::Column::JobId.eq(job_id))
            .order_by_asc(job_log_entity::Column::CreatedAt)
            .order_by_asc(job_log_entity::Column::Id)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn latest_for_job(&self, job_id: Uuid) -> Result<Option<JobLog>, RepositoryError> {
        let model = job_log_entity::Entity::find()
            .filter(job_log_entity::Column::JobId.eq(job_id))
            .order_by_desc(job_log_entity::Column::CreatedAt)
            .order_by_desc(job_log_entity::Column::Id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn latest_for_jobs(
        &self,
        job_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, JobLog>, RepositoryError> {
        if job_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let models = job_log_entity::Entity::find()
            .filter(job_log_entity::Column::JobId.is_in(job_ids.to_vec()))
            .order_by_asc(job_log_entity::Column::CreatedAt)
            .order_by_asc(job_log_entity::Column::Id)
            .all(self.db.as_ref())
            .await?;

        // 升序遍历，后写入的覆盖先写入的
        let mut latest = HashMap::with_capacity(job_ids.len());
        for model in models {
            latest.insert(model.job_id, JobLog::from(model));
        }
        Ok(latest)
    }
}
