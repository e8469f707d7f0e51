// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::job_log::JobLog;
use crate::domain::services::job_service::JobService;
use crate::presentation::errors::AppError;

/// 作业的全部日志，按时间升序
pub async fn list_logs(
    Extension(service): Extension<Arc<JobService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<JobLog>>, AppError> {
    Ok(Json(service.job_logs(id).await?))
}

/// 作业的最新日志，没有日志时返回 null
pub async fn latest_log(
    Extension(service): Extension<Arc<JobService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Option<JobLog>>, AppError> {
    Ok(Json(service.latest_log(id).await?))
}
