// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::job_dto::{
    ActionResponseDto, CreateJobRequestDto, DmImportRequestDto, ListJobsQueryDto,
};
use crate::application::use_cases::import_dm_jobs::ImportDmJobsUseCase;
use crate::domain::models::direct_message::DmPayload;
use crate::domain::models::job::{Job, JobKind, JobSummary, JobWithLogs, NewJob};
use crate::domain::repositories::job_repository::{JobListQuery, RepositoryError};
use crate::domain::services::job_service::JobService;
use crate::presentation::errors::AppError;

/// 批量导入响应
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    pub jobs: Vec<Job>,
}

/// 列出作业
///
/// 每项只内联最新一条日志
pub async fn list_jobs(
    Extension(service): Extension<Arc<JobService>>,
    Query(query): Query<ListJobsQueryDto>,
) -> Result<Json<Vec<JobSummary>>, AppError> {
    let query: JobListQuery = query.into();
    Ok(Json(service.list_jobs(&query).await?))
}

/// 创建单个作业
pub async fn create_job(
    Extension(service): Extension<Arc<JobService>>,
    Json(payload): Json<CreateJobRequestDto>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    payload.validate()?;

    let (subject, description) = match payload.kind {
        JobKind::DirectMessage => match DmPayload::from_value(&payload.payload) {
            Ok(dm) => (
                payload.subject.unwrap_or_else(|| dm.subject()),
                payload.description.or_else(|| Some(dm.description())),
            ),
            // 负载校验交给服务层统一报错
            Err(_) => (payload.subject.unwrap_or_default(), payload.description),
        },
        kind => (
            payload.subject.unwrap_or_else(|| kind.to_string()),
            payload.description,
        ),
    };

    let job = service
        .create_job(NewJob {
            kind: payload.kind,
            account_id: payload.account_id,
            account_secret: payload.account_secret,
            subject,
            description,
            payload: payload.payload,
            scheduled_at: payload
                .scheduled_at
                .unwrap_or_else(|| Utc::now().fixed_offset()),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(job)))
}

/// 获取作业详情及完整日志
pub async fn get_job(
    Extension(service): Extension<Arc<JobService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobWithLogs>, AppError> {
    Ok(Json(service.get_job(id).await?))
}

/// 重试失败的作业
///
/// 作业不是 Failed 时返回 409 和 `success: false`
pub async fn retry_job(
    Extension(service): Extension<Arc<JobService>>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ActionResponseDto>), AppError> {
    match service.retry_job(id).await {
        Ok(_) => Ok((
            StatusCode::OK,
            Json(ActionResponseDto::ok("job queued for retry")),
        )),
        Err(RepositoryError::Conflict(message)) => Ok((
            StatusCode::CONFLICT,
            Json(ActionResponseDto::rejected(message)),
        )),
        Err(e) => Err(e.into()),
    }
}

/// 删除作业
///
/// 作业处于 Processing 时返回 409 和 `success: false`，不做任何修改
pub async fn delete_job(
    Extension(service): Extension<Arc<JobService>>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ActionResponseDto>), AppError> {
    match service.delete_job(id).await {
        Ok(()) => Ok((StatusCode::OK, Json(ActionResponseDto::ok("job deleted")))),
        Err(RepositoryError::Conflict(message)) => Ok((
            StatusCode::CONFLICT,
            Json(ActionResponseDto::rejected(message)),
        )),
        Err(e) => Err(e.into()),
    }
}

/// 批量导入私信作业
pub async fn import_dm_jobs(
    Extension(use_case): Extension<Arc<ImportDmJobsUseCase>>,
    Json(payload): Json<DmImportRequestDto>,
) -> Result<(StatusCode, Json<ImportResponse>), AppError> {
    payload.validate()?;

    let jobs = use_case.execute(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            success: true,
            message: format!("{} direct message jobs registered", jobs.len()),
            jobs,
        }),
    ))
}
