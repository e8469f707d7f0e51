// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::application::use_cases::import_dm_jobs::ImportError;
use crate::domain::models::job::DomainError;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::services::job_service::JobServiceError;
use crate::domain::services::network_rotator::RotationError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
    }
}

fn service_status(err: &JobServiceError) -> StatusCode {
    match err {
        JobServiceError::Domain(_) => StatusCode::BAD_REQUEST,
        JobServiceError::Repository(e) => repository_status(e),
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        let err = &self.0;

        if let Some(e) = err.downcast_ref::<RepositoryError>() {
            return repository_status(e);
        }
        if let Some(e) = err.downcast_ref::<JobServiceError>() {
            return service_status(e);
        }
        if let Some(e) = err.downcast_ref::<ImportError>() {
            return match e {
                ImportError::Empty | ImportError::InvalidRows(_) => StatusCode::BAD_REQUEST,
                ImportError::Service(inner) => service_status(inner),
            };
        }
        if err.downcast_ref::<DomainError>().is_some()
            || err.downcast_ref::<validator::ValidationErrors>().is_some()
        {
            return StatusCode::BAD_REQUEST;
        }
        if err.downcast_ref::<RotationError>().is_some() {
            return StatusCode::BAD_GATEWAY;
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.0);
        }

        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
