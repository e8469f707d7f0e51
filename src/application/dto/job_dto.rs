// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::models::job::{JobKind, JobStatus};
use crate::domain::repositories::job_repository::{JobListQuery, JobSortField, SortOrder};

/// 作业列表查询参数
///
/// 对应 `GET /jobs?status=&search=&orderBy=&order=`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJobsQueryDto {
    pub status: Option<JobStatus>,
    pub search: Option<String>,
    #[serde(alias = "order_by")]
    pub order_by: Option<JobSortField>,
    pub order: Option<SortOrder>,
}

impl From<ListJobsQueryDto> for JobListQuery {
    fn from(dto: ListJobsQueryDto) -> Self {
        Self {
            status: dto.status,
            search: dto.search.filter(|s| !s.trim().is_empty()),
            order_by: dto.order_by.unwrap_or_default(),
            order: dto.order.unwrap_or_default(),
        }
    }
}

/// 创建单个作业的请求
#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequestDto {
    pub kind: JobKind,

    #[validate(length(min = 1, message = "account_id is required"))]
    pub account_id: String,

    #[validate(length(min = 1, message = "account_secret is required"))]
    pub account_secret: String,

    #[validate(length(max = 200))]
    pub subject: Option<String>,

    pub description: Option<String>,

    pub payload: serde_json::Value,

    /// 不填时立即可执行
    pub scheduled_at: Option<DateTime<FixedOffset>>,
}

/// 批量导入中的一行
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DmImportRowDto {
    pub target: Option<String>,
    pub message: Option<String>,
    /// RFC 3339 或 `YYYY-MM-DD HH:MM`
    pub scheduled_at: Option<String>,
}

/// 批量私信导入请求
#[derive(Debug, Deserialize, Validate)]
pub struct DmImportRequestDto {
    #[validate(length(min = 1, message = "account_id is required"))]
    pub account_id: String,

    #[validate(length(min = 1, message = "account_secret is required"))]
    pub account_secret: String,

    /// 行内没有或无法解析时间时使用的默认时间，为空则使用当前时间
    pub scheduled_at: Option<DateTime<FixedOffset>>,

    #[validate(length(min = 1, message = "import contains no rows"))]
    pub rows: Vec<DmImportRowDto>,
}

/// 重试、删除等操作的响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResponseDto {
    pub success: bool,
    pub message: String,
}

impl ActionResponseDto {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// 更换 IP 请求
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeIpRequestDto {
    #[serde(default, alias = "prev_ip")]
    pub prev_ip: String,
}

/// IP 查询响应
#[derive(Debug, Serialize, Deserialize)]
pub struct IpResponseDto {
    pub ip: String,
}
