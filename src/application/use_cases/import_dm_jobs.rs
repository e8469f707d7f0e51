// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::dto::job_dto::{DmImportRequestDto, DmImportRowDto};
use crate::domain::models::direct_message::{DmPayload, DmTarget};
use crate::domain::models::job::{Job, JobKind, NewJob};
use crate::domain::services::job_service::{JobService, JobServiceError};

/// 单行校验错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 从 1 开始的行号
    pub row: usize,
    pub reason: String,
}

/// 批量导入错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("import contains no rows")]
    Empty,
    /// 所有不合法的行，出现任何一行时不会创建作业
    #[error("{} invalid rows: {}", .0.len(), describe_rows(.0))]
    InvalidRows(Vec<RowError>),
    #[error(transparent)]
    Service(#[from] JobServiceError),
}

fn describe_rows(rows: &[RowError]) -> String {
    rows.iter()
        .map(|r| format!("row {}: {}", r.row, r.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// 解析导入文件中的预约时间
///
/// 支持 RFC 3339 以及 `YYYY-MM-DD HH:MM`（按 `offset` 解释）
pub fn parse_scheduled_at(raw: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").ok()?;
    offset.from_local_datetime(&naive).single()
}

/// 批量私信导入用例
///
/// 每行一个目标。所有行先统一校验，再按解析后的预约时间分组，
/// 每个不同的时间创建一个私信作业。
pub struct ImportDmJobsUseCase {
    service: Arc<JobService>,
    offset: FixedOffset,
}

impl ImportDmJobsUseCase {
    /// # 参数
    ///
    /// * `service` - 作业服务
    /// * `utc_offset_minutes` - 无时区时间戳的 UTC 偏移
    pub fn new(service: Arc<JobService>, utc_offset_minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix());
        Self { service, offset }
    }

    pub async fn execute(&self, request: DmImportRequestDto) -> Result<Vec<Job>, ImportError> {
        if request.rows.is_empty() {
            return Err(ImportError::Empty);
        }

        let default_at = request
            .scheduled_at
            .unwrap_or_else(|| Utc::now().fixed_offset());
        let groups = self.group_rows(&request.rows, default_at)?;

        let mut created = Vec::with_capacity(groups.len());
        for (scheduled_at, targets) in groups {
            let payload = DmPayload { targets };
            let job = self
                .service
                .create_job(NewJob {
                    kind: JobKind::DirectMessage,
                    account_id: request.account_id.clone(),
                    account_secret: request.account_secret.clone(),
                    subject: payload.subject(),
                    description: Some(payload.description()),
                    payload: payload.to_value(),
                    scheduled_at,
                })
                .await?;
            created.push(job);
        }

        info!(
            rows = request.rows.len(),
            jobs = created.len(),
            account_id = %request.account_id,
            "Imported direct message jobs"
        );
        Ok(created)
    }

    /// 校验并按预约时间分组，时间早的组排在前面
    fn group_rows(
        &self,
        rows: &[DmImportRowDto],
        default_at: DateTime<FixedOffset>,
    ) -> Result<Vec<(DateTime<FixedOffset>, Vec<DmTarget>)>, ImportError> {
        let mut errors = Vec::new();
        let mut groups: BTreeMap<DateTime<Utc>, (DateTime<FixedOffset>, Vec<DmTarget>)> =
            BTreeMap::new();

        for (idx, row) in rows.iter().enumerate() {
            let line = idx + 1;
            let target = row.target.as_deref().map(str::trim).unwrap_or_default();
            let message = row.message.as_deref().unwrap_or_default();

            if target.is_empty() {
                errors.push(RowError {
                    row: line,
                    reason: "missing target".to_string(),
                });
                continue;
            }
            if message.trim().is_empty() {
                errors.push(RowError {
                    row: line,
                    reason: format!("empty message for {target}"),
                });
                continue;
            }

            let scheduled_at = match row.scheduled_at.as_deref() {
                Some(raw) if !raw.trim().is_empty() => {
                    parse_scheduled_at(raw, self.offset).unwrap_or_else(|| {
                        warn!(row = line, value = raw, "Unparseable schedule, using default");
                        default_at
                    })
                }
                _ => default_at,
            };

            groups
                .entry(scheduled_at.with_timezone(&Utc))
                .or_insert_with(|| (scheduled_at, Vec::new()))
                .1
                .push(DmTarget {
                    target: target.to_string(),
                    message: message.to_string(),
                });
        }

        if !errors.is_empty() {
            return Err(ImportError::InvalidRows(errors));
        }

        Ok(groups.into_values().collect())
    }
}
