// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 作业日志条目
///
/// 只追加，写入后不可修改。同一作业的日志按 `(created_at, id)` 升序排列，
/// 最新一条即排序中的最后一条。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobLog {
    pub id: i32,
    pub job_id: Uuid,
    pub message: String,
    pub created_at: DateTime<FixedOffset>,
}
