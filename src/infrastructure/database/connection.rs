// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::DatabaseSettings;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use std::time::Duration;
use tracing::info;

/// 连接的最长存活时间
const MAX_LIFETIME: Duration = Duration::from_secs(3600);

/// 根据 `[database]` 配置构造连接参数
///
/// 未配置的连接数与超时沿用 sqlx 默认值。`connect_timeout` 同时作为
/// 从池中获取连接的等待上限。
pub fn connect_options(settings: &DatabaseSettings) -> ConnectOptions {
    let mut opt = ConnectOptions::new(settings.url.to_owned());

    if let Some(max) = settings.max_connections {
        opt.max_connections(max);
    }
    if let Some(min) = settings.min_connections {
        opt.min_connections(min);
    }
    if let Some(timeout) = settings.connect_timeout {
        opt.connect_timeout(Duration::from_secs(timeout))
            .acquire_timeout(Duration::from_secs(timeout));
    }
    if let Some(idle) = settings.idle_timeout {
        opt.idle_timeout(Duration::from_secs(idle));
    }

    opt.max_lifetime(MAX_LIFETIME)
        .sqlx_logging(settings.sqlx_logging);
    opt
}

/// 打开作业存储的连接池
///
/// 默认使用 SQLite 文件库，配置为 `postgres://` 地址时连接 Postgres。
/// 迁移由调用方在连接成功后执行。
///
/// # 参数
///
/// * `settings` - `[database]` 配置段
///
/// # 返回值
///
/// * `Ok(DatabaseConnection)` - 作业与日志仓库共享的连接池
/// * `Err(DbErr)` - 地址不合法或数据库不可达
pub async fn create_pool(settings: &DatabaseSettings) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(connect_options(settings)).await?;
    info!(backend = ?db.get_database_backend(), "Job store connected");
    Ok(db)
}
