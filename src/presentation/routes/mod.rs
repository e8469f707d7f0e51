// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::presentation::handlers::{job_handler, log_handler, tether_handler};
use axum::{
    routing::{get, post},
    Router,
};

/// 创建应用路由
///
/// 处理器依赖通过 `Extension` 层注入：`Arc<JobService>`、
/// `Arc<ImportDmJobsUseCase>` 和 `Arc<NetworkIdentityRotator>`
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let job_routes = Router::new()
        .route(
            "/jobs",
            get(job_handler::list_jobs).post(job_handler::create_job),
        )
        .route("/jobs/dm/import", post(job_handler::import_dm_jobs))
        .route(
            "/jobs/{id}",
            get(job_handler::get_job).delete(job_handler::delete_job),
        )
        .route("/jobs/{id}/retry", post(job_handler::retry_job))
        .route("/jobs/{id}/logs", get(log_handler::list_logs))
        .route("/jobs/{id}/logs/latest", get(log_handler::latest_log));

    let tether_routes = Router::new()
        .route("/tether/health", get(tether_handler::health))
        .route("/tether/current-ip", get(tether_handler::current_ip))
        .route("/tether/reset", post(tether_handler::reset))
        .route("/tether/change-ip", post(tether_handler::change_ip));

    Router::new()
        .merge(public_routes)
        .merge(job_routes)
        .merge(tether_routes)
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
