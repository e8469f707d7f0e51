// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::config::settings::MetricsSettings;

/// 初始化 Prometheus 指标导出
///
/// 地址不合法或端口被占用时只记录警告，不阻止服务启动
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!(
                "Invalid metrics listen address {}: {}",
                settings.listen_addr, e
            );
            return;
        }
    };

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_counter!(
        "outreach_jobs_claimed_total",
        "Jobs moved from pending to processing by the scheduler"
    );
    describe_counter!(
        "outreach_jobs_completed_total",
        "Jobs that reached the completed status"
    );
    describe_counter!(
        "outreach_jobs_failed_total",
        "Jobs that reached the failed status, labelled by reason"
    );
    describe_counter!(
        "outreach_identity_rotations_total",
        "Network identity rotation attempts, labelled by outcome"
    );

    info!("Metrics exporter listening on {}", addr);
}
