// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{extract::Extension, Json};
use std::sync::Arc;

use crate::application::dto::job_dto::{ActionResponseDto, ChangeIpRequestDto, IpResponseDto};
use crate::domain::services::network_rotator::{Identity, NetworkIdentityRotator, TetherHealth};
use crate::presentation::errors::AppError;

/// 设备连接与外网 IP 概览
pub async fn health(
    Extension(rotator): Extension<Arc<NetworkIdentityRotator>>,
) -> Json<TetherHealth> {
    Json(rotator.health().await)
}

/// 当前外网 IP，查询失败时为空字符串
pub async fn current_ip(
    Extension(rotator): Extension<Arc<NetworkIdentityRotator>>,
) -> Json<IpResponseDto> {
    let ip = rotator.current_identity().await.to_string();
    Json(IpResponseDto { ip })
}

/// 重置网络共享
pub async fn reset(
    Extension(rotator): Extension<Arc<NetworkIdentityRotator>>,
) -> Result<Json<ActionResponseDto>, AppError> {
    rotator.rotate().await?;
    Ok(Json(ActionResponseDto::ok("tethering reset")))
}

/// 轮换直到外网 IP 与 `prevIp` 不同
pub async fn change_ip(
    Extension(rotator): Extension<Arc<NetworkIdentityRotator>>,
    Json(payload): Json<ChangeIpRequestDto>,
) -> Result<Json<IpResponseDto>, AppError> {
    let previous = Identity::parse(&payload.prev_ip);
    let ip = rotator.check_changed(previous).await?;
    Ok(Json(IpResponseDto { ip: ip.to_string() }))
}
