// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::settings::TetherSettings;

/// 网络身份轮换错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RotationError {
    /// 底层命令执行失败
    #[error("Tether command failed: {0}")]
    Command(String),
    /// 底层命令超时
    #[error("Tether command timed out: {0}")]
    Timeout(String),
    /// 多次尝试后外网身份仍未变化
    #[error("Network identity unchanged after {attempts} attempts")]
    IdentityUnchanged { attempts: u32 },
}

/// 外部可见的网络身份
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Known(IpAddr),
    /// 查询失败，无法得知当前身份
    Unknown,
}

impl Identity {
    /// 从字符串解析，无法解析时视为 `Unknown`
    pub fn parse(raw: &str) -> Self {
        raw.trim()
            .parse::<IpAddr>()
            .map(Identity::Known)
            .unwrap_or(Identity::Unknown)
    }

    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            Identity::Known(ip) => Some(*ip),
            Identity::Unknown => None,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Identity::Known(ip) => write!(f, "{ip}"),
            Identity::Unknown => write!(f, ""),
        }
    }
}

/// 网络共享设备（例如通过 adb 控制的手机）
#[async_trait]
pub trait TetherDevice: Send + Sync {
    /// 关闭再开启移动数据，触发运营商分配新地址
    async fn reset(&self) -> Result<(), RotationError>;

    /// 已连接的设备序列号列表
    async fn devices(&self) -> Result<Vec<String>, RotationError>;
}

/// 外网 IP 查询
#[async_trait]
pub trait IdentityProbe: Send + Sync {
    async fn current(&self) -> Identity;
}

/// 轮换时序参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationTiming {
    /// 重置后等待新地址生效的时间
    pub propagation_wait: Duration,
    /// 两次尝试之间的退避时间
    pub retry_backoff: Duration,
    /// 最大尝试次数
    pub max_attempts: u32,
}

impl Default for RotationTiming {
    fn default() -> Self {
        Self {
            propagation_wait: Duration::from_secs(5),
            retry_backoff: Duration::from_secs(3),
            max_attempts: 3,
        }
    }
}

impl From<&TetherSettings> for RotationTiming {
    fn from(settings: &TetherSettings) -> Self {
        Self {
            propagation_wait: Duration::from_millis(settings.propagation_wait_ms),
            retry_backoff: Duration::from_millis(settings.retry_backoff_ms),
            max_attempts: settings.max_attempts.max(1),
        }
    }
}

/// 网络共享健康状态
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TetherHealth {
    pub adb_connected: bool,
    pub current_ip: String,
    pub devices: Vec<String>,
}

/// 网络身份轮换器
///
/// 通过网络共享设备触发地址变更，并确认外网身份确实变化。
/// 同一时刻只有一个轮换在操作设备，接口触发的轮换与执行器的轮换互相排队。
pub struct NetworkIdentityRotator {
    device: Arc<dyn TetherDevice>,
    probe: Arc<dyn IdentityProbe>,
    timing: RotationTiming,
    rotation: tokio::sync::Mutex<()>,
}

impl NetworkIdentityRotator {
    pub fn new(
        device: Arc<dyn TetherDevice>,
        probe: Arc<dyn IdentityProbe>,
        timing: RotationTiming,
    ) -> Self {
        Self {
            device,
            probe,
            timing,
            rotation: tokio::sync::Mutex::new(()),
        }
    }

    /// 当前外网身份
    pub async fn current_identity(&self) -> Identity {
        self.probe.current().await
    }

    /// 触发一次地址轮换
    pub async fn rotate(&self) -> Result<(), RotationError> {
        let _guard = self.rotation.lock().await;
        self.device.reset().await
    }

    /// 轮换直到外网身份变化
    ///
    /// 每次尝试依次执行：轮换、等待生效、查询身份。查询结果为 `Unknown`
    /// 或与 `previous` 相同都不算变化。
    ///
    /// # 返回值
    ///
    /// * `Ok(IpAddr)` - 第一次观察到的新地址
    /// * `Err(RotationError::IdentityUnchanged)` - 用尽尝试次数
    /// * `Err(RotationError)` - 最后一次尝试中命令执行失败
    pub async fn check_changed(&self, previous: Identity) -> Result<IpAddr, RotationError> {
        let _guard = self.rotation.lock().await;
        let attempts = self.timing.max_attempts;

        for attempt in 1..=attempts {
            match self.device.reset().await {
                Ok(()) => {
                    tokio::time::sleep(self.timing.propagation_wait).await;
                    let current = self.current_identity().await;
                    info!(
                        attempt,
                        previous = %previous,
                        current = %current,
                        "Checked network identity after rotation"
                    );

                    if let Identity::Known(ip) = current {
                        if current != previous {
                            info!(previous = %previous, current = %ip, "Network identity changed");
                            metrics::counter!("outreach_identity_rotations_total", "outcome" => "changed")
                                .increment(1);
                            return Ok(ip);
                        }
                    }
                    warn!(attempt, "Network identity did not change");
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Tether reset failed");
                    if attempt == attempts {
                        metrics::counter!("outreach_identity_rotations_total", "outcome" => "error")
                            .increment(1);
                        return Err(e);
                    }
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.timing.retry_backoff).await;
            }
        }

        metrics::counter!("outreach_identity_rotations_total", "outcome" => "unchanged")
            .increment(1);
        Err(RotationError::IdentityUnchanged { attempts })
    }

    /// 设备连接与外网身份概览
    pub async fn health(&self) -> TetherHealth {
        let (devices, current) =
            futures::join!(self.device.devices(), self.current_identity());
        let devices = devices.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to list tether devices");
            Vec::new()
        });

        TetherHealth {
            adb_connected: !devices.is_empty(),
            current_ip: current.to_string(),
            devices,
        }
    }
}
