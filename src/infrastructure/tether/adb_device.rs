// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::settings::TetherSettings;
use crate::domain::services::network_rotator::{RotationError, TetherDevice};

/// 通过 adb 控制的安卓网络共享设备
///
/// 重置流程：`svc data disable`，等待一段间隔，再 `svc data enable`
#[derive(Debug, Clone)]
pub struct AdbTetherDevice {
    adb_path: String,
    serial: Option<String>,
    command_timeout: Duration,
    toggle_gap: Duration,
}

impl AdbTetherDevice {
    pub fn new(settings: &TetherSettings) -> Self {
        Self {
            adb_path: settings.adb_path.clone(),
            serial: settings.device_serial.clone().filter(|s| !s.is_empty()),
            command_timeout: Duration::from_millis(settings.command_timeout_ms),
            toggle_gap: Duration::from_millis(settings.toggle_gap_ms),
        }
    }

    /// 执行一条 adb 命令并返回标准输出
    async fn run(&self, args: &[&str]) -> Result<String, RotationError> {
        let mut cmd = Command::new(&self.adb_path);
        if let Some(serial) = &self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd.args(args).kill_on_drop(true);

        let rendered = format!("adb {}", args.join(" "));
        debug!(command = %rendered, "Running adb command");

        let output = tokio::time::timeout(self.command_timeout, cmd.output())
            .await
            .map_err(|_| RotationError::Timeout(rendered.clone()))?
            .map_err(|e| RotationError::Command(format!("{rendered}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RotationError::Command(format!(
                "{rendered} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// 解析 `adb devices` 输出中的设备序列号
pub fn parse_devices(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of devices"))
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let serial = parts.next()?;
            match parts.next() {
                Some("device") | None => Some(serial.to_string()),
                _ => None,
            }
        })
        .collect()
}

#[async_trait]
impl TetherDevice for AdbTetherDevice {
    async fn reset(&self) -> Result<(), RotationError> {
        info!("Disabling mobile data on tether device");
        self.run(&["shell", "svc", "data", "disable"]).await?;

        tokio::time::sleep(self.toggle_gap).await;

        info!("Enabling mobile data on tether device");
        self.run(&["shell", "svc", "data", "enable"]).await?;
        Ok(())
    }

    async fn devices(&self) -> Result<Vec<String>, RotationError> {
        let output = self.run(&["devices"]).await?;
        let devices = parse_devices(&output);
        info!("Connected tether devices: {}", devices.len());
        Ok(devices)
    }
}
