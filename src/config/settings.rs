// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::domain::models::delay_policy::DelayPolicy;
use crate::domain::models::job::JobKind;

/// 应用程序配置设置
///
/// 启动时构建一次，之后以 `Arc` 形式注入到需要的组件中
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    /// 数据库配置
    #[validate(nested)]
    pub database: DatabaseSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// 调度器配置
    #[validate(nested)]
    pub scheduler: SchedulerSettings,
    /// 延迟策略配置
    #[validate(nested)]
    pub delay: DelaySettings,
    /// USB 网络共享配置
    #[validate(nested)]
    pub tether: TetherSettings,
    /// 会话存储配置
    pub session: SessionSettings,
    /// 动作驱动配置
    #[validate(nested)]
    pub driver: DriverSettings,
    /// 执行器配置
    pub executor: ExecutorSettings,
    /// 批量导入配置
    #[validate(nested)]
    pub import: ImportSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
    /// 日志配置
    pub logging: LoggingSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    #[validate(length(min = 1, message = "database url cannot be empty"))]
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
    /// 是否输出 SQL 语句日志
    #[serde(default)]
    pub sqlx_logging: bool,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 调度器配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SchedulerSettings {
    /// 是否启动周期调度
    pub enabled: bool,
    /// 轮询间隔（秒）
    #[validate(range(min = 1, message = "tick interval must be at least one second"))]
    pub tick_interval_secs: u64,
}

/// 延迟策略配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_delay_bounds"))]
pub struct DelaySettings {
    /// 目标之间的最小延迟（毫秒）
    pub min_delay_ms: u64,
    /// 目标之间的最大延迟（毫秒）
    pub max_delay_ms: u64,
    /// 同一账号作业之间的延迟（秒）
    pub inter_job_delay_secs: u64,
}

fn validate_delay_bounds(delay: &DelaySettings) -> Result<(), ValidationError> {
    if delay.min_delay_ms > delay.max_delay_ms {
        let mut err = ValidationError::new("delay_bounds");
        err.message = Some("min_delay_ms must not exceed max_delay_ms".into());
        return Err(err);
    }
    Ok(())
}

impl DelaySettings {
    /// 转换为领域层的延迟策略
    pub fn policy(&self) -> DelayPolicy {
        DelayPolicy::new(
            self.min_delay_ms,
            self.max_delay_ms,
            self.inter_job_delay_secs,
        )
    }
}

/// USB 网络共享配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TetherSettings {
    /// 是否启用 IP 轮换
    pub enabled: bool,
    /// adb 可执行文件路径
    pub adb_path: String,
    /// 指定设备序列号，为空时使用唯一连接的设备
    pub device_serial: Option<String>,
    /// 外网 IP 查询地址
    #[validate(url)]
    pub ip_lookup_url: String,
    /// IP 查询超时（毫秒）
    pub lookup_timeout_ms: u64,
    /// adb 命令超时（毫秒）
    pub command_timeout_ms: u64,
    /// 关闭与重新开启数据连接之间的间隔（毫秒）
    pub toggle_gap_ms: u64,
    /// 等待新 IP 生效的时间（毫秒）
    pub propagation_wait_ms: u64,
    /// 两次尝试之间的退避时间（毫秒）
    pub retry_backoff_ms: u64,
    /// 最大尝试次数
    #[validate(range(min = 1, message = "max_attempts must be at least 1"))]
    pub max_attempts: u32,
}

/// 会话存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// 会话文件目录
    pub cookie_dir: String,
}

/// 动作驱动类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    /// 进程内模拟驱动
    Simulated,
    /// 通过 HTTP 调用自动化 sidecar
    Remote,
}

/// 动作驱动配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_driver"))]
pub struct DriverSettings {
    pub kind: DriverKind,
    pub remote_url: Option<String>,
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
}

fn validate_driver(driver: &DriverSettings) -> Result<(), ValidationError> {
    if driver.kind == DriverKind::Remote
        && driver.remote_url.as_deref().map_or(true, str::is_empty)
    {
        let mut err = ValidationError::new("remote_url");
        err.message = Some("remote driver requires driver.remote_url".into());
        return Err(err);
    }
    Ok(())
}

/// 执行器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorSettings {
    /// 分发前需要轮换网络身份的作业类型
    pub rotate_before_dispatch: Vec<JobKind>,
}

/// 批量导入配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ImportSettings {
    /// 无时区时间戳使用的 UTC 偏移（分钟）
    #[validate(range(min = -1439, max = 1439))]
    pub utc_offset_minutes: i32,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub listen_addr: String,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// 是否输出 JSON 格式日志
    pub json: bool,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次合并默认值、配置文件和环境变量，并在返回前完成校验
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载或校验失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("OUTREACH")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("executor.rotate_before_dispatch")
                    .try_parsing(true),
            );

        Self::from_builder(builder)
    }

    /// 带有全部默认值的配置构建器
    pub fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("database.url", "sqlite://outreach.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("scheduler.enabled", true)?
            .set_default("scheduler.tick_interval_secs", 60)?
            .set_default("delay.min_delay_ms", 5000)?
            .set_default("delay.max_delay_ms", 10000)?
            .set_default("delay.inter_job_delay_secs", 0)?
            .set_default("tether.enabled", false)?
            .set_default("tether.adb_path", "adb")?
            .set_default("tether.ip_lookup_url", "https://ifconfig.co/ip")?
            .set_default("tether.lookup_timeout_ms", 5000)?
            .set_default("tether.command_timeout_ms", 5000)?
            .set_default("tether.toggle_gap_ms", 2000)?
            .set_default("tether.propagation_wait_ms", 5000)?
            .set_default("tether.retry_backoff_ms", 3000)?
            .set_default("tether.max_attempts", 3)?
            .set_default("session.cookie_dir", "./cookies")?
            .set_default("driver.kind", "simulated")?
            .set_default("driver.request_timeout_secs", 120)?
            .set_default("executor.rotate_before_dispatch", Vec::<String>::new())?
            .set_default("import.utc_offset_minutes", 0)?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")?
            .set_default("logging.json", false)
    }

    /// 从构建器生成并校验配置
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid configuration: {e}")))?;
        Ok(settings)
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
