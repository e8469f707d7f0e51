// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，负责与外部系统交互。
///
/// 包含的子模块：
/// - 数据库（database）：连接池与实体映射
/// - 动作驱动（drivers）：模拟驱动与远程驱动
/// - 指标（metrics）：Prometheus 指标导出
/// - 仓库实现（repositories）：领域仓库接口的具体实现
/// - 会话（session）：基于文件的会话存储
/// - 网络共享（tether）：adb 设备控制与外网 IP 查询
pub mod database;
pub mod drivers;
pub mod metrics;
pub mod repositories;
pub mod session;
pub mod tether;
