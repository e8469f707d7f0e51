// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 请求/响应数据结构与批量导入用例
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、服务和仓库接口
pub mod domain;

/// 基础设施模块
///
/// 提供数据库、动作驱动、会话存储和网络共享设备的具体实现
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由和处理器
pub mod presentation;

/// 队列模块
///
/// 周期性作业调度与崩溃恢复
pub mod queue;

/// 工具模块
///
/// 提供遥测等通用功能
pub mod utils;

/// 工作器模块
///
/// 作业执行器与各作业类型的处理器
pub mod workers;
