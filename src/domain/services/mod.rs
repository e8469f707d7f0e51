// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务与协作接口：
/// - 动作驱动（action_driver）：对目标服务执行单个自动化动作
/// - 时钟（clock）：可替换的时间来源
/// - 作业服务（job_service）：面向运营人员的作业操作
/// - 网络身份轮换（network_rotator）：触发并确认外网 IP 变化
/// - 会话存储（session_store）：按账号持久化认证状态
pub mod action_driver;
pub mod clock;
pub mod job_service;
pub mod network_rotator;
pub mod session_store;
