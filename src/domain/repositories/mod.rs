// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 作业仓库（job_repository）：作业的生命周期与原子认领
/// - 作业日志仓库（job_log_repository）：只追加的作业日志
pub mod job_log_repository;
pub mod job_repository;
