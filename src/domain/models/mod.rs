// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 作业（job）：绑定到单个账号的调度工作单元及其状态机
/// - 作业日志（job_log）：只追加的作业观察记录
/// - 延迟策略（delay_policy）：目标之间与作业之间的等待时间
/// - 负载（direct_message）：各作业类型的负载结构
pub mod delay_policy;
pub mod direct_message;
pub mod job;
pub mod job_log;
