// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 动作驱动实现
///
/// - 模拟驱动（simulated）：进程内会话，用于演练和测试
/// - 远程驱动（remote）：把动作委托给自动化 sidecar
pub mod remote;
pub mod simulated;
