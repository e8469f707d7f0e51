// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 作业执行器与各作业类型的处理器
pub mod error;
pub mod executor;
pub mod handlers;

pub use executor::JobExecutor;
