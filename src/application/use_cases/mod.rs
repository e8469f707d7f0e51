// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
///
/// 包含跨越多个领域服务的业务流程
pub mod import_dm_jobs;
