// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::services::action_driver::ActionError;
use crate::domain::services::network_rotator::RotationError;

/// 作业执行错误类型
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// 单个作业失败，同组其他作业不受影响
    #[error("{0}")]
    Handler(String),
    /// 账号级失败，同组剩余作业全部失败
    #[error("{0}")]
    GroupFatal(String),
    /// 网络身份轮换失败
    #[error("network rotation failed: {0}")]
    Rotation(#[from] RotationError),
    /// 作业存储不可用，中止本次执行
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ExecutionError {
    /// 按驱动错误的性质归类
    pub fn from_action(err: ActionError) -> Self {
        if err.is_session_fatal() {
            ExecutionError::GroupFatal(err.to_string())
        } else {
            ExecutionError::Handler(err.to_string())
        }
    }

    /// 指标标签
    pub fn reason(&self) -> &'static str {
        match self {
            ExecutionError::Handler(_) => "handler",
            ExecutionError::GroupFatal(_) => "group_fatal",
            ExecutionError::Rotation(_) => "rotation",
            ExecutionError::Repository(_) => "repository",
        }
    }
}
