// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::models::delay_policy::DelayPolicy;
use crate::domain::models::job::{Job, JobKind};
use crate::domain::repositories::job_log_repository::JobLogRepository;
use crate::domain::services::action_driver::ActionDriver;
use crate::workers::error::ExecutionError;

pub mod direct_message;
pub mod export;
pub mod post;

pub use direct_message::DirectMessageHandler;
pub use export::ExportHandler;
pub use post::PostHandler;

/// 处理器执行上下文
pub struct JobContext<'a> {
    pub job: &'a Job,
    pub driver: &'a dyn ActionDriver,
    pub logs: &'a dyn JobLogRepository,
    pub delay: DelayPolicy,
}

impl JobContext<'_> {
    /// 追加一条作业日志
    pub async fn log(&self, message: &str) -> Result<(), ExecutionError> {
        self.logs.append(self.job.id, message).await?;
        Ok(())
    }
}

/// 处理器成功时的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerOutcome {
    pub message: Option<String>,
    pub url: Option<String>,
}

/// 按作业类型执行的处理器
#[async_trait]
pub trait JobHandler: Send + Sync {
    fn kind(&self) -> JobKind;

    async fn handle(&self, ctx: &JobContext<'_>) -> Result<HandlerOutcome, ExecutionError>;
}

/// 作业类型到处理器的映射
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<JobKind, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册全部内置处理器
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DirectMessageHandler));
        registry.register(Arc::new(PostHandler));
        registry.register(Arc::new(ExportHandler));
        registry
    }

    /// 注册处理器，同类型的旧处理器会被替换
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn get(&self, kind: JobKind) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(&kind).cloned()
    }
}
