// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;

use crate::domain::models::direct_message::ExportPayload;
use crate::domain::models::job::JobKind;
use crate::domain::services::action_driver::Action;
use crate::workers::error::ExecutionError;
use crate::workers::handlers::{HandlerOutcome, JobContext, JobHandler};

/// 关键词导出处理器
pub struct ExportHandler;

#[async_trait]
impl JobHandler for ExportHandler {
    fn kind(&self) -> JobKind {
        JobKind::Export
    }

    async fn handle(&self, ctx: &JobContext<'_>) -> Result<HandlerOutcome, ExecutionError> {
        let payload: ExportPayload = serde_json::from_value(ctx.job.payload.clone())
            .map_err(|e| ExecutionError::Handler(format!("invalid export payload: {e}")))?;

        let action = Action::Search {
            keyword: payload.keyword.clone(),
            limit: payload.limit,
        };
        let outcome = ctx
            .driver
            .perform(&ctx.job.account_id, &action)
            .await
            .map_err(ExecutionError::from_action)?;

        let count = outcome.items.len();
        ctx.log(&format!("collected {count} posts for '{}'", payload.keyword))
            .await?;

        Ok(HandlerOutcome {
            message: Some(format!(
                "exported {count} posts for '{}'",
                payload.keyword
            )),
            url: outcome.url,
        })
    }
}
