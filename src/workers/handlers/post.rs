// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;

use crate::domain::models::direct_message::PostPayload;
use crate::domain::models::job::JobKind;
use crate::domain::services::action_driver::Action;
use crate::workers::error::ExecutionError;
use crate::workers::handlers::{HandlerOutcome, JobContext, JobHandler};

/// 发帖处理器，成功时把帖子地址写入结果链接
pub struct PostHandler;

#[async_trait]
impl JobHandler for PostHandler {
    fn kind(&self) -> JobKind {
        JobKind::Post
    }

    async fn handle(&self, ctx: &JobContext<'_>) -> Result<HandlerOutcome, ExecutionError> {
        let payload: PostPayload = serde_json::from_value(ctx.job.payload.clone())
            .map_err(|e| ExecutionError::Handler(format!("invalid post payload: {e}")))?;

        let action = Action::Publish {
            caption: payload.caption,
            media_urls: payload.media_urls,
        };
        let outcome = ctx
            .driver
            .perform(&ctx.job.account_id, &action)
            .await
            .map_err(ExecutionError::from_action)?;

        if let Some(url) = &outcome.url {
            ctx.log(&format!("post published at {url}")).await?;
        }

        Ok(HandlerOutcome {
            message: Some(
                outcome
                    .detail
                    .unwrap_or_else(|| "post published".to_string()),
            ),
            url: outcome.url,
        })
    }
}
