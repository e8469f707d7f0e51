// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::models::direct_message::DmPayload;
use crate::domain::models::job::JobKind;
use crate::domain::services::action_driver::Action;
use crate::workers::error::ExecutionError;
use crate::workers::handlers::{HandlerOutcome, JobContext, JobHandler};

/// 批量私信处理器
///
/// 逐个目标发送私信，每个目标写一条结果日志，目标之间随机等待。
/// 结果判定：
/// - 全部成功：Completed
/// - 全部失败：Failed
/// - 部分成功：Completed，结果信息标明成功与失败数量
///
/// 会话失效属于账号级错误，立即中止并上报 `GroupFatal`。
pub struct DirectMessageHandler;

#[async_trait]
impl JobHandler for DirectMessageHandler {
    fn kind(&self) -> JobKind {
        JobKind::DirectMessage
    }

    async fn handle(&self, ctx: &JobContext<'_>) -> Result<HandlerOutcome, ExecutionError> {
        let payload = DmPayload::from_value(&ctx.job.payload)
            .map_err(|e| ExecutionError::Handler(e.to_string()))?;

        let account_id = ctx.job.account_id.as_str();
        let total = payload.targets.len();
        let mut sent = 0usize;
        let mut failed = 0usize;

        for (idx, item) in payload.targets.iter().enumerate() {
            let position = idx + 1;
            let action = Action::SendDirectMessage {
                target: item.target.clone(),
                message: item.message.clone(),
            };

            match ctx.driver.perform(account_id, &action).await {
                Ok(_) => {
                    sent += 1;
                    debug!(job_id = %ctx.job.id, target = %item.target, "Direct message sent");
                    ctx.log(&format!("[{position}/{total}] sent to {}", item.target))
                        .await?;
                }
                Err(e) if e.is_session_fatal() => {
                    ctx.log(&format!(
                        "[{position}/{total}] failed to send to {}: {}",
                        item.target, e
                    ))
                    .await?;
                    return Err(ExecutionError::from_action(e));
                }
                Err(e) => {
                    failed += 1;
                    warn!(job_id = %ctx.job.id, target = %item.target, error = %e, "Direct message failed");
                    ctx.log(&format!(
                        "[{position}/{total}] failed to send to {}: {}",
                        item.target, e
                    ))
                    .await?;
                }
            }

            if position < total {
                let wait = ctx.delay.target_delay();
                if !wait.is_zero() {
                    tokio::time::sleep(wait).await;
                }
            }
        }

        ctx.log(&format!("summary - sent: {sent}, failed: {failed}"))
            .await?;

        if failed == 0 {
            Ok(HandlerOutcome {
                message: Some(format!("direct messages sent - sent: {sent}, failed: 0")),
                url: None,
            })
        } else if sent == 0 {
            Err(ExecutionError::Handler(format!(
                "all {total} direct messages failed"
            )))
        } else {
            Ok(HandlerOutcome {
                message: Some(format!(
                    "partial success - sent: {sent}, failed: {failed}"
                )),
                url: None,
            })
        }
    }
}
