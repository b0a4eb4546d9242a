use futures::future::BoxFuture;
use serde_json::json;
use tracing::info;

use instaflow_core::error::{FlowError, Result};

use super::{ActionContext, ActionHandler, ActionOutput};

// ── ReplyCommentAction ──────────────────────────────────────────

/// Public reply under the triggering comment.
pub struct ReplyCommentAction;

impl ActionHandler for ReplyCommentAction {
    fn action_type(&self) -> &str {
        "reply_comment"
    }

    fn execute<'a>(&'a self, ctx: ActionContext<'a>) -> BoxFuture<'a, Result<ActionOutput>> {
        Box::pin(async move {
            let comment_id = ctx
                .var("comment_id")
                .ok_or_else(|| FlowError::missing(self.action_type(), "comment_id"))?;
            let message = ctx
                .config_str("message")
                .ok_or_else(|| FlowError::missing(self.action_type(), "message"))?;

            info!(node_id = ctx.node_id, comment_id = %comment_id, "Replying to comment");
            let result = ctx.provider.reply_to_comment(&comment_id, &message).await?;

            Ok(ActionOutput::new(json!({
                "action": self.action_type(),
                "comment_id": comment_id,
                "message": message,
                "result": result,
            })))
        })
    }
}

// ── CommentAction ───────────────────────────────────────────────

/// Moderation actions that only need the triggering comment id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAction {
    Delete,
    Hide,
    Like,
}

impl ActionHandler for CommentAction {
    fn action_type(&self) -> &str {
        match self {
            Self::Delete => "delete_comment",
            Self::Hide => "hide_comment",
            Self::Like => "like_comment",
        }
    }

    fn execute<'a>(&'a self, ctx: ActionContext<'a>) -> BoxFuture<'a, Result<ActionOutput>> {
        Box::pin(async move {
            let comment_id = ctx
                .var("comment_id")
                .ok_or_else(|| FlowError::missing(self.action_type(), "comment_id"))?;

            info!(node_id = ctx.node_id, comment_id = %comment_id, action = self.action_type(), "Moderating comment");
            let result = match self {
                Self::Delete => ctx.provider.delete_comment(&comment_id).await?,
                Self::Hide => ctx.provider.hide_comment(&comment_id).await?,
                Self::Like => ctx.provider.like_comment(&comment_id).await?,
            };

            Ok(ActionOutput::new(json!({
                "action": self.action_type(),
                "comment_id": comment_id,
                "result": result,
            })))
        })
    }
}
