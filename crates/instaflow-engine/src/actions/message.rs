use futures::future::BoxFuture;
use serde_json::{json, Value};
use tracing::info;

use instaflow_core::error::{FlowError, Result};
use instaflow_core::types::Button;

use super::{ActionContext, ActionHandler, ActionOutput};

/// Instagram's button template limit.
pub const MAX_BUTTONS: usize = 3;

// ── SendDmAction ────────────────────────────────────────────────

/// Direct message to the event author.
///
/// When the event carries a `comment_id` the message goes out as a private
/// reply to that comment; otherwise it is sent to `sender_id`, as a button
/// template when `config.buttons` is non-empty.
pub struct SendDmAction;

impl ActionHandler for SendDmAction {
    fn action_type(&self) -> &str {
        "send_dm"
    }

    fn execute<'a>(&'a self, ctx: ActionContext<'a>) -> BoxFuture<'a, Result<ActionOutput>> {
        Box::pin(async move {
            let action = self.action_type();
            let message = ctx
                .config_str("message")
                .ok_or_else(|| FlowError::missing(action, "message"))?;

            if let Some(comment_id) = ctx.var("comment_id") {
                info!(node_id = ctx.node_id, comment_id = %comment_id, "Sending private reply");
                let result = ctx.provider.send_private_reply(&comment_id, &message).await?;
                return Ok(ActionOutput::new(json!({
                    "action": action,
                    "method": "private_reply",
                    "comment_id": comment_id,
                    "message": message,
                    "result": result,
                })));
            }

            let sender_id = ctx
                .var("sender_id")
                .ok_or_else(|| FlowError::missing(action, "comment_id or sender_id"))?;
            let buttons = parse_buttons(action, ctx.config.get("buttons"))?;

            let result = if buttons.is_empty() {
                info!(node_id = ctx.node_id, sender_id = %sender_id, "Sending direct message");
                ctx.provider.send_direct_message(&sender_id, &message).await?
            } else {
                let subtitle = ctx.config_str("subtitle");
                info!(node_id = ctx.node_id, sender_id = %sender_id, buttons = buttons.len(), "Sending button template");
                ctx.provider
                    .send_button_template(&sender_id, &message, subtitle.as_deref(), &buttons)
                    .await?
            };

            Ok(ActionOutput::new(json!({
                "action": action,
                "method": "direct_message",
                "sender_id": sender_id,
                "message": message,
                "buttons": buttons.len(),
                "result": result,
            })))
        })
    }
}

/// Decode `config.buttons`. Absent, `null`, or `[]` means no buttons.
fn parse_buttons(action: &str, raw: Option<&Value>) -> Result<Vec<Button>> {
    let Some(raw) = raw.filter(|v| !v.is_null()) else {
        return Ok(vec![]);
    };
    let buttons: Vec<Button> = serde_json::from_value(raw.clone())
        .map_err(|e| FlowError::invalid_config(action, format!("buttons: {e}")))?;
    if buttons.len() > MAX_BUTTONS {
        return Err(FlowError::invalid_config(
            action,
            format!("at most {MAX_BUTTONS} buttons allowed, got {}", buttons.len()),
        ));
    }
    Ok(buttons)
}

// ── SendLinkAction ──────────────────────────────────────────────

/// DM a link to the event author.
pub struct SendLinkAction;

impl ActionHandler for SendLinkAction {
    fn action_type(&self) -> &str {
        "send_link"
    }

    fn execute<'a>(&'a self, ctx: ActionContext<'a>) -> BoxFuture<'a, Result<ActionOutput>> {
        Box::pin(async move {
            let action = self.action_type();
            let sender_id = ctx
                .var("sender_id")
                .ok_or_else(|| FlowError::missing(action, "sender_id"))?;
            let url = ctx
                .config_str("url")
                .ok_or_else(|| FlowError::missing(action, "url"))?;

            info!(node_id = ctx.node_id, sender_id = %sender_id, "Sending link");
            let result = ctx.provider.send_direct_message(&sender_id, &url).await?;

            Ok(ActionOutput::new(json!({
                "action": action,
                "sender_id": sender_id,
                "url": url,
                "result": result,
            })))
        })
    }
}
