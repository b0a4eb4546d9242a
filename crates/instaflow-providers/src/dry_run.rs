use futures::future::BoxFuture;
use serde_json::{json, Value};
use tracing::info;

use instaflow_core::error::Result;
use instaflow_core::traits::ActionProvider;
use instaflow_core::types::Button;

/// Provider that logs every call instead of contacting Instagram.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunProvider;

impl DryRunProvider {
    fn respond(&self, operation: &'static str, details: Value) -> BoxFuture<'_, Result<Value>> {
        info!(operation, %details, "Dry run: skipping Instagram call");
        let mut result = json!({ "dry_run": true, "operation": operation });
        if let (Some(result), Value::Object(details)) = (result.as_object_mut(), details) {
            result.extend(details);
        }
        Box::pin(async move { Ok(result) })
    }
}

impl ActionProvider for DryRunProvider {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn reply_to_comment(&self, comment_id: &str, text: &str) -> BoxFuture<'_, Result<Value>> {
        self.respond("reply_to_comment", json!({ "comment_id": comment_id, "text": text }))
    }

    fn delete_comment(&self, comment_id: &str) -> BoxFuture<'_, Result<Value>> {
        self.respond("delete_comment", json!({ "comment_id": comment_id }))
    }

    fn hide_comment(&self, comment_id: &str) -> BoxFuture<'_, Result<Value>> {
        self.respond("hide_comment", json!({ "comment_id": comment_id }))
    }

    fn like_comment(&self, comment_id: &str) -> BoxFuture<'_, Result<Value>> {
        self.respond("like_comment", json!({ "comment_id": comment_id }))
    }

    fn send_direct_message(&self, recipient_id: &str, text: &str) -> BoxFuture<'_, Result<Value>> {
        self.respond(
            "send_direct_message",
            json!({ "recipient_id": recipient_id, "text": text }),
        )
    }

    fn send_button_template(
        &self,
        recipient_id: &str,
        title: &str,
        subtitle: Option<&str>,
        buttons: &[Button],
    ) -> BoxFuture<'_, Result<Value>> {
        self.respond(
            "send_button_template",
            json!({
                "recipient_id": recipient_id,
                "title": title,
                "subtitle": subtitle,
                "buttons": buttons,
            }),
        )
    }

    fn send_private_reply(&self, comment_id: &str, text: &str) -> BoxFuture<'_, Result<Value>> {
        self.respond(
            "send_private_reply",
            json!({ "comment_id": comment_id, "text": text }),
        )
    }
}
