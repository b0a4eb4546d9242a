use futures::future::BoxFuture;
use serde_json::json;
use tracing::info;

use instaflow_core::error::{FlowError, Result};

use super::{ActionContext, ActionHandler, ActionOutput};

const DEFAULT_METHOD: &str = "POST";

// ── ApiCallAction ───────────────────────────────────────────────

/// Forward the raw trigger payload to an external endpoint.
pub struct ApiCallAction;

impl ActionHandler for ApiCallAction {
    fn action_type(&self) -> &str {
        "api_call"
    }

    fn execute<'a>(&'a self, ctx: ActionContext<'a>) -> BoxFuture<'a, Result<ActionOutput>> {
        Box::pin(async move {
            let action = self.action_type();
            let endpoint = ctx
                .config_str("endpoint")
                .ok_or_else(|| FlowError::missing(action, "endpoint"))?;
            let method = ctx
                .config_str("method")
                .unwrap_or_else(|| DEFAULT_METHOD.to_string())
                .to_uppercase();

            info!(node_id = ctx.node_id, endpoint = %endpoint, method = %method, "Calling external API");
            let result = ctx.http.request(&method, &endpoint, ctx.trigger_data).await?;

            Ok(ActionOutput::new(json!({
                "action": action,
                "endpoint": endpoint,
                "method": method,
                "result": result,
            })))
        })
    }
}
