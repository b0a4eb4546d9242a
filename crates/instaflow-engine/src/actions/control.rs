use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::{json, Value};
use tracing::info;

use instaflow_core::error::{FlowError, Result};

use super::{ActionContext, ActionHandler, ActionOutput, FlowEffect};

// ── DelayAction ─────────────────────────────────────────────────

/// Suspend this run for `config.seconds`. Other runs keep going.
pub struct DelayAction;

impl ActionHandler for DelayAction {
    fn action_type(&self) -> &str {
        "delay"
    }

    fn execute<'a>(&'a self, ctx: ActionContext<'a>) -> BoxFuture<'a, Result<ActionOutput>> {
        Box::pin(async move {
            let action = self.action_type();
            let raw = ctx
                .config
                .get("seconds")
                .filter(|v| !v.is_null())
                .ok_or_else(|| FlowError::missing(action, "seconds"))?;
            let seconds = parse_seconds(raw)
                .ok_or_else(|| FlowError::invalid_config(action, format!("seconds must be a non-negative number, got {raw}")))?;
            let duration = Duration::try_from_secs_f64(seconds)
                .map_err(|e| FlowError::invalid_config(action, format!("seconds out of range ({raw}): {e}")))?;

            info!(node_id = ctx.node_id, seconds, "Delaying flow");
            tokio::time::sleep(duration).await;

            Ok(ActionOutput::new(json!({
                "action": action,
                "seconds": seconds_value(seconds),
            })))
        })
    }
}

/// Accepts `2`, `2.5`, `"2"`, `" 2.5 "`.
fn parse_seconds(raw: &Value) -> Option<f64> {
    let seconds = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
}

/// Whole seconds render as integers.
fn seconds_value(seconds: f64) -> Value {
    if seconds.fract() == 0.0 && seconds <= u64::MAX as f64 {
        json!(seconds as u64)
    } else {
        json!(seconds)
    }
}

// ── SetVariableAction ───────────────────────────────────────────

/// Write `config.value` into the run's variables under `config.name`.
pub struct SetVariableAction;

impl ActionHandler for SetVariableAction {
    fn action_type(&self) -> &str {
        "set_variable"
    }

    fn execute<'a>(&'a self, ctx: ActionContext<'a>) -> BoxFuture<'a, Result<ActionOutput>> {
        Box::pin(async move {
            let action = self.action_type();
            let name = ctx
                .config_str("name")
                .ok_or_else(|| FlowError::missing(action, "name"))?;
            let value = match ctx.config.get("value") {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => crate::template::substitute(s, ctx.variables, ctx.unresolved_tokens),
                Some(other) => other.to_string(),
            };

            info!(node_id = ctx.node_id, name = %name, "Setting variable");
            Ok(ActionOutput::new(json!({
                "action": action,
                "name": name,
                "value": value,
            }))
            .with_effect(FlowEffect::SetVariable { name, value }))
        })
    }
}

// ── StopFlowAction ──────────────────────────────────────────────

/// End the run here, successfully.
pub struct StopFlowAction;

impl ActionHandler for StopFlowAction {
    fn action_type(&self) -> &str {
        "stop_flow"
    }

    fn execute<'a>(&'a self, ctx: ActionContext<'a>) -> BoxFuture<'a, Result<ActionOutput>> {
        Box::pin(async move {
            info!(node_id = ctx.node_id, "Stopping flow");
            Ok(ActionOutput::new(json!({ "action": self.action_type() })).with_effect(FlowEffect::Stop))
        })
    }
}
