//! Action dispatch.
//!
//! Each action kind is an [`ActionHandler`] registered by name in an
//! [`ActionRegistry`]. The controller looks the handler up by the node's
//! `actionType`, so new kinds plug in without touching the graph walk.

pub mod comment;
pub mod control;
pub mod http;
pub mod message;

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use instaflow_core::config::UnresolvedTokens;
use instaflow_core::error::{FlowError, Result};
use instaflow_core::traits::{ActionProvider, HttpClient};
use instaflow_core::types::{ActionConfig, Variables};

use crate::template::substitute;

/// Config keys that go through `{variable}` substitution.
const SUBSTITUTED_KEYS: &[&str] = &["message", "url"];

/// Everything a handler may read while executing one action node.
pub struct ActionContext<'a> {
    pub node_id: &'a str,
    /// Node config after variable substitution.
    pub config: &'a ActionConfig,
    pub variables: &'a Variables,
    pub trigger_data: &'a Value,
    pub provider: &'a dyn ActionProvider,
    pub http: &'a dyn HttpClient,
    pub unresolved_tokens: UnresolvedTokens,
}

impl ActionContext<'_> {
    /// Non-empty string config value. Numbers are accepted and stringified.
    pub fn config_str(&self, key: &str) -> Option<String> {
        match self.config.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Non-empty variable value.
    pub fn var(&self, key: &str) -> Option<String> {
        self.variables
            .get(key)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// Side effect an action has on the walk itself.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEffect {
    None,
    SetVariable { name: String, value: String },
    Stop,
}

#[derive(Debug, Clone)]
pub struct ActionOutput {
    pub result: Value,
    pub effect: FlowEffect,
}

impl ActionOutput {
    pub fn new(result: Value) -> Self {
        Self {
            result,
            effect: FlowEffect::None,
        }
    }

    pub fn with_effect(mut self, effect: FlowEffect) -> Self {
        self.effect = effect;
        self
    }
}

/// One action kind.
pub trait ActionHandler: Send + Sync + 'static {
    /// The `actionType` this handler serves (e.g., "reply_comment").
    fn action_type(&self) -> &str;

    fn execute<'a>(&'a self, ctx: ActionContext<'a>) -> BoxFuture<'a, Result<ActionOutput>>;
}

/// Registry of action handlers keyed by `actionType`.
pub struct ActionRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler, replacing any handler for the same type.
    pub fn register(&mut self, handler: impl ActionHandler) {
        let name = handler.action_type().to_string();
        self.handlers.insert(name, Arc::new(handler));
    }

    pub fn get(&self, action_type: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(action_type).cloned()
    }

    pub fn contains(&self, action_type: &str) -> bool {
        self.handlers.contains_key(action_type)
    }

    /// List all registered action types.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Execute an action by type.
    pub async fn execute(&self, action_type: &str, ctx: ActionContext<'_>) -> Result<ActionOutput> {
        let handler = self
            .get(action_type)
            .ok_or_else(|| FlowError::UnknownAction(action_type.to_string()))?;
        handler.execute(ctx).await
    }

    /// Create a registry with all built-in action kinds registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        // ── Comments ────────────────────────────────────────────
        registry.register(comment::ReplyCommentAction);
        registry.register(comment::CommentAction::Delete);
        registry.register(comment::CommentAction::Hide);
        registry.register(comment::CommentAction::Like);

        // ── Messaging ───────────────────────────────────────────
        registry.register(message::SendDmAction);
        registry.register(message::SendLinkAction);

        // ── External ────────────────────────────────────────────
        registry.register(http::ApiCallAction);

        // ── Flow control ────────────────────────────────────────
        registry.register(control::DelayAction);
        registry.register(control::SetVariableAction);
        registry.register(control::StopFlowAction);

        registry
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Apply `{variable}` substitution to the substitutable config keys.
pub fn prepare_config(config: &ActionConfig, variables: &Variables, policy: UnresolvedTokens) -> ActionConfig {
    let mut prepared = config.clone();
    for key in SUBSTITUTED_KEYS {
        if let Some(Value::String(text)) = prepared.get_mut(*key) {
            *text = substitute(text, variables, policy);
        }
    }
    prepared
}
