//! Mocks and fixtures shared by Instaflow tests.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use serde_json::{json, Value};

use instaflow_core::error::{FlowError, Result};
use instaflow_core::traits::{ActionProvider, HttpClient};
use instaflow_core::types::{ActionConfig, Button, Condition, Edge, Flow, LogicOperator, Node, TriggerType};

/// One recorded call against [`MockProvider`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCall {
    ReplyToComment { comment_id: String, text: String },
    DeleteComment { comment_id: String },
    HideComment { comment_id: String },
    LikeComment { comment_id: String },
    SendDirectMessage { recipient_id: String, text: String },
    SendButtonTemplate {
        recipient_id: String,
        title: String,
        subtitle: Option<String>,
        buttons: Vec<Button>,
    },
    SendPrivateReply { comment_id: String, text: String },
}

impl ProviderCall {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::ReplyToComment { .. } => "reply_to_comment",
            Self::DeleteComment { .. } => "delete_comment",
            Self::HideComment { .. } => "hide_comment",
            Self::LikeComment { .. } => "like_comment",
            Self::SendDirectMessage { .. } => "send_direct_message",
            Self::SendButtonTemplate { .. } => "send_button_template",
            Self::SendPrivateReply { .. } => "send_private_reply",
        }
    }
}

/// Action provider that records every call and answers `{"id": "mock-N"}`.
///
/// `fail_on` makes one operation return a provider error instead.
#[derive(Default)]
pub struct MockProvider {
    calls: Mutex<Vec<ProviderCall>>,
    fail_on: Option<(String, String)>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            calls: Mutex::new(vec![]),
            fail_on: Some((operation.into(), message.into())),
        }
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: ProviderCall) -> BoxFuture<'_, Result<Value>> {
        let operation = call.operation();
        let fail = self
            .fail_on
            .as_ref()
            .filter(|(op, _)| op == operation)
            .map(|(_, msg)| msg.clone());
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call);
            calls.len()
        };
        Box::pin(async move {
            match fail {
                Some(message) => Err(FlowError::Provider {
                    operation: operation.to_string(),
                    message,
                }),
                None => Ok(json!({ "id": format!("mock-{n}") })),
            }
        })
    }
}

impl ActionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn reply_to_comment(&self, comment_id: &str, text: &str) -> BoxFuture<'_, Result<Value>> {
        self.record(ProviderCall::ReplyToComment {
            comment_id: comment_id.into(),
            text: text.into(),
        })
    }

    fn delete_comment(&self, comment_id: &str) -> BoxFuture<'_, Result<Value>> {
        self.record(ProviderCall::DeleteComment {
            comment_id: comment_id.into(),
        })
    }

    fn hide_comment(&self, comment_id: &str) -> BoxFuture<'_, Result<Value>> {
        self.record(ProviderCall::HideComment {
            comment_id: comment_id.into(),
        })
    }

    fn like_comment(&self, comment_id: &str) -> BoxFuture<'_, Result<Value>> {
        self.record(ProviderCall::LikeComment {
            comment_id: comment_id.into(),
        })
    }

    fn send_direct_message(&self, recipient_id: &str, text: &str) -> BoxFuture<'_, Result<Value>> {
        self.record(ProviderCall::SendDirectMessage {
            recipient_id: recipient_id.into(),
            text: text.into(),
        })
    }

    fn send_button_template(
        &self,
        recipient_id: &str,
        title: &str,
        subtitle: Option<&str>,
        buttons: &[Button],
    ) -> BoxFuture<'_, Result<Value>> {
        self.record(ProviderCall::SendButtonTemplate {
            recipient_id: recipient_id.into(),
            title: title.into(),
            subtitle: subtitle.map(str::to_string),
            buttons: buttons.to_vec(),
        })
    }

    fn send_private_reply(&self, comment_id: &str, text: &str) -> BoxFuture<'_, Result<Value>> {
        self.record(ProviderCall::SendPrivateReply {
            comment_id: comment_id.into(),
            text: text.into(),
        })
    }
}

/// One recorded HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpCall {
    pub method: String,
    pub url: String,
    pub body: Value,
}

/// HTTP client that records requests and returns a canned response.
pub struct MockHttpClient {
    calls: Mutex<Vec<HttpCall>>,
    response: std::result::Result<Value, String>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::responding(json!({"ok": true}))
    }

    pub fn responding(response: Value) -> Self {
        Self {
            calls: Mutex::new(vec![]),
            response: Ok(response),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            calls: Mutex::new(vec![]),
            response: Err(message.into()),
        }
    }

    pub fn calls(&self) -> Vec<HttpCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for MockHttpClient {
    fn request(&self, method: &str, url: &str, body: &Value) -> BoxFuture<'_, Result<Value>> {
        self.calls.lock().unwrap().push(HttpCall {
            method: method.into(),
            url: url.into(),
            body: body.clone(),
        });
        let response = self.response.clone().map_err(FlowError::Http);
        Box::pin(async move { response })
    }
}

/// Mocks wrapped for injection into a `FlowExecutor`.
pub fn mocks() -> (Arc<MockProvider>, Arc<MockHttpClient>) {
    (Arc::new(MockProvider::new()), Arc::new(MockHttpClient::new()))
}

/// Build a JSON object config from a `json!` literal.
pub fn config(value: Value) -> ActionConfig {
    match value {
        Value::Object(map) => map,
        other => panic!("action config must be an object, got {other}"),
    }
}

/// Fluent flow fixture builder.
pub struct FlowBuilder {
    flow: Flow,
}

impl FlowBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            flow: Flow::new(id.clone(), id),
        }
    }

    pub fn account(mut self, account_id: impl Into<String>) -> Self {
        self.flow.account_id = Some(account_id.into());
        self
    }

    pub fn trigger(mut self, id: &str, trigger_type: TriggerType) -> Self {
        self.flow.nodes.push(Node::trigger(id, trigger_type));
        self
    }

    pub fn condition(mut self, id: &str, conditions: Vec<Condition>, logic: LogicOperator) -> Self {
        self.flow.nodes.push(Node::condition(id, conditions, logic));
        self
    }

    pub fn action(mut self, id: &str, action_type: &str, config_value: Value) -> Self {
        self.flow.nodes.push(Node::action(id, action_type, config(config_value)));
        self
    }

    pub fn node(mut self, node: Node) -> Self {
        self.flow.nodes.push(node);
        self
    }

    pub fn edge(mut self, source: &str, target: &str) -> Self {
        self.flow.edges.push(Edge::new(source, target));
        self
    }

    pub fn branch(mut self, source: &str, target: &str, taken: bool) -> Self {
        self.flow.edges.push(Edge::branch(source, target, taken));
        self
    }

    pub fn build(self) -> Flow {
        self.flow
    }
}

/// Flattened comment payload as produced by webhook ingestion.
pub fn comment_event(comment_id: &str, text: &str, username: &str) -> Value {
    json!({
        "comment_id": comment_id,
        "comment_text": text,
        "from_id": format!("user-{username}"),
        "from_username": username,
        "media_id": "media-1",
    })
}

/// Flattened DM payload.
pub fn dm_event(message_id: &str, text: &str, sender_id: &str) -> Value {
    json!({
        "message_id": message_id,
        "message_text": text,
        "sender_id": sender_id,
    })
}
