use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form action configuration, validated per action type at dispatch.
pub type ActionConfig = serde_json::Map<String, serde_json::Value>;

/// A trigger → condition → action graph bound to one Instagram account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Owning Instagram account id.
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Flow {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            account_id: None,
            is_active: true,
            nodes: vec![],
            edges: vec![],
            updated_at: None,
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// All trigger nodes, in document order.
    pub fn triggers(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind() == NodeKind::Trigger)
    }

    /// The trigger type of the first trigger node, if any.
    pub fn trigger_type(&self) -> Option<TriggerType> {
        self.triggers().find_map(|n| match &n.data {
            NodeData::Trigger(t) => Some(t.trigger_type),
            _ => None,
        })
    }
}

/// UI-only canvas position; ignored by execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Trigger,
    Condition,
    Action,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::Condition => "condition",
            Self::Action => "action",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A graph vertex. On the wire the node is `{id, type, position, data}`;
/// `type` selects which [`NodeData`] variant `data` decodes into.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub struct Node {
    pub id: String,
    pub position: Option<Position>,
    pub data: NodeData,
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Trigger(TriggerData),
    Condition(ConditionData),
    Action(ActionData),
}

impl Node {
    pub fn trigger(id: impl Into<String>, trigger_type: TriggerType) -> Self {
        Self {
            id: id.into(),
            position: None,
            data: NodeData::Trigger(TriggerData {
                trigger_type,
                label: None,
            }),
        }
    }

    pub fn condition(
        id: impl Into<String>,
        conditions: Vec<Condition>,
        logic_operator: LogicOperator,
    ) -> Self {
        Self {
            id: id.into(),
            position: None,
            data: NodeData::Condition(ConditionData {
                conditions,
                logic_operator,
                label: None,
            }),
        }
    }

    pub fn action(id: impl Into<String>, action_type: impl Into<String>, config: ActionConfig) -> Self {
        Self {
            id: id.into(),
            position: None,
            data: NodeData::Action(ActionData {
                action_type: Some(action_type.into()),
                action_config: Some(config),
                label: None,
            }),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Trigger(_) => NodeKind::Trigger,
            NodeData::Condition(_) => NodeKind::Condition,
            NodeData::Action(_) => NodeKind::Action,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match &self.data {
            NodeData::Trigger(d) => d.label.as_deref(),
            NodeData::Condition(d) => d.label.as_deref(),
            NodeData::Action(d) => d.label.as_deref(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawNode {
    id: String,
    #[serde(rename = "type")]
    kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<Position>,
    #[serde(default)]
    data: serde_json::Value,
}

impl TryFrom<RawNode> for Node {
    type Error = serde_json::Error;

    fn try_from(raw: RawNode) -> std::result::Result<Self, Self::Error> {
        let data = match raw.kind {
            NodeKind::Trigger => NodeData::Trigger(serde_json::from_value(raw.data)?),
            NodeKind::Condition => NodeData::Condition(serde_json::from_value(raw.data)?),
            NodeKind::Action => NodeData::Action(serde_json::from_value(raw.data)?),
        };
        Ok(Self {
            id: raw.id,
            position: raw.position,
            data,
        })
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        let kind = node.kind();
        let data = match node.data {
            NodeData::Trigger(d) => serde_json::to_value(d),
            NodeData::Condition(d) => serde_json::to_value(d),
            NodeData::Action(d) => serde_json::to_value(d),
        };
        // Node data is plain structs with string keys, which always serialize
        debug_assert!(data.is_ok(), "node data failed to serialize: {data:?}");
        let data = data.unwrap_or_default();
        Self {
            id: node.id,
            kind,
            position: node.position,
            data,
        }
    }
}

/// Instagram event a flow listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    CommentReceived,
    DmReceived,
    MentionReceived,
    StoryReplyReceived,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommentReceived => "comment_received",
            Self::DmReceived => "dm_received",
            Self::MentionReceived => "mention_received",
            Self::StoryReplyReceived => "story_reply_received",
        }
    }
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerData {
    pub trigger_type: TriggerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionData {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub logic_operator: LogicOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_config: Option<ActionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A single predicate on one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: String,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: ConditionOperator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Contains,
    Equals,
    NotContains,
    NotEquals,
    Regex,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicOperator {
    #[default]
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

/// A directed connection. Condition nodes label their two outgoing edges
/// with `sourceHandle` `"true"` / `"false"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(default)]
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
}

impl Edge {
    /// Create an unlabeled edge.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("{source}->{target}"),
            source,
            target,
            source_handle: None,
        }
    }

    /// Create a condition branch edge labeled `"true"` or `"false"`.
    pub fn branch(source: impl Into<String>, target: impl Into<String>, taken: bool) -> Self {
        let mut edge = Self::new(source, target);
        edge.id = format!("{}-{}", edge.id, taken);
        edge.source_handle = Some(taken.to_string());
        edge
    }
}

/// Flat string-keyed context derived from the trigger payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables(BTreeMap<String, String>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value for `key`, or `""` when unset.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Outcome of visiting one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResult {
    pub node_id: String,
    pub node_type: NodeKind,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeResult {
    pub fn success(node_id: impl Into<String>, node_type: NodeKind, output: Option<serde_json::Value>) -> Self {
        Self {
            node_id: node_id.into(),
            node_type,
            success: true,
            output,
            error: None,
        }
    }

    pub fn failure(node_id: impl Into<String>, node_type: NodeKind, error: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            node_type,
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }
}

/// Result of one flow run. Always produced, even when the run fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub execution_path: Vec<String>,
    pub node_results: Vec<NodeResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A flattened incoming event, ready for routing and variable extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent {
    pub event_type: TriggerType,
    /// Instagram account the event was delivered for.
    #[serde(default)]
    pub account_id: Option<String>,
    pub data: serde_json::Value,
}

/// A button attached to a DM button template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Button {
    WebUrl { title: String, url: String },
    Postback { title: String, payload: String },
}

impl Button {
    pub fn title(&self) -> &str {
        match self {
            Self::WebUrl { title, .. } | Self::Postback { title, .. } => title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_decodes_by_type_tag() {
        let json = serde_json::json!({
            "id": "c1",
            "type": "condition",
            "position": {"x": 10.0, "y": 20.0},
            "data": {
                "conditions": [{"field": "message_text", "operator": "contains", "value": "price"}],
                "logicOperator": "OR"
            }
        });
        let node: Node = serde_json::from_value(json).unwrap();
        assert_eq!(node.kind(), NodeKind::Condition);
        match node.data {
            NodeData::Condition(c) => {
                assert_eq!(c.logic_operator, LogicOperator::Or);
                assert_eq!(c.conditions[0].operator, ConditionOperator::Contains);
            }
            other => panic!("unexpected node data: {other:?}"),
        }
    }

    #[test]
    fn action_node_without_config_decodes() {
        let json = serde_json::json!({"id": "a1", "type": "action", "data": {"label": "todo"}});
        let node: Node = serde_json::from_value(json).unwrap();
        assert_eq!(node.label(), Some("todo"));
        assert_eq!(Node::trigger("t", TriggerType::DmReceived).label(), None);
        match node.data {
            NodeData::Action(a) => {
                assert!(a.action_type.is_none());
                assert!(a.action_config.is_none());
                assert_eq!(a.label.as_deref(), Some("todo"));
            }
            other => panic!("unexpected node data: {other:?}"),
        }
    }

    #[test]
    fn unknown_trigger_type_is_rejected() {
        let json = serde_json::json!({"id": "t", "type": "trigger", "data": {"triggerType": "follow_received"}});
        assert!(serde_json::from_value::<Node>(json).is_err());
    }

    #[test]
    fn node_serializes_back_to_wire_shape() {
        let node = Node::trigger("t1", TriggerType::DmReceived);
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "trigger");
        assert_eq!(value["data"]["triggerType"], "dm_received");
    }

    #[test]
    fn flow_defaults() {
        let flow: Flow = serde_json::from_str(r#"{"id": "f1", "name": "Welcome"}"#).unwrap();
        assert!(flow.is_active);
        assert!(flow.nodes.is_empty());
        assert!(flow.trigger_type().is_none());
    }

    #[test]
    fn branch_edge_labels() {
        let e = Edge::branch("c", "a", false);
        assert_eq!(e.source_handle.as_deref(), Some("false"));
        assert_eq!(Edge::new("t", "c").source_handle, None);
    }

    #[test]
    fn result_uses_camel_case_keys() {
        let result = ExecutionResult {
            success: true,
            execution_path: vec!["t1".into()],
            node_results: vec![NodeResult::success("t1", NodeKind::Trigger, None)],
            error: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["executionPath"][0], "t1");
        assert_eq!(value["nodeResults"][0]["nodeType"], "trigger");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn button_tagged_by_type() {
        let b: Button = serde_json::from_value(serde_json::json!({
            "type": "web_url", "title": "Shop", "url": "https://example.com"
        }))
        .unwrap();
        assert_eq!(b.title(), "Shop");
    }
}
