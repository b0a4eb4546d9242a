//! Static checks for a flow document, run before it is saved or activated.

use std::collections::HashSet;

use instaflow_core::error::{FlowError, Result};
use instaflow_core::types::{Flow, NodeData, NodeKind};

use crate::actions::ActionRegistry;
use crate::executor::find_trigger;

/// Validate a flow against the graph rules and the known action types.
///
/// Returns the first problem found.
pub fn validate_flow(flow: &Flow, registry: &ActionRegistry) -> Result<()> {
    find_trigger(flow)?;

    let mut ids = HashSet::new();
    for node in &flow.nodes {
        if !ids.insert(node.id.as_str()) {
            return Err(FlowError::InvalidFlow(format!("duplicate node id '{}'", node.id)));
        }
        if let NodeData::Action(action) = &node.data {
            if let Some(kind) = &action.action_type {
                if !registry.contains(kind) {
                    return Err(FlowError::UnknownAction(kind.clone()));
                }
            }
        }
    }

    for edge in &flow.edges {
        for end in [&edge.source, &edge.target] {
            if !ids.contains(end.as_str()) {
                return Err(FlowError::NodeNotFound(end.clone()));
            }
        }

        let source_kind = flow.node(&edge.source).map(|n| n.kind());
        let handle = edge.source_handle.as_deref();
        if source_kind == Some(NodeKind::Condition) && !matches!(handle, Some("true") | Some("false")) {
            return Err(FlowError::InvalidFlow(format!(
                "edge '{}' leaves condition node '{}' without a true/false handle",
                edge.id, edge.source
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use instaflow_core::types::{Edge, LogicOperator, Node, TriggerType};
    use serde_json::json;

    fn base_flow() -> Flow {
        let mut flow = Flow::new("f1", "Price replies");
        flow.nodes = vec![
            Node::trigger("t", TriggerType::CommentReceived),
            Node::condition("c", vec![], LogicOperator::And),
            Node::action("a", "reply_comment", json!({"message": "hi"}).as_object().unwrap().clone()),
        ];
        flow.edges = vec![Edge::new("t", "c"), Edge::branch("c", "a", true)];
        flow
    }

    #[test]
    fn test_valid_flow() {
        validate_flow(&base_flow(), &ActionRegistry::with_builtins()).unwrap();
    }

    #[test]
    fn test_rejects_second_trigger() {
        let mut flow = base_flow();
        flow.nodes.push(Node::trigger("t2", TriggerType::DmReceived));
        let err = validate_flow(&flow, &ActionRegistry::with_builtins()).unwrap_err();
        assert!(matches!(err, FlowError::MultipleTriggerNodes(2)));
    }

    #[test]
    fn test_rejects_missing_trigger() {
        let mut flow = base_flow();
        flow.nodes.remove(0);
        flow.edges.remove(0);
        let err = validate_flow(&flow, &ActionRegistry::with_builtins()).unwrap_err();
        assert_eq!(err.to_string(), "No trigger node found in flow");
    }

    #[test]
    fn test_rejects_dangling_edge() {
        let mut flow = base_flow();
        flow.edges.push(Edge::new("a", "ghost"));
        let err = validate_flow(&flow, &ActionRegistry::with_builtins()).unwrap_err();
        assert!(matches!(err, FlowError::NodeNotFound(ref id) if id == "ghost"));
    }

    #[test]
    fn test_rejects_unlabeled_condition_edge() {
        let mut flow = base_flow();
        flow.edges[1].source_handle = None;
        let err = validate_flow(&flow, &ActionRegistry::with_builtins()).unwrap_err();
        assert!(err.to_string().contains("true/false"));
    }

    #[test]
    fn test_rejects_unknown_action() {
        let mut flow = base_flow();
        flow.nodes[2] = Node::action("a", "follow_user", Default::default());
        let err = validate_flow(&flow, &ActionRegistry::with_builtins()).unwrap_err();
        assert!(matches!(err, FlowError::UnknownAction(kind) if kind == "follow_user"));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut flow = base_flow();
        flow.nodes.push(Node::action("a", "like_comment", Default::default()));
        let err = validate_flow(&flow, &ActionRegistry::with_builtins()).unwrap_err();
        assert!(err.to_string().contains("duplicate node id 'a'"));
    }
}
