use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use instaflow_core::config::EngineConfig;
use instaflow_core::error::{FlowError, Result};
use instaflow_core::traits::{ActionProvider, HttpClient};
use instaflow_core::types::{
    ActionData, ConditionData, Edge, ExecutionResult, Flow, Node, NodeData, NodeResult, TriggerData, Variables,
};

use crate::actions::{prepare_config, ActionContext, ActionRegistry, FlowEffect};
use crate::condition::evaluate_conditions;
use crate::variables::extract;

/// Where the walk goes after a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Follow the node's unlabeled outgoing edge.
    Continue,
    /// Follow the condition edge labeled `"true"` / `"false"`.
    Branch(bool),
    /// End the run successfully.
    Stop,
}

/// Resolve the next node id. The first matching edge in list order wins.
pub fn next_node<'a>(edges: &'a [Edge], from: &str, step: NextStep) -> Option<&'a str> {
    let edge = match step {
        NextStep::Continue => edges.iter().find(|e| e.source == from),
        NextStep::Branch(taken) => {
            let label = if taken { "true" } else { "false" };
            edges
                .iter()
                .find(|e| e.source == from && e.source_handle.as_deref() == Some(label))
        }
        NextStep::Stop => None,
    };
    edge.map(|e| e.target.as_str())
}

/// The single trigger node of a flow.
pub fn find_trigger(flow: &Flow) -> Result<&Node> {
    let mut triggers = flow.triggers();
    let first = triggers.next().ok_or(FlowError::NoTriggerNode)?;
    let extra = triggers.count();
    if extra > 0 {
        return Err(FlowError::MultipleTriggerNodes(extra + 1));
    }
    Ok(first)
}

/// Per-run state. Owned by exactly one `execute` call.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub trigger_data: Value,
    pub variables: Variables,
    pub execution_path: Vec<String>,
    pub node_results: Vec<NodeResult>,
}

impl ExecutionContext {
    pub fn new(trigger_data: Value) -> Self {
        let variables = extract(&trigger_data);
        Self {
            trigger_data,
            variables,
            execution_path: vec![],
            node_results: vec![],
        }
    }

    fn into_result(self, error: Option<String>) -> ExecutionResult {
        ExecutionResult {
            success: error.is_none(),
            execution_path: self.execution_path,
            node_results: self.node_results,
            error,
        }
    }
}

/// Walks a flow graph from its trigger node, one node at a time.
///
/// The provider and HTTP client are injected so tests can substitute mocks.
/// A single executor can serve many concurrent runs; nothing mutable is
/// shared between them.
pub struct FlowExecutor {
    provider: Arc<dyn ActionProvider>,
    http: Arc<dyn HttpClient>,
    registry: Arc<ActionRegistry>,
    config: EngineConfig,
}

impl FlowExecutor {
    pub fn new(provider: Arc<dyn ActionProvider>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            provider,
            http,
            registry: Arc::new(ActionRegistry::with_builtins()),
            config: EngineConfig::default(),
        }
    }

    /// Replace the action registry.
    pub fn with_registry(mut self, registry: ActionRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Set engine limits and substitution policy.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Run `flow` against one trigger payload.
    ///
    /// Never fails: any error aborts the walk and is reported in the result
    /// alongside the path and node results gathered up to that point.
    pub async fn execute(&self, flow: &Flow, trigger_data: Value) -> ExecutionResult {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4();
        let mut ctx = ExecutionContext::new(trigger_data);

        info!(
            %run_id,
            flow_id = %flow.id,
            provider = self.provider.name(),
            variables = ctx.variables.len(),
            "Executing flow"
        );

        let outcome = self.walk(flow, &mut ctx).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(()) => {
                info!(%run_id, flow_id = %flow.id, steps = ctx.execution_path.len(), elapsed_ms, "Flow complete");
                ctx.into_result(None)
            }
            Err(e) => {
                error!(%run_id, flow_id = %flow.id, error = %e, elapsed_ms, "Flow execution failed");
                ctx.into_result(Some(e.to_string()))
            }
        }
    }

    async fn walk(&self, flow: &Flow, ctx: &mut ExecutionContext) -> Result<()> {
        let trigger = find_trigger(flow)?;
        let mut current: Option<String> = Some(trigger.id.clone());
        let mut steps = 0usize;

        while let Some(node_id) = current.take() {
            // Graphs are user-authored and may loop
            if steps >= self.config.max_steps {
                return Err(FlowError::MaxStepsExceeded(self.config.max_steps));
            }
            steps += 1;

            let Some(node) = flow.node(&node_id) else {
                warn!(flow_id = %flow.id, target = %node_id, "Edge target not in flow, ending run");
                break;
            };
            ctx.execution_path.push(node.id.clone());

            let step = match self.visit(node, ctx).await {
                Ok(step) => step,
                Err(e) => {
                    ctx.node_results
                        .push(NodeResult::failure(&node.id, node.kind(), e.to_string()));
                    return Err(e);
                }
            };

            current = next_node(&flow.edges, &node.id, step).map(str::to_string);
            debug!(node_id = %node.id, ?step, next = ?current, "Resolved next node");
        }

        Ok(())
    }

    async fn visit(&self, node: &Node, ctx: &mut ExecutionContext) -> Result<NextStep> {
        info!(node_id = %node.id, node_type = %node.kind(), label = node.label().unwrap_or(""), "Visiting node");

        match &node.data {
            NodeData::Trigger(data) => Ok(self.visit_trigger(node, data, ctx)),
            NodeData::Condition(data) => Ok(self.visit_condition(node, data, ctx)),
            NodeData::Action(data) => self.visit_action(node, data, ctx).await,
        }
    }

    fn visit_trigger(&self, node: &Node, data: &TriggerData, ctx: &mut ExecutionContext) -> NextStep {
        let output = json!({
            "triggerType": data.trigger_type,
            "triggerData": ctx.trigger_data,
        });
        ctx.node_results
            .push(NodeResult::success(&node.id, node.kind(), Some(output)));
        NextStep::Continue
    }

    fn visit_condition(&self, node: &Node, data: &ConditionData, ctx: &mut ExecutionContext) -> NextStep {
        let met = evaluate_conditions(&data.conditions, data.logic_operator, &ctx.variables);
        debug!(node_id = %node.id, conditions_met = met, "Evaluated conditions");

        let output = json!({
            "conditionsMet": met,
            "conditions": data.conditions,
            "logicOperator": data.logic_operator,
            "variables": ctx.variables,
        });
        ctx.node_results
            .push(NodeResult::success(&node.id, node.kind(), Some(output)));
        NextStep::Branch(met)
    }

    async fn visit_action(&self, node: &Node, data: &ActionData, ctx: &mut ExecutionContext) -> Result<NextStep> {
        let (Some(action_type), Some(config)) = (&data.action_type, &data.action_config) else {
            debug!(node_id = %node.id, "Action node not configured, passing through");
            ctx.node_results.push(NodeResult::success(&node.id, node.kind(), None));
            return Ok(NextStep::Continue);
        };

        let prepared = prepare_config(config, &ctx.variables, self.config.unresolved_tokens);
        let start = Instant::now();
        let output = self
            .registry
            .execute(
                action_type,
                ActionContext {
                    node_id: &node.id,
                    config: &prepared,
                    variables: &ctx.variables,
                    trigger_data: &ctx.trigger_data,
                    provider: self.provider.as_ref(),
                    http: self.http.as_ref(),
                    unresolved_tokens: self.config.unresolved_tokens,
                },
            )
            .await?;
        debug!(
            node_id = %node.id,
            action = %action_type,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Action complete"
        );

        ctx.node_results.push(NodeResult::success(
            &node.id,
            node.kind(),
            Some(json!({
                "actionType": action_type,
                "config": config,
                "result": output.result,
            })),
        ));

        Ok(match output.effect {
            FlowEffect::None => NextStep::Continue,
            FlowEffect::SetVariable { name, value } => {
                ctx.variables.set(name, value);
                NextStep::Continue
            }
            FlowEffect::Stop => NextStep::Stop,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use instaflow_core::types::{Condition, ConditionOperator, LogicOperator, TriggerType};

    #[test]
    fn test_next_node_unlabeled_takes_first() {
        let edges = vec![Edge::new("t", "a"), Edge::new("t", "b")];
        assert_eq!(next_node(&edges, "t", NextStep::Continue), Some("a"));
        assert_eq!(next_node(&edges, "a", NextStep::Continue), None);
    }

    #[test]
    fn test_next_node_branch_matches_label() {
        let edges = vec![Edge::branch("c", "no", false), Edge::branch("c", "yes", true)];
        assert_eq!(next_node(&edges, "c", NextStep::Branch(true)), Some("yes"));
        assert_eq!(next_node(&edges, "c", NextStep::Branch(false)), Some("no"));
    }

    #[test]
    fn test_next_node_dangling_branch() {
        let edges = vec![Edge::branch("c", "yes", true), Edge::new("c", "unlabeled")];
        assert_eq!(next_node(&edges, "c", NextStep::Branch(false)), None);
    }

    #[test]
    fn test_next_node_stop() {
        let edges = vec![Edge::new("a", "b")];
        assert_eq!(next_node(&edges, "a", NextStep::Stop), None);
    }

    #[test]
    fn test_find_trigger() {
        let mut flow = Flow::new("f", "f");
        assert!(matches!(find_trigger(&flow), Err(FlowError::NoTriggerNode)));

        flow.nodes.push(Node::condition(
            "c",
            vec![Condition::new("x", ConditionOperator::Equals, "y")],
            LogicOperator::And,
        ));
        flow.nodes.push(Node::trigger("t", TriggerType::CommentReceived));
        assert_eq!(find_trigger(&flow).unwrap().id, "t");

        flow.nodes.push(Node::trigger("t2", TriggerType::DmReceived));
        assert!(matches!(find_trigger(&flow), Err(FlowError::MultipleTriggerNodes(2))));
    }

    #[test]
    fn test_context_extracts_variables() {
        let ctx = ExecutionContext::new(serde_json::json!({"comment_id": "c1"}));
        assert_eq!(ctx.variables.get("comment_id"), Some("c1"));
        assert!(ctx.execution_path.is_empty());
    }
}
