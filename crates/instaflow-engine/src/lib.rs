//! Flow execution engine.
//!
//! A flow is a graph of trigger, condition, and action nodes. The
//! [`FlowExecutor`] starts at the trigger, evaluates conditions against the
//! variables extracted from the event payload, dispatches actions through the
//! [`ActionRegistry`], and returns an [`ExecutionResult`] describing the path
//! it took.
//!
//! [`ExecutionResult`]: instaflow_core::types::ExecutionResult

pub mod actions;
pub mod condition;
pub mod executor;
pub mod router;
pub mod template;
pub mod validate;
pub mod variables;

pub use actions::{ActionContext, ActionHandler, ActionOutput, ActionRegistry, FlowEffect};
pub use condition::{evaluate_condition, evaluate_conditions};
pub use executor::{find_trigger, next_node, ExecutionContext, FlowExecutor, NextStep};
pub use router::{classify, event_type, match_flows};
pub use template::substitute;
pub use validate::validate_flow;
pub use variables::extract;
