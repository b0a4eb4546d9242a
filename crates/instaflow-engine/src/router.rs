//! Event-to-flow matching.

use serde_json::Value;

use instaflow_core::types::{Flow, TriggerEvent, TriggerType};

/// Derive the trigger type from a flattened payload's identifying keys.
pub fn event_type(data: &Value) -> Option<TriggerType> {
    let has = |key: &str| data.get(key).is_some_and(|v| !v.is_null());

    if has("comment_id") {
        Some(TriggerType::CommentReceived)
    } else if has("mention_id") {
        Some(TriggerType::MentionReceived)
    } else if has("reply_id") {
        Some(TriggerType::StoryReplyReceived)
    } else if has("message_id") {
        Some(TriggerType::DmReceived)
    } else {
        None
    }
}

/// Build a routable event from a flattened payload, if its shape is known.
pub fn classify(account_id: Option<String>, data: Value) -> Option<TriggerEvent> {
    let event_type = event_type(&data)?;
    Some(TriggerEvent {
        event_type,
        account_id,
        data,
    })
}

/// Active flows whose trigger listens for this event, scoped to its account.
///
/// A flow without an account id, or an event without one, is not filtered
/// by account.
pub fn match_flows<'a>(flows: &'a [Flow], event: &TriggerEvent) -> Vec<&'a Flow> {
    flows
        .iter()
        .filter(|f| f.is_active)
        .filter(|f| match (&f.account_id, &event.account_id) {
            (Some(flow_account), Some(event_account)) => flow_account == event_account,
            _ => true,
        })
        .filter(|f| f.trigger_type() == Some(event.event_type))
        .collect()
}
