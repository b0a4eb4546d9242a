//! Instagram webhook ingestion.
//!
//! A webhook delivery batches `entry[]` objects, one per account. Comment and
//! mention notifications arrive under `entry[].changes[]`; DMs and story
//! replies under `entry[].messaging[]`. Each notification is flattened into
//! the key set the variable extractor understands.

use serde_json::{json, Map, Value};
use tracing::debug;

use instaflow_core::types::TriggerEvent;
use instaflow_engine::router::classify;

/// Flatten a webhook body into routable trigger events.
///
/// Unknown fields, echoes of the account's own messages, and malformed
/// entries are skipped.
pub fn flatten_webhook(body: &Value) -> Vec<TriggerEvent> {
    let mut events = Vec::new();

    for entry in array(body, "entry") {
        let account_id = str_at(entry, &["id"]).map(str::to_string);

        for change in array(entry, "changes") {
            if let Some(data) = flatten_change(change) {
                push(&mut events, account_id.clone(), data);
            }
        }

        for messaging in array(entry, "messaging") {
            if let Some(data) = flatten_messaging(messaging) {
                push(&mut events, account_id.clone(), data);
            }
        }
    }

    events
}

fn push(events: &mut Vec<TriggerEvent>, account_id: Option<String>, data: Map<String, Value>) {
    match classify(account_id, Value::Object(data)) {
        Some(event) => events.push(event),
        None => debug!("Skipping webhook notification without an identifying id"),
    }
}

fn flatten_change(change: &Value) -> Option<Map<String, Value>> {
    let value = change.get("value")?;
    let mut data = Map::new();

    match change.get("field")?.as_str()? {
        "comments" => {
            put(&mut data, "comment_id", str_at(value, &["id"]));
            put(&mut data, "comment_text", str_at(value, &["text"]));
            put(&mut data, "from_id", str_at(value, &["from", "id"]));
            put(&mut data, "from_username", str_at(value, &["from", "username"]));
            put(&mut data, "media_id", str_at(value, &["media", "id"]));
        }
        "mentions" => {
            let id = str_at(value, &["comment_id"]).or_else(|| str_at(value, &["media_id"]));
            put(&mut data, "mention_id", id);
            put(&mut data, "mention_text", str_at(value, &["text"]));
            put(&mut data, "media_id", str_at(value, &["media_id"]));
            put(&mut data, "from_id", str_at(value, &["from", "id"]));
            put(&mut data, "from_username", str_at(value, &["from", "username"]));
        }
        field => {
            debug!(field, "Ignoring unsupported webhook field");
            return None;
        }
    }

    Some(data)
}

fn flatten_messaging(messaging: &Value) -> Option<Map<String, Value>> {
    let message = messaging.get("message")?;
    if message.get("is_echo").and_then(Value::as_bool).unwrap_or(false) {
        return None;
    }

    let mut data = Map::new();
    let sender = str_at(messaging, &["sender", "id"]);

    if let Some(story) = message.pointer("/reply_to/story") {
        put(&mut data, "reply_id", str_at(message, &["mid"]));
        put(&mut data, "reply_text", str_at(message, &["text"]));
        put(&mut data, "from_id", sender);
        put(&mut data, "story_id", str_at(story, &["id"]));
    } else {
        put(&mut data, "message_id", str_at(message, &["mid"]));
        put(&mut data, "message_text", str_at(message, &["text"]));
        put(&mut data, "sender_id", sender);
        put(&mut data, "recipient_id", str_at(messaging, &["recipient", "id"]));
    }

    Some(data)
}

fn array<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// String at a nested key path.
fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str()
}

fn put(data: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        data.insert(key.to_string(), json!(value));
    }
}
