//! Variable extraction: flatten a trigger payload into the string context
//! consumed by conditions and action config.
//!
//! Payloads arrive pre-flattened, so a single payload may carry keys from
//! more than one event shape. Each shape's rule is applied independently, in
//! the order comment, DM, mention, story reply.

use serde_json::{Map, Value};

use instaflow_core::types::Variables;

/// Derive the variables map from a raw trigger payload.
///
/// Never fails; keys whose source field is absent are simply left unset.
pub fn extract(trigger_data: &Value) -> Variables {
    let mut vars = Variables::new();
    let Some(obj) = trigger_data.as_object() else {
        return vars;
    };
    let has = |key: &str| obj.get(key).is_some_and(|v| !v.is_null());

    if has("comment_id") || has("comment_text") {
        copy_fields(
            &mut vars,
            obj,
            &[
                ("comment_id", "comment_id"),
                ("comment_text", "comment_text"),
                ("message_text", "comment_text"),
                ("username", "from_username"),
                ("user_id", "from_id"),
                ("sender_id", "from_id"),
                ("media_id", "media_id"),
            ],
        );
    }

    if has("message_id") || has("message_text") {
        copy_fields(
            &mut vars,
            obj,
            &[
                ("message_id", "message_id"),
                ("message_text", "message_text"),
                ("sender_id", "sender_id"),
                ("user_id", "sender_id"),
                ("username", "sender_username"),
            ],
        );
    }

    if has("mention_id") || has("mention_text") {
        copy_fields(
            &mut vars,
            obj,
            &[
                ("mention_id", "mention_id"),
                ("mention_text", "mention_text"),
                ("message_text", "mention_text"),
                ("username", "from_username"),
                ("user_id", "from_id"),
                ("media_id", "media_id"),
            ],
        );
    }

    if has("reply_id") || has("reply_text") {
        copy_fields(
            &mut vars,
            obj,
            &[
                ("reply_id", "reply_id"),
                ("reply_text", "reply_text"),
                ("message_text", "reply_text"),
                ("username", "from_username"),
                ("user_id", "from_id"),
            ],
        );
    }

    vars
}

/// Copy `(to, from)` pairs whose source field is present.
fn copy_fields(vars: &mut Variables, obj: &Map<String, Value>, pairs: &[(&str, &str)]) {
    for (to, from) in pairs {
        if let Some(v) = obj.get(*from).and_then(scalar_to_string) {
            vars.set(*to, v);
        }
    }
}

/// String form of a payload value; `null` counts as absent.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
