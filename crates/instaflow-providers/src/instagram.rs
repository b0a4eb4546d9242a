use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use instaflow_core::config::InstagramConfig;
use instaflow_core::error::{FlowError, Result};
use instaflow_core::traits::ActionProvider;
use instaflow_core::types::Button;

/// Instagram Graph API client.
///
/// Comment moderation goes to `/{comment_id}` endpoints; messaging goes
/// through the account's `/messages` edge (`me` when no account id is
/// configured).
pub struct InstagramClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    account_id: Option<String>,
}

impl InstagramClient {
    pub fn new(config: &InstagramConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FlowError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: format!(
                "{}/{}",
                config.api_base.trim_end_matches('/'),
                config.api_version.trim_matches('/')
            ),
            access_token: config.access_token.clone(),
            account_id: config.account_id.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn messages_path(&self) -> String {
        format!("{}/messages", self.account_id.as_deref().unwrap_or("me"))
    }

    async fn call(&self, operation: &str, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = self.url(path);
        debug!(operation, %method, %url, "Instagram API request");

        let mut req = self.http.request(method, &url).bearer_auth(&self.access_token);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req.send().await.map_err(|e| FlowError::Provider {
            operation: operation.to_string(),
            message: e.to_string(),
        })?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = format!("HTTP {}: {}", status.as_u16(), error_text(&text));
            warn!(operation, status = status.as_u16(), "Instagram API call failed");
            return Err(FlowError::Provider {
                operation: operation.to_string(),
                message,
            });
        }

        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

/// The Graph API's `error.message`, or the raw body when it has none.
fn error_text(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

fn text_message(recipient: Value, text: &str) -> Value {
    json!({
        "recipient": recipient,
        "message": { "text": text },
    })
}

/// Button template payload. With a subtitle the generic template is used,
/// since the button template has no subtitle field.
fn button_message(recipient_id: &str, title: &str, subtitle: Option<&str>, buttons: &[Button]) -> Value {
    let payload = match subtitle {
        Some(subtitle) => json!({
            "template_type": "generic",
            "elements": [{
                "title": title,
                "subtitle": subtitle,
                "buttons": buttons,
            }],
        }),
        None => json!({
            "template_type": "button",
            "text": title,
            "buttons": buttons,
        }),
    };

    json!({
        "recipient": { "id": recipient_id },
        "message": {
            "attachment": {
                "type": "template",
                "payload": payload,
            }
        },
    })
}

impl ActionProvider for InstagramClient {
    fn name(&self) -> &str {
        "instagram"
    }

    fn reply_to_comment(&self, comment_id: &str, text: &str) -> BoxFuture<'_, Result<Value>> {
        let path = format!("{comment_id}/replies");
        let body = json!({ "message": text });
        Box::pin(async move { self.call("reply_to_comment", Method::POST, &path, Some(body)).await })
    }

    fn delete_comment(&self, comment_id: &str) -> BoxFuture<'_, Result<Value>> {
        let path = comment_id.to_string();
        Box::pin(async move { self.call("delete_comment", Method::DELETE, &path, None).await })
    }

    fn hide_comment(&self, comment_id: &str) -> BoxFuture<'_, Result<Value>> {
        let path = format!("{comment_id}?hide=true");
        Box::pin(async move { self.call("hide_comment", Method::POST, &path, None).await })
    }

    fn like_comment(&self, comment_id: &str) -> BoxFuture<'_, Result<Value>> {
        let path = format!("{comment_id}/likes");
        Box::pin(async move { self.call("like_comment", Method::POST, &path, None).await })
    }

    fn send_direct_message(&self, recipient_id: &str, text: &str) -> BoxFuture<'_, Result<Value>> {
        let body = text_message(json!({ "id": recipient_id }), text);
        Box::pin(async move {
            let path = self.messages_path();
            self.call("send_direct_message", Method::POST, &path, Some(body)).await
        })
    }

    fn send_button_template(
        &self,
        recipient_id: &str,
        title: &str,
        subtitle: Option<&str>,
        buttons: &[Button],
    ) -> BoxFuture<'_, Result<Value>> {
        let body = button_message(recipient_id, title, subtitle, buttons);
        Box::pin(async move {
            let path = self.messages_path();
            self.call("send_button_template", Method::POST, &path, Some(body)).await
        })
    }

    fn send_private_reply(&self, comment_id: &str, text: &str) -> BoxFuture<'_, Result<Value>> {
        let body = text_message(json!({ "comment_id": comment_id }), text);
        Box::pin(async move {
            let path = self.messages_path();
            self.call("send_private_reply", Method::POST, &path, Some(body)).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> InstagramConfig {
        InstagramConfig {
            access_token: "IGQV-test".into(),
            account_id: None,
            api_base: "https://graph.instagram.com/".into(),
            api_version: "v21.0".into(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_urls() {
        let client = InstagramClient::new(&config()).unwrap();
        assert_eq!(client.url("c1/replies"), "https://graph.instagram.com/v21.0/c1/replies");
        assert_eq!(client.messages_path(), "me/messages");

        let client = InstagramClient::new(&InstagramConfig {
            account_id: Some("1784".into()),
            ..config()
        })
        .unwrap();
        assert_eq!(client.messages_path(), "1784/messages");
    }

    #[test]
    fn test_error_text_prefers_graph_message() {
        let body = r#"{"error":{"message":"Invalid OAuth access token","code":190}}"#;
        assert_eq!(error_text(body), "Invalid OAuth access token");
        assert_eq!(error_text("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_private_reply_recipient() {
        let body = text_message(json!({ "comment_id": "c1" }), "check your DMs");
        assert_eq!(body["recipient"]["comment_id"], "c1");
        assert_eq!(body["message"]["text"], "check your DMs");
    }

    #[test]
    fn test_button_template_payloads() {
        let buttons = vec![
            Button::WebUrl {
                title: "Shop".into(),
                url: "https://shop.example".into(),
            },
            Button::Postback {
                title: "Talk to us".into(),
                payload: "HUMAN".into(),
            },
        ];

        let plain = button_message("s1", "Pick one", None, &buttons);
        let payload = &plain["message"]["attachment"]["payload"];
        assert_eq!(plain["recipient"]["id"], "s1");
        assert_eq!(payload["template_type"], "button");
        assert_eq!(payload["text"], "Pick one");
        assert_eq!(payload["buttons"][0]["type"], "web_url");
        assert_eq!(payload["buttons"][1]["payload"], "HUMAN");

        let generic = button_message("s1", "Pick one", Some("Fast replies"), &buttons);
        let element = &generic["message"]["attachment"]["payload"]["elements"][0];
        assert_eq!(generic["message"]["attachment"]["payload"]["template_type"], "generic");
        assert_eq!(element["subtitle"], "Fast replies");
        assert_eq!(element["buttons"].as_array().unwrap().len(), 2);
    }
}
