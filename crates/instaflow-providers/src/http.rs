use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use instaflow_core::config::HttpConfig;
use instaflow_core::error::{FlowError, Result};
use instaflow_core::traits::HttpClient;

/// reqwest-backed client for the `api_call` action.
pub struct ReqwestHttpClient {
    http: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| FlowError::Http(e.to_string()))?;
        Ok(Self { http })
    }
}

fn parse_method(method: &str) -> Result<Method> {
    method
        .to_uppercase()
        .parse::<Method>()
        .map_err(|e| FlowError::Http(format!("invalid method {method:?}: {e}")))
}

/// Response body as JSON, falling back to the raw text.
fn parse_body(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

impl HttpClient for ReqwestHttpClient {
    fn request(&self, method: &str, url: &str, body: &Value) -> BoxFuture<'_, Result<Value>> {
        let method = parse_method(method);
        let url = url.to_string();
        let body = body.clone();

        Box::pin(async move {
            let method = method?;
            debug!(%method, %url, "Outbound API call");

            let mut req = self.http.request(method.clone(), &url);
            if method != Method::GET && method != Method::HEAD {
                req = req.json(&body);
            }

            let resp = req.send().await.map_err(|e| FlowError::Http(e.to_string()))?;
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();

            if !status.is_success() {
                return Err(FlowError::Http(format!("{}: {}", status, text)));
            }

            Ok(parse_body(text))
        })
    }
}
