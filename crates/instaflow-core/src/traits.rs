use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::Button;

/// Instagram side-effect provider.
///
/// Each call returns the provider's response body, or an error carrying the
/// provider's error text.
pub trait ActionProvider: Send + Sync + 'static {
    /// Provider name (e.g., "instagram", "dry-run").
    fn name(&self) -> &str;

    fn reply_to_comment(&self, comment_id: &str, text: &str) -> BoxFuture<'_, Result<serde_json::Value>>;

    fn delete_comment(&self, comment_id: &str) -> BoxFuture<'_, Result<serde_json::Value>>;

    fn hide_comment(&self, comment_id: &str) -> BoxFuture<'_, Result<serde_json::Value>>;

    fn like_comment(&self, comment_id: &str) -> BoxFuture<'_, Result<serde_json::Value>>;

    fn send_direct_message(&self, recipient_id: &str, text: &str) -> BoxFuture<'_, Result<serde_json::Value>>;

    /// Send a DM with up to three buttons.
    fn send_button_template(
        &self,
        recipient_id: &str,
        title: &str,
        subtitle: Option<&str>,
        buttons: &[Button],
    ) -> BoxFuture<'_, Result<serde_json::Value>>;

    /// Reply privately (via DM) to the author of a comment.
    fn send_private_reply(&self, comment_id: &str, text: &str) -> BoxFuture<'_, Result<serde_json::Value>>;
}

/// Generic HTTP client used by the `api_call` action.
pub trait HttpClient: Send + Sync + 'static {
    /// Send `body` as JSON and return the response body (JSON when it parses,
    /// a string otherwise).
    fn request(
        &self,
        method: &str,
        url: &str,
        body: &serde_json::Value,
    ) -> BoxFuture<'_, Result<serde_json::Value>>;
}
