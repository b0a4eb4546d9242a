//! Adapters between the flow engine and the outside world.

pub mod dry_run;
pub mod http;
pub mod instagram;
pub mod webhook;

pub use dry_run::DryRunProvider;
pub use http::ReqwestHttpClient;
pub use instagram::InstagramClient;
pub use webhook::flatten_webhook;
