use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    // Graph errors
    #[error("No trigger node found in flow")]
    NoTriggerNode,

    #[error("Flow has {0} trigger nodes; expected exactly one")]
    MultipleTriggerNodes(usize),

    #[error("Node '{0}' not found in flow")]
    NodeNotFound(String),

    #[error("Flow exceeded max steps ({0})")]
    MaxStepsExceeded(usize),

    #[error("Invalid flow: {0}")]
    InvalidFlow(String),

    // Action errors
    #[error("{action}: missing required {field}")]
    MissingInput { action: String, field: String },

    #[error("{action}: invalid config: {message}")]
    InvalidConfig { action: String, message: String },

    #[error("Unknown action type: {0}")]
    UnknownAction(String),

    // External call errors
    #[error("Instagram API error ({operation}): {message}")]
    Provider { operation: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(String),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FlowError {
    /// Shorthand for a missing required action input.
    pub fn missing(action: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingInput {
            action: action.into(),
            field: field.into(),
        }
    }

    pub fn invalid_config(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            action: action.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
