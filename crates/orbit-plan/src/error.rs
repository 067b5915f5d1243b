use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Enumerates failures raised while building or decoding plans.
pub enum PlanError {
    #[error("missing required parameter '{name}'")]
    MissingParameter { name: String },
    #[error("invalid value '{value}' for parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
    #[error("action id '{0}' is already registered in this message")]
    DuplicateActionId(String),
    #[error("no handler registered for '{0}'")]
    UnknownHandler(String),
    #[error("unexpected response shape for {context}: {detail}")]
    MalformedResponse { context: String, detail: String },
    #[error("failed to encode or decode plan data: {0}")]
    Encoding(String),
}

impl PlanError {
    pub fn missing(name: &str) -> Self {
        Self::MissingParameter {
            name: name.to_string(),
        }
    }

    pub fn malformed(context: &str, detail: impl ToString) -> Self {
        Self::MalformedResponse {
            context: context.to_string(),
            detail: detail.to_string(),
        }
    }
}

impl From<serde_json::Error> for PlanError {
    fn from(error: serde_json::Error) -> Self {
        Self::Encoding(error.to_string())
    }
}
