use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Params, Resumption};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Values the chat platform maps onto every invocation, plus host-resolved inputs.
pub struct InvocationContext {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub repo_owner: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
    /// Result of the host's identity lookup for `user`; `None` when the lookup
    /// itself produced nothing.
    #[serde(default)]
    pub github_logins: Option<Vec<String>>,
    pub now: DateTime<Utc>,
}

impl InvocationContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            user: None,
            channel: None,
            repo_owner: None,
            repo: None,
            github_logins: None,
            now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub command: String,
    #[serde(default)]
    pub params: Params,
    pub context: InvocationContext,
}

impl Invocation {
    pub fn new(command: impl Into<String>, params: Params, context: InvocationContext) -> Self {
        Self {
            command: command.into(),
            params,
            context,
        }
    }

    /// A button click re-enters exactly like a fresh command.
    pub fn from_click(resumption: &Resumption, context: InvocationContext) -> Self {
        Self::new(
            resumption.name.clone(),
            resumption.params.clone(),
            context,
        )
    }
}
