use std::fmt;

use orbit_core::short_key_hash;
use serde::{Deserialize, Serialize};

use crate::Params;

/// Parameter-bag key under which a correlation id is threaded between steps.
pub const CORRELATION_PARAM: &str = "correlation_id";

/// Opaque token tying a sent chat message (or a multi-step plan) to later work.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Id of the personal status message kept for one issue.
    pub fn for_issue(user: &str, owner: &str, repo: &str, number: u64) -> Self {
        Self(format!("{user}-issue/{owner}/{repo}/{number}"))
    }

    /// Deterministic id from stable inputs, e.g. a view name plus its query.
    pub fn derive(scope: &str, parts: &[&str]) -> Self {
        Self(format!("{scope}/{}", short_key_hash(&parts.join("\u{1f}"))))
    }

    pub fn from_params(params: &Params) -> Option<Self> {
        params.text(CORRELATION_PARAM).map(Self)
    }

    pub fn thread_into(&self, params: Params) -> Params {
        params.with(CORRELATION_PARAM, self.0.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
