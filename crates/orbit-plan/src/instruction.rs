use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// External system a step talks to.
pub enum TargetSystem {
    IssueTracker,
    Ci,
}

impl TargetSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IssueTracker => "issue_tracker",
            Self::Ci => "ci",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// Placeholder for a secret the host resolves at dispatch time; plans never hold tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialRef(String);

impl CredentialRef {
    pub const GITHUB_USER_TOKEN: &'static str = "github://user_token?scopes=repo";

    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn github_user_token() -> Self {
        Self::new(Self::GITHUB_USER_TOKEN)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One outbound HTTP call described as data.
pub struct Instruction {
    pub target: TargetSystem,
    pub method: HttpMethod,
    pub url: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<CredentialRef>,
}

impl Instruction {
    pub fn new(target: TargetSystem, method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            target,
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            credential: None,
        }
    }

    pub fn get(target: TargetSystem, url: impl Into<String>) -> Self {
        Self::new(target, HttpMethod::Get, url)
    }

    pub fn post(target: TargetSystem, url: impl Into<String>, body: Value) -> Self {
        Self::new(target, HttpMethod::Post, url).with_body(body)
    }

    pub fn patch(target: TargetSystem, url: impl Into<String>, body: Value) -> Self {
        Self::new(target, HttpMethod::Patch, url).with_body(body)
    }

    pub fn delete(target: TargetSystem, url: impl Into<String>) -> Self {
        Self::new(target, HttpMethod::Delete, url)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_credential(mut self, credential: CredentialRef) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Short `METHOD url` label used in logs and error prefixes.
    pub fn describe(&self) -> String {
        format!("{} {}", self.method.as_str(), self.url)
    }
}
