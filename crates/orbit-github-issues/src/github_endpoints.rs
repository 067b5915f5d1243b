//! Request builders for the GitHub issue, label, comment, and search endpoints.

use orbit_plan::{CredentialRef, HttpMethod, Instruction, TargetSystem};
use serde_json::{json, Value};

use crate::search_query::IssueSearchQuery;

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubEndpoints {
    api_base: String,
}

impl Default for GithubEndpoints {
    fn default() -> Self {
        Self::new(DEFAULT_GITHUB_API_BASE)
    }
}

impl GithubEndpoints {
    pub fn new(api_base: &str) -> Self {
        Self {
            api_base: api_base.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn issue_url(&self, owner: &str, repo: &str, number: u64) -> String {
        format!("{}/repos/{owner}/{repo}/issues/{number}", self.api_base)
    }

    fn request(method: HttpMethod, url: String, body: Option<Value>) -> Instruction {
        let mut instruction = Instruction::new(TargetSystem::IssueTracker, method, url)
            .with_header("Content-Type", "application/json")
            .with_credential(CredentialRef::github_user_token());
        if let Some(body) = body {
            instruction = instruction.with_body(body);
        }
        instruction
    }

    pub fn search_issues(&self, query: &IssueSearchQuery) -> Instruction {
        Self::request(HttpMethod::Get, query.api_url(&self.api_base), None)
    }

    pub fn get_issue(&self, owner: &str, repo: &str, number: u64) -> Instruction {
        Self::request(HttpMethod::Get, self.issue_url(owner, repo, number), None)
    }

    pub fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
        assignees: &[String],
        labels: &[String],
    ) -> Instruction {
        Self::request(
            HttpMethod::Post,
            format!("{}/repos/{owner}/{repo}/issues", self.api_base),
            Some(json!({
                "title": title,
                "body": body,
                "assignees": assignees,
                "labels": labels,
            })),
        )
    }

    /// Close by the issue's API url, as carried between steps.
    pub fn close_issue_at(&self, issue_api_url: &str) -> Instruction {
        Self::request(
            HttpMethod::Patch,
            issue_api_url.trim_end_matches('/').to_string(),
            Some(json!({ "state": "closed" })),
        )
    }

    pub fn close_issue(&self, owner: &str, repo: &str, number: u64) -> Instruction {
        self.close_issue_at(&self.issue_url(owner, repo, number))
    }

    pub fn comment_at(&self, issue_api_url: &str, comment: &str) -> Instruction {
        Self::request(
            HttpMethod::Post,
            format!("{}/comments", issue_api_url.trim_end_matches('/')),
            Some(json!({ "body": comment })),
        )
    }

    pub fn add_label(&self, owner: &str, repo: &str, number: u64, label: &str) -> Instruction {
        Self::request(
            HttpMethod::Post,
            format!("{}/labels", self.issue_url(owner, repo, number)),
            Some(json!([label])),
        )
    }

    pub fn remove_label_at(&self, issue_api_url: &str, label: &str) -> Instruction {
        Self::request(
            HttpMethod::Delete,
            format!("{}/labels/{label}", issue_api_url.trim_end_matches('/')),
            None,
        )
    }

    pub fn remove_label(&self, owner: &str, repo: &str, number: u64, label: &str) -> Instruction {
        self.remove_label_at(&self.issue_url(owner, repo, number), label)
    }
}
