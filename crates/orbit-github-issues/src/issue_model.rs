use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::issue_filter::issue_matches_label;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// Public struct `GithubUser` used across Orbit components.
pub struct GithubUser {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GithubIssueLabel {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Issue or pull request as GitHub returns it from `issues` and `search/issues`.
pub struct GithubIssue {
    pub id: u64,
    pub number: u64,
    pub url: String,
    pub html_url: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub user: Option<GithubUser>,
    #[serde(default)]
    pub labels: Vec<GithubIssueLabel>,
    #[serde(default)]
    pub assignees: Vec<GithubUser>,
    #[serde(default)]
    pub assignee: Option<GithubUser>,
    #[serde(default)]
    pub pull_request: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubSearchResult {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<GithubIssue>,
}

/// Display projection of one issue; built inside a continuation, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteIssue {
    pub id: u64,
    pub number: u64,
    pub url: String,
    pub html_url: String,
    pub title: String,
    pub body: String,
    pub state: String,
    pub author: Option<String>,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub closed_at: Option<String>,
}

impl From<GithubIssue> for RemoteIssue {
    fn from(issue: GithubIssue) -> Self {
        let mut assignees = Vec::new();
        // `assignees` wins when populated; older payloads only carry `assignee`.
        let candidates = if issue.assignees.is_empty() {
            issue.assignee.into_iter().collect::<Vec<_>>()
        } else {
            issue.assignees
        };
        for login in candidates.into_iter().map(|user| user.login) {
            if !assignees.contains(&login) {
                assignees.push(login);
            }
        }
        let mut labels = Vec::new();
        for name in issue.labels.into_iter().map(|label| label.name) {
            if !labels.contains(&name) {
                labels.push(name);
            }
        }
        Self {
            id: issue.id,
            number: issue.number,
            url: issue.url,
            html_url: issue.html_url,
            title: issue.title,
            body: issue.body.unwrap_or_default(),
            state: issue.state,
            author: issue.user.map(|user| user.login),
            labels,
            assignees,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            closed_at: issue.closed_at,
        }
    }
}

impl RemoteIssue {
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<GithubIssue>(body).map(Self::from)
    }

    pub fn is_closed(&self) -> bool {
        self.state.eq_ignore_ascii_case("closed")
    }

    pub fn is_pull_request(&self) -> bool {
        !self.html_url.contains("/issues/")
    }

    pub fn has_label(&self, label: &str) -> bool {
        issue_matches_label(self.labels.iter().map(String::as_str), label)
    }

    pub fn is_assigned_to(&self, login: &str) -> bool {
        self.assignees
            .iter()
            .any(|assignee| assignee.eq_ignore_ascii_case(login))
    }

    /// `(owner, repo)` from the API url `.../repos/{owner}/{repo}/issues/{n}`.
    pub fn repo_slug(&self) -> Option<(String, String)> {
        let rest = self.url.split("/repos/").nth(1)?;
        let mut parts = rest.split('/');
        let owner = parts.next().filter(|value| !value.is_empty())?;
        let repo = parts.next().filter(|value| !value.is_empty())?;
        Some((owner.to_string(), repo.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSearchPage {
    pub total_count: u64,
    pub items: Vec<RemoteIssue>,
}

impl IssueSearchPage {
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        let result: GithubSearchResult = serde_json::from_str(body)?;
        Ok(Self {
            total_count: result.total_count,
            items: result.items.into_iter().map(RemoteIssue::from).collect(),
        })
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::test_fixtures::issue_json;
    use super::{IssueSearchPage, RemoteIssue};

    #[test]
    fn unit_remote_issue_extracts_repo_slug_and_type() {
        let issue = RemoteIssue::parse(&issue_json(7, "open", &[], &[]).to_string()).expect("issue");
        assert_eq!(
            issue.repo_slug(),
            Some(("sol".to_string(), "workflow".to_string()))
        );
        assert!(!issue.is_pull_request());
        assert!(!issue.is_closed());
    }

    #[test]
    fn functional_remote_issue_falls_back_to_single_assignee_and_dedupes() {
        let mut payload = issue_json(8, "closed", &["bug", "bug", "in-progress"], &[]);
        payload["assignee"] = json!({"login": "jess"});
        let issue = RemoteIssue::parse(&payload.to_string()).expect("issue");
        assert_eq!(issue.assignees, vec!["jess".to_string()]);
        assert_eq!(issue.labels, vec!["bug".to_string(), "in-progress".to_string()]);
        assert!(issue.is_closed());
        assert!(issue.has_label("In-Progress"));
        assert!(issue.is_assigned_to("Jess"));
    }

    #[test]
    fn integration_search_page_parses_items_in_order() {
        let body = json!({
            "total_count": 2,
            "items": [issue_json(1, "open", &[], &["jess"]), issue_json(2, "open", &[], &[])],
        });
        let page = IssueSearchPage::parse(&body.to_string()).expect("page");
        assert_eq!(page.total_count, 2);
        assert_eq!(
            page.items.iter().map(|item| item.number).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn regression_repo_slug_is_none_for_unexpected_urls() {
        let mut payload = issue_json(3, "open", &[], &[]);
        payload["url"] = json!("https://example.com/elsewhere");
        let issue = RemoteIssue::parse(&payload.to_string()).expect("issue");
        assert_eq!(issue.repo_slug(), None);
    }
}
