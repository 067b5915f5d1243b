//! GitHub issue search query construction (`search/issues?q=...`).

use std::sync::LazyLock;

use orbit_plan::PlanError;
use regex::Regex;

const ORG_REPO_PATTERN: &str = r"^[A-Za-z0-9_.-]+(/[A-Za-z0-9_.-]+)?$";
static ORG_REPO: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(ORG_REPO_PATTERN));
const USER_ALIAS_ME: &str = "me";

/// Space-joined `key:value` filters for the issue search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueSearchQuery {
    pub mentions: Option<String>,
    pub assignee: Option<String>,
    pub status: Option<String>,
    pub repo: Option<String>,
    pub org: Option<String>,
}

/// `me` stands for the configured default user.
pub fn expand_user_alias(raw: Option<&str>, me: &str) -> Option<String> {
    let value = raw.map(str::trim).filter(|value| !value.is_empty())?;
    if value.eq_ignore_ascii_case(USER_ALIAS_ME) {
        Some(me.to_string())
    } else {
        Some(value.to_string())
    }
}

pub fn validate_org_repo(raw: &str) -> Result<String, PlanError> {
    let pattern = ORG_REPO
        .as_ref()
        .map_err(|error| PlanError::Encoding(format!("invalid repo pattern: {error}")))?;
    let trimmed = raw.trim();
    if pattern.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(PlanError::InvalidParameter {
            name: "orgRepo".to_string(),
            value: raw.to_string(),
            reason: "expected org/repo or repo".to_string(),
        })
    }
}

impl IssueSearchQuery {
    pub fn filters(&self) -> Vec<String> {
        [
            ("mentions", &self.mentions),
            ("assignee", &self.assignee),
            ("is", &self.status),
            ("repo", &self.repo),
            ("org", &self.org),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(|value| format!("{key}:{value}"))
        })
        .collect()
    }

    /// True when nothing but a status filter is set, which would match all of GitHub.
    pub fn is_unbounded(&self) -> bool {
        let filters = self.filters();
        filters.iter().all(|filter| filter.starts_with("is:"))
    }

    /// Human-readable form, e.g. `assignee:jess is:open`.
    pub fn display(&self) -> String {
        self.filters().join(" ")
    }

    /// Form used in `github.com/issues?q=` links.
    pub fn web_query(&self) -> String {
        self.filters().join("+")
    }

    pub fn api_url(&self, api_base: &str) -> String {
        format!(
            "{}/search/issues?q={}",
            api_base.trim_end_matches('/'),
            self.filters().join("%20")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{expand_user_alias, validate_org_repo, IssueSearchQuery, ORG_REPO};

    #[test]
    fn unit_expand_user_alias_maps_me_and_blank() {
        assert_eq!(expand_user_alias(Some("me"), "jess").as_deref(), Some("jess"));
        assert_eq!(expand_user_alias(Some(" kim "), "jess").as_deref(), Some("kim"));
        assert_eq!(expand_user_alias(Some("  "), "jess"), None);
        assert_eq!(expand_user_alias(None, "jess"), None);
    }

    #[test]
    fn functional_filters_keep_fixed_order_and_skip_blanks() {
        let query = IssueSearchQuery {
            mentions: Some("jess".to_string()),
            assignee: Some(" ".to_string()),
            status: Some("open".to_string()),
            repo: Some("sol/workflow".to_string()),
            org: None,
        };
        assert_eq!(query.display(), "mentions:jess is:open repo:sol/workflow");
        assert_eq!(query.web_query(), "mentions:jess+is:open+repo:sol/workflow");
        assert_eq!(
            query.api_url("https://api.github.com/"),
            "https://api.github.com/search/issues?q=mentions:jess%20is:open%20repo:sol/workflow"
        );
        assert!(!query.is_unbounded());
    }

    #[test]
    fn regression_status_only_query_is_unbounded() {
        let query = IssueSearchQuery {
            status: Some("open".to_string()),
            ..IssueSearchQuery::default()
        };
        assert!(query.is_unbounded());
        assert!(IssueSearchQuery::default().is_unbounded());
    }

    #[test]
    fn integration_validate_org_repo_rejects_query_injection() {
        assert_eq!(validate_org_repo(" sol/workflow "), Ok("sol/workflow".to_string()));
        assert_eq!(validate_org_repo("workflow"), Ok("workflow".to_string()));
        assert!(validate_org_repo("sol/workflow is:closed").is_err());
        assert!(validate_org_repo("a/b/c").is_err());
    }

    #[test]
    fn regression_org_repo_pattern_is_shared_across_calls() {
        let first = ORG_REPO.as_ref().map(|pattern| pattern as *const _).ok();
        assert!(validate_org_repo("sol/workflow").is_ok());
        assert!(validate_org_repo("sol/workflow is:open").is_err());
        let second = ORG_REPO.as_ref().map(|pattern| pattern as *const _).ok();
        assert!(first.is_some());
        assert_eq!(first, second);
    }
}
