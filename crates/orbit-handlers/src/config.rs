use orbit_ci::DEFAULT_TRAVIS_API_BASE;
use orbit_github_issues::github_endpoints::DEFAULT_GITHUB_API_BASE;
use orbit_github_issues::issue_format::RecencyWindow;

pub const DEFAULT_IN_PROGRESS_LABEL: &str = "in-progress";
pub const DEFAULT_BUILD_CHANNEL: &str = "general";
pub const DEFAULT_ALERT_CHANNEL: &str = "alerts";
pub const DEFAULT_LOG_TAIL_LINES: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Identities, channels, and endpoints injected into every handler.
pub struct PlanBuilderConfig {
    pub github_api_base: String,
    pub travis_api_base: String,
    /// GitHub login that `me` and the personal views refer to.
    pub default_user: String,
    pub default_org: String,
    /// Where personal issue status messages live.
    pub status_channel: String,
    pub build_channel: String,
    pub alert_channel: String,
    pub in_progress_label: String,
    pub recency: RecencyWindow,
    pub log_tail_lines: usize,
}

impl PlanBuilderConfig {
    pub fn new(default_user: &str, default_org: &str) -> Self {
        let default_user = default_user.trim().to_string();
        Self {
            github_api_base: DEFAULT_GITHUB_API_BASE.to_string(),
            travis_api_base: DEFAULT_TRAVIS_API_BASE.to_string(),
            status_channel: format!("{default_user}-status"),
            default_user,
            default_org: default_org.trim().to_string(),
            build_channel: DEFAULT_BUILD_CHANNEL.to_string(),
            alert_channel: DEFAULT_ALERT_CHANNEL.to_string(),
            in_progress_label: DEFAULT_IN_PROGRESS_LABEL.to_string(),
            recency: RecencyWindow::default(),
            log_tail_lines: DEFAULT_LOG_TAIL_LINES,
        }
    }
}
