//! Chat rendering for issue lists: titles, relative ages, colors, label emoji.

use chrono::{DateTime, Datelike, Utc, Weekday};
use orbit_core::{parse_rfc3339_utc, seconds_between, sha256_hex};
use orbit_plan::Attachment;

use crate::issue_model::RemoteIssue;

pub const OPEN_COLOR: &str = "#3D9900";
pub const CLOSED_COLOR: &str = "#0066FF";
pub const RECENT_THUMB_URL: &str =
    "https://upload.wikimedia.org/wikipedia/commons/thumb/8/8c/Sol.svg/256px-Sol.svg.png";
pub const CLOSED_THUMB_URL: &str = "https://upload.wikimedia.org/wikipedia/commons/9/91/Checked_icon.png";

const MINUTE_SECONDS: f64 = 60.0;
const HOUR_SECONDS: f64 = 3_600.0;
const DAY_SECONDS: f64 = 86_400.0;
// Minutes until the age rounds to two hours, so 3700s reads `62m ago`.
const MINUTES_UNTIL_SECONDS: f64 = 1.5 * HOUR_SECONDS;
const LITERAL_DATE_AFTER_DAYS: f64 = 30.0;

/// How far back counts as "recent". Widens on one weekday so Monday still sees Friday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyWindow {
    pub base_seconds: u64,
    pub widen_on: Weekday,
    pub widen_factor: u64,
}

impl Default for RecencyWindow {
    fn default() -> Self {
        Self {
            base_seconds: 86_400,
            widen_on: Weekday::Mon,
            widen_factor: 3,
        }
    }
}

impl RecencyWindow {
    pub fn window_seconds(&self, now: DateTime<Utc>) -> u64 {
        if now.weekday() == self.widen_on {
            self.base_seconds.saturating_mul(self.widen_factor.max(1))
        } else {
            self.base_seconds
        }
    }

    pub fn is_recent(&self, timestamp: Option<&str>, now: DateTime<Utc>) -> bool {
        let Some(then) = timestamp.and_then(parse_rfc3339_utc) else {
            return false;
        };
        seconds_between(then, now) < self.window_seconds(now) as f64
    }
}

/// Relative age bucketed into s/m/h/d, or the literal date past 30 days.
pub fn time_since(timestamp: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(raw) = timestamp.map(str::trim).filter(|value| !value.is_empty()) else {
        return "never".to_string();
    };
    let Some(then) = parse_rfc3339_utc(raw) else {
        return literal_date(raw);
    };
    let seconds_past = seconds_between(then, now).max(0.0);
    if seconds_past < MINUTE_SECONDS {
        return format!("{}s ago", seconds_past.round());
    }
    if seconds_past < MINUTES_UNTIL_SECONDS {
        return format!("{}m ago", (seconds_past / MINUTE_SECONDS).round());
    }
    if seconds_past <= DAY_SECONDS {
        return format!("{}h ago", (seconds_past / HOUR_SECONDS).round());
    }
    if seconds_past <= DAY_SECONDS * LITERAL_DATE_AFTER_DAYS {
        return format!("{}d ago", (seconds_past / DAY_SECONDS).round());
    }
    literal_date(raw)
}

fn literal_date(raw: &str) -> String {
    raw.chars().take(10).collect()
}

/// Stable `#rrggbb` derived from the issue id.
pub fn item_color(id: u64) -> String {
    format!("#{}", &sha256_hex(&id.to_string())[..6])
}

pub fn to_emoji(name: &str) -> String {
    let normalized = name
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|ch| if ch == ':' || ch.is_whitespace() { '-' } else { ch })
        .collect::<String>();
    format!(":{normalized}:")
}

pub fn label_emojis(labels: &[String]) -> String {
    labels
        .iter()
        .filter(|label| !label.trim().is_empty())
        .map(|label| to_emoji(label))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn issue_kind(issue: &RemoteIssue) -> &'static str {
    if issue.is_pull_request() {
        "pr"
    } else {
        "issue"
    }
}

/// Repository name for display; falls back to the API url when it cannot be parsed.
pub fn issue_repo_name(issue: &RemoteIssue) -> String {
    issue
        .repo_slug()
        .map(|(_, repo)| repo)
        .unwrap_or_else(|| issue.url.clone())
}

pub fn issue_title(issue: &RemoteIssue) -> String {
    format!(
        "<{}|{} {} #{}: {}>",
        issue.html_url,
        issue_repo_name(issue),
        issue_kind(issue),
        issue.number,
        issue.title
    )
}

pub fn assignee_line(issue: &RemoteIssue) -> String {
    if issue.assignees.is_empty() {
        return "Unassigned".to_string();
    }
    let logins = issue
        .assignees
        .iter()
        .map(|login| to_emoji(login))
        .collect::<Vec<_>>()
        .join(" ");
    format!("assigned to {logins}")
}

fn with_labels(labels: &[String], rest: String) -> String {
    let emojis = label_emojis(labels);
    if emojis.is_empty() {
        rest
    } else {
        format!("{emojis} {rest}")
    }
}

/// Attachment used for cross-org search results.
pub fn search_result_attachment(
    issue: &RemoteIssue,
    now: DateTime<Utc>,
    window: &RecencyWindow,
) -> Attachment {
    let author = issue
        .author
        .as_deref()
        .map(|login| format!(" by {}", to_emoji(login)))
        .unwrap_or_default();
    Attachment {
        fallback: issue.html_url.clone(),
        title: issue_title(issue),
        text: with_labels(
            &issue.labels,
            format!(
                "created {}{author}, updated {}",
                time_since(issue.created_at.as_deref(), now),
                time_since(issue.updated_at.as_deref(), now)
            ),
        ),
        color: Some(item_color(issue.id)),
        author_name: Some(assignee_line(issue)),
        thumb_url: window
            .is_recent(issue.created_at.as_deref(), now)
            .then(|| RECENT_THUMB_URL.to_string()),
        actions: Vec::new(),
    }
}

/// Attachment used for the plain "my issues" listing, including close age.
pub fn assigned_issue_attachment(issue: &RemoteIssue, now: DateTime<Utc>) -> Attachment {
    Attachment {
        fallback: issue.html_url.clone(),
        title: issue_title(issue),
        text: with_labels(
            &issue.labels,
            format!(
                "created {}, updated {}, closed {}",
                time_since(issue.created_at.as_deref(), now),
                time_since(issue.updated_at.as_deref(), now),
                time_since(issue.closed_at.as_deref(), now)
            ),
        ),
        color: Some(item_color(issue.id)),
        ..Attachment::default()
    }
}

pub fn open_issue_attachment(
    issue: &RemoteIssue,
    now: DateTime<Utc>,
    window: &RecencyWindow,
) -> Attachment {
    Attachment {
        fallback: issue.html_url.clone(),
        title: issue_title(issue),
        text: with_labels(
            &issue.labels,
            format!(
                "created {}, updated {}",
                time_since(issue.created_at.as_deref(), now),
                time_since(issue.updated_at.as_deref(), now)
            ),
        ),
        color: Some(OPEN_COLOR.to_string()),
        author_name: None,
        thumb_url: window
            .is_recent(issue.created_at.as_deref(), now)
            .then(|| RECENT_THUMB_URL.to_string()),
        actions: Vec::new(),
    }
}

pub fn closed_issue_attachment(issue: &RemoteIssue, now: DateTime<Utc>) -> Attachment {
    Attachment {
        fallback: issue.html_url.clone(),
        title: issue_title(issue),
        text: with_labels(
            &issue.labels,
            format!(
                "created {}, closed {}",
                time_since(issue.created_at.as_deref(), now),
                time_since(issue.closed_at.as_deref(), now)
            ),
        ),
        color: Some(CLOSED_COLOR.to_string()),
        author_name: None,
        thumb_url: Some(CLOSED_THUMB_URL.to_string()),
        actions: Vec::new(),
    }
}
