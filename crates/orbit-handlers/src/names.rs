//! Command and continuation names. Commands double as button targets.

pub const SEARCH_ISSUES: &str = "search issues";
pub const LIST_MY_ISSUES: &str = "list my issues";
pub const STUFF_IN_PROGRESS: &str = "que pasa";
pub const MOVE_ISSUE: &str = "move issue";
pub const START_WORK: &str = "start work";
pub const COMPLETE_WORK: &str = "complete work";
pub const CLOSE_ISSUE: &str = "close issue";
pub const ADD_LABEL: &str = "add label";
pub const REMOVE_LABEL: &str = "remove label";
pub const WHAT_SHOULD_I_DO: &str = "what should i do";

pub const RECEIVE_SEARCH_RESULTS: &str = "receive search results";
pub const RECEIVE_MY_ISSUES: &str = "receive my issues";
pub const RECEIVE_STUFF_IN_PROGRESS: &str = "receive stuff in progress";
pub const RECEIVE_ISSUE_TO_MOVE: &str = "receive issue to move";
pub const RECEIVE_MOVED_ISSUE: &str = "receive moved issue";
pub const RECEIVE_MOVE_COMMENT: &str = "receive move comment";
pub const RECEIVE_CLOSED_ORIGINAL: &str = "receive closed original";
pub const ISSUE_CLOSED: &str = "issue closed";
pub const LABEL_CHANGED: &str = "label changed";
pub const RENDER_PERSONAL_ISSUE: &str = "render personal issue";
pub const RECEIVE_BUILD_DETAILS: &str = "receive build details";
pub const RECEIVE_JOB_LOG: &str = "receive job log";

/// Lowercased, single-spaced form used as the dispatch key.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
