/// Normalize issue label names for case-insensitive matching.
pub fn normalize_issue_label(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Return true when any of `labels` matches `wanted` after normalization.
pub fn issue_matches_label<'a>(labels: impl IntoIterator<Item = &'a str>, wanted: &str) -> bool {
    let wanted = normalize_issue_label(wanted);
    if wanted.is_empty() {
        return false;
    }
    labels
        .into_iter()
        .map(normalize_issue_label)
        .any(|label| label == wanted)
}

/// Split `org/repo` (or bare `repo`) falling back to `default_owner`.
pub fn parse_owner_repo(raw: &str, default_owner: &str) -> Option<(String, String)> {
    let raw = raw.trim().trim_matches('/');
    let (owner, repo) = match raw.split_once('/') {
        Some((owner, repo)) => (owner.trim(), repo.trim()),
        None => (default_owner.trim(), raw),
    };
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{issue_matches_label, normalize_issue_label, parse_owner_repo};

    #[test]
    fn unit_normalize_issue_label_trims_and_lowercases() {
        assert_eq!(normalize_issue_label("  In-Progress  "), "in-progress");
    }

    #[test]
    fn functional_issue_matches_label_is_case_insensitive() {
        assert!(issue_matches_label(["bug", "IN-PROGRESS"], "in-progress"));
        assert!(!issue_matches_label(["bug"], "in-progress"));
    }

    #[test]
    fn regression_issue_matches_label_never_matches_blank_label() {
        assert!(!issue_matches_label(["", " "], "  "));
    }

    #[test]
    fn integration_parse_owner_repo_defaults_owner_for_bare_repo() {
        assert_eq!(
            parse_owner_repo("workflow-rugs", "sol"),
            Some(("sol".to_string(), "workflow-rugs".to_string()))
        );
        assert_eq!(
            parse_owner_repo("other/repo", "sol"),
            Some(("other".to_string(), "repo".to_string()))
        );
        assert_eq!(parse_owner_repo("a/b/c", "sol"), None);
        assert_eq!(parse_owner_repo("", "sol"), None);
    }
}
