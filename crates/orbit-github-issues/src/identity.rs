//! Chat user to GitHub login resolution.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Structured identity-resolution failure, reported to the user rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sadness {
    pub error: String,
}

impl Sadness {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl fmt::Display for Sadness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.error)
    }
}

/// Resolve the lookup result for one chat user to a single login.
///
/// `None` means the lookup itself returned nothing; an empty list means it
/// matched no GitHub identity. Several matches are fine as long as they agree.
pub fn resolve_github_login(matches: Option<&[String]>) -> Result<String, Sadness> {
    let Some(matches) = matches else {
        return Err(Sadness::new("null result"));
    };
    let logins = matches
        .iter()
        .map(|login| login.trim())
        .filter(|login| !login.is_empty())
        .collect::<Vec<_>>();
    let Some(first) = logins.first() else {
        return Err(Sadness::new("empty result"));
    };
    if logins.len() > 1 {
        tracing::warn!(count = logins.len(), "identity lookup returned several github logins");
    }
    if logins.iter().all(|login| login == first) {
        return Ok(first.to_string());
    }
    let mut distinct = Vec::new();
    for login in logins {
        if !distinct.contains(&login) {
            distinct.push(login);
        }
    }
    Err(Sadness::new(format!(
        "Multiple different github logins returned: {}",
        distinct.join(",")
    )))
}

#[cfg(test)]
mod tests {
    use super::{resolve_github_login, Sadness};

    fn logins(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn unit_resolve_github_login_accepts_single_match() {
        let matches = logins(&["jess"]);
        assert_eq!(resolve_github_login(Some(&matches)), Ok("jess".to_string()));
    }

    #[test]
    fn functional_resolve_github_login_accepts_agreeing_matches() {
        let matches = logins(&["jess", "jess", "jess"]);
        assert_eq!(resolve_github_login(Some(&matches)), Ok("jess".to_string()));
    }

    #[test]
    fn functional_resolve_github_login_lists_differing_matches() {
        let matches = logins(&["jess", "kim", "jess", "lee"]);
        assert_eq!(
            resolve_github_login(Some(&matches)),
            Err(Sadness {
                error: "Multiple different github logins returned: jess,kim,lee".to_string()
            })
        );
    }

    #[test]
    fn regression_resolve_github_login_distinguishes_null_and_empty() {
        assert_eq!(
            resolve_github_login(None),
            Err(Sadness {
                error: "null result".to_string()
            })
        );
        assert_eq!(
            resolve_github_login(Some(&[])),
            Err(Sadness {
                error: "empty result".to_string()
            })
        );
    }
}
