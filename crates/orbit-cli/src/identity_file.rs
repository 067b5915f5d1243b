//! Chat user id to GitHub login lookup, loaded from a TOML file:
//!
//! ```toml
//! [users]
//! U123 = ["jess"]
//! U456 = ["kim", "kim-work"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct IdentityDirectory {
    #[serde(default)]
    users: BTreeMap<String, Vec<String>>,
}

impl IdentityDirectory {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read identity file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse identity file {}", path.display()))
    }

    /// `None` when the user is unknown, so the handler can say so.
    pub(crate) fn logins_for(&self, user: Option<&str>) -> Option<Vec<String>> {
        let user = user.map(str::trim).filter(|user| !user.is_empty())?;
        self.users.get(user).map(|logins| {
            logins
                .iter()
                .map(|login| login.trim().to_string())
                .filter(|login| !login.is_empty())
                .collect()
        })
    }
}
