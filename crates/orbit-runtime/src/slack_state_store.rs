//! Correlation id to posted Slack message, kept in a JSON state file so a later
//! `orbit` run can update the same message in place.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use orbit_core::write_text_atomic;
use orbit_plan::CorrelationId;
use serde::{Deserialize, Serialize};

pub const SLACK_STATE_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_SLACK_MESSAGE_CAP: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackPostedMessage {
    pub channel: String,
    pub ts: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlackMessageEntry {
    correlation_id: CorrelationId,
    #[serde(flatten)]
    message: SlackPostedMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlackMessageState {
    schema_version: u32,
    /// Oldest first.
    #[serde(default)]
    messages: Vec<SlackMessageEntry>,
}

impl Default for SlackMessageState {
    fn default() -> Self {
        Self {
            schema_version: SLACK_STATE_SCHEMA_VERSION,
            messages: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct SlackMessageIndex {
    path: Option<PathBuf>,
    cap: usize,
    state: SlackMessageState,
    by_correlation: HashMap<CorrelationId, SlackPostedMessage>,
}

impl SlackMessageIndex {
    pub fn in_memory(cap: usize) -> Self {
        Self {
            path: None,
            cap: cap.max(1),
            state: SlackMessageState::default(),
            by_correlation: HashMap::new(),
        }
    }

    pub fn load(path: PathBuf, cap: usize) -> Result<Self> {
        let mut state = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read state file {}", path.display()))?;
            serde_json::from_str::<SlackMessageState>(&raw).with_context(|| {
                format!("failed to parse slack message state file {}", path.display())
            })?
        } else {
            SlackMessageState::default()
        };

        if state.schema_version != SLACK_STATE_SCHEMA_VERSION {
            bail!(
                "unsupported slack message state schema: expected {}, found {}",
                SLACK_STATE_SCHEMA_VERSION,
                state.schema_version
            );
        }

        let cap = cap.max(1);
        if state.messages.len() > cap {
            let keep_from = state.messages.len() - cap;
            state.messages = state.messages.split_off(keep_from);
        }
        let by_correlation = state
            .messages
            .iter()
            .map(|entry| (entry.correlation_id.clone(), entry.message.clone()))
            .collect();
        Ok(Self {
            path: Some(path),
            cap,
            state,
            by_correlation,
        })
    }

    pub fn get(&self, correlation_id: &CorrelationId) -> Option<&SlackPostedMessage> {
        self.by_correlation.get(correlation_id)
    }

    pub fn len(&self) -> usize {
        self.state.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.messages.is_empty()
    }

    /// Returns false when the entry was already current.
    pub fn remember(&mut self, correlation_id: CorrelationId, message: SlackPostedMessage) -> bool {
        if self.by_correlation.get(&correlation_id) == Some(&message) {
            return false;
        }
        self.state
            .messages
            .retain(|entry| entry.correlation_id != correlation_id);
        self.state.messages.push(SlackMessageEntry {
            correlation_id: correlation_id.clone(),
            message: message.clone(),
        });
        self.by_correlation.insert(correlation_id, message);
        while self.state.messages.len() > self.cap {
            let evicted = self.state.messages.remove(0);
            self.by_correlation.remove(&evicted.correlation_id);
        }
        true
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut payload =
            serde_json::to_string_pretty(&self.state).context("failed to serialize state")?;
        payload.push('\n');
        write_text_atomic(path, &payload)
            .with_context(|| format!("failed to write state file {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use orbit_plan::CorrelationId;
    use tempfile::tempdir;

    use super::{SlackMessageIndex, SlackPostedMessage};

    fn posted(ts: &str) -> SlackPostedMessage {
        SlackPostedMessage {
            channel: "C9".to_string(),
            ts: ts.to_string(),
        }
    }

    #[test]
    fn functional_index_survives_reload() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("slack-messages.json");
        let board = CorrelationId::new("jess-issue/sol/workflow/3");

        let mut index = SlackMessageIndex::load(path.clone(), 8).expect("load");
        assert!(index.remember(board.clone(), posted("1700.1")));
        assert!(!index.remember(board.clone(), posted("1700.1")));
        index.save().expect("save");

        let reloaded = SlackMessageIndex::load(path, 8).expect("reload");
        assert_eq!(reloaded.get(&board), Some(&posted("1700.1")));
    }

    #[test]
    fn regression_cap_evicts_least_recently_remembered() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("slack-messages.json");
        let mut index = SlackMessageIndex::load(path.clone(), 2).expect("load");
        index.remember(CorrelationId::new("a"), posted("1"));
        index.remember(CorrelationId::new("b"), posted("2"));
        index.remember(CorrelationId::new("a"), posted("3"));
        index.remember(CorrelationId::new("c"), posted("4"));
        assert_eq!(index.len(), 2);
        assert!(index.get(&CorrelationId::new("b")).is_none());
        assert_eq!(index.get(&CorrelationId::new("a")), Some(&posted("3")));
        index.save().expect("save");

        let reloaded = SlackMessageIndex::load(path, 1).expect("reload");
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get(&CorrelationId::new("c")), Some(&posted("4")));
    }

    #[test]
    fn regression_unknown_schema_version_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("slack-messages.json");
        std::fs::write(&path, r#"{"schema_version": 99, "messages": []}"#).expect("write");
        let error = SlackMessageIndex::load(path, 8).expect_err("schema");
        assert!(error.to_string().contains("unsupported slack message state schema"));
    }

    #[test]
    fn unit_in_memory_index_never_touches_disk() {
        let mut index = SlackMessageIndex::in_memory(4);
        index.remember(CorrelationId::new("a"), posted("1"));
        index.save().expect("save");
        assert!(!index.is_empty());
    }
}
