//! Maps action ids embedded in chat buttons back to their resumptions.

use std::collections::BTreeMap;

use crate::{Action, Message, PlanError, Resumption};

/// Stable action id for an item, e.g. `close-sol-workflow-12`. Built from item
/// fields, never from list position.
pub fn action_id(verb: &str, owner: &str, repo: &str, number: u64) -> String {
    format!(
        "{}-{}-{}-{number}",
        verb.trim().to_ascii_lowercase().replace(' ', "-"),
        owner.trim(),
        repo.trim()
    )
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Resumption>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every action in `message`, rejecting colliding ids.
    pub fn from_message(message: &Message) -> Result<Self, PlanError> {
        let mut registry = Self::new();
        for action in message.all_actions() {
            registry.register(action)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, action: &Action) -> Result<(), PlanError> {
        if self.actions.contains_key(&action.id) {
            return Err(PlanError::DuplicateActionId(action.id.clone()));
        }
        self.actions
            .insert(action.id.clone(), action.resumption.clone());
        Ok(())
    }

    pub fn resolve(&self, action_id: &str) -> Option<&Resumption> {
        self.actions.get(action_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
