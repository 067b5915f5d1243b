use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error_report, Instruction, Invocation, Message, Params, PlanError};

/// Named continuation plus the parameter bag it needs. No closures cross a step boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resumption {
    pub name: String,
    #[serde(default)]
    pub params: Params,
}

impl Resumption {
    pub fn new(name: impl Into<String>, params: Params) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn to_wire_value(&self) -> Result<String, PlanError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_wire_value(raw: &str) -> Result<Self, PlanError> {
        let resumption: Self = serde_json::from_str(raw)?;
        if resumption.name.trim().is_empty() {
            return Err(PlanError::missing("name"));
        }
        Ok(resumption)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Continuation {
    /// Emit a fixed message.
    Message(Message),
    /// Hand the outcome to the named plan-builder entry point.
    Resume(Resumption),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One external call with its success and error continuations.
pub struct Step {
    pub instruction: Instruction,
    pub on_success: Continuation,
    pub on_error: Continuation,
}

impl Step {
    /// Step whose success is reported as a plain reply and whose failure goes to
    /// the error reporter with a generic prefix.
    pub fn new(instruction: Instruction) -> Self {
        let on_success = Continuation::Message(Message::respond(format!(
            "Done: {}",
            instruction.describe()
        )));
        Self {
            instruction,
            on_success,
            on_error: Continuation::Resume(error_report::error_resumption(
                "The request failed",
                None,
            )),
        }
    }

    pub fn on_success_message(mut self, message: Message) -> Self {
        self.on_success = Continuation::Message(message);
        self
    }

    pub fn on_success(mut self, resumption: Resumption) -> Self {
        self.on_success = Continuation::Resume(resumption);
        self
    }

    /// Route failures to the error reporter with `prefix`, replying in place.
    pub fn report_errors(self, prefix: &str) -> Self {
        self.report_errors_to(None, prefix)
    }

    pub fn report_errors_to(mut self, channel: Option<&str>, prefix: &str) -> Self {
        self.on_error = Continuation::Resume(error_report::error_resumption(prefix, channel));
        self
    }

    /// Treat failure as expected and emit `message` instead of an error report.
    pub fn on_error_message(mut self, message: Message) -> Self {
        self.on_error = Continuation::Message(message);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
/// Result of performing one step, handed to its continuation.
pub enum StepOutcome {
    Success {
        status: u16,
        body: String,
    },
    Failure {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<String>,
    },
}

impl StepOutcome {
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Success { body, .. } => Some(body),
            Self::Failure { body, .. } => body.as_deref(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanItem {
    Message(Message),
    Step(Step),
}

/// Ordered messages and steps produced by one invocation or continuation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    items: Vec<PlanItem>,
}

impl Plan {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn of_message(message: Message) -> Self {
        Self::empty().with_message(message)
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.items.push(PlanItem::Message(message));
        self
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.items.push(PlanItem::Step(step));
        self
    }

    pub fn add_message(&mut self, message: Message) {
        self.items.push(PlanItem::Message(message));
    }

    pub fn add_step(&mut self, step: Step) {
        self.items.push(PlanItem::Step(step));
    }

    pub fn items(&self) -> &[PlanItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<PlanItem> {
        self.items
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.items.iter().filter_map(|item| match item {
            PlanItem::Message(message) => Some(message),
            PlanItem::Step(_) => None,
        })
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.items.iter().filter_map(|item| match item {
            PlanItem::Step(step) => Some(step),
            PlanItem::Message(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String, PlanError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Plan-builder contract consumed by the executor. Implementations must be pure
/// functions of their inputs.
pub trait PlanSource: Send + Sync {
    fn build_initial_plan(&self, invocation: &Invocation) -> Result<Plan, PlanError>;

    fn build_continuation_plan(
        &self,
        resumption: &Resumption,
        outcome: &StepOutcome,
        now: DateTime<Utc>,
    ) -> Result<Plan, PlanError>;
}
