//! Continuation loop: delivers messages, performs steps, splices follow-up plans.
//!
//! Plans run depth-first on a stack of frames. A successful step pushes the
//! plan built from its `on_success` continuation; a failed step drops the rest
//! of its own frame and pushes the plan built from `on_error`. Frames below
//! keep running either way.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use orbit_plan::{
    report, Continuation, Invocation, Message, Plan, PlanItem, PlanSource, Resumption, Step,
    StepOutcome,
};
use serde::Serialize;

use crate::{ChatSink, CredentialResolver, HttpTransport};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub messages_delivered: usize,
    pub delivery_failures: usize,
    pub steps_succeeded: usize,
    pub steps_failed: usize,
}

#[derive(Clone)]
pub struct PlanExecutor {
    source: Arc<dyn PlanSource>,
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialResolver>,
    sink: Arc<dyn ChatSink>,
    clock: Clock,
}

impl PlanExecutor {
    pub fn new(
        source: Arc<dyn PlanSource>,
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialResolver>,
        sink: Arc<dyn ChatSink>,
    ) -> Self {
        Self {
            source,
            transport,
            credentials,
            sink,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Build the initial plan for `invocation` and run it to completion.
    pub async fn run_invocation(&self, invocation: &Invocation) -> ExecutionReport {
        tracing::info!(
            command = %invocation.command,
            user = invocation.context.user.as_deref().unwrap_or("-"),
            channel = invocation.context.channel.as_deref().unwrap_or("-"),
            "invocation started"
        );
        let plan = match self.source.build_initial_plan(invocation) {
            Ok(plan) => plan,
            Err(error) => {
                tracing::warn!(command = %invocation.command, error = %error, "plan build failed");
                Plan::of_message(report(
                    None,
                    &format!("Unable to run `{}`:", invocation.command),
                    &error.to_string(),
                    None,
                ))
            }
        };
        let report = self
            .run_plan(plan, invocation.context.channel.as_deref())
            .await;
        tracing::info!(
            command = %invocation.command,
            messages = report.messages_delivered,
            steps_succeeded = report.steps_succeeded,
            steps_failed = report.steps_failed,
            "invocation finished"
        );
        report
    }

    /// Run an already built plan. `respond_channel` receives `Respond` messages.
    pub async fn run_plan(&self, plan: Plan, respond_channel: Option<&str>) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let mut frames = vec![plan.into_items().into_iter()];
        while let Some(frame) = frames.last_mut() {
            let Some(item) = frame.next() else {
                frames.pop();
                continue;
            };
            match item {
                PlanItem::Message(message) => {
                    self.deliver(&message, respond_channel, &mut report).await;
                }
                PlanItem::Step(step) => {
                    let outcome = self.perform(&step).await;
                    let continuation = if outcome.is_success() {
                        report.steps_succeeded += 1;
                        &step.on_success
                    } else {
                        report.steps_failed += 1;
                        frames.pop();
                        &step.on_error
                    };
                    let next = self.resolve(continuation, &outcome);
                    if !next.is_empty() {
                        frames.push(next.into_items().into_iter());
                    }
                }
            }
        }
        report
    }

    async fn deliver(
        &self,
        message: &Message,
        respond_channel: Option<&str>,
        report: &mut ExecutionReport,
    ) {
        match self.sink.deliver(message, respond_channel).await {
            Ok(_) => report.messages_delivered += 1,
            Err(error) => {
                report.delivery_failures += 1;
                tracing::warn!(error = %error, text = message.text(), "chat delivery failed");
            }
        }
    }

    async fn perform(&self, step: &Step) -> StepOutcome {
        let instruction = &step.instruction;
        tracing::debug!(
            target_system = instruction.target.as_str(),
            request = %instruction.describe(),
            "performing step"
        );
        let secret = match &instruction.credential {
            Some(reference) => match self.credentials.resolve(reference) {
                Ok(secret) => Some(secret),
                Err(error) => {
                    tracing::warn!(error = %error, "step credential unavailable");
                    return StepOutcome::Failure {
                        status: None,
                        error: error.summary(),
                        body: None,
                    };
                }
            },
            None => None,
        };
        match self.transport.perform(instruction, secret.as_deref()).await {
            Ok(response) => StepOutcome::Success {
                status: response.status,
                body: response.body,
            },
            Err(error) => {
                tracing::warn!(error = %error, "step failed");
                StepOutcome::Failure {
                    status: error.status(),
                    error: error.summary(),
                    body: error.body().map(str::to_string),
                }
            }
        }
    }

    fn resolve(&self, continuation: &Continuation, outcome: &StepOutcome) -> Plan {
        match continuation {
            Continuation::Message(message) => Plan::of_message(message.clone()),
            Continuation::Resume(resumption) => self.resume(resumption, outcome),
        }
    }

    fn resume(&self, resumption: &Resumption, outcome: &StepOutcome) -> Plan {
        tracing::debug!(continuation = %resumption.name, "building continuation plan");
        match self
            .source
            .build_continuation_plan(resumption, outcome, (self.clock)())
        {
            Ok(plan) => plan,
            Err(error) => {
                tracing::warn!(continuation = %resumption.name, error = %error, "continuation build failed");
                let channel = resumption.params.text("channel");
                Plan::of_message(report(
                    channel.as_deref(),
                    &format!("Unable to continue `{}`:", resumption.name),
                    &error.to_string(),
                    None,
                ))
            }
        }
    }
}
