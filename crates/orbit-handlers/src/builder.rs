use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use orbit_ci::{BuildEvent, TravisEndpoints};
use orbit_github_issues::github_endpoints::GithubEndpoints;
use orbit_github_issues::issue_model::RemoteIssue;
use orbit_plan::{
    report_from_bag, ActionRegistry, Invocation, InvocationContext, Message, Params, Plan,
    PlanError, PlanSource, Resumption, StepOutcome, ERROR_REPORTER,
};

use crate::config::PlanBuilderConfig;
use crate::names::{self, normalize_name};
use crate::{failed_build, issue_search, issue_work, move_issue, personal_issue};

pub(crate) type CommandHandler =
    fn(&ChatopsPlanBuilder, &Params, &InvocationContext) -> Result<Plan, PlanError>;
pub(crate) type ContinuationHandler =
    fn(&ChatopsPlanBuilder, &Params, &StepOutcome, DateTime<Utc>) -> Result<Plan, PlanError>;

/// Dispatches commands and continuations by name to the handler modules.
#[derive(Clone)]
pub struct ChatopsPlanBuilder {
    config: PlanBuilderConfig,
    github: GithubEndpoints,
    travis: TravisEndpoints,
    commands: BTreeMap<&'static str, CommandHandler>,
    continuations: BTreeMap<&'static str, ContinuationHandler>,
}

impl ChatopsPlanBuilder {
    pub fn new(config: PlanBuilderConfig) -> Self {
        let mut commands: BTreeMap<&'static str, CommandHandler> = BTreeMap::new();
        commands.insert(names::SEARCH_ISSUES, issue_search::search_issues);
        commands.insert(names::LIST_MY_ISSUES, issue_search::list_my_issues);
        commands.insert(names::STUFF_IN_PROGRESS, issue_search::stuff_in_progress);
        commands.insert(names::MOVE_ISSUE, move_issue::move_issue);
        commands.insert(names::START_WORK, issue_work::start_work);
        commands.insert(names::COMPLETE_WORK, issue_work::complete_work);
        commands.insert(names::CLOSE_ISSUE, issue_work::close_issue);
        commands.insert(names::ADD_LABEL, issue_work::add_label);
        commands.insert(names::REMOVE_LABEL, issue_work::remove_label);
        commands.insert(names::WHAT_SHOULD_I_DO, issue_work::what_should_i_do);

        let mut continuations: BTreeMap<&'static str, ContinuationHandler> = BTreeMap::new();
        continuations.insert(ERROR_REPORTER, report_error);
        continuations.insert(
            names::RECEIVE_SEARCH_RESULTS,
            issue_search::receive_search_results,
        );
        continuations.insert(names::RECEIVE_MY_ISSUES, issue_search::receive_my_issues);
        continuations.insert(
            names::RECEIVE_STUFF_IN_PROGRESS,
            issue_search::receive_stuff_in_progress,
        );
        continuations.insert(names::RECEIVE_ISSUE_TO_MOVE, move_issue::receive_issue_to_move);
        continuations.insert(names::RECEIVE_MOVED_ISSUE, move_issue::receive_moved_issue);
        continuations.insert(names::RECEIVE_MOVE_COMMENT, move_issue::receive_move_comment);
        continuations.insert(
            names::RECEIVE_CLOSED_ORIGINAL,
            move_issue::receive_closed_original,
        );
        continuations.insert(names::ISSUE_CLOSED, issue_work::issue_closed);
        continuations.insert(names::LABEL_CHANGED, issue_work::label_changed);
        continuations.insert(
            names::RENDER_PERSONAL_ISSUE,
            personal_issue::render_personal_issue,
        );
        continuations.insert(
            names::RECEIVE_BUILD_DETAILS,
            failed_build::receive_build_details,
        );
        continuations.insert(names::RECEIVE_JOB_LOG, failed_build::receive_job_log);
        Self {
            github: GithubEndpoints::new(&config.github_api_base),
            travis: TravisEndpoints::new(&config.travis_api_base),
            config,
            commands,
            continuations,
        }
    }

    pub fn config(&self) -> &PlanBuilderConfig {
        &self.config
    }

    pub fn github(&self) -> &GithubEndpoints {
        &self.github
    }

    pub fn travis(&self) -> &TravisEndpoints {
        &self.travis
    }

    pub fn command_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    pub fn knows_command(&self, name: &str) -> bool {
        self.commands.contains_key(normalize_name(name).as_str())
    }

    /// Personal status message for an issue assigned to the default user.
    pub fn build_issue_event_plan(
        &self,
        issue: &RemoteIssue,
        now: DateTime<Utc>,
    ) -> Result<Plan, PlanError> {
        let plan = personal_issue::issue_event(self, issue, now)?;
        checked(plan)
    }

    pub fn build_failed_build_plan(&self, event: &BuildEvent) -> Result<Plan, PlanError> {
        checked(failed_build::failed_build(self, event))
    }
}

impl fmt::Debug for ChatopsPlanBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatopsPlanBuilder")
            .field("config", &self.config)
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("continuations", &self.continuations.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PlanSource for ChatopsPlanBuilder {
    fn build_initial_plan(&self, invocation: &Invocation) -> Result<Plan, PlanError> {
        let name = normalize_name(&invocation.command);
        let Some(handler) = self.commands.get(name.as_str()) else {
            tracing::debug!(command = %invocation.command, "unknown command");
            return Ok(Plan::of_message(Message::respond(format!(
                "Sorry, I don't know the command `{}`. Try one of: {}.",
                invocation.command.trim(),
                self.command_names().collect::<Vec<_>>().join(", ")
            ))));
        };
        tracing::debug!(command = %name, params = invocation.params.len(), "building plan");
        checked(handler(self, &invocation.params, &invocation.context)?)
    }

    fn build_continuation_plan(
        &self,
        resumption: &Resumption,
        outcome: &StepOutcome,
        now: DateTime<Utc>,
    ) -> Result<Plan, PlanError> {
        let name = normalize_name(&resumption.name);
        let Some(handler) = self.continuations.get(name.as_str()) else {
            tracing::debug!(continuation = %resumption.name, "unknown continuation");
            return Ok(Plan::of_message(Message::respond(format!(
                "Sorry, I don't know how to continue `{}`.",
                resumption.name.trim()
            ))));
        };
        tracing::debug!(continuation = %name, success = outcome.is_success(), "building continuation");
        checked(handler(self, &resumption.params, outcome, now)?)
    }
}

fn report_error(
    _builder: &ChatopsPlanBuilder,
    params: &Params,
    outcome: &StepOutcome,
    _now: DateTime<Utc>,
) -> Result<Plan, PlanError> {
    Ok(Plan::of_message(report_from_bag(params, outcome)))
}

/// Every message must carry distinct action ids.
fn checked(plan: Plan) -> Result<Plan, PlanError> {
    for message in plan.messages() {
        ActionRegistry::from_message(message)?;
    }
    Ok(plan)
}

/// Response body a success continuation works from.
pub(crate) fn response_body<'a>(
    outcome: &'a StepOutcome,
    context: &str,
) -> Result<&'a str, PlanError> {
    match outcome {
        StepOutcome::Success { body, .. } => Ok(body),
        StepOutcome::Failure { error, .. } => Err(PlanError::malformed(context, error)),
    }
}

/// Repository coordinates plus issue number, from explicit params or the mapped context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IssueTarget {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl IssueTarget {
    pub fn resolve(params: &Params, context: Option<&InvocationContext>) -> Result<Self, PlanError> {
        let mapped = |key: &str, fallback: Option<&String>| {
            params
                .text(key)
                .or_else(|| {
                    fallback
                        .map(|value| value.trim().to_string())
                        .filter(|value| !value.is_empty())
                })
                .ok_or_else(|| PlanError::missing(key))
        };
        Ok(Self {
            owner: mapped("owner", context.and_then(|ctx| ctx.repo_owner.as_ref()))?,
            repo: mapped("repo", context.and_then(|ctx| ctx.repo.as_ref()))?,
            number: params.require_number("issue")?,
        })
    }

    pub fn to_params(&self) -> Params {
        Params::new()
            .with("owner", self.owner.as_str())
            .with("repo", self.repo.as_str())
            .with("issue", self.number)
    }
}
