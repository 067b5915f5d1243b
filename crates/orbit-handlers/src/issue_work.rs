//! Work-status commands: start, complete, close, and label toggles.
//!
//! These double as button targets. When a click carries a correlation id the
//! originating message is redrawn after the change lands.

use chrono::{DateTime, Utc};
use orbit_github_issues::identity::resolve_github_login;
use orbit_plan::{
    CorrelationId, Instruction, InvocationContext, Message, Params, Plan, PlanError, Resumption,
    Step, StepOutcome,
};

use crate::builder::{ChatopsPlanBuilder, IssueTarget};
use crate::issue_search::refresh_in_progress_step;
use crate::names;
use crate::personal_issue::refresh_personal_issue_step;

pub(crate) fn start_work(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    context: &InvocationContext,
) -> Result<Plan, PlanError> {
    let target = IssueTarget::resolve(params, Some(context))?;
    let user = context.user.as_deref().unwrap_or("you");
    let login = match resolve_github_login(context.github_logins.as_deref()) {
        Ok(login) => login,
        Err(sadness) => {
            return Ok(Plan::of_message(Message::respond(format!(
                "Unable to determine github login for <@{user}>: {sadness}"
            ))));
        }
    };
    let label = &builder.config().in_progress_label;
    let step = Step::new(
        builder
            .github()
            .add_label(&target.owner, &target.repo, target.number, label),
    )
    .on_success_message(Message::respond(format!("Added {label} label")))
    .report_errors("The add-label request to GitHub failed");
    Ok(Plan::of_message(Message::respond(format!(
        "Starting work by <@{user}> (github login {login}) on {}#{}",
        target.repo, target.number
    )))
    .with_step(step))
}

/// Remove the in-progress label, then close. A failed unlabel stops the close.
pub(crate) fn complete_work(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    context: &InvocationContext,
) -> Result<Plan, PlanError> {
    let target = IssueTarget::resolve(params, Some(context))?;
    let label = &builder.config().in_progress_label;
    let unlabel = Step::new(
        builder
            .github()
            .remove_label(&target.owner, &target.repo, target.number, label),
    )
    .on_success_message(Message::respond(format!("Removed {label} label")))
    .report_errors("The remove-label request to GitHub failed");
    Ok(Plan::of_message(Message::respond(format!(
        "Stopping work on {}#{}",
        target.repo, target.number
    )))
    .with_step(unlabel)
    .with_step(close_step(builder, &target, params)))
}

pub(crate) fn close_issue(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    context: &InvocationContext,
) -> Result<Plan, PlanError> {
    let target = IssueTarget::resolve(params, Some(context))?;
    Ok(Plan::empty().with_step(close_step(builder, &target, params)))
}

fn close_step(builder: &ChatopsPlanBuilder, target: &IssueTarget, params: &Params) -> Step {
    Step::new(
        builder
            .github()
            .close_issue(&target.owner, &target.repo, target.number),
    )
    .on_success(Resumption::new(
        names::ISSUE_CLOSED,
        carry_refresh(params, target.to_params()),
    ))
    .report_errors("The close request to GitHub failed")
}

pub(crate) fn issue_closed(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    _outcome: &StepOutcome,
    _now: DateTime<Utc>,
) -> Result<Plan, PlanError> {
    let number = params.require_number("issue")?;
    let plan = Plan::of_message(Message::respond(format!("#{number} Closed.")));
    let Some(correlation) = CorrelationId::from_params(params) else {
        return Ok(plan);
    };
    let channel = params.text_or("channel", &builder.config().status_channel);
    Ok(plan.with_step(refresh_in_progress_step(builder, &correlation, &channel)))
}

pub(crate) fn add_label(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    context: &InvocationContext,
) -> Result<Plan, PlanError> {
    let target = IssueTarget::resolve(params, Some(context))?;
    let label = params.require_text("label")?;
    let instruction = builder
        .github()
        .add_label(&target.owner, &target.repo, target.number, &label);
    Ok(Plan::empty().with_step(label_step(
        instruction,
        &target,
        &label,
        "Added",
        "The add-label request to GitHub failed",
        params,
    )))
}

pub(crate) fn remove_label(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    context: &InvocationContext,
) -> Result<Plan, PlanError> {
    let target = IssueTarget::resolve(params, Some(context))?;
    let label = params.require_text("label")?;
    let instruction = builder
        .github()
        .remove_label(&target.owner, &target.repo, target.number, &label);
    Ok(Plan::empty().with_step(label_step(
        instruction,
        &target,
        &label,
        "Removed",
        "The remove-label request to GitHub failed",
        params,
    )))
}

fn label_step(
    instruction: Instruction,
    target: &IssueTarget,
    label: &str,
    verb: &str,
    error_prefix: &str,
    params: &Params,
) -> Step {
    let step = Step::new(instruction).report_errors(error_prefix);
    if CorrelationId::from_params(params).is_none() {
        return step.on_success_message(Message::respond(format!("{verb} {label} label")));
    }
    step.on_success(Resumption::new(
        names::LABEL_CHANGED,
        carry_refresh(params, target.to_params())
            .with("label", label)
            .with("verb", verb),
    ))
}

pub(crate) fn label_changed(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    _outcome: &StepOutcome,
    _now: DateTime<Utc>,
) -> Result<Plan, PlanError> {
    let target = IssueTarget::resolve(params, None)?;
    let label = params.require_text("label")?;
    let verb = params.text_or("verb", "Updated");
    let plan = Plan::of_message(Message::respond(format!("{verb} {label} label")));
    let Some(correlation) = CorrelationId::from_params(params) else {
        return Ok(plan);
    };
    let channel = params.text_or("channel", &builder.config().status_channel);
    Ok(plan.with_step(refresh_personal_issue_step(
        builder,
        &target,
        &correlation,
        &channel,
    )))
}

pub(crate) fn what_should_i_do(
    _builder: &ChatopsPlanBuilder,
    _params: &Params,
    context: &InvocationContext,
) -> Result<Plan, PlanError> {
    let text = match context.user.as_deref().map(str::trim) {
        Some(user) if !user.is_empty() => format!("Go to the beach, <@{user}>."),
        _ => "Go to the beach.".to_string(),
    };
    Ok(Plan::of_message(Message::respond(text)))
}

/// Keeps the correlation id and channel of a clicked message for the redraw.
fn carry_refresh(params: &Params, base: Params) -> Params {
    let base = match params.text("channel") {
        Some(channel) => base.with("channel", channel),
        None => base,
    };
    match CorrelationId::from_params(params) {
        Some(correlation) => correlation.thread_into(base),
        None => base,
    }
}
