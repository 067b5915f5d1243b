//! Moving an issue between repositories: fetch, recreate, comment, close.

use chrono::{DateTime, Utc};
use orbit_github_issues::issue_filter::parse_owner_repo;
use orbit_github_issues::issue_model::RemoteIssue;
use orbit_github_issues::search_query::validate_org_repo;
use orbit_plan::{InvocationContext, Message, Params, Plan, PlanError, Resumption, Step, StepOutcome};

use crate::builder::{response_body, ChatopsPlanBuilder, IssueTarget};
use crate::names;

pub(crate) fn move_issue(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    context: &InvocationContext,
) -> Result<Plan, PlanError> {
    let from = IssueTarget::resolve(params, Some(context))?;
    let raw_destination = params.require_text("toOrgRepo")?;
    let destination = validate_org_repo(&raw_destination)?;
    let (to_owner, to_repo) =
        parse_owner_repo(&destination, &from.owner).ok_or_else(|| PlanError::InvalidParameter {
            name: "toOrgRepo".to_string(),
            value: raw_destination.clone(),
            reason: "expected org/repo or repo".to_string(),
        })?;

    let step = Step::new(builder.github().get_issue(&from.owner, &from.repo, from.number))
        .on_success(Resumption::new(
            names::RECEIVE_ISSUE_TO_MOVE,
            Params::new()
                .with("toOrg", to_owner.as_str())
                .with("toRepo", to_repo.as_str()),
        ))
        .report_errors("The request to GitHub failed");
    Ok(Plan::of_message(Message::respond(format!(
        "Moving issue: {}/{}#{} to {to_owner}/{to_repo}",
        from.owner, from.repo, from.number
    )))
    .with_step(step))
}

pub(crate) fn receive_issue_to_move(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    outcome: &StepOutcome,
    _now: DateTime<Utc>,
) -> Result<Plan, PlanError> {
    let issue = parse_issue(outcome, "issue to move")?;
    if issue.is_closed() {
        return Ok(Plan::of_message(Message::respond(format!(
            "{} is already closed.",
            issue.html_url
        ))));
    }
    let to_owner = params.require_text("toOrg")?;
    let to_repo = params.require_text("toRepo")?;
    let label = &builder.config().in_progress_label;
    let body = format!("{}\n\nMoved from {}", issue.body, issue.html_url);

    let step = Step::new(builder.github().create_issue(
        &to_owner,
        &to_repo,
        &issue.title,
        &body,
        &issue.assignees,
        &issue.labels,
    ))
    .on_success(Resumption::new(
        names::RECEIVE_MOVED_ISSUE,
        Params::new()
            .with("fromUrl", issue.url.as_str())
            .with("hadInProgress", issue.has_label(label)),
    ))
    .report_errors("The new-issue post to GitHub failed");
    Ok(Plan::of_message(Message::respond(format!(
        "Creating issue in {to_owner}/{to_repo}"
    )))
    .with_step(step))
}

pub(crate) fn receive_moved_issue(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    outcome: &StepOutcome,
    _now: DateTime<Utc>,
) -> Result<Plan, PlanError> {
    let created = parse_issue(outcome, "created issue")?;
    let from_url = params.require_text("fromUrl")?;
    let step = Step::new(
        builder
            .github()
            .comment_at(&from_url, &format!("Moved to {}", created.html_url)),
    )
    .on_success(Resumption::new(
        names::RECEIVE_MOVE_COMMENT,
        carry_move(params, &from_url).with("toHtmlUrl", created.html_url.as_str()),
    ))
    .report_errors("The comment post to GitHub failed");
    Ok(Plan::of_message(Message::respond("Commenting on original issue")).with_step(step))
}

pub(crate) fn receive_move_comment(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    _outcome: &StepOutcome,
    _now: DateTime<Utc>,
) -> Result<Plan, PlanError> {
    let from_url = params.require_text("fromUrl")?;
    let to_html_url = params.require_text("toHtmlUrl")?;
    let step = Step::new(builder.github().close_issue_at(&from_url))
        .on_success(Resumption::new(
            names::RECEIVE_CLOSED_ORIGINAL,
            carry_move(params, &from_url).with("toHtmlUrl", to_html_url.as_str()),
        ))
        .report_errors("The close-issue patch to GitHub failed");
    Ok(Plan::of_message(Message::respond("Closing original issue")).with_step(step))
}

pub(crate) fn receive_closed_original(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    _outcome: &StepOutcome,
    _now: DateTime<Utc>,
) -> Result<Plan, PlanError> {
    let to_html_url = params.require_text("toHtmlUrl")?;
    let done = Message::respond(format!("Done! <{to_html_url}|New issue created>"));
    if !params.flag("hadInProgress") {
        return Ok(Plan::of_message(done));
    }
    let from_url = params.require_text("fromUrl")?;
    let label = &builder.config().in_progress_label;
    let step = Step::new(builder.github().remove_label_at(&from_url, label))
        .on_success_message(done)
        .report_errors("The remove-label request to GitHub failed");
    Ok(Plan::empty().with_step(step))
}

fn carry_move(params: &Params, from_url: &str) -> Params {
    Params::new()
        .with("fromUrl", from_url)
        .with("hadInProgress", params.flag("hadInProgress"))
}

fn parse_issue(outcome: &StepOutcome, context: &str) -> Result<RemoteIssue, PlanError> {
    RemoteIssue::parse(response_body(outcome, context)?)
        .map_err(|error| PlanError::malformed(context, error))
}
