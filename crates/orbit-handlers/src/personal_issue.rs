//! Personal status message kept per issue assigned to the default user.

use chrono::{DateTime, Utc};
use orbit_github_issues::issue_format::{closed_issue_attachment, open_issue_attachment};
use orbit_github_issues::issue_model::RemoteIssue;
use orbit_plan::{
    action_id, Action, CorrelationId, Destination, Message, Params, Plan, PlanError, Resumption,
    RichMessage, Step, StepOutcome,
};

use crate::builder::{response_body, ChatopsPlanBuilder, IssueTarget};
use crate::names;

/// Inbound issue change. Issues not assigned to the default user produce an empty plan.
pub(crate) fn issue_event(
    builder: &ChatopsPlanBuilder,
    issue: &RemoteIssue,
    now: DateTime<Utc>,
) -> Result<Plan, PlanError> {
    let config = builder.config();
    if !issue.is_assigned_to(&config.default_user) {
        tracing::debug!(issue = issue.number, "issue not assigned to default user");
        return Ok(Plan::empty());
    }
    let Some((owner, repo)) = issue.repo_slug() else {
        return Err(PlanError::malformed(
            "issue event",
            format!("no repository in {}", issue.url),
        ));
    };
    let correlation = CorrelationId::for_issue(&config.default_user, &owner, &repo, issue.number);
    Ok(Plan::of_message(personal_issue_message(
        builder,
        issue,
        &owner,
        &repo,
        &correlation,
        &config.status_channel,
        now,
    )))
}

fn personal_issue_message(
    builder: &ChatopsPlanBuilder,
    issue: &RemoteIssue,
    owner: &str,
    repo: &str,
    correlation: &CorrelationId,
    channel: &str,
    now: DateTime<Utc>,
) -> Message {
    let config = builder.config();
    let mut attachment = if issue.is_closed() {
        closed_issue_attachment(issue, now)
    } else {
        open_issue_attachment(issue, now, &config.recency)
    };
    if !issue.is_closed() {
        let in_progress = issue.has_label(&config.in_progress_label);
        let (verb, command) = if in_progress {
            ("Stop", names::REMOVE_LABEL)
        } else {
            ("Start", names::ADD_LABEL)
        };
        let params = correlation.thread_into(
            Params::new()
                .with("owner", owner)
                .with("repo", repo)
                .with("issue", issue.number)
                .with("label", config.in_progress_label.as_str())
                .with("channel", channel),
        );
        attachment.actions.push(Action::new(
            action_id(verb, owner, repo, issue.number),
            verb,
            Resumption::new(command, params),
        ));
    }
    let status = if issue.is_closed() {
        "closed"
    } else if issue.has_label(&config.in_progress_label) {
        "in progress"
    } else {
        "assigned"
    };
    Message::rich(
        Destination::Update {
            correlation_id: correlation.clone(),
            channel: Some(channel.to_string()),
        },
        RichMessage {
            text: format!("{repo}#{} is {status}", issue.number),
            attachments: vec![attachment],
        },
    )
}

/// Re-fetch the issue and redraw its personal message in place.
pub(crate) fn refresh_personal_issue_step(
    builder: &ChatopsPlanBuilder,
    target: &IssueTarget,
    correlation: &CorrelationId,
    channel: &str,
) -> Step {
    Step::new(
        builder
            .github()
            .get_issue(&target.owner, &target.repo, target.number),
    )
    .on_success(Resumption::new(
        names::RENDER_PERSONAL_ISSUE,
        correlation.thread_into(target.to_params().with("channel", channel)),
    ))
    .report_errors("The request to GitHub failed")
}

pub(crate) fn render_personal_issue(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    outcome: &StepOutcome,
    now: DateTime<Utc>,
) -> Result<Plan, PlanError> {
    let issue = RemoteIssue::parse(response_body(outcome, "personal issue")?)
        .map_err(|error| PlanError::malformed("personal issue", error))?;
    let target = IssueTarget::resolve(params, None)?;
    let config = builder.config();
    let correlation = CorrelationId::from_params(params).unwrap_or_else(|| {
        CorrelationId::for_issue(&config.default_user, &target.owner, &target.repo, target.number)
    });
    let channel = params.text_or("channel", &config.status_channel);
    Ok(Plan::of_message(personal_issue_message(
        builder,
        &issue,
        &target.owner,
        &target.repo,
        &correlation,
        &channel,
        now,
    )))
}
