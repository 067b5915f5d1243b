//! Issue listings: ad-hoc search, "my issues", and the in-progress board.

use chrono::{DateTime, Utc};
use orbit_github_issues::issue_format::{
    assigned_issue_attachment, closed_issue_attachment, open_issue_attachment,
    search_result_attachment,
};
use orbit_github_issues::issue_model::{IssueSearchPage, RemoteIssue};
use orbit_github_issues::search_query::{expand_user_alias, validate_org_repo, IssueSearchQuery};
use orbit_plan::{
    action_id, Action, CorrelationId, Destination, InvocationContext, Message, Params, Plan,
    PlanError, Resumption, RichMessage, Step, StepOutcome,
};

use crate::builder::{response_body, ChatopsPlanBuilder};
use crate::config::PlanBuilderConfig;
use crate::names;

const GITHUB_FAILED: &str = "The request to GitHub failed";
const IN_PROGRESS_SCOPE: &str = "in-progress";

pub(crate) fn search_issues(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    _context: &InvocationContext,
) -> Result<Plan, PlanError> {
    let config = builder.config();
    let me = config.default_user.as_str();
    let status = params.text_or("status", "open");
    let query = IssueSearchQuery {
        mentions: expand_user_alias(params.text("mentions").as_deref(), me),
        assignee: expand_user_alias(params.text("assignee").as_deref(), me),
        status: Some(status.clone()),
        repo: params
            .text("orgRepo")
            .map(|raw| validate_org_repo(&raw))
            .transpose()?,
        org: None,
    };
    if query.is_unbounded() {
        return Ok(Plan::of_message(Message::respond(format!(
            "I don't want to query all {status} issues on GitHub. Try adding `--assignee me` or `--orgRepo {}/<repo>`",
            config.default_org
        ))));
    }
    let step = Step::new(builder.github().search_issues(&query))
        .on_success(Resumption::new(
            names::RECEIVE_SEARCH_RESULTS,
            Params::new().with("query", query.web_query()),
        ))
        .report_errors(GITHUB_FAILED);
    Ok(Plan::of_message(Message::respond(format!(
        "Querying github for issues {}",
        query.display()
    )))
    .with_step(step))
}

pub(crate) fn receive_search_results(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    outcome: &StepOutcome,
    now: DateTime<Utc>,
) -> Result<Plan, PlanError> {
    let page = parse_page(outcome)?;
    let more = format!(
        "Search more on <https://github.com/issues?q={}|Github>",
        params.text_or("query", "")
    );
    if page.items.is_empty() {
        return Ok(Plan::of_message(Message::respond(format!(
            "No issues found. {more}"
        ))));
    }
    let recency = &builder.config().recency;
    let attachments = page
        .items
        .iter()
        .map(|issue| search_result_attachment(issue, now, recency))
        .collect();
    Ok(Plan::of_message(Message::rich(
        Destination::Respond,
        RichMessage {
            text: format!("There are {}. {more}", page.total_count),
            attachments,
        },
    )))
}

fn my_issues_query(config: &PlanBuilderConfig) -> IssueSearchQuery {
    IssueSearchQuery {
        assignee: Some(config.default_user.clone()),
        org: Some(config.default_org.clone()),
        ..IssueSearchQuery::default()
    }
}

pub(crate) fn list_my_issues(
    builder: &ChatopsPlanBuilder,
    _params: &Params,
    _context: &InvocationContext,
) -> Result<Plan, PlanError> {
    let query = my_issues_query(builder.config());
    let step = Step::new(builder.github().search_issues(&query))
        .on_success(Resumption::new(names::RECEIVE_MY_ISSUES, Params::new()))
        .report_errors(GITHUB_FAILED);
    Ok(Plan::empty().with_step(step))
}

pub(crate) fn receive_my_issues(
    _builder: &ChatopsPlanBuilder,
    _params: &Params,
    outcome: &StepOutcome,
    now: DateTime<Utc>,
) -> Result<Plan, PlanError> {
    let page = parse_page(outcome)?;
    let text = format!("You have {} things going", page.total_count);
    if page.items.is_empty() {
        return Ok(Plan::of_message(Message::respond(text)));
    }
    let attachments = page
        .items
        .iter()
        .map(|issue| assigned_issue_attachment(issue, now))
        .collect();
    Ok(Plan::of_message(Message::rich(
        Destination::Respond,
        RichMessage { text, attachments },
    )))
}

/// Correlation id of the in-progress board for the configured user and org.
pub(crate) fn in_progress_correlation(config: &PlanBuilderConfig) -> CorrelationId {
    CorrelationId::derive(
        IN_PROGRESS_SCOPE,
        &[config.default_user.as_str(), config.default_org.as_str()],
    )
}

/// Search step whose result redraws the in-progress board under `correlation`.
pub(crate) fn refresh_in_progress_step(
    builder: &ChatopsPlanBuilder,
    correlation: &CorrelationId,
    channel: &str,
) -> Step {
    let query = my_issues_query(builder.config());
    Step::new(builder.github().search_issues(&query))
        .on_success(Resumption::new(
            names::RECEIVE_STUFF_IN_PROGRESS,
            correlation.thread_into(Params::new().with("channel", channel)),
        ))
        .report_errors(GITHUB_FAILED)
}

pub(crate) fn stuff_in_progress(
    builder: &ChatopsPlanBuilder,
    _params: &Params,
    context: &InvocationContext,
) -> Result<Plan, PlanError> {
    let config = builder.config();
    let channel = context
        .channel
        .as_deref()
        .map(str::trim)
        .filter(|channel| !channel.is_empty())
        .unwrap_or(&config.status_channel);
    let correlation = in_progress_correlation(config);
    Ok(Plan::empty().with_step(refresh_in_progress_step(builder, &correlation, channel)))
}

pub(crate) fn receive_stuff_in_progress(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    outcome: &StepOutcome,
    now: DateTime<Utc>,
) -> Result<Plan, PlanError> {
    let config = builder.config();
    let page = parse_page(outcome)?;
    let correlation =
        CorrelationId::from_params(params).unwrap_or_else(|| in_progress_correlation(config));
    let channel = params.text_or("channel", &config.status_channel);

    let open = page
        .items
        .iter()
        .filter(|issue| !issue.is_closed())
        .collect::<Vec<_>>();
    let recently_closed = page.items.iter().filter(|issue| {
        issue.is_closed() && config.recency.is_recent(issue.closed_at.as_deref(), now)
    });

    let mut attachments = recently_closed
        .map(|issue| closed_issue_attachment(issue, now))
        .collect::<Vec<_>>();
    for issue in &open {
        let mut attachment = open_issue_attachment(issue, now, &config.recency);
        if let Some(action) = finish_action(config, issue, &correlation, &channel) {
            attachment.actions.push(action);
        }
        attachments.push(attachment);
    }

    Ok(Plan::of_message(Message::rich(
        Destination::Update {
            correlation_id: correlation,
            channel: Some(channel),
        },
        RichMessage {
            text: format!("You have {} things going", open.len()),
            attachments,
        },
    )))
}

/// "Mark complete" for in-progress issues, "Close issue" otherwise.
fn finish_action(
    config: &PlanBuilderConfig,
    issue: &RemoteIssue,
    correlation: &CorrelationId,
    channel: &str,
) -> Option<Action> {
    let (owner, repo) = issue.repo_slug()?;
    let (verb, label, command) = if issue.has_label(&config.in_progress_label) {
        ("complete", "Mark complete", names::COMPLETE_WORK)
    } else {
        ("close", "Close issue", names::CLOSE_ISSUE)
    };
    let params = correlation.thread_into(
        Params::new()
            .with("owner", owner.as_str())
            .with("repo", repo.as_str())
            .with("issue", issue.number)
            .with("channel", channel),
    );
    Some(Action::new(
        action_id(verb, &owner, &repo, issue.number),
        label,
        Resumption::new(command, params),
    ))
}

fn parse_page(outcome: &StepOutcome) -> Result<IssueSearchPage, PlanError> {
    IssueSearchPage::parse(response_body(outcome, "issue search")?)
        .map_err(|error| PlanError::malformed("issue search", error))
}
