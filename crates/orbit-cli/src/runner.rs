use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use orbit_ci::BuildEvent;
use orbit_github_issues::issue_model::RemoteIssue;
use orbit_handlers::ChatopsPlanBuilder;
use orbit_plan::{report, Invocation, InvocationContext, Plan, PlanSource, Resumption};
use orbit_runtime::{
    ChatSink, EnvCredentialResolver, ExecutionReport, PlanExecutor, RecordingChatSink,
    ReqwestTransport, SlackChatSink, SlackMessageIndex,
};
use serde_json::Value;

use crate::cli_args::{Cli, Command, EventCommand, InvocationArgs};
use crate::identity_file::IdentityDirectory;

/// What entered the bot: a command or click, or a webhook event.
#[derive(Debug, Clone)]
pub(crate) enum Inbound {
    Invocation(Invocation),
    Issue(RemoteIssue),
    FailedBuild(BuildEvent),
}

impl Inbound {
    fn failure_prefix(&self) -> String {
        match self {
            Self::Invocation(invocation) => format!("Unable to run `{}`:", invocation.command),
            Self::Issue(issue) => format!("Unable to handle issue event for #{}:", issue.number),
            Self::FailedBuild(event) => format!("Unable to handle build {}:", event.id),
        }
    }

    /// Events have no invoking channel; their replies and failures go to alerts.
    fn event_channel<'a>(&self, builder: &'a ChatopsPlanBuilder) -> Option<&'a str> {
        match self {
            Self::Invocation(_) => None,
            Self::Issue(_) | Self::FailedBuild(_) => Some(builder.config().alert_channel.as_str()),
        }
    }
}

pub(crate) async fn run_cli(cli: Cli) -> Result<()> {
    let builder = Arc::new(ChatopsPlanBuilder::new(cli.plan_builder_config()?));
    let identities = match cli.identity_file.as_deref() {
        Some(path) => IdentityDirectory::load(path)?,
        None => IdentityDirectory::default(),
    };
    let now = Utc::now();
    let (inbound, dry_run) = inbound_from(&cli.command, &identities, now)?;
    if dry_run {
        println!("{}", build_plan(&builder, &inbound, now).to_json_pretty()?);
        return Ok(());
    }

    let slack_token = cli
        .slack_bot_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty());
    let recorder = slack_token
        .is_none()
        .then(|| Arc::new(RecordingChatSink::new()));
    let sink: Arc<dyn ChatSink> = match (&recorder, slack_token) {
        (Some(recorder), _) => recorder.clone(),
        (None, token) => Arc::new(slack_sink(&cli, token.unwrap_or_default())?),
    };
    let executor = PlanExecutor::new(
        builder.clone(),
        Arc::new(ReqwestTransport::new(cli.request_timeout_ms)?),
        Arc::new(EnvCredentialResolver::new()),
        sink,
    );
    let report = execute(&executor, &builder, &inbound, now).await;

    if let Some(recorder) = recorder {
        for delivery in recorder.deliveries() {
            println!(
                "[{}] {}",
                delivery.channel.as_deref().unwrap_or("-"),
                delivery.message.text()
            );
        }
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn slack_sink(cli: &Cli, token: &str) -> Result<SlackChatSink> {
    let index = match &cli.state_path {
        Some(path) => SlackMessageIndex::load(path.clone(), cli.slack_message_cap)?,
        None => SlackMessageIndex::in_memory(cli.slack_message_cap),
    };
    Ok(
        SlackChatSink::new(&cli.slack_api_base, token, cli.request_timeout_ms)?
            .with_message_index(index),
    )
}

pub(crate) fn inbound_from(
    command: &Command,
    identities: &IdentityDirectory,
    now: DateTime<Utc>,
) -> Result<(Inbound, bool)> {
    match command {
        Command::Command(args) => {
            let context = invocation_context(&args.invocation, identities, now);
            Ok((
                Inbound::Invocation(Invocation::new(args.name.trim(), args.params(), context)),
                args.invocation.dry_run,
            ))
        }
        Command::Click(args) => {
            let resumption = Resumption::from_wire_value(&args.value)
                .context("failed to decode button value")?;
            let context = invocation_context(&args.invocation, identities, now);
            Ok((
                Inbound::Invocation(Invocation::from_click(&resumption, context)),
                args.invocation.dry_run,
            ))
        }
        Command::Event(EventCommand::Issue(args)) => {
            let payload = read_json(&args.path)?;
            let issue = payload.get("issue").cloned().unwrap_or(payload);
            let issue = RemoteIssue::parse(&issue.to_string())
                .with_context(|| format!("{} is not a GitHub issue", args.path.display()))?;
            Ok((Inbound::Issue(issue), args.dry_run))
        }
        Command::Event(EventCommand::FailedBuild(args)) => {
            let event: BuildEvent = serde_json::from_value(read_json(&args.path)?)
                .with_context(|| format!("{} is not a build event", args.path.display()))?;
            Ok((Inbound::FailedBuild(event), args.dry_run))
        }
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn invocation_context(
    args: &InvocationArgs,
    identities: &IdentityDirectory,
    now: DateTime<Utc>,
) -> InvocationContext {
    let trimmed = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    let user = trimmed(&args.user);
    InvocationContext {
        github_logins: identities.logins_for(user.as_deref()),
        user,
        channel: trimmed(&args.channel),
        repo_owner: trimmed(&args.owner),
        repo: trimmed(&args.repo),
        now,
    }
}

/// A plan that cannot be built becomes an error report instead.
pub(crate) fn build_plan(
    builder: &ChatopsPlanBuilder,
    inbound: &Inbound,
    now: DateTime<Utc>,
) -> Plan {
    let built = match inbound {
        Inbound::Invocation(invocation) => builder.build_initial_plan(invocation),
        Inbound::Issue(issue) => builder.build_issue_event_plan(issue, now),
        Inbound::FailedBuild(event) => builder.build_failed_build_plan(event),
    };
    built.unwrap_or_else(|error| {
        tracing::warn!(error = %error, "plan build failed");
        Plan::of_message(report(
            inbound.event_channel(builder),
            &inbound.failure_prefix(),
            &error.to_string(),
            None,
        ))
    })
}

pub(crate) async fn execute(
    executor: &PlanExecutor,
    builder: &ChatopsPlanBuilder,
    inbound: &Inbound,
    now: DateTime<Utc>,
) -> ExecutionReport {
    match inbound {
        Inbound::Invocation(invocation) => executor.run_invocation(invocation).await,
        event => {
            let plan = build_plan(builder, event, now);
            tracing::info!(items = plan.len(), "running event plan");
            executor
                .run_plan(plan, event.event_channel(builder))
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use chrono::{DateTime, Utc};
    use clap::Parser;
    use httpmock::prelude::*;
    use orbit_ci::BuildEvent;
    use orbit_github_issues::issue_model::RemoteIssue;
    use orbit_handlers::{ChatopsPlanBuilder, PlanBuilderConfig};
    use orbit_plan::{
        CredentialRef, Destination, Invocation, InvocationContext, Params, PlanItem, Resumption,
    };
    use orbit_runtime::{EnvCredentialResolver, PlanExecutor, RecordingChatSink, ReqwestTransport};
    use serde_json::json;
    use tempfile::NamedTempFile;

    use super::{build_plan, execute, inbound_from, Inbound};
    use crate::cli_args::Cli;
    use crate::identity_file::IdentityDirectory;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-17T12:00:00Z")
            .map(|value| value.with_timezone(&Utc))
            .expect("timestamp")
    }

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["orbit", "--default-user", "jess", "--default-org", "sol"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("cli")
    }

    fn identities() -> IdentityDirectory {
        let mut file = NamedTempFile::new().expect("tempfile");
        writeln!(file, "[users]\nU123 = [\"jess\"]").expect("write");
        IdentityDirectory::load(file.path()).expect("identities")
    }

    fn context() -> InvocationContext {
        InvocationContext {
            user: Some("U123".to_string()),
            channel: Some("C1".to_string()),
            repo_owner: Some("sol".to_string()),
            repo: Some("workflow".to_string()),
            github_logins: Some(vec!["jess".to_string()]),
            now: now(),
        }
    }

    fn live_executor(
        server: &MockServer,
        sink: Arc<RecordingChatSink>,
    ) -> (PlanExecutor, Arc<ChatopsPlanBuilder>) {
        let mut config = PlanBuilderConfig::new("jess", "sol");
        config.github_api_base = server.base_url();
        config.travis_api_base = server.base_url();
        let builder = Arc::new(ChatopsPlanBuilder::new(config));
        let executor = PlanExecutor::new(
            builder.clone(),
            Arc::new(ReqwestTransport::new(2_000).expect("transport")),
            Arc::new(
                EnvCredentialResolver::default()
                    .with_secret(CredentialRef::GITHUB_USER_TOKEN, "ghp-test"),
            ),
            sink,
        )
        .with_clock(now);
        (executor, builder)
    }

    #[test]
    fn unit_command_context_carries_identity_lookup() {
        let cli = cli(&[
            "command", "start work", "issue=4", "--user", "U123", "--channel", "C1",
        ]);
        let (inbound, dry_run) = inbound_from(&cli.command, &identities(), now()).expect("inbound");
        assert!(!dry_run);
        let Inbound::Invocation(invocation) = inbound else {
            panic!("expected invocation");
        };
        assert_eq!(invocation.command, "start work");
        assert_eq!(
            invocation.context.github_logins,
            Some(vec!["jess".to_string()])
        );
        assert_eq!(invocation.context.channel.as_deref(), Some("C1"));
    }

    #[test]
    fn functional_click_replays_recorded_resumption() {
        let resumption = Resumption::new("close issue", Params::new().with("owner", "sol"));
        let wire = resumption.to_wire_value().expect("wire");
        let cli = cli(&["click", wire.as_str(), "--dry-run"]);
        let (inbound, dry_run) =
            inbound_from(&cli.command, &IdentityDirectory::default(), now()).expect("inbound");
        assert!(dry_run);
        let Inbound::Invocation(invocation) = inbound else {
            panic!("expected invocation");
        };
        assert_eq!(invocation.command, "close issue");
        assert_eq!(invocation.params.text("owner").as_deref(), Some("sol"));
        assert_eq!(invocation.context.github_logins, None);
    }

    #[test]
    fn functional_issue_webhook_payload_builds_personal_message_plan() {
        let mut file = NamedTempFile::new().expect("tempfile");
        let payload = json!({
            "action": "labeled",
            "issue": {
                "id": 5004,
                "number": 4,
                "url": "https://api.github.com/repos/sol/workflow/issues/4",
                "html_url": "https://github.com/sol/workflow/issues/4",
                "title": "Fix the flux",
                "body": "details",
                "state": "open",
                "created_at": "2026-10-10T12:00:00Z",
                "updated_at": "2026-10-17T10:00:00Z",
                "user": {"login": "octo"},
                "labels": [{"name": "in-progress"}],
                "assignees": [{"login": "jess"}],
            }
        });
        write!(file, "{payload}").expect("write");
        let path = file.path().to_string_lossy().to_string();
        let cli = cli(&["event", "issue", path.as_str(), "--dry-run"]);
        let (inbound, dry_run) =
            inbound_from(&cli.command, &IdentityDirectory::default(), now()).expect("inbound");
        assert!(dry_run);

        let builder = ChatopsPlanBuilder::new(cli.plan_builder_config().expect("config"));
        let plan = build_plan(&builder, &inbound, now());
        let [PlanItem::Message(message)] = plan.items() else {
            panic!("expected a single message");
        };
        assert_eq!(message.text(), "workflow#4 is in progress");
    }

    #[test]
    fn regression_malformed_build_event_names_the_file() {
        let mut file = NamedTempFile::new().expect("tempfile");
        write!(file, "{}", json!({"id": "not a number"})).expect("write");
        let path = file.path().to_string_lossy().to_string();
        let cli = cli(&["event", "failed-build", path.as_str()]);
        let error = inbound_from(&cli.command, &IdentityDirectory::default(), now())
            .expect_err("malformed");
        assert!(error.to_string().contains("is not a build event"));
    }

    #[tokio::test]
    async fn integration_start_work_labels_issue_and_confirms() {
        let server = MockServer::start();
        let label = server.mock(|when, then| {
            when.method(POST)
                .path("/repos/sol/workflow/issues/4/labels")
                .header("authorization", "token ghp-test")
                .json_body(json!(["in-progress"]));
            then.status(200).json_body(json!([{"name": "in-progress"}]));
        });
        let sink = Arc::new(RecordingChatSink::new());
        let (executor, builder) = live_executor(&server, sink.clone());
        let inbound = Inbound::Invocation(Invocation::new(
            "start work",
            Params::new().with("issue", 4_u64),
            context(),
        ));

        let report = execute(&executor, &builder, &inbound, now()).await;
        assert_eq!(report.steps_succeeded, 1);
        assert_eq!(
            sink.texts(),
            vec![
                "Starting work by <@U123> (github login jess) on workflow#4",
                "Added in-progress label",
            ]
        );
        label.assert();
    }

    #[tokio::test]
    async fn integration_failed_close_is_reported_in_chat() {
        let server = MockServer::start();
        let close = server.mock(|when, then| {
            when.method(PATCH)
                .path("/repos/sol/workflow/issues/9")
                .json_body(json!({"state": "closed"}));
            then.status(404).body(r#"{"message":"Not Found"}"#);
        });
        let sink = Arc::new(RecordingChatSink::new());
        let (executor, builder) = live_executor(&server, sink.clone());
        let inbound = Inbound::Invocation(Invocation::new(
            "close issue",
            Params::new().with("issue", 9_u64),
            context(),
        ));

        let report = execute(&executor, &builder, &inbound, now()).await;
        assert_eq!(report.steps_failed, 1);
        assert_eq!(
            sink.texts(),
            vec![r#"The close request to GitHub failed 404 Not Found ({"message":"Not Found"})"#]
        );
        assert_eq!(close.calls(), 1);
    }

    #[tokio::test]
    async fn regression_issue_event_without_repository_is_reported_to_alerts() {
        let issue = RemoteIssue::parse(
            &json!({
                "id": 5004,
                "number": 4,
                "url": "not-a-github-url",
                "html_url": "https://github.com/sol/workflow/issues/4",
                "title": "Fix the flux",
                "state": "open",
                "assignees": [{"login": "jess"}],
            })
            .to_string(),
        )
        .expect("issue");
        let inbound = Inbound::Issue(issue);
        let server = MockServer::start();
        let sink = Arc::new(RecordingChatSink::new());
        let (executor, builder) = live_executor(&server, sink.clone());

        let plan = build_plan(&builder, &inbound, now());
        let [PlanItem::Message(message)] = plan.items() else {
            panic!("expected a single report");
        };
        assert_eq!(
            message.destination,
            Destination::Channel {
                channel: "alerts".to_string()
            }
        );

        execute(&executor, &builder, &inbound, now()).await;
        let deliveries = sink.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].channel.as_deref(), Some("alerts"));
        assert_eq!(
            deliveries[0].message.text(),
            "Unable to handle issue event for #4: unexpected response shape for issue event: \
             no repository in not-a-github-url"
        );
    }

    #[tokio::test]
    async fn regression_malformed_build_details_are_reported_to_alerts() {
        let server = MockServer::start();
        let build = server.mock(|when, then| {
            when.method(GET).path("/builds/314");
            then.status(200).body("nope");
        });
        let sink = Arc::new(RecordingChatSink::new());
        let (executor, builder) = live_executor(&server, sink.clone());
        let inbound = Inbound::FailedBuild(BuildEvent {
            id: 314,
            provider: "travis".to_string(),
            status: "failed".to_string(),
            repo: "workflow".to_string(),
        });

        let report = execute(&executor, &builder, &inbound, now()).await;
        assert_eq!(report.steps_succeeded, 1);
        assert_eq!(report.delivery_failures, 0);
        let deliveries = sink.deliveries();
        assert_eq!(deliveries.len(), 2);
        let failure = &deliveries[1];
        assert_eq!(failure.channel.as_deref(), Some("alerts"));
        assert!(failure
            .message
            .text()
            .starts_with("Unable to continue `receive build details`: unexpected response shape"));
        build.assert();
    }
}
