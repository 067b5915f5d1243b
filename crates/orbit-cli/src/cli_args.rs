use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::Weekday;
use clap::{Args, Parser, Subcommand};
use orbit_ci::DEFAULT_TRAVIS_API_BASE;
use orbit_github_issues::github_endpoints::DEFAULT_GITHUB_API_BASE;
use orbit_github_issues::issue_format::RecencyWindow;
use orbit_handlers::config::{
    DEFAULT_ALERT_CHANNEL, DEFAULT_BUILD_CHANNEL, DEFAULT_IN_PROGRESS_LABEL,
};
use orbit_handlers::PlanBuilderConfig;
use orbit_plan::{ParamValue, Params};
use orbit_runtime::{DEFAULT_SLACK_API_BASE, DEFAULT_SLACK_MESSAGE_CAP};

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_weekday(value: &str) -> Result<Weekday, String> {
    value
        .trim()
        .parse::<Weekday>()
        .map_err(|_| format!("unknown weekday '{value}'"))
}

/// `key=value`; `true`/`false` become flags and integers become numbers.
pub(crate) fn parse_param(raw: &str) -> Result<(String, ParamValue), String> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(format!("expected key=value, got '{raw}'"));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing parameter name in '{raw}'"));
    }
    let value = value.trim();
    let parsed = match value {
        "true" => ParamValue::Bool(true),
        "false" => ParamValue::Bool(false),
        _ => value
            .parse::<i64>()
            .map(ParamValue::Int)
            .unwrap_or_else(|_| ParamValue::Text(value.to_string())),
    };
    Ok((key.to_string(), parsed))
}

#[derive(Debug, Parser)]
#[command(
    name = "orbit",
    about = "Chatops plan engine for GitHub issues and Travis builds",
    version
)]
pub(crate) struct Cli {
    #[arg(long, env = "ORBIT_GITHUB_API_BASE", default_value = DEFAULT_GITHUB_API_BASE)]
    pub github_api_base: String,

    #[arg(long, env = "ORBIT_TRAVIS_API_BASE", default_value = DEFAULT_TRAVIS_API_BASE)]
    pub travis_api_base: String,

    #[arg(long, env = "ORBIT_SLACK_API_BASE", default_value = DEFAULT_SLACK_API_BASE)]
    pub slack_api_base: String,

    #[arg(
        long,
        env = "ORBIT_SLACK_BOT_TOKEN",
        hide_env_values = true,
        help = "Slack bot token. Without it, messages are printed instead of posted."
    )]
    pub slack_bot_token: Option<String>,

    #[arg(
        long,
        env = "ORBIT_DEFAULT_USER",
        help = "GitHub login that `me` and the personal views refer to."
    )]
    pub default_user: String,

    #[arg(long, env = "ORBIT_DEFAULT_ORG")]
    pub default_org: String,

    #[arg(
        long,
        env = "ORBIT_STATUS_CHANNEL",
        help = "Channel for personal issue messages. Defaults to {default-user}-status."
    )]
    pub status_channel: Option<String>,

    #[arg(long, env = "ORBIT_BUILD_CHANNEL", default_value = DEFAULT_BUILD_CHANNEL)]
    pub build_channel: String,

    #[arg(long, env = "ORBIT_ALERT_CHANNEL", default_value = DEFAULT_ALERT_CHANNEL)]
    pub alert_channel: String,

    #[arg(long, env = "ORBIT_IN_PROGRESS_LABEL", default_value = DEFAULT_IN_PROGRESS_LABEL)]
    pub in_progress_label: String,

    #[arg(
        long,
        env = "ORBIT_REQUEST_TIMEOUT_MS",
        default_value_t = 10_000,
        value_parser = parse_positive_u64
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long,
        env = "ORBIT_RECENCY_SECONDS",
        default_value_t = 86_400,
        value_parser = parse_positive_u64
    )]
    pub recency_seconds: u64,

    #[arg(
        long,
        env = "ORBIT_RECENCY_WIDEN_ON",
        default_value = "Mon",
        value_parser = parse_weekday
    )]
    pub recency_widen_on: Weekday,

    #[arg(
        long,
        env = "ORBIT_RECENCY_WIDEN_FACTOR",
        default_value_t = 3,
        value_parser = parse_positive_u64
    )]
    pub recency_widen_factor: u64,

    #[arg(
        long,
        env = "ORBIT_LOG_TAIL_LINES",
        default_value_t = 20,
        value_parser = parse_positive_usize
    )]
    pub log_tail_lines: usize,

    #[arg(
        long,
        env = "ORBIT_IDENTITY_FILE",
        help = "TOML file mapping chat user ids to GitHub logins."
    )]
    pub identity_file: Option<PathBuf>,

    #[arg(
        long,
        env = "ORBIT_STATE_PATH",
        help = "JSON file remembering posted Slack messages so later runs update them in place."
    )]
    pub state_path: Option<PathBuf>,

    #[arg(
        long,
        env = "ORBIT_SLACK_MESSAGE_CAP",
        default_value_t = DEFAULT_SLACK_MESSAGE_CAP,
        value_parser = parse_positive_usize
    )]
    pub slack_message_cap: usize,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub(crate) fn plan_builder_config(&self) -> Result<PlanBuilderConfig> {
        if self.default_user.trim().is_empty() {
            bail!("--default-user cannot be empty");
        }
        if self.default_org.trim().is_empty() {
            bail!("--default-org cannot be empty");
        }
        let mut config = PlanBuilderConfig::new(&self.default_user, &self.default_org);
        config.github_api_base = self.github_api_base.trim().to_string();
        config.travis_api_base = self.travis_api_base.trim().to_string();
        if let Some(channel) = self
            .status_channel
            .as_deref()
            .map(str::trim)
            .filter(|channel| !channel.is_empty())
        {
            config.status_channel = channel.to_string();
        }
        config.build_channel = self.build_channel.trim().to_string();
        config.alert_channel = self.alert_channel.trim().to_string();
        config.in_progress_label = self.in_progress_label.trim().to_string();
        config.recency = RecencyWindow {
            base_seconds: self.recency_seconds,
            widen_on: self.recency_widen_on,
            widen_factor: self.recency_widen_factor,
        };
        config.log_tail_lines = self.log_tail_lines;
        Ok(config)
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Run a chat command, e.g. `orbit command "start work" issue=12`
    Command(CommandArgs),
    /// Replay a button click from its wire value
    Click(ClickArgs),
    /// Handle an inbound webhook payload
    #[command(subcommand)]
    Event(EventCommand),
}

#[derive(Debug, Args, Clone)]
pub(crate) struct InvocationArgs {
    #[arg(long, env = "ORBIT_CHAT_USER", help = "Chat user id of the invoker.")]
    pub user: Option<String>,

    #[arg(long, env = "ORBIT_CHAT_CHANNEL", help = "Channel replies go to.")]
    pub channel: Option<String>,

    #[arg(long, env = "ORBIT_REPO_OWNER")]
    pub owner: Option<String>,

    #[arg(long, env = "ORBIT_REPO")]
    pub repo: Option<String>,

    #[arg(long, help = "Print the built plan as JSON instead of executing it.")]
    pub dry_run: bool,
}

#[derive(Debug, Args, Clone)]
pub(crate) struct CommandArgs {
    pub name: String,

    #[arg(value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, ParamValue)>,

    #[command(flatten)]
    pub invocation: InvocationArgs,
}

impl CommandArgs {
    pub(crate) fn params(&self) -> Params {
        let mut params = Params::new();
        for (key, value) in &self.params {
            params.insert(key, value.clone());
        }
        params
    }
}

#[derive(Debug, Args, Clone)]
pub(crate) struct ClickArgs {
    #[arg(value_name = "WIRE_VALUE")]
    pub value: String,

    #[command(flatten)]
    pub invocation: InvocationArgs,
}

#[derive(Debug, Subcommand)]
pub(crate) enum EventCommand {
    /// GitHub issue JSON, bare or wrapped in a webhook `issue` field
    Issue(EventArgs),
    /// Build notification JSON: id, provider, status, repo
    FailedBuild(EventArgs),
}

#[derive(Debug, Args, Clone)]
pub(crate) struct EventArgs {
    pub path: PathBuf,

    #[arg(long, help = "Print the built plan as JSON instead of executing it.")]
    pub dry_run: bool,
}
