//! Single sink that turns a failed step into a visible chat message.

use crate::{Message, Params, Resumption, StepOutcome};

/// Resumption name routed to [`report_from_bag`].
pub const ERROR_REPORTER: &str = "report_error";

const PREFIX_PARAM: &str = "msg";
const CHANNEL_PARAM: &str = "channel";

pub(crate) fn error_resumption(prefix: &str, channel: Option<&str>) -> Resumption {
    let mut params = Params::new().with(PREFIX_PARAM, prefix);
    if let Some(channel) = channel.map(str::trim).filter(|value| !value.is_empty()) {
        params.insert(CHANNEL_PARAM, channel);
    }
    Resumption::new(ERROR_REPORTER, params)
}

/// `"{prefix} {error} ({raw_body})"`, skipping blank parts. Never fails.
pub fn report(channel: Option<&str>, prefix: &str, error: &str, raw_body: Option<&str>) -> Message {
    let body = raw_body
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| format!("({value})"));
    let contents = [Some(prefix.trim()), Some(error.trim()), body.as_deref()]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let contents = if contents.is_empty() {
        "The request failed".to_string()
    } else {
        contents
    };
    Message::directed(channel.map(str::trim).filter(|value| !value.is_empty()), contents)
}

pub fn report_from_bag(params: &Params, outcome: &StepOutcome) -> Message {
    let prefix = params.text(PREFIX_PARAM).unwrap_or_default();
    let channel = params.text(CHANNEL_PARAM);
    match outcome {
        StepOutcome::Failure { error, body, .. } => {
            report(channel.as_deref(), &prefix, error, body.as_deref())
        }
        StepOutcome::Success { status, body } => report(
            channel.as_deref(),
            &prefix,
            &format!("unexpected status {status}"),
            Some(body),
        ),
    }
}
