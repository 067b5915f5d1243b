//! Slack Web API chat sink. Correlated messages are tracked in a
//! [`SlackMessageIndex`] so repeats become `chat.update` calls.

use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use orbit_core::truncate_for_error;
use orbit_plan::{Action, Attachment, CorrelationId, Destination, Message, MessageBody};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::slack_state_store::{SlackMessageIndex, SlackPostedMessage, DEFAULT_SLACK_MESSAGE_CAP};
use crate::{ChatSink, DeliveryReceipt};

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Clone, Deserialize)]
struct SlackChatMessageResponse {
    ok: bool,
    ts: Option<String>,
    channel: Option<String>,
    error: Option<String>,
}

pub struct SlackChatSink {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
    posted: Mutex<SlackMessageIndex>,
}

impl SlackChatSink {
    pub fn new(api_base: &str, bot_token: &str, request_timeout_ms: u64) -> Result<Self> {
        let bot_token = bot_token.trim();
        if bot_token.is_empty() {
            bail!("slack bot token is required");
        }
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("orbit-chatops"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create slack api client")?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
            posted: Mutex::new(SlackMessageIndex::in_memory(DEFAULT_SLACK_MESSAGE_CAP)),
        })
    }

    /// Replace the in-process index, typically with one loaded from a state file.
    pub fn with_message_index(mut self, index: SlackMessageIndex) -> Self {
        self.posted = Mutex::new(index);
        self
    }

    fn remembered(&self, correlation_id: &CorrelationId) -> Result<Option<SlackPostedMessage>> {
        let posted = self
            .posted
            .lock()
            .map_err(|_| anyhow!("slack correlation index lock is poisoned"))?;
        Ok(posted.get(correlation_id).cloned())
    }

    fn remember(&self, correlation_id: CorrelationId, message: SlackPostedMessage) -> Result<()> {
        let mut posted = self
            .posted
            .lock()
            .map_err(|_| anyhow!("slack correlation index lock is poisoned"))?;
        if posted.remember(correlation_id, message) {
            if let Err(error) = posted.save() {
                tracing::warn!(error = %error, "slack message state not saved");
            }
        }
        Ok(())
    }

    async fn call(&self, operation: &str, payload: &Value) -> Result<SlackChatMessageResponse> {
        let response = self
            .http
            .post(format!("{}/{operation}", self.api_base))
            .bearer_auth(&self.bot_token)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("slack api {operation} request failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "slack api {operation} failed with status {}: {}",
                status.as_u16(),
                truncate_for_error(&body, 800)
            );
        }
        let parsed = response
            .json::<SlackChatMessageResponse>()
            .await
            .with_context(|| format!("failed to decode slack {operation}"))?;
        if !parsed.ok {
            bail!(
                "slack {operation} failed: {}",
                parsed.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
        Ok(parsed)
    }

    async fn post_message(&self, channel: &str, message: &Message) -> Result<SlackPostedMessage> {
        let payload = render_payload(message, channel, None)?;
        let response = self.call("chat.postMessage", &payload).await?;
        Ok(SlackPostedMessage {
            channel: response.channel.unwrap_or_else(|| channel.to_string()),
            ts: response
                .ts
                .ok_or_else(|| anyhow!("slack chat.postMessage response missing ts"))?,
        })
    }

    async fn update_message(
        &self,
        previous: &SlackPostedMessage,
        message: &Message,
    ) -> Result<SlackPostedMessage> {
        let payload = render_payload(message, &previous.channel, Some(&previous.ts))?;
        let response = self.call("chat.update", &payload).await?;
        Ok(SlackPostedMessage {
            channel: response
                .channel
                .unwrap_or_else(|| previous.channel.clone()),
            ts: response.ts.unwrap_or_else(|| previous.ts.clone()),
        })
    }
}

#[async_trait]
impl ChatSink for SlackChatSink {
    async fn deliver(
        &self,
        message: &Message,
        respond_channel: Option<&str>,
    ) -> Result<DeliveryReceipt> {
        let respond_channel = respond_channel
            .map(str::trim)
            .filter(|channel| !channel.is_empty());
        let (posted, updated) = match &message.destination {
            Destination::Respond => {
                let channel = respond_channel
                    .ok_or_else(|| anyhow!("cannot respond without an invoking channel"))?;
                (self.post_message(channel, message).await?, false)
            }
            Destination::Channel { channel } => (self.post_message(channel, message).await?, false),
            Destination::Update {
                correlation_id,
                channel,
            } => {
                if let Some(previous) = self.remembered(correlation_id)? {
                    let posted = self.update_message(&previous, message).await?;
                    self.remember(correlation_id.clone(), posted.clone())?;
                    (posted, true)
                } else {
                    let channel = channel
                        .as_deref()
                        .or(respond_channel)
                        .ok_or_else(|| {
                            anyhow!("no channel for first message of {correlation_id}")
                        })?;
                    let posted = self.post_message(channel, message).await?;
                    self.remember(correlation_id.clone(), posted.clone())?;
                    (posted, false)
                }
            }
        };
        tracing::debug!(channel = %posted.channel, ts = %posted.ts, updated, "slack message delivered");
        Ok(DeliveryReceipt {
            channel: Some(posted.channel),
            reference: Some(posted.ts),
            updated,
        })
    }
}

fn render_payload(message: &Message, channel: &str, ts: Option<&str>) -> Result<Value> {
    let mut payload = json!({
        "channel": channel,
        "text": message.text(),
        "unfurl_links": false,
        "unfurl_media": false,
    });
    if let Some(ts) = ts {
        payload["ts"] = Value::String(ts.to_string());
    }
    let mut attachments = match &message.body {
        MessageBody::Text { .. } => Vec::new(),
        MessageBody::Rich(rich) => rich
            .attachments
            .iter()
            .map(render_attachment)
            .collect::<Result<Vec<_>>>()?,
    };
    if !message.actions.is_empty() {
        attachments.push(render_attachment(&Attachment {
            fallback: message.text().to_string(),
            actions: message.actions.clone(),
            ..Attachment::default()
        })?);
    }
    // chat.update keeps old attachments unless they are replaced explicitly.
    if !attachments.is_empty() || ts.is_some() {
        payload["attachments"] = Value::Array(attachments);
    }
    Ok(payload)
}

fn render_attachment(attachment: &Attachment) -> Result<Value> {
    let mut rendered = Map::new();
    rendered.insert("fallback".to_string(), json!(attachment.fallback));
    rendered.insert("title".to_string(), json!(attachment.title));
    rendered.insert("text".to_string(), json!(attachment.text));
    if let Some(color) = &attachment.color {
        rendered.insert("color".to_string(), json!(color));
    }
    if let Some(author_name) = &attachment.author_name {
        rendered.insert("author_name".to_string(), json!(author_name));
    }
    if let Some(thumb_url) = &attachment.thumb_url {
        rendered.insert("thumb_url".to_string(), json!(thumb_url));
    }
    if !attachment.actions.is_empty() {
        let callback_id = attachment
            .actions
            .iter()
            .map(|action| action.id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        rendered.insert("callback_id".to_string(), json!(callback_id));
        let actions = attachment
            .actions
            .iter()
            .map(render_button)
            .collect::<Result<Vec<_>>>()?;
        rendered.insert("actions".to_string(), Value::Array(actions));
    }
    Ok(Value::Object(rendered))
}

fn render_button(action: &Action) -> Result<Value> {
    Ok(json!({
        "name": action.id,
        "text": action.label,
        "type": "button",
        "value": action.wire_value()?,
    }))
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use orbit_plan::{
        Action, Attachment, CorrelationId, Destination, Message, MessageBody, Params, Resumption,
        RichMessage,
    };
    use serde_json::json;
    use tempfile::tempdir;

    use super::{render_payload, SlackChatSink};
    use crate::slack_state_store::SlackMessageIndex;
    use crate::ChatSink;

    fn personal(text: &str) -> Message {
        Message::new(
            Destination::Update {
                correlation_id: CorrelationId::new("jess-issue/sol/workflow/3"),
                channel: Some("jess-status".to_string()),
            },
            MessageBody::Text {
                text: text.to_string(),
            },
        )
    }

    #[test]
    fn unit_buttons_carry_resumption_wire_value() {
        let resumption = Resumption::new("add label", Params::new().with("issue", 3_u64));
        let message = Message::rich(
            Destination::Respond,
            RichMessage {
                text: "workflow#3 is assigned".to_string(),
                attachments: vec![Attachment {
                    title: "Fix the flux".to_string(),
                    actions: vec![Action::new("start-sol-workflow-3", "Start", resumption.clone())],
                    ..Attachment::default()
                }],
            },
        );
        let payload = render_payload(&message, "C1", None).expect("payload");
        let button = &payload["attachments"][0]["actions"][0];
        assert_eq!(button["text"], "Start");
        assert_eq!(button["type"], "button");
        let value = button["value"].as_str().expect("value");
        assert_eq!(
            Resumption::from_wire_value(value).expect("decoded"),
            resumption
        );
        assert_eq!(payload["attachments"][0]["callback_id"], "start-sol-workflow-3");
    }

    #[tokio::test]
    async fn functional_respond_without_channel_is_an_error() {
        let sink = SlackChatSink::new("http://127.0.0.1:9", "xoxb-test", 500).expect("sink");
        let error = sink
            .deliver(&Message::respond("hi"), None)
            .await
            .expect_err("no channel");
        assert!(error.to_string().contains("invoking channel"));
    }

    #[tokio::test]
    async fn integration_correlated_message_is_posted_then_updated() {
        let server = MockServer::start();
        let post = server.mock(|when, then| {
            when.method(POST)
                .path("/chat.postMessage")
                .header("authorization", "Bearer xoxb-test")
                .json_body_includes(
                    json!({"channel": "jess-status", "text": "workflow#3 is assigned"}).to_string(),
                );
            then.status(200)
                .json_body(json!({"ok": true, "channel": "C9", "ts": "1700.1"}));
        });
        let update = server.mock(|when, then| {
            when.method(POST)
                .path("/chat.update")
                .json_body_includes(
                    json!({"channel": "C9", "ts": "1700.1", "text": "workflow#3 is in progress"})
                        .to_string(),
                );
            then.status(200)
                .json_body(json!({"ok": true, "channel": "C9", "ts": "1700.1"}));
        });
        let sink = SlackChatSink::new(&server.base_url(), "xoxb-test", 2_000).expect("sink");

        let first = sink
            .deliver(&personal("workflow#3 is assigned"), None)
            .await
            .expect("post");
        let second = sink
            .deliver(&personal("workflow#3 is in progress"), None)
            .await
            .expect("update");

        assert!(!first.updated);
        assert!(second.updated);
        assert_eq!(second.reference.as_deref(), Some("1700.1"));
        post.assert();
        update.assert();
    }

    #[tokio::test]
    async fn integration_correlated_message_updates_across_sink_instances() {
        let server = MockServer::start();
        let post = server.mock(|when, then| {
            when.method(POST).path("/chat.postMessage");
            then.status(200)
                .json_body(json!({"ok": true, "channel": "C9", "ts": "1700.1"}));
        });
        let update = server.mock(|when, then| {
            when.method(POST)
                .path("/chat.update")
                .json_body_includes(json!({"channel": "C9", "ts": "1700.1"}).to_string());
            then.status(200)
                .json_body(json!({"ok": true, "channel": "C9", "ts": "1700.1"}));
        });
        let dir = tempdir().expect("tempdir");
        let state_path = dir.path().join("slack-messages.json");
        let sink_for_run = || {
            SlackChatSink::new(&server.base_url(), "xoxb-test", 2_000)
                .expect("sink")
                .with_message_index(
                    SlackMessageIndex::load(state_path.clone(), 16).expect("index"),
                )
        };

        let first = sink_for_run()
            .deliver(&personal("workflow#3 is assigned"), None)
            .await
            .expect("post");
        let second = sink_for_run()
            .deliver(&personal("workflow#3 is in progress"), None)
            .await
            .expect("update");

        assert!(!first.updated);
        assert!(second.updated);
        assert_eq!(post.calls(), 1);
        assert_eq!(update.calls(), 1);
    }

    #[tokio::test]
    async fn regression_slack_error_field_fails_delivery() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/chat.postMessage");
            then.status(200)
                .json_body(json!({"ok": false, "error": "channel_not_found"}));
        });
        let sink = SlackChatSink::new(&server.base_url(), "xoxb-test", 2_000).expect("sink");
        let error = sink
            .deliver(&Message::to_channel("nowhere", "hi"), None)
            .await
            .expect_err("slack error");
        assert!(error.to_string().contains("channel_not_found"));
        assert_eq!(mock.calls(), 1);
    }
}
