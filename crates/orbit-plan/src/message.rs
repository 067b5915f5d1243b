use serde::{Deserialize, Serialize};

use crate::{CorrelationId, PlanError, Resumption};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// Where an outbound chat message goes.
pub enum Destination {
    /// Reply to whoever invoked the command, in the invoking channel.
    Respond,
    /// Post a new message to a named channel.
    Channel { channel: String },
    /// Replace the message previously sent under `correlation_id`; post to
    /// `channel` (or respond) when there is nothing to replace yet.
    Update {
        correlation_id: CorrelationId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel: Option<String>,
    },
}

/// Clickable element bound to a resumption recorded at plan-build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub label: String,
    pub resumption: Resumption,
}

impl Action {
    pub fn new(id: impl Into<String>, label: impl Into<String>, resumption: Resumption) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            resumption,
        }
    }

    /// Value embedded in the chat button; decoded again on click.
    pub fn wire_value(&self) -> Result<String, PlanError> {
        self.resumption.to_wire_value()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub fallback: String,
    pub title: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichMessage {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum MessageBody {
    Text { text: String },
    Rich(RichMessage),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Outbound chat payload.
pub struct Message {
    pub destination: Destination,
    pub body: MessageBody,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

impl Message {
    pub fn new(destination: Destination, body: MessageBody) -> Self {
        Self {
            destination,
            body,
            actions: Vec::new(),
        }
    }

    pub fn respond(text: impl Into<String>) -> Self {
        Self::new(Destination::Respond, MessageBody::Text { text: text.into() })
    }

    pub fn to_channel(channel: &str, text: impl Into<String>) -> Self {
        Self::new(
            Destination::Channel {
                channel: channel.to_string(),
            },
            MessageBody::Text { text: text.into() },
        )
    }

    /// Plain reply, or a directed post when a channel is known.
    pub fn directed(channel: Option<&str>, text: impl Into<String>) -> Self {
        match channel {
            Some(channel) => Self::to_channel(channel, text),
            None => Self::respond(text),
        }
    }

    pub fn rich(destination: Destination, rich: RichMessage) -> Self {
        Self::new(destination, MessageBody::Rich(rich))
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Headline text regardless of body format.
    pub fn text(&self) -> &str {
        match &self.body {
            MessageBody::Text { text } => text,
            MessageBody::Rich(rich) => &rich.text,
        }
    }

    /// Message-level actions followed by per-attachment actions, in render order.
    pub fn all_actions(&self) -> impl Iterator<Item = &Action> {
        let attachments: &[Attachment] = match &self.body {
            MessageBody::Rich(rich) => &rich.attachments,
            MessageBody::Text { .. } => &[],
        };
        self.actions
            .iter()
            .chain(attachments.iter().flat_map(|attachment| attachment.actions.iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Attachment, Destination, Message, RichMessage};
    use crate::{Params, Resumption};

    fn action(id: &str) -> Action {
        Action::new(id, "Close issue", Resumption::new("close issue", Params::new()))
    }

    #[test]
    fn unit_directed_falls_back_to_respond_without_channel() {
        assert_eq!(Message::directed(None, "hi").destination, Destination::Respond);
        assert_eq!(
            Message::directed(Some("general"), "hi").destination,
            Destination::Channel {
                channel: "general".to_string()
            }
        );
    }

    #[test]
    fn functional_all_actions_walks_message_then_attachments() {
        let rich = RichMessage {
            text: "2 things".to_string(),
            attachments: vec![
                Attachment {
                    actions: vec![action("close-a")],
                    ..Attachment::default()
                },
                Attachment {
                    actions: vec![action("close-b")],
                    ..Attachment::default()
                },
            ],
        };
        let message = Message::rich(Destination::Respond, rich).with_action(action("top"));
        let ids = message
            .all_actions()
            .map(|action| action.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["top", "close-a", "close-b"]);
        assert_eq!(message.text(), "2 things");
    }

    #[test]
    fn regression_text_message_has_no_attachment_actions() {
        let message = Message::respond("plain");
        assert_eq!(message.all_actions().count(), 0);
    }
}
