use std::collections::BTreeSet;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use orbit_plan::{CorrelationId, Destination, Message};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub channel: Option<String>,
    /// Platform id of the posted message, when the sink has one.
    pub reference: Option<String>,
    /// True when an earlier correlated message was replaced.
    pub updated: bool,
}

#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Deliver `message`; `Destination::Respond` goes to `respond_channel`.
    async fn deliver(&self, message: &Message, respond_channel: Option<&str>)
        -> Result<DeliveryReceipt>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDelivery {
    pub message: Message,
    pub channel: Option<String>,
    pub updated: bool,
}

/// In-memory sink for dry runs and tests.
#[derive(Debug, Default)]
pub struct RecordingChatSink {
    state: Mutex<RecordingState>,
}

#[derive(Debug, Default)]
struct RecordingState {
    deliveries: Vec<RecordedDelivery>,
    correlations: BTreeSet<CorrelationId>,
}

impl RecordingChatSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<RecordedDelivery> {
        self.state
            .lock()
            .map(|state| state.deliveries.clone())
            .unwrap_or_default()
    }

    pub fn texts(&self) -> Vec<String> {
        self.deliveries()
            .iter()
            .map(|delivery| delivery.message.text().to_string())
            .collect()
    }
}

#[async_trait]
impl ChatSink for RecordingChatSink {
    async fn deliver(
        &self,
        message: &Message,
        respond_channel: Option<&str>,
    ) -> Result<DeliveryReceipt> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("recording chat sink lock is poisoned"))?;
        let (channel, updated) = match &message.destination {
            Destination::Respond => (respond_channel.map(str::to_string), false),
            Destination::Channel { channel } => (Some(channel.clone()), false),
            Destination::Update {
                correlation_id,
                channel,
            } => (
                channel
                    .clone()
                    .or_else(|| respond_channel.map(str::to_string)),
                !state.correlations.insert(correlation_id.clone()),
            ),
        };
        state.deliveries.push(RecordedDelivery {
            message: message.clone(),
            channel: channel.clone(),
            updated,
        });
        Ok(DeliveryReceipt {
            channel,
            reference: Some(state.deliveries.len().to_string()),
            updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use orbit_plan::{CorrelationId, Destination, Message, MessageBody};

    use super::{ChatSink, RecordingChatSink};

    fn correlated(text: &str) -> Message {
        Message::new(
            Destination::Update {
                correlation_id: CorrelationId::new("jess-issue/sol/workflow/3"),
                channel: None,
            },
            MessageBody::Text {
                text: text.to_string(),
            },
        )
    }

    #[tokio::test]
    async fn functional_recording_sink_resolves_channels() {
        let sink = RecordingChatSink::new();
        sink.deliver(&Message::respond("hi"), Some("C1"))
            .await
            .expect("respond");
        sink.deliver(&Message::to_channel("general", "news"), Some("C1"))
            .await
            .expect("channel");
        let channels = sink
            .deliveries()
            .into_iter()
            .map(|delivery| delivery.channel)
            .collect::<Vec<_>>();
        assert_eq!(
            channels,
            vec![Some("C1".to_string()), Some("general".to_string())]
        );
    }

    #[tokio::test]
    async fn integration_second_correlated_delivery_counts_as_update() {
        let sink = RecordingChatSink::new();
        let first = sink
            .deliver(&correlated("v1"), Some("status"))
            .await
            .expect("first");
        let second = sink
            .deliver(&correlated("v2"), Some("status"))
            .await
            .expect("second");
        assert!(!first.updated);
        assert!(second.updated);
        assert_eq!(sink.texts(), vec!["v1".to_string(), "v2".to_string()]);
    }
}
