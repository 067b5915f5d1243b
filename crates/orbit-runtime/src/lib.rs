//! Host runtime for Orbit plans.
//!
//! Performs plan steps over HTTP, resolves credential placeholders, delivers
//! chat messages (Slack, with a persisted correlation index, or an in-memory
//! recorder), and drives the continuation loop in [`PlanExecutor`].

pub mod chat_sink;
pub mod credentials;
pub mod executor;
pub mod slack_sink;
pub mod slack_state_store;
pub mod transport;

pub use chat_sink::{ChatSink, DeliveryReceipt, RecordedDelivery, RecordingChatSink};
pub use credentials::{CredentialResolver, EnvCredentialResolver, GITHUB_TOKEN_ENV};
pub use executor::{ExecutionReport, PlanExecutor};
pub use slack_sink::{SlackChatSink, DEFAULT_SLACK_API_BASE};
pub use slack_state_store::{
    SlackMessageIndex, SlackPostedMessage, DEFAULT_SLACK_MESSAGE_CAP, SLACK_STATE_SCHEMA_VERSION,
};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};
