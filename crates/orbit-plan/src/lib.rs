//! Plan model for Orbit chatops handlers.
//!
//! A command or event is turned into a [`Plan`]: an ordered list of chat
//! [`Message`]s and [`Step`]s. Each step wraps one external HTTP call and names
//! the continuation to run when it succeeds or fails. Continuations are
//! serializable [`Resumption`]s (name + parameter bag) so they can cross an
//! asynchronous boundary or ride along in a chat button.

pub mod action_registry;
pub mod correlation;
pub mod error;
pub mod error_report;
pub mod instruction;
pub mod invocation;
pub mod message;
pub mod params;
pub mod plan;

pub use action_registry::{action_id, ActionRegistry};
pub use correlation::{CorrelationId, CORRELATION_PARAM};
pub use error::PlanError;
pub use error_report::{report, report_from_bag, ERROR_REPORTER};
pub use instruction::{CredentialRef, HttpMethod, Instruction, TargetSystem};
pub use invocation::{Invocation, InvocationContext};
pub use message::{Action, Attachment, Destination, Message, MessageBody, RichMessage};
pub use params::{ParamValue, Params};
pub use plan::{Continuation, Plan, PlanItem, PlanSource, Resumption, Step, StepOutcome};
