//! Command, event, and continuation handlers for the Orbit chatops bot.
//!
//! [`ChatopsPlanBuilder`] is the single [`orbit_plan::PlanSource`]: chat
//! commands and button clicks enter through `build_initial_plan`, step results
//! come back through `build_continuation_plan`, and inbound issue and build
//! events have their own entry points. Every handler is a pure function of its
//! inputs; identities and channel names come from [`PlanBuilderConfig`].

pub mod builder;
pub mod config;
pub mod failed_build;
pub mod issue_search;
pub mod issue_work;
pub mod move_issue;
pub mod names;
pub mod personal_issue;

pub use builder::ChatopsPlanBuilder;
pub use config::PlanBuilderConfig;
