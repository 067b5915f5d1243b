//! GitHub issue helpers for Orbit handlers.
//!
//! Read-only issue projections parsed from REST/search responses, the chat
//! formatter for issue lists, search query construction, request builders for
//! issue/label/comment endpoints, and chat-user to GitHub-login resolution.

pub mod github_endpoints;
pub mod identity;
pub mod issue_filter;
pub mod issue_format;
pub mod issue_model;
pub mod search_query;
