//! Travis CI helpers for Orbit failed-build handling.
//!
//! Inbound failed-build events, job-id probing over build payloads, job log
//! lookup, and request builders for the builds/jobs endpoints.

pub mod build_model;
pub mod travis_endpoints;

pub use build_model::{probe_job_id, BuildEvent, JobLog, JobProbe};
pub use travis_endpoints::{TravisEndpoints, DEFAULT_TRAVIS_API_BASE};
