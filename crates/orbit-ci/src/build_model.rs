use orbit_core::tail_lines;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const TRAVIS_PROVIDER: &str = "travis";
const FAILED_STATUS: &str = "failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Build notification as delivered to the failed-build handler.
pub struct BuildEvent {
    pub id: u64,
    pub provider: String,
    pub status: String,
    pub repo: String,
}

impl BuildEvent {
    /// Only failed Travis builds are handled; other providers carry no log API.
    pub fn is_failed_travis(&self) -> bool {
        self.provider.trim().eq_ignore_ascii_case(TRAVIS_PROVIDER)
            && self.status.trim().eq_ignore_ascii_case(FAILED_STATUS)
    }

    pub fn summary(&self) -> String {
        format!(
            "Build event received {}, {}, {}, {}",
            self.id, self.provider, self.status, self.repo
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobProbe {
    Found(String),
    /// Sentinel reason, always starting with `sorry:`.
    Missing(&'static str),
}

/// First job id of a build payload, looking in `jobs` before `matrix`.
pub fn probe_job_id(build: &Value) -> JobProbe {
    if let Some(jobs) = build.get("jobs").filter(|value| !value.is_null()) {
        return first_id(jobs, "sorry: No entries in jobs", "sorry: no ID");
    }
    if let Some(matrix) = build.get("matrix").filter(|value| !value.is_null()) {
        return first_id(matrix, "sorry: No entries in matrix", "sorry: no matrix ID");
    }
    JobProbe::Missing("sorry: no jobs and no matrix")
}

fn first_id(entries: &Value, no_entries: &'static str, no_id: &'static str) -> JobProbe {
    let Some(first) = entries.as_array().and_then(|entries| entries.first()) else {
        return JobProbe::Missing(no_entries);
    };
    match first.get("id").and_then(render_id) {
        Some(id) => JobProbe::Found(id),
        None => JobProbe::Missing(no_id),
    }
}

/// Numeric or string id rendered as text; blank and zero count as absent.
pub fn render_id(value: &Value) -> Option<String> {
    let rendered = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_string(),
        _ => return None,
    };
    (!rendered.is_empty() && rendered != "0").then_some(rendered)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLog {
    pub job_id: Option<String>,
    pub log: Option<String>,
}

impl JobLog {
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        let payload: Value = serde_json::from_str(body)?;
        Ok(Self {
            job_id: payload.get("id").and_then(render_id),
            log: payload
                .get("log")
                .and_then(Value::as_str)
                .filter(|log| !log.trim().is_empty())
                .map(str::to_string),
        })
    }

    pub fn tail(&self, max_lines: usize) -> Option<String> {
        self.log.as_deref().map(|log| tail_lines(log, max_lines))
    }
}
