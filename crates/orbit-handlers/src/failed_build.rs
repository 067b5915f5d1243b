//! Failed Travis build: fetch the build, find its first job, fetch the job log.

use chrono::{DateTime, Utc};
use orbit_ci::build_model::render_id;
use orbit_ci::{probe_job_id, BuildEvent, JobLog, JobProbe};
use orbit_plan::{Message, Params, Plan, PlanError, Resumption, Step, StepOutcome};
use serde_json::Value;

use crate::builder::{response_body, ChatopsPlanBuilder};
use crate::names;

pub(crate) fn failed_build(builder: &ChatopsPlanBuilder, event: &BuildEvent) -> Plan {
    if !event.is_failed_travis() {
        tracing::debug!(build = event.id, provider = %event.provider, status = %event.status, "ignoring build event");
        return Plan::empty();
    }
    let config = builder.config();
    let build_id = event.id.to_string();
    let step = Step::new(builder.travis().fetch_build(&build_id))
        .on_success(Resumption::new(
            names::RECEIVE_BUILD_DETAILS,
            Params::new()
                .with("repo", event.repo.as_str())
                .with("build", build_id.as_str())
                .with("channel", config.alert_channel.as_str()),
        ))
        .report_errors_to(
            Some(&config.alert_channel),
            &builder.travis().build_url(&build_id),
        );
    Plan::of_message(Message::to_channel(&config.build_channel, event.summary())).with_step(step)
}

pub(crate) fn receive_build_details(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    outcome: &StepOutcome,
    _now: DateTime<Utc>,
) -> Result<Plan, PlanError> {
    let config = builder.config();
    let build: Value = serde_json::from_str(response_body(outcome, "build details")?)
        .map_err(|error| PlanError::malformed("build details", error))?;
    let repo = params.text_or("repo", "unknown repo");
    let build_id = build
        .get("id")
        .and_then(render_id)
        .or_else(|| params.text("build"))
        .unwrap_or_else(|| "unknown build".to_string());

    let job_id = match probe_job_id(&build) {
        JobProbe::Found(job_id) => job_id,
        JobProbe::Missing(reason) => {
            tracing::debug!(build = %build_id, reason, "no job in build");
            return Ok(Plan::of_message(Message::to_channel(
                &config.alert_channel,
                format!("Sorry, couldn't find the job inside the build for {build_id} on {repo}."),
            )));
        }
    };
    let step = Step::new(builder.travis().fetch_job(&job_id))
        .on_success(Resumption::new(
            names::RECEIVE_JOB_LOG,
            Params::new()
                .with("repo", repo.as_str())
                .with("job", job_id.as_str())
                .with("channel", config.alert_channel.as_str()),
        ))
        .report_errors_to(Some(&config.alert_channel), &builder.travis().job_url(&job_id));
    Ok(Plan::of_message(Message::to_channel(
        &config.build_channel,
        format!("Found a job id {job_id} in repo {repo}"),
    ))
    .with_step(step))
}

pub(crate) fn receive_job_log(
    builder: &ChatopsPlanBuilder,
    params: &Params,
    outcome: &StepOutcome,
    _now: DateTime<Utc>,
) -> Result<Plan, PlanError> {
    let config = builder.config();
    let job = JobLog::parse(response_body(outcome, "job log")?)
        .map_err(|error| PlanError::malformed("job log", error))?;
    let job_id = job
        .job_id
        .clone()
        .or_else(|| params.text("job"))
        .unwrap_or_else(|| "unknown job".to_string());
    let text = match job.tail(config.log_tail_lines) {
        Some(tail) => format!("Found a log for {job_id}\n```\n{tail}\n```"),
        None => format!("Did not find the log for job {job_id}."),
    };
    Ok(Plan::of_message(Message::to_channel(&config.build_channel, text)))
}

#[cfg(test)]
mod tests {
    use orbit_ci::BuildEvent;
    use orbit_plan::{
        Continuation, Destination, Params, PlanSource, Resumption, StepOutcome, ERROR_REPORTER,
    };
    use serde_json::json;

    use crate::builder::test_support::{builder, now, success};
    use crate::names;

    fn event(status: &str) -> BuildEvent {
        BuildEvent {
            id: 314,
            provider: "travis".to_string(),
            status: status.to_string(),
            repo: "workflow".to_string(),
        }
    }

    fn channel_of(destination: &Destination) -> Option<&str> {
        match destination {
            Destination::Channel { channel } => Some(channel),
            _ => None,
        }
    }

    #[test]
    fn unit_passing_build_produces_empty_plan() {
        let plan = builder().build_failed_build_plan(&event("passed")).expect("plan");
        assert!(plan.is_empty());
    }

    #[test]
    fn functional_failed_build_notifies_and_fetches_build() {
        let plan = builder().build_failed_build_plan(&event("failed")).expect("plan");
        let notice = plan.messages().next().expect("notice");
        assert_eq!(channel_of(&notice.destination), Some("general"));
        let step = plan.steps().next().expect("step");
        assert_eq!(step.instruction.url, "https://api.travis-ci.org/builds/314");
        let Continuation::Resume(on_error) = &step.on_error else {
            panic!("expected error reporter");
        };
        let Continuation::Resume(on_success) = &step.on_success else {
            panic!("expected build details continuation");
        };
        assert_eq!(on_success.params.text("channel").as_deref(), Some("alerts"));
        assert_eq!(on_error.name, ERROR_REPORTER);
        assert_eq!(on_error.params.text("channel").as_deref(), Some("alerts"));
        assert_eq!(
            on_error.params.text("msg").as_deref(),
            Some("https://api.travis-ci.org/builds/314")
        );
    }

    #[test]
    fn regression_build_without_jobs_reports_to_alert_channel() {
        let plan = builder()
            .build_continuation_plan(
                &Resumption::new(
                    names::RECEIVE_BUILD_DETAILS,
                    Params::new().with("repo", "workflow").with("build", "314"),
                ),
                &success(json!({"id": 314})),
                now(),
            )
            .expect("plan");
        assert_eq!(plan.len(), 1);
        let message = plan.messages().next().expect("message");
        assert_eq!(channel_of(&message.destination), Some("alerts"));
        assert_eq!(
            message.text(),
            "Sorry, couldn't find the job inside the build for 314 on workflow."
        );
    }

    #[test]
    fn integration_build_job_and_log_chain() {
        let builder = builder();
        let details = builder
            .build_continuation_plan(
                &Resumption::new(
                    names::RECEIVE_BUILD_DETAILS,
                    Params::new().with("repo", "workflow"),
                ),
                &success(json!({"id": 314, "matrix": [{"id": 900}]})),
                now(),
            )
            .expect("details");
        assert_eq!(
            details.messages().next().map(|message| message.text().to_string()),
            Some("Found a job id 900 in repo workflow".to_string())
        );
        let step = details.steps().next().expect("job step");
        assert_eq!(step.instruction.url, "https://api.travis-ci.org/jobs/900");
        let Continuation::Resume(receive_log) = &step.on_success else {
            panic!("expected log continuation");
        };
        assert_eq!(receive_log.params.text("channel").as_deref(), Some("alerts"));

        let found = builder
            .build_continuation_plan(
                receive_log,
                &success(json!({"id": 900, "log": "step 1\nstep 2\nFAILED\n"})),
                now(),
            )
            .expect("log");
        assert_eq!(
            found.messages().next().map(|message| message.text().to_string()),
            Some("Found a log for 900\n```\nstep 1\nstep 2\nFAILED\n```".to_string())
        );

        let missing = builder
            .build_continuation_plan(receive_log, &success(json!({"id": 900})), now())
            .expect("missing");
        assert_eq!(
            missing.messages().next().map(|message| message.text().to_string()),
            Some("Did not find the log for job 900.".to_string())
        );
    }

    #[test]
    fn regression_failure_outcome_on_success_path_is_malformed() {
        let result = builder().build_continuation_plan(
            &Resumption::new(names::RECEIVE_JOB_LOG, Params::new()),
            &StepOutcome::Failure {
                status: None,
                error: "connection reset".to_string(),
                body: None,
            },
            now(),
        );
        assert!(result.is_err());
    }
}
