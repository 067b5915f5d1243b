use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub(crate) const LOG_FILTER_ENV: &str = "ORBIT_LOG";

fn orbit_env_filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives.map(str::trim).unwrap_or_default())
}

/// Logs go to stderr; stdout carries plan JSON and the run report.
pub(crate) fn init_tracing() {
    let directives = std::env::var(LOG_FILTER_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(orbit_env_filter(directives.as_deref()))
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::orbit_env_filter;

    #[test]
    fn unit_filter_defaults_to_warn() {
        assert_eq!(orbit_env_filter(None).to_string(), "warn");
        assert_eq!(orbit_env_filter(Some("  ")).to_string(), "warn");
    }

    #[test]
    fn functional_filter_accepts_per_crate_directives() {
        let filter = orbit_env_filter(Some("orbit_runtime=debug")).to_string();
        assert!(filter.contains("orbit_runtime=debug"));
    }
}
