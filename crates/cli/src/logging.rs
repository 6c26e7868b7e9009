// Logging setup
// Diagnostics go to stderr; stdout carries node results only

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FORMAT_ENV: &str = "FLEETPING_LOG_FORMAT";
const CRATES: &[&str] = &["fleetping_core", "fleetping_infra_system", "fleet_ping"];

/// Default filter when RUST_LOG is not set
pub fn default_directives(verbose: bool) -> String {
    let level = if verbose { "info" } else { "warn" };
    let mut directives = vec!["warn".to_string()];
    directives.extend(CRATES.iter().map(|c| format!("{c}={level}")));
    directives.join(",")
}

/// Install the global subscriber; a second call is a no-op
pub fn init(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let log_format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "pretty".to_string());

    let result = match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("logging already initialised: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_quiet() {
        let directives = default_directives(false);
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("fleetping_core=warn"));
    }

    #[test]
    fn test_default_directives_verbose() {
        let directives = default_directives(true);
        assert!(directives.contains("fleetping_core=info"));
        assert!(directives.contains("fleetping_infra_system=info"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
