use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::{fmt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_DIRECTIVES: &str = "info,breadcrumb=info";

/// Initialize tracing subscriber with sane defaults and optional env overrides.
///
/// Environment variables:
/// - `RUST_LOG`    : overrides filter directives (e.g. `debug,breadcrumb=trace`).
/// - `LOG_FORMAT`  : `json` (default) or `pretty` (compact, human-friendly).
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let log_format = std::env::var("LOG_FORMAT")
        .unwrap_or_else(|_| "json".to_string())
        .to_lowercase();

    if matches!(log_format.as_str(), "pretty" | "compact") {
        fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_level(true)
            .with_timer(SystemTime)
            .compact()
            .finish()
            .init();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_level(true)
            .with_timer(SystemTime)
            .json()
            .finish()
            .init();
    }
}
