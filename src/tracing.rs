use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Install the process-wide subscriber for game-finder binaries.
///
/// Events carry their target (`catalog`, `advisor`, `collections`, `api`) plus file and
/// line. `RUST_LOG` wins over `default_filter`; calling twice is an error.
pub fn init_tracing(default_filter: &str) -> Result<(), anyhow::Error> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}
