use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,laliga_tips=debug";

/// Installs the fmt subscriber once per process; `RUST_LOG` overrides the default filter.
/// Logs go to stderr so stdout stays clean for the composed digest.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
