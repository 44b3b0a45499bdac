//! Tracing subscriber bootstrap

use pizza_config::Verbosity;
use tracing_subscriber::EnvFilter;

/// Default log level for a verbosity; `RUST_LOG` takes precedence
pub fn default_level(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Plain => "warn",
        Verbosity::Ci => "info",
        Verbosity::Doge => "debug",
    }
}

/// Install the global fmt subscriber writing to stderr.
///
/// Only the first call in a process installs anything; later calls return
/// `false`.
pub fn init(verbosity: Verbosity) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .is_ok()
}
