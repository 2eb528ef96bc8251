//! Logging initialization.

use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise logs at `debug` when `verbose` is
/// set and `info` when not. Fails if a global subscriber is already set.
pub fn init(verbose: bool) -> Result<(), TryInitError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::registry()
        .with(filter(verbose, rust_log.as_deref()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
}

/// Filter from `RUST_LOG` directives, or the default level when they are
/// missing or unparseable.
fn filter(verbose: bool, directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level(verbose)))
}

fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}
