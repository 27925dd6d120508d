use std::env;
use std::io;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter, e.g. `MACROMATE_LOG=debug`.
pub const LOG_ENV: &str = "MACROMATE_LOG";

/// Build the filter from `MACROMATE_LOG`, or `default_level` when unset.
/// HTTP client internals stay at `warn` either way.
fn build_filter(default_level: &str) -> EnvFilter {
    let base = env::var(LOG_ENV).map_or_else(
        |_| EnvFilter::new(default_level),
        |directive| EnvFilter::new(&directive),
    );
    base.add_directive(
        "hyper=warn"
            .parse()
            .unwrap_or_else(|_| tracing::Level::WARN.into()),
    )
    .add_directive(
        "reqwest=warn"
            .parse()
            .unwrap_or_else(|_| tracing::Level::WARN.into()),
    )
}

/// Install the global subscriber. Logs go to stderr so `--json` output on
/// stdout stays machine readable. A second call is a no-op.
pub fn init(default_level: &str) {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(io::stderr);

    let _ = tracing_subscriber::registry()
        .with(build_filter(default_level))
        .with(layer)
        .try_init();
}
