//! tracing subscriber setup for `hkseries`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter directive used when `RUST_LOG` is unset
fn fallback_directive(verbose: bool) -> &'static str {
    if verbose {
        "healthkit_core=debug,hkseries=debug,info"
    } else {
        "info"
    }
}

/// Install the global subscriber for the binary
///
/// `RUST_LOG` takes precedence over `verbose`. Events are written compactly
/// to stderr; stdout only carries command output.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback_directive(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Route library events to libtest's captured output; repeat calls are no-ops
#[cfg(test)]
pub(crate) fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("healthkit_core=debug"))
        .try_init();
}
