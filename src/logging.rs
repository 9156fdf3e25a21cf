//! Diagnostic logging setup.
//!
//! User-facing output goes through the palette and progress helpers; this
//! subscriber only carries diagnostics, which stay hidden unless `--verbose`
//! or `RUST_LOG` asks for them.

use std::io;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber, writing compact lines to stderr.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "starli=debug" } else { "starli=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(verbose)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .try_init();

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
