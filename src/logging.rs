//! Log subscriber set-up for the command-line host

use std::io::IsTerminal;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise the crate logs at `info`, or `debug`
/// when `verbose` is on. Calling this twice is harmless.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "datasweep=debug" } else { "datasweep=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false),
        )
        .try_init();
}
