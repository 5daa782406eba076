//! Logging initialization
//!
//! Diagnostics go through `tracing` to stderr so they never mix with the
//! progress lines and `--json` output on stdout. `RUST_LOG` takes precedence
//! over `--verbose`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_logging(verbose: bool) {
  let level = if verbose { "debug" } else { "warn" };
  let filter = tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string()));

  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr),
    )
    .init();
}
