//! Diagnostic logging on stderr
//!
//! `RUST_LOG` wins when set (e.g. `RUST_LOG=brief::anchors=debug`). Otherwise
//! `--verbose` enables debug, `--quiet` keeps only errors and the default is warn.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Level used when `RUST_LOG` is not set
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}

pub fn init(verbose: bool, quiet: bool, color: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(color)
        .with_target(verbose)
        .without_time()
        .with_filter(filter);

    // A second init (tests) is not an error worth reporting
    let _ = tracing_subscriber::registry().with(console_layer).try_init();
}
