//! Log subscriber setup for the binaries
//!
//! The library only emits `tracing` events. Binaries call `init_logging`
//! once at startup; `RUST_LOG` overrides the level passed in.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "arbgen=info";

/// Install a compact stderr subscriber
///
/// Later calls are ignored.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr),
    );

    let _ = tracing::subscriber::set_global_default(subscriber);
}
