//! Diagnostic tracing for the iteration engine.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: status lines, skipped files and storage
//!   failures, filtered via `RUST_LOG` and written to stderr.
//!
//! - **Command output (`main`)**: the JSON result of each invocation on
//!   stdout. Always printed, unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset: this crate's warnings only.
pub const DEFAULT_FILTER: &str = "dir_iterator=warn";

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG` env var. Defaults to [`DEFAULT_FILTER`] if unset.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=dir_iterator=info dir-iterator next ./images
/// ```
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
