//! CLI timing and latency profiling utilities.
//!
//! Uses `tracing` spans with automatic duration tracking via `FmtSpan::CLOSE`.
//! Functions annotated with `#[instrument]` will automatically have their
//! execution time logged when the span closes.
//!
//! # Usage
//!
//! Initialize tracing with timing enabled:
//! ```ignore
//! use timing::init_tracing;
//! init_tracing(true, true); // verbose=true, timing=true
//! ```
//!
//! Then use `#[instrument]` on functions to automatically track timing:
//! ```ignore
//! #[tracing::instrument(skip_all, name = "wallet")]
//! async fn run_wallet(ctx: &mut StateCtx) -> anyhow::Result<()> {
//!     // ...
//! }
//! ```
//!
//! `log` records emitted by the business crate are bridged into the same
//! subscriber, so `--verbose` shows request and dialog tracing too.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Default level when `RUST_LOG` does not say otherwise.
///
/// Span close events are logged at INFO, so `--timing` needs at least that.
fn default_level(verbose: bool, timing: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else if timing {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    }
}

/// Initialize tracing subscriber with optional timing output.
///
/// `RUST_LOG` still refines the filter, e.g. `RUST_LOG=keeper_business=trace`.
pub fn init_tracing(verbose: bool, timing: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(verbose, timing).into())
        .from_env_lossy();

    let span_events = if timing {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_level(true)
                .with_span_events(span_events)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
