//! Structured logging setup for the bootstrap.
//!
//! All bootstrap events are emitted through `tracing` with target `appproc`.
//! The subscriber writes to stderr; the filter comes from `APP_PROCESS_LOG`,
//! then `RUST_LOG`, then defaults to `info`.

use std::env;

use once_cell::sync::OnceCell;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Log target used by every bootstrap event.
pub const LOG_TAG: &str = "appproc";

static INIT: OnceCell<()> = OnceCell::new();

fn filter_directives() -> String {
    env::var("APP_PROCESS_LOG")
        .ok()
        .or_else(|| env::var("RUST_LOG").ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "info".to_string())
}

/// Install the global subscriber once. Returns false when a subscriber was
/// already installed by someone else (tests, embedding hosts).
pub fn init() -> bool {
    if INIT.get().is_some() {
        return true;
    }

    let filter = EnvFilter::try_new(filter_directives()).unwrap_or_else(|e| {
        eprintln!("app_process: invalid log filter ({e}); using 'info'");
        EnvFilter::new("info")
    });
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(crate::color::color_enabled_stderr())
        .with_target(true);

    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        return false;
    }

    let _ = INIT.set(());
    true
}
