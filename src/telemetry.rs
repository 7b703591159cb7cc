//! Subscriber setup for the `harborview` binary.
//!
//! Library code emits `log` records and `tracing` spans; `init` installs a
//! formatting subscriber that receives both. Filtering follows `RUST_LOG`
//! and defaults to `info`.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
    if installed.is_err() {
        log::debug!("a global subscriber is already installed");
    }
}
