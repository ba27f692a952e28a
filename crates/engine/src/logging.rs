//! Tracing subscriber setup
//!
//! Log targets used by this crate:
//! - `catalog::query`: executor and error reports
//! - `catalog::live`: subscription lifecycle
//! - `catalog::resolve`: reference fetches
//! - `catalog::store`: in-memory store listeners and writes

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber.
///
/// Returns `false` when a global subscriber was already installed; the
/// existing one is kept.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(true)
        .try_init()
        .is_ok()
}
