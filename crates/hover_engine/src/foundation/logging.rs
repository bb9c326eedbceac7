//! Logging utilities and structured logging support
//!
//! The library only emits through the `log` facade; binaries call [`init`]
//! once to install the `env_logger` backend (filter with `RUST_LOG`).

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system, defaulting to `info` when `RUST_LOG` is unset
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
