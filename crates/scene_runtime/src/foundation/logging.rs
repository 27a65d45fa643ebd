//! Logging facade used across the runtime
//!
//! The library only emits through the `log` macros; binaries pick the
//! backend. [`init`] wires up `env_logger` for the demo and for tools.

pub use log::{debug, error, info, trace, warn};

/// Initialize `env_logger` from the `RUST_LOG` environment variable
pub fn init() {
    env_logger::init();
}

/// Initialize `env_logger` with a fallback filter when `RUST_LOG` is unset
pub fn init_with_default(filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
}
