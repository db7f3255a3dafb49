//! Session-tagged logging macros gated by a module-level `ENABLE_LOGS` flag.
//!
//! Usage:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! use crate::{session_info, session_warn};
//!
//! session_info!(token, "targets ready: {}", count);
//! ```
//! Every line is prefixed with `[session <token>]` so interleaved sessions
//! (an abandoned one still resolving, a fresh one playing) stay readable.

/// Initializes `env_logger` from `RUST_LOG`, defaulting to `info`.
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}

#[macro_export]
macro_rules! session_info {
    ($token:expr, $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!("[session {}] {}", $token, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! session_warn {
    ($token:expr, $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!("[session {}] {}", $token, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! session_debug {
    ($token:expr, $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!("[session {}] {}", $token, format_args!($($arg)*));
        }
    };
}
