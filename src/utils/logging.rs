//! Per-module switchable logging.
//!
//! Each module that logs through these macros declares its own switch:
//! ```rust,ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_info, log_warn};
//!
//! log_info!("session {} connected", id);
//! ```
//! Flipping the const to `false` silences that module without touching
//! `RUST_LOG` filters for the rest of the crate.

#[doc(hidden)]
#[macro_export]
macro_rules! __gated_log {
    ($level:ident, $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::$level!($($arg)*);
        }
    };
}

/// Info-level log, gated on the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::__gated_log!(info, $($arg)*) };
}

/// Warn-level log, gated on the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::__gated_log!(warn, $($arg)*) };
}

/// Error-level log, gated on the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::__gated_log!(error, $($arg)*) };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::__gated_log!(debug, $($arg)*) };
}
