//! Logging macros for the weft loader and its collaborators.
//!
//! Thin wrappers over `tracing` so that every crate logs through the same
//! surface, tagged with the emitting module. The library installs no
//! subscriber; embedders pick their own.

/// Macros for logging at specific levels.
#[macro_export]
macro_rules! log_error {
    ($module:expr, $($arg:tt)*) => {
        tracing::event!(tracing::Level::ERROR, module = $module, $($arg)*)
    }
}

#[macro_export]
macro_rules! log_warn {
    ($module:expr, $($arg:tt)*) => {
        tracing::event!(tracing::Level::WARN, module = $module, $($arg)*)
    }
}

#[macro_export]
macro_rules! log_info {
    ($module:expr, $($arg:tt)*) => {
        tracing::event!(tracing::Level::INFO, module = $module, $($arg)*)
    }
}

#[macro_export]
macro_rules! log_debug {
    ($module:expr, $($arg:tt)*) => {
        tracing::event!(tracing::Level::DEBUG, module = $module, $($arg)*)
    }
}

#[macro_export]
macro_rules! log_trace {
    ($module:expr, $($arg:tt)*) => {
        tracing::event!(tracing::Level::TRACE, module = $module, $($arg)*)
    }
}
