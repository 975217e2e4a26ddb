//! Macros for generating log messages, gated behind the `gc_debug` feature.
//!
//! With `gc_debug` off, these expand to nothing, so call sites pay no cost in
//! a release build that has opted out of allocator diagnostics.

#[macro_export]
macro_rules! warning {
    ($($arg:tt)+) => {
        #[cfg(feature = "gc_debug")]
        {
            $crate::log::init_logger();
            tracing::event!(tracing::Level::WARN, message = format_args!($($arg)+));
        }
    };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {
        #[cfg(feature = "gc_debug")]
        {
            $crate::log::init_logger();
            tracing::event!(tracing::Level::DEBUG, message = format_args!($($arg)+));
        }
    };
}

#[macro_export]
macro_rules! trace {
    ($($arg:tt)+) => {
        #[cfg(feature = "gc_debug")]
        {
            $crate::log::init_logger();
            tracing::event!(tracing::Level::TRACE, message = format_args!($($arg)+));
        }
    };
}

pub use crate::{debug, trace, warning};
