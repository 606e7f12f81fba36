//! Thin wrappers around the `log` facade, gated by the `logging` feature
//! so embedders that want a zero-dependency build can turn it off.

macro_rules! log_trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "logging")]
        log::trace!($($arg)*);
    }};
}

macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "logging")]
        log::debug!($($arg)*);
    }};
}

macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "logging")]
        log::warn!($($arg)*);
    }};
}

pub(crate) use log_debug;
pub(crate) use log_trace;
pub(crate) use log_warn;
