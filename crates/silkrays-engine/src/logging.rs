//! Centralized timestamped logging
//!
//! All logs should go through `logi!`, `logw!`, or `loge!` so they include:
//!   <timestamp> [TAG][thread] message
//!
//! The macros are exported from the engine so the showcase binary and the engine
//! share one format.

// Local time is used when available; it falls back to UTC.
#[doc(hidden)]
pub fn log_timestamp() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    let fmt = time::macros::format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    );
    now.format(fmt).unwrap_or_else(|_| "<time-format-error>".to_string())
}

#[doc(hidden)]
pub fn log_thread_name() -> String {
    std::thread::current().name().unwrap_or("thread").to_string()
}

/// Info log: printed to stdout
#[macro_export]
macro_rules! logi {
    ($tag:expr, $($arg:tt)*) => {{
        println!("{} [{}][{}] {}", $crate::logging::log_timestamp(), $tag, $crate::logging::log_thread_name(), format!($($arg)*));
    }};
}

/// Warning log: printed to stderr
#[macro_export]
macro_rules! logw {
    ($tag:expr, $($arg:tt)*) => {{
        eprintln!("{} [{}][{}] {}", $crate::logging::log_timestamp(), $tag, $crate::logging::log_thread_name(), format!($($arg)*));
    }};
}

/// Error log: printed to stderr
#[macro_export]
macro_rules! loge {
    ($tag:expr, $($arg:tt)*) => {{
        eprintln!("{} [{}][{}] {}", $crate::logging::log_timestamp(), $tag, $crate::logging::log_thread_name(), format!($($arg)*));
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_has_millisecond_precision() {
        let ts = log_timestamp();
        // "YYYY-MM-DD HH:MM:SS.mmm"
        assert_eq!(ts.len(), 23, "unexpected timestamp: {ts}");
        assert_eq!(&ts[19..20], ".");
    }
}
