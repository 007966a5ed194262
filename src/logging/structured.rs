//! Structured logging utilities.
//!
//! Lines are an upper-snake event name followed by `key=value` pairs,
//! prefixed with a context: `[ingest=..] [message=..]` on the ingestion
//! path, `[device=..]` in the presence controller. Any `Display` value can
//! serve as the context of the `log_*!` macros.

use std::fmt;

/// Logging context for one ingest invocation.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub ingest_id: String,
    pub message_id: Option<String>,
}

impl LogContext {
    pub fn new(ingest_id: &str) -> Self {
        Self {
            ingest_id: ingest_id.to_string(),
            message_id: None,
        }
    }

    pub fn with_message(&self, message_id: &str) -> Self {
        Self {
            ingest_id: self.ingest_id.clone(),
            message_id: Some(message_id.to_string()),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message_id {
            Some(mid) => write!(f, "[ingest={}] [message={}]", self.ingest_id, mid),
            None => write!(f, "[ingest={}]", self.ingest_id),
        }
    }
}

/// Logging context for the presence controller of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceLogContext {
    pub device_id: String,
}

impl DeviceLogContext {
    pub fn new(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
        }
    }
}

impl fmt::Display for DeviceLogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[device={}]", self.device_id)
    }
}

/// Log an info message with context.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr $(,)?) => {
        log::info!("{} {}", $ctx, $event);
    };
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),+ $(,)?) => {
        log::info!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),+), $($value),+)
        );
    };
}

/// Log a warning message with context.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr $(,)?) => {
        log::warn!("{} {}", $ctx, $event);
    };
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),+ $(,)?) => {
        log::warn!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),+), $($value),+)
        );
    };
}

/// Log an error message with context.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $event:expr $(,)?) => {
        log::error!("{} {}", $ctx, $event);
    };
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),+ $(,)?) => {
        log::error!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),+), $($value),+)
        );
    };
}

/// Log a debug message with context.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $event:expr $(,)?) => {
        log::debug!("{} {}", $ctx, $event);
    };
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),+ $(,)?) => {
        log::debug!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),+), $($value),+)
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_context_display() {
        let ctx = LogContext::new("ingest-1a2b3c4d");
        assert_eq!(format!("{}", ctx), "[ingest=ingest-1a2b3c4d]");

        let ctx_with_message = ctx.with_message("m1");
        assert_eq!(
            format!("{}", ctx_with_message),
            "[ingest=ingest-1a2b3c4d] [message=m1]"
        );
    }

    #[test]
    fn test_device_context_display() {
        let ctx = DeviceLogContext::new("5f0c");
        assert_eq!(ctx.to_string(), "[device=5f0c]");
        crate::log_info!(ctx, "PRESENCE_ACTIVE", observers = 1);
    }

    #[test]
    fn test_macros_accept_any_number_of_pairs() {
        let ctx = LogContext::new("ingest-1a2b3c4d");
        crate::log_debug!(ctx, "NO_FIELDS");
        crate::log_info!(ctx, "ONE_FIELD", count = 1);
        crate::log_warn!(ctx, "TWO_FIELDS", count = 2, name = "x",);
        crate::log_error!(ctx, "THREE_FIELDS", a = 1, b = 2, c = 3);
    }
}
