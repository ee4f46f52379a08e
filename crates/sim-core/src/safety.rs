//! Fault containment for simulation updates.
//!
//! [`safe_call`] runs an operation, and if it returns an error or panics,
//! records a timestamped [`Diagnostic`] and hands back a fallback value so
//! the session keeps running. [`safe`] builds a reusable wrapper with the
//! same behaviour.

use crate::SimError;
use std::backtrace::Backtrace;
use std::fmt::Display;
use std::io::{self, Write};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Structured record of a contained fault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub timestamp: String,
    pub operation: String,
    /// Type name of a returned error, or "panic" for unwinds.
    pub fault: String,
    pub message: String,
    pub backtrace: String,
}

impl Diagnostic {
    pub fn new(operation: &str, fault: &str, message: impl Into<String>) -> Self {
        Self {
            timestamp: get_timestamp(chrono::Local::now()),
            operation: operation.to_string(),
            fault: fault.to_string(),
            message: message.into(),
            backtrace: Backtrace::force_capture().to_string(),
        }
    }

    /// Multi-line report with the backtrace fenced as a code block.
    pub fn render(&self) -> String {
        format!(
            "[{}] {} failed ({}): {}\n```\n{}\n```\n",
            self.timestamp, self.operation, self.fault, self.message, self.backtrace
        )
    }
}

impl From<Diagnostic> for SimError {
    fn from(d: Diagnostic) -> Self {
        SimError::UnhandledFault {
            operation: d.operation,
            message: d.message,
        }
    }
}

/// Local time with its UTC offset.
pub fn get_timestamp<Tz>(when: chrono::DateTime<Tz>) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: Display,
{
    when.format("%Y-%m-%d %H:%M:%S %:z").to_string()
}

/// Primary destination for diagnostics.
pub trait DiagnosticSink {
    fn record(&self, diagnostic: &Diagnostic) -> io::Result<()>;
}

/// Emits diagnostics as `tracing` error events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, d: &Diagnostic) -> io::Result<()> {
        tracing::error!(
            operation = %d.operation,
            fault = %d.fault,
            timestamp = %d.timestamp,
            backtrace = %d.backtrace,
            "{}",
            d.message
        );
        Ok(())
    }
}

/// Record `diagnostic` on `sink`, falling back to `fallback` if the sink
/// fails. Nothing here panics or returns an error.
pub fn log_error(sink: &dyn DiagnosticSink, fallback: &mut dyn Write, diagnostic: &Diagnostic) {
    if let Err(e) = sink.record(diagnostic) {
        let _ = writeln!(fallback, "diagnostic sink failed: {e}");
        let _ = fallback.write_all(diagnostic.render().as_bytes());
        let _ = fallback.flush();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Run `op`, turning an error or a panic into a logged [`Diagnostic`].
pub fn contain_with<T, E, F>(
    sink: &dyn DiagnosticSink,
    fallback: &mut dyn Write,
    operation: &str,
    op: F,
) -> Result<T, Diagnostic>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    let diagnostic = match catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(e)) => Diagnostic::new(operation, std::any::type_name::<E>(), e.to_string()),
        Err(payload) => Diagnostic::new(operation, "panic", panic_message(payload.as_ref())),
    };
    log_error(sink, fallback, &diagnostic);
    Err(diagnostic)
}

/// [`contain_with`] using tracing with stderr as the fallback.
pub fn contain<T, E, F>(operation: &str, op: F) -> Result<T, Diagnostic>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    contain_with(&TracingSink, &mut io::stderr(), operation, op)
}

/// Run `op`; on any fault return `on_error` instead.
pub fn safe_call<T, E, F>(operation: &str, op: F, on_error: T) -> T
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    contain(operation, op).unwrap_or(on_error)
}

/// Wrap `f` so every call behaves like [`safe_call`] with the same
/// fallback.
pub fn safe<A, T, E, F>(operation: &'static str, on_error: T, f: F) -> impl Fn(A) -> T
where
    T: Clone,
    E: Display,
    F: Fn(A) -> Result<T, E>,
{
    move |arg| safe_call(operation, || f(arg), on_error.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::RefCell;

    struct RecordingSink(RefCell<Vec<Diagnostic>>);

    impl DiagnosticSink for RecordingSink {
        fn record(&self, d: &Diagnostic) -> io::Result<()> {
            self.0.borrow_mut().push(d.clone());
            Ok(())
        }
    }

    struct BrokenSink;

    impl DiagnosticSink for BrokenSink {
        fn record(&self, _: &Diagnostic) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn timestamp_carries_offset() {
        let t = chrono::FixedOffset::east_opt(3600)
            .unwrap()
            .timestamp_opt(0, 0)
            .unwrap();
        assert_eq!(get_timestamp(t), "1970-01-01 01:00:00 +01:00");
    }

    #[test]
    fn success_passes_through() {
        let r = safe_call("answer", || Ok::<_, SimError>(67), -1);
        assert_eq!(r, 67);
    }

    #[test]
    fn error_is_recorded_on_primary_sink() {
        let sink = RecordingSink(RefCell::new(vec![]));
        let mut fallback = Vec::new();
        let r: Result<i32, _> = contain_with(&sink, &mut fallback, "allocate", || {
            Err(SimError::InvalidAmount(-3))
        });
        let d = r.unwrap_err();
        assert_eq!(d.operation, "allocate");
        assert_eq!(d.fault, "sim_core::error::SimError");
        assert!(d.message.contains("-3"));
        assert_eq!(sink.0.borrow().len(), 1);
        assert!(fallback.is_empty());
    }

    #[test]
    fn broken_sink_falls_back() {
        let mut fallback = Vec::new();
        let r: Result<(), _> = contain_with(&BrokenSink, &mut fallback, "tick", || {
            Err::<(), _>("test error")
        });
        assert!(r.is_err());
        let out = String::from_utf8(fallback).unwrap();
        assert!(out.contains("denied"));
        assert!(out.contains("tick"));
        assert!(out.contains("test error"));
        assert!(out.contains("(&str)"));
        assert!(out.contains("```"));
    }

    #[test]
    fn panic_is_contained() {
        let sink = RecordingSink(RefCell::new(vec![]));
        let mut fallback = Vec::new();
        let r = contain_with(&sink, &mut fallback, "divide", || -> Result<i64, SimError> {
            panic!("attempt to divide by zero")
        });
        let d = r.unwrap_err();
        assert_eq!(d.fault, "panic");
        assert!(d.message.contains("divide by zero"));
        assert_eq!(
            SimError::from(d.clone()),
            SimError::UnhandledFault {
                operation: "divide".into(),
                message: d.message,
            }
        );
    }

    #[test]
    fn wrapper_uses_fallback_value() {
        let multiply = safe("multiply", -1, |(x, y): (i64, i64)| {
            x.checked_mul(y).ok_or(SimError::InvalidAmount(x))
        });
        assert_eq!(multiply((3, 4)), 12);
        assert_eq!(multiply((i64::MAX, 2)), -1);
    }
}
