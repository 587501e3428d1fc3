//! Structured diagnostic events.
//!
//! Adapters and the cache never surface errors to their callers.  Instead
//! every fallback substitution or failed request is reported here, so that an
//! external log collaborator can tell "degraded" (warnings) from "broken"
//! (errors).
//!
//! ## For contributors
//!
//! [`TracingDiagnostics`] is what the binary uses.  Tests use
//! [`RecordingDiagnostics`] to assert on exactly which events were emitted.

use serde_json::Value;

/// Severity of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Something was substituted but the result is still usable.
    Warning,
    /// An outright request or storage failure.
    Error,
}

/// Sink for diagnostic events.
pub trait Diagnostics: Send + Sync {
    /// Record one event.  `source` names the emitting component (for example
    /// `daily_byte.trivia` or `daily_byte.cache`).
    fn log(&self, level: Level, source: &str, message: &str, details: Value);
}

/// Forwards diagnostics to [`tracing`] with structured fields.
#[derive(Debug, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn log(&self, level: Level, source: &str, message: &str, details: Value) {
        match level {
            Level::Warning => tracing::warn!(source, %details, "{message}"),
            Level::Error => tracing::error!(source, %details, "{message}"),
        }
    }
}

#[cfg(test)]
pub use recording::RecordingDiagnostics;

#[cfg(test)]
mod recording {
    use std::sync::Mutex;

    use serde_json::Value;

    use super::{Diagnostics, Level};

    /// One captured diagnostic event.
    #[derive(Debug, Clone)]
    pub struct Event {
        pub level: Level,
        pub source: String,
        pub message: String,
        pub details: Value,
    }

    /// Keeps every event in memory for later inspection.
    #[derive(Debug, Default)]
    pub struct RecordingDiagnostics {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingDiagnostics {
        pub fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        /// Events whose message contains `needle`.
        pub fn matching(&self, needle: &str) -> Vec<Event> {
            self.events()
                .into_iter()
                .filter(|e| e.message.contains(needle))
                .collect()
        }
    }

    impl Diagnostics for RecordingDiagnostics {
        fn log(&self, level: Level, source: &str, message: &str, details: Value) {
            self.events.lock().unwrap().push(Event {
                level,
                source: source.to_string(),
                message: message.to_string(),
                details,
            });
        }
    }
}
