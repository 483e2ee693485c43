//! Observability for the plan guard
//!
//! - Structured logging (JSON lines)
//! - Counters for every terminal guard state
//! - Typed events
//!
//! Observability is read-only: it never changes a guard verdict.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{GuardMetrics, MetricsSnapshot};

/// Log a guard event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
