//! Observability for the panel
//!
//! Structured JSON logging keyed by typed [`Event`]s, plus scope-based
//! begin/complete logging for catalog renders and query executions.
//!
//! ```ignore
//! use wherepanel::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::QueryReceived, &[("query", "SELECT 1")]);
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

/// Log a typed event at its own severity
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a typed event with fields at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
