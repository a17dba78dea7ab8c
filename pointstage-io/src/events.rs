//! Structured load events
//!
//! Filters and converters report what happened during a load through an
//! [`EventSink`] instead of writing to a global console.

use std::sync::Mutex;

/// Severity of a load event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warning,
    Error,
}

/// A single message emitted while loading
#[derive(Debug, Clone, PartialEq)]
pub struct LoadEvent {
    pub level: EventLevel,
    pub message: String,
    /// Name of the field the event is about, if any
    pub field: Option<String>,
}

impl LoadEvent {
    pub fn new<S: Into<String>>(level: EventLevel, message: S) -> Self {
        Self {
            level,
            message: message.into(),
            field: None,
        }
    }

    pub fn info<S: Into<String>>(message: S) -> Self {
        Self::new(EventLevel::Info, message)
    }

    pub fn warning<S: Into<String>>(message: S) -> Self {
        Self::new(EventLevel::Warning, message)
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Self::new(EventLevel::Error, message)
    }

    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Receiver of load events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: LoadEvent);
}

/// Forwards events to `tracing`, tagged with the filter name
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: LoadEvent) {
        let field = event.field.as_deref().unwrap_or("");
        match event.level {
            EventLevel::Info => tracing::info!(field, "[StageFilter] {}", event.message),
            EventLevel::Warning => tracing::warn!(field, "[StageFilter] {}", event.message),
            EventLevel::Error => tracing::error!(field, "[StageFilter] {}", event.message),
        }
    }
}

/// Records every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LoadEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events, oldest first
    pub fn events(&self) -> Vec<LoadEvent> {
        self.lock().clone()
    }

    pub fn warnings(&self) -> Vec<LoadEvent> {
        self.with_level(EventLevel::Warning)
    }

    pub fn errors(&self) -> Vec<LoadEvent> {
        self.with_level(EventLevel::Error)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn with_level(&self, level: EventLevel) -> Vec<LoadEvent> {
        self.lock()
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LoadEvent>> {
        // a panicking emitter cannot leave the vector half-written
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: LoadEvent) {
        self.lock().push(event);
    }
}
