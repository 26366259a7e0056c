//! Diagnostics for model construction: why a member was rejected, a class
//! ignored, a signature dropped or an instantiation abandoned.
//!
//! [`Diagnostics`] is a cheap-to-clone handle. Every pipeline component
//! holds a clone; events fan out to an optional JSONL file, to stderr when
//! verbose, and to an optional in-memory buffer (tests, `--explain`).

#![allow(missing_docs)]

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use super::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub event: EventType,
    pub subject: String,
    pub reason: String,
}

#[derive(Default)]
struct Sinks {
    jsonl: Option<JsonlWriter>,
    verbose: bool,
    buffer: Option<Vec<DiagnosticEvent>>,
}

#[derive(Clone, Default)]
pub struct Diagnostics {
    sinks: Arc<Mutex<Sinks>>,
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sinks = self.sinks.lock();
        f.debug_struct("Diagnostics")
            .field("jsonl", &sinks.jsonl.as_ref().map(JsonlWriter::state))
            .field("verbose", &sinks.verbose)
            .field("buffered", &sinks.buffer.as_ref().map(Vec::len))
            .finish()
    }
}

impl Diagnostics {
    /// Records nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Keeps every event in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            sinks: Arc::new(Mutex::new(Sinks {
                buffer: Some(Vec::new()),
                ..Sinks::default()
            })),
        }
    }

    /// Sinks as selected by the `[logging]` settings.
    #[must_use]
    pub fn from_settings(log_path: Option<&Path>, verbose: bool) -> Self {
        Self {
            sinks: Arc::new(Mutex::new(Sinks {
                jsonl: log_path.map(|p| JsonlWriter::open(JsonlConfig::at(p))),
                verbose,
                buffer: None,
            })),
        }
    }

    /// Also keep events in memory from now on.
    #[must_use]
    pub fn buffered(self) -> Self {
        self.sinks.lock().buffer.get_or_insert_with(Vec::new);
        self
    }

    pub fn record(&self, event: EventType, subject: impl Into<String>, reason: impl Into<String>) {
        let mut sinks = self.sinks.lock();
        if sinks.jsonl.is_none() && !sinks.verbose && sinks.buffer.is_none() {
            return;
        }
        let event = DiagnosticEvent {
            event,
            subject: subject.into(),
            reason: reason.into(),
        };
        if sinks.verbose {
            eprintln!("[OPF-DIAG] {} {}: {}", event.event.label(), event.subject, event.reason);
        }
        if let Some(writer) = sinks.jsonl.as_mut() {
            let mut entry = LogEntry::new(event.event, severity_of(event.event));
            entry.subject = Some(event.subject.clone());
            entry.reason = Some(event.reason.clone());
            writer.write_entry(&entry);
        }
        if let Some(buffer) = sinks.buffer.as_mut() {
            buffer.push(event);
        }
    }

    pub fn member_rejected(&self, subject: impl Into<String>, reason: impl Into<String>) {
        self.record(EventType::MemberRejected, subject, reason);
    }

    pub fn class_ignored(&self, subject: impl Into<String>, reason: impl Into<String>) {
        self.record(EventType::ClassIgnored, subject, reason);
    }

    /// Final summary line for a built model.
    pub fn model_built(&self, kept: usize, omitted: usize) {
        let mut sinks = self.sinks.lock();
        if let Some(writer) = sinks.jsonl.as_mut() {
            let mut entry = LogEntry::new(EventType::ModelBuilt, Severity::Info);
            entry.count = Some(kept as u64);
            entry.reason = Some(format!("{kept} kept, {omitted} omitted"));
            writer.write_entry(&entry);
            writer.flush();
        }
    }

    /// Buffered events; empty unless buffering.
    #[must_use]
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.sinks.lock().buffer.clone().unwrap_or_default()
    }

    #[must_use]
    pub fn count(&self, event: EventType) -> usize {
        self.sinks
            .lock()
            .buffer
            .as_ref()
            .map_or(0, |b| b.iter().filter(|e| e.event == event).count())
    }

    pub fn flush(&self) {
        if let Some(writer) = self.sinks.lock().jsonl.as_mut() {
            writer.flush();
        }
    }
}

const fn severity_of(event: EventType) -> Severity {
    match event {
        EventType::SignatureDropped | EventType::ClassIgnored => Severity::Warning,
        _ => Severity::Info,
    }
}
