//! Reporting sinks for command output.

use std::sync::{Mutex, PoisonError};

use tracing::{error, info};

/// Severity of a reported line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportLevel {
    /// Headline result of a command
    Info,
    /// Detail line belonging to the preceding or following headline
    SubInfo,
    /// Command failure or a lookup miss
    Error,
}

/// Destination for the human-readable output of a command.
///
/// Implementors only need [`report`](Reporter::report); the leveled helpers
/// forward to it.
pub trait Reporter: Send + Sync {
    fn report(&self, level: ReportLevel, message: &str);

    fn info(&self, message: &str) {
        self.report(ReportLevel::Info, message);
    }

    fn sub_info(&self, message: &str) {
        self.report(ReportLevel::SubInfo, message);
    }

    fn error(&self, message: &str) {
        self.report(ReportLevel::Error, message);
    }
}

/// Forwards reports to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, level: ReportLevel, message: &str) {
        match level {
            ReportLevel::Info => info!("{message}"),
            ReportLevel::SubInfo => info!(sub = true, "{message}"),
            ReportLevel::Error => error!("{message}"),
        }
    }
}

/// Keeps every report in memory, in order.
///
/// Useful for hosts that render output themselves and for asserting on
/// command output in tests.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    entries: Mutex<Vec<(ReportLevel, String)>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All reports so far, in order.
    pub fn entries(&self) -> Vec<(ReportLevel, String)> {
        self.lock().clone()
    }

    /// Messages reported at `level`, in order.
    pub fn messages(&self, level: ReportLevel) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Number of reports at `level`.
    pub fn count(&self, level: ReportLevel) -> usize {
        self.lock().iter().filter(|(l, _)| *l == level).count()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ReportLevel, String)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, level: ReportLevel, message: &str) {
        self.lock().push((level, message.to_string()));
    }
}
