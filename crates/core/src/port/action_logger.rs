// Action Logger Port
//
// Explicit logging handle handed to executors and providers at construction,
// so package actions never reach for process-wide logger state.

/// Log levels the package layer cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
}

pub trait ActionLogger: Send + Sync {
    /// Whether messages at `level` currently reach any output
    fn is_enabled(&self, level: LogLevel) -> bool;

    fn info(&self, message: &str);

    fn debug(&self, message: &str);
}

/// Logger backed by the global `tracing` subscriber (production)
pub struct TracingActionLogger;

impl ActionLogger for TracingActionLogger {
    fn is_enabled(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Debug => tracing::enabled!(tracing::Level::DEBUG),
            LogLevel::Info => tracing::enabled!(tracing::Level::INFO),
        }
    }

    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Captures messages; reports every level at or above `threshold` enabled
    #[derive(Clone)]
    pub struct RecordingLogger {
        threshold: Option<LogLevel>,
        lines: Arc<Mutex<Vec<(LogLevel, String)>>>,
    }

    impl RecordingLogger {
        pub fn new(threshold: LogLevel) -> Self {
            Self {
                threshold: Some(threshold),
                lines: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Logger with every level switched off
        pub fn silent() -> Self {
            Self {
                threshold: None,
                lines: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn info_lines(&self) -> Vec<String> {
            self.lines_at(LogLevel::Info)
        }

        pub fn debug_lines(&self) -> Vec<String> {
            self.lines_at(LogLevel::Debug)
        }

        fn lines_at(&self, level: LogLevel) -> Vec<String> {
            self.lines
                .lock()
                .unwrap()
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    impl ActionLogger for RecordingLogger {
        fn is_enabled(&self, level: LogLevel) -> bool {
            self.threshold.is_some_and(|t| level >= t)
        }

        fn info(&self, message: &str) {
            self.lines
                .lock()
                .unwrap()
                .push((LogLevel::Info, message.to_string()));
        }

        fn debug(&self, message: &str) {
            self.lines
                .lock()
                .unwrap()
                .push((LogLevel::Debug, message.to_string()));
        }
    }
}
