//! Transient operator notifications ("User added successfully", "Failed to
//! fetch products"). Mirrored to the log.

use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Warning,
    Error,
}

impl Level {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::Warning => "warn",
            Self::Error => "error",
        }
    }
}

pub trait Notifier {
    fn notify(&self, level: Level, message: &str);

    fn success(&self, message: &str) {
        self.notify(Level::Success, message);
    }

    fn warning(&self, message: &str) {
        self.notify(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.notify(Level::Error, message);
    }
}

/// Prints to stderr so table output on stdout stays clean.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: Level, message: &str) {
        match level {
            Level::Error => tracing::warn!(%message, "notification"),
            _ => tracing::debug!(level = level.tag(), %message, "notification"),
        }
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "[{}] {}", level.tag(), message);
    }
}
