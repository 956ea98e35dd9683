//! JSONL audit trail of fetches and mutations, one file per session.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct AuditLog {
    pub path: Option<PathBuf>,
    session_id: String,
    file: Option<File>,
}

#[derive(Serialize)]
struct Event<'a> {
    ts: DateTime<Utc>,
    session_id: &'a str,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(flatten)]
    data: serde_json::Value,
}

impl AuditLog {
    pub fn open(path: &Path, session_id: &str) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: Some(path.to_path_buf()),
            session_id: session_id.to_string(),
            file: Some(file),
        })
    }

    /// A log that records nothing.
    pub fn disabled(session_id: &str) -> Self {
        Self {
            path: None,
            session_id: session_id.to_string(),
            file: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Write one event. Failures are logged, never propagated: the audit
    /// trail must not block an operation.
    pub fn log(&mut self, event_type: &str, data: serde_json::Value) {
        if let Err(e) = self.write(event_type, data) {
            tracing::warn!(error = %e, event_type, "audit write failed");
        }
    }

    fn write(&mut self, event_type: &str, data: serde_json::Value) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        let event = Event {
            ts: Utc::now(),
            session_id: &self.session_id,
            event_type,
            data,
        };
        let line = serde_json::to_string(&event)?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }

    pub fn fetch(&mut self, kind: &str, count: usize, ok: bool) {
        self.log(
            "fetch",
            serde_json::json!({ "kind": kind, "count": count, "ok": ok }),
        )
    }

    pub fn mutation(&mut self, kind: &str, action: &str, target: Option<&str>) {
        self.log(
            "mutation",
            serde_json::json!({ "kind": kind, "action": action, "target": target }),
        )
    }

    pub fn mutation_failed(&mut self, kind: &str, action: &str, target: Option<&str>, error: &str) {
        self.log(
            "mutation_failed",
            serde_json::json!({
                "kind": kind,
                "action": action,
                "target": target,
                "error": error,
            }),
        )
    }

    pub fn confirm_declined(&mut self, action: &str, target: &str) {
        self.log(
            "confirm_declined",
            serde_json::json!({ "action": action, "target": target }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_appended_as_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.jsonl");
        let mut log = AuditLog::open(&path, "sess-1").unwrap();
        log.fetch("user", 3, true);
        log.mutation("user", "delete", Some("u1"));
        log.mutation_failed("product", "create", None, "server returned 500: boom");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["type"], "fetch");
        assert_eq!(lines[0]["count"], 3);
        assert_eq!(lines[1]["target"], "u1");
        assert_eq!(lines[2]["session_id"], "sess-1");
        assert!(lines[2]["target"].is_null());
    }

    #[test]
    fn test_disabled_log_writes_nothing() {
        let mut log = AuditLog::disabled("s");
        log.mutation("user", "create", None);
        assert!(log.path.is_none());
        assert_eq!(log.session_id(), "s");
    }
}
