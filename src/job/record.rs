//! Job records and their append-only log.

use super::state::JobStatus;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Opaque job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity of a job log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal progress.
    #[default]
    Info,
    /// Something unexpected that did not stop the job.
    Warning,
    /// A failure.
    Error,
}

impl LogLevel {
    /// Uppercase label written into the job log.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work tracked by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Identifier assigned at submission.
    pub id: JobId,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Handler key such as `nfofix` or `repack`.
    pub job_type: String,
    /// Handler-specific settings.
    pub config: Map<String, Value>,
    /// Newline-terminated log lines, oldest first.
    pub logs: String,
    /// Submitting user.
    pub created_by: String,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// A fresh `pending` job with an empty log.
    #[must_use]
    pub fn new(
        id: JobId,
        job_type: impl Into<String>,
        config: Map<String, Value>,
        created_by: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            job_type: job_type.into(),
            config,
            logs: String::new(),
            created_by: created_by.into(),
            created_at,
        }
    }

    /// Iterates over the log lines.
    pub fn log_lines(&self) -> impl Iterator<Item = &str> {
        self.logs.lines()
    }

    pub(crate) fn push_line(&mut self, at: DateTime<Utc>, message: &str) {
        self.logs.push_str(&format!("[{}] {message}\n", timestamp(at)));
    }

    pub(crate) fn push_leveled(&mut self, at: DateTime<Utc>, level: LogLevel, message: &str) {
        self.logs
            .push_str(&format!("[{}] [{level}] {message}\n", timestamp(at)));
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    #[rstest]
    fn log_lines_carry_timestamp_and_level(at: DateTime<Utc>) {
        let mut job = Job::new(JobId::new(7), "readnfo", Map::new(), "alice", at);

        job.push_line(at, "Job processing started...");
        job.push_leveled(at, LogLevel::Warning, "odd input");

        let lines: Vec<&str> = job.log_lines().collect();
        assert_eq!(
            lines,
            [
                "[2024-05-01T12:30:00.000Z] Job processing started...",
                "[2024-05-01T12:30:00.000Z] [WARNING] odd input",
            ]
        );
    }

    #[rstest]
    fn serialises_with_camel_case_keys(at: DateTime<Utc>) {
        let job = Job::new(JobId::new(3), "repack", Map::new(), "bob", at);

        let json = serde_json::to_value(&job).expect("serialise");

        assert_eq!(json["id"], 3);
        assert_eq!(json["status"], "pending");
        assert_eq!(json["jobType"], "repack");
        assert_eq!(json["createdBy"], "bob");
        assert!(json.get("createdAt").is_some());
    }
}
