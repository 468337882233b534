//! Job handlers and the built-in job types.
//!
//! A handler runs outside the job lock with a snapshot of the job and a log
//! sink. Returning `Ok` completes the job with the returned message; returning
//! an error fails it.

use super::error::HandlerError;
use super::record::{Job, LogLevel};
use serde_json::{Map, Value};

/// Work performed for one job type.
pub trait JobHandler: Send + Sync {
    /// Runs the job, returning the message recorded on completion.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerError`] describing why the job failed.
    fn run(&self, ctx: &JobContext<'_>) -> Result<String, HandlerError>;
}

/// What a handler sees while it runs.
pub struct JobContext<'a> {
    job: &'a Job,
    sink: &'a dyn Fn(LogLevel, &str),
}

impl<'a> JobContext<'a> {
    pub(crate) fn new(job: &'a Job, sink: &'a dyn Fn(LogLevel, &str)) -> Self {
        Self { job, sink }
    }

    /// Snapshot of the job taken when it started running.
    #[must_use]
    pub const fn job(&self) -> &Job {
        self.job
    }

    /// The job's configuration.
    #[must_use]
    pub const fn config(&self) -> &Map<String, Value> {
        &self.job.config
    }

    /// Appends a line to the job log.
    pub fn log(&self, level: LogLevel, message: &str) {
        (self.sink)(level, message);
    }

    /// Appends an `INFO` line to the job log.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }
}

/// A handler that narrates its progress without touching any files.
///
/// The built-in `nfofix`, `readnfo`, `repack` and `dirfix` types use this;
/// register a custom [`JobHandler`] to replace them with real work.
#[derive(Debug, Clone, Copy)]
pub struct NarratingHandler {
    started: &'static str,
    finished: &'static str,
    completion: &'static str,
}

impl NarratingHandler {
    /// Creates a handler logging `started` then `finished`, completing with
    /// `completion`.
    #[must_use]
    pub const fn new(started: &'static str, finished: &'static str, completion: &'static str) -> Self {
        Self {
            started,
            finished,
            completion,
        }
    }
}

impl JobHandler for NarratingHandler {
    fn run(&self, ctx: &JobContext<'_>) -> Result<String, HandlerError> {
        ctx.info(self.started);
        ctx.info(self.finished);
        Ok(self.completion.to_owned())
    }
}

/// Fallback for job types without a registered handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericHandler;

impl JobHandler for GenericHandler {
    fn run(&self, ctx: &JobContext<'_>) -> Result<String, HandlerError> {
        ctx.info(&format!("Processing job type: {}", ctx.job().job_type));
        ctx.info("Job processing completed");
        Ok("Job completed successfully".to_owned())
    }
}

/// The built-in job types and their handlers.
pub(crate) fn builtin() -> [(&'static str, NarratingHandler); 4] {
    [
        (
            "nfofix",
            NarratingHandler::new(
                "Fixing NFO file...",
                "NFO file fixed successfully",
                "NFOFIX job completed",
            ),
        ),
        (
            "readnfo",
            NarratingHandler::new(
                "Reading NFO file...",
                "NFO file read successfully",
                "READNFO job completed",
            ),
        ),
        (
            "repack",
            NarratingHandler::new(
                "Repacking release...",
                "Release repacked successfully",
                "REPACK job completed",
            ),
        ),
        (
            "dirfix",
            NarratingHandler::new(
                "Fixing directory structure...",
                "Directory structure fixed successfully",
                "DIRFIX job completed",
            ),
        ),
    ]
}

/// Whether the configuration carries the `invalid_action` sentinel.
pub(crate) fn requests_invalid_action(config: &Map<String, Value>) -> bool {
    config.get("action").and_then(Value::as_str) == Some("invalid_action")
}
