//! Drives jobs through their lifecycle.
//!
//! Every read-check-write of a job happens inside one [`JobStore::with_job`]
//! call, so the pending to running move is atomic and a job is processed at
//! most once. Handlers run outside the lock; a cancellation that lands while
//! a handler runs wins, and the handler's result is discarded.

use super::clock::{Clock, SystemClock};
use super::error::{HandlerError, JobError};
use super::handlers::{self, GenericHandler, JobContext, JobHandler};
use super::record::{Job, JobId, LogLevel};
use super::state::JobStatus;
use super::store::{InMemoryJobStore, JobStore};
use log::{error, info, warn};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Progress reported for a running job without an explicit value.
const RUNNING_PROGRESS: u8 = 50;

/// How a call to [`JobOrchestrator::process`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The handler succeeded and the job is `completed`.
    Completed,
    /// The handler failed and the job is `failed`.
    Failed {
        /// The handler's error message.
        message: String,
    },
    /// The job was not pending, so nothing ran, or it could not be moved
    /// out of `running` once its handler returned.
    Skipped {
        /// The status the job was found in.
        status: JobStatus,
    },
    /// The job was cancelled while its handler ran.
    Cancelled,
}

/// Runs jobs against a store, recording progress in each job's log.
pub struct JobOrchestrator<S = InMemoryJobStore, C = SystemClock> {
    store: S,
    clock: C,
    handlers: HashMap<String, Box<dyn JobHandler>>,
    fallback: Box<dyn JobHandler>,
}

impl JobOrchestrator {
    /// An orchestrator over a fresh in-memory store and the system clock.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(InMemoryJobStore::new(), SystemClock)
    }
}

impl<S: JobStore, C: Clock> JobOrchestrator<S, C> {
    /// Creates an orchestrator with the built-in handlers registered.
    #[must_use]
    pub fn new(store: S, clock: C) -> Self {
        let handlers = handlers::builtin()
            .into_iter()
            .map(|(name, handler)| (name.to_owned(), Box::new(handler) as Box<dyn JobHandler>))
            .collect();
        Self {
            store,
            clock,
            handlers,
            fallback: Box::new(GenericHandler),
        }
    }

    /// Registers `handler` for `job_type`, replacing any existing one.
    #[must_use]
    pub fn with_handler(
        mut self,
        job_type: impl Into<String>,
        handler: impl JobHandler + 'static,
    ) -> Self {
        self.handlers.insert(job_type.into(), Box::new(handler));
        self
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Creates a `pending` job and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::DuplicateId`] when the store hands out an
    /// identifier that is already in use.
    pub fn submit(
        &self,
        job_type: impl Into<String>,
        config: Map<String, Value>,
        created_by: impl Into<String>,
    ) -> Result<JobId, JobError> {
        let id = self.store.next_id();
        let job = Job::new(id, job_type, config, created_by, self.clock.now());
        info!("submitted {} job {id}", job.job_type);
        self.store.insert(job)?;
        Ok(id)
    }

    /// Snapshot of a job.
    #[must_use]
    pub fn job(&self, id: JobId) -> Option<Job> {
        self.store.get(id)
    }

    /// Processes a pending job with the handler for its type.
    ///
    /// Jobs in any other state are left alone and reported as
    /// [`ProcessOutcome::Skipped`]. Handler failures are recorded on the job
    /// rather than returned.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::NotFound`] when the job does not exist.
    pub fn process(&self, id: JobId) -> Result<ProcessOutcome, JobError> {
        let claimed = self
            .store
            .with_job(id, |job| match job.status.transition_to(JobStatus::Running) {
                Ok(status) => {
                    job.status = status;
                    job.push_line(self.clock.now(), "Job processing started...");
                    Ok(job.clone())
                }
                Err(_) => Err(job.status),
            })
            .ok_or(JobError::NotFound { id })?;

        let job = match claimed {
            Ok(job) => job,
            Err(status) => {
                warn!("job {id} is {status}, not pending; skipping");
                return Ok(ProcessOutcome::Skipped { status });
            }
        };
        info!("job {id} ({}) is running", job.job_type);

        match self.dispatch(&job) {
            Ok(message) => Ok(self.finish(id, JobStatus::Completed, &message)),
            Err(err) => {
                let message = err.to_string();
                error!("job {id} failed: {message}");
                self.log_line(id, LogLevel::Error, &format!("Job processing failed: {message}"));
                Ok(self.finish(id, JobStatus::Failed, &message))
            }
        }
    }

    /// Moves a job to `new_status`, appending `message` when given.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::NotFound`] for a missing job and
    /// [`JobError::InvalidTransition`] when the move is not allowed, in which
    /// case the job is left untouched.
    pub fn update_status(
        &self,
        id: JobId,
        new_status: JobStatus,
        message: Option<&str>,
    ) -> Result<(), JobError> {
        self.store
            .with_job(id, |job| {
                job.status.transition_to(new_status).map(|status| {
                    job.status = status;
                    if let Some(message) = message {
                        job.push_line(self.clock.now(), message);
                    }
                })
            })
            .ok_or(JobError::NotFound { id })??;
        info!("job {id} moved to {new_status}");
        Ok(())
    }

    /// Appends `[timestamp] [LEVEL] message` to the job log.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::NotFound`] when the job does not exist.
    pub fn append_log(&self, id: JobId, message: &str, level: LogLevel) -> Result<(), JobError> {
        self.store
            .with_job(id, |job| job.push_leveled(self.clock.now(), level, message))
            .ok_or(JobError::NotFound { id })
    }

    /// Cancels a pending or running job.
    ///
    /// Returns `false`, leaving the job untouched, when it is missing or
    /// already finished.
    pub fn cancel(&self, id: JobId) -> bool {
        let cancelled = self
            .store
            .with_job(id, |job| match job.status.transition_to(JobStatus::Cancelled) {
                Ok(status) => {
                    job.status = status;
                    job.push_line(self.clock.now(), "Job cancelled by user");
                    Ok(())
                }
                Err(_) => Err(job.status),
            });

        match cancelled {
            Some(Ok(())) => {
                info!("job {id} cancelled");
                true
            }
            Some(Err(status)) => {
                warn!("refusing to cancel job {id}: already {status}");
                false
            }
            None => {
                warn!("refusing to cancel job {id}: not found");
                false
            }
        }
    }

    /// Progress percentage for a job.
    ///
    /// An integer `progress` entry in the job configuration wins, clamped to
    /// `0..=100`. Otherwise it is derived from the status. Missing jobs
    /// report `0`.
    #[must_use]
    pub fn progress(&self, id: JobId) -> u8 {
        self.store
            .with_job(id, |job| {
                explicit_progress(&job.config).unwrap_or(match job.status {
                    JobStatus::Running => RUNNING_PROGRESS,
                    JobStatus::Completed => 100,
                    JobStatus::Pending | JobStatus::Failed | JobStatus::Cancelled => 0,
                })
            })
            .unwrap_or(0)
    }

    fn dispatch(&self, job: &Job) -> Result<String, HandlerError> {
        if handlers::requests_invalid_action(&job.config) {
            return Err(HandlerError::InvalidAction);
        }
        let handler = self.handlers.get(&job.job_type).unwrap_or(&self.fallback);
        let sink = |level: LogLevel, message: &str| self.log_line(job.id, level, message);
        handler.run(&JobContext::new(job, &sink))
    }

    /// Ends a running job, unless something else ended it first.
    fn finish(&self, id: JobId, target: JobStatus, message: &str) -> ProcessOutcome {
        let ended = self.store.with_job(id, |job| {
            if job.status != JobStatus::Running {
                return Err(job.status);
            }
            let status = job.status.transition_to(target).map_err(|err| err.from)?;
            job.status = status;
            job.push_line(self.clock.now(), message);
            Ok(())
        });

        match ended {
            Some(Ok(())) => {
                info!("job {id} moved to {target}");
                if target == JobStatus::Failed {
                    ProcessOutcome::Failed {
                        message: message.to_owned(),
                    }
                } else {
                    ProcessOutcome::Completed
                }
            }
            Some(Err(JobStatus::Cancelled)) => {
                info!("job {id} was cancelled while running");
                ProcessOutcome::Cancelled
            }
            None => {
                warn!("job {id} vanished while running");
                ProcessOutcome::Cancelled
            }
            Some(Err(status)) => {
                warn!("job {id} ended as {status} while running");
                ProcessOutcome::Skipped { status }
            }
        }
    }

    fn log_line(&self, id: JobId, level: LogLevel, message: &str) {
        if self.append_log(id, message, level).is_err() {
            warn!("job {id} vanished before its log line was written");
        }
    }
}

fn explicit_progress(config: &Map<String, Value>) -> Option<u8> {
    let value = config.get("progress")?;
    let clamped = value
        .as_u64()
        .map(|n| n.min(100))
        .or_else(|| value.as_i64().map(|_| 0))?;
    u8::try_from(clamped).ok()
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
