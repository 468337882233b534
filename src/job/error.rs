//! Error types for job lifecycle management.

use super::record::JobId;
use super::state::JobStatus;
use thiserror::Error;

/// A state name that is not one of the five job statuses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown job status '{value}'")]
pub struct UnknownStatusError {
    /// The rejected name as supplied.
    pub value: String,
}

/// A transition outside the job state graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid status transition from {from} to {to}")]
pub struct InvalidTransitionError {
    /// State the job is in.
    pub from: JobStatus,
    /// State that was requested.
    pub to: JobStatus,
}

/// Failures raised by name-based transition checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// One of the names is not a known status.
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatusError),

    /// Both names are known but the edge is not allowed.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransitionError),
}

/// Errors surfaced by the job orchestrator and its store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// No job exists under this identifier.
    #[error("job {id} not found")]
    NotFound {
        /// The missing identifier.
        id: JobId,
    },

    /// A job with this identifier is already stored.
    #[error("job {id} already exists")]
    DuplicateId {
        /// The conflicting identifier.
        id: JobId,
    },

    /// The requested status change is not allowed.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransitionError),

    /// A status name could not be parsed.
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatusError),
}

impl From<StateError> for JobError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::UnknownStatus(e) => Self::UnknownStatus(e),
            StateError::InvalidTransition(e) => Self::InvalidTransition(e),
        }
    }
}

/// Failures reported by a job handler.
///
/// The orchestrator records these in the job log and moves the job to
/// `failed`; they never escape `process`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The job configuration requests an action the handler cannot run.
    #[error("Invalid action specified in job configuration")]
    InvalidAction,

    /// The handler ran but could not finish its work.
    #[error("{reason}")]
    Failed {
        /// Human-readable failure description.
        reason: String,
    },
}

impl HandlerError {
    /// Convenience constructor for [`HandlerError::Failed`].
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn invalid_transition_names_both_states() {
        let err = InvalidTransitionError {
            from: JobStatus::Completed,
            to: JobStatus::Pending,
        };

        assert_eq!(
            err.to_string(),
            "invalid status transition from completed to pending"
        );
    }

    #[rstest]
    fn state_errors_convert_into_job_errors() {
        let unknown = StateError::from(UnknownStatusError {
            value: "paused".to_owned(),
        });

        let job_error = JobError::from(unknown);

        assert!(matches!(job_error, JobError::UnknownStatus(ref e) if e.value == "paused"));
        assert_eq!(job_error.to_string(), "unknown job status 'paused'");
    }

    #[rstest]
    fn handler_errors_render_their_reason() {
        assert_eq!(
            HandlerError::InvalidAction.to_string(),
            "Invalid action specified in job configuration"
        );
        assert_eq!(HandlerError::failed("disk full").to_string(), "disk full");
    }
}
