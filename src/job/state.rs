//! Job lifecycle states and the transitions between them.
//!
//! The graph is small and closed:
//!
//! ```text
//! pending ──► running ──► completed
//!    │           ├──────► failed
//!    └───────────┴──────► cancelled
//! ```
//!
//! `completed`, `failed` and `cancelled` are terminal. [`JobStatus`] carries
//! the typed table; [`JobStateMachine`] exposes the same checks over state
//! names for callers holding untyped input.

use super::error::{InvalidTransitionError, StateError, UnknownStatusError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Submitted and waiting to be processed.
    #[default]
    Pending,
    /// Claimed by a worker.
    Running,
    /// Finished successfully (terminal).
    Completed,
    /// Finished with an error (terminal).
    Failed,
    /// Stopped by a user (terminal).
    Cancelled,
}

impl JobStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Running,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    /// Returns `true` if no transition leaves this state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns the lowercase state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns the states reachable in one step.
    #[must_use]
    pub const fn valid_transitions(&self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Running, Self::Cancelled],
            Self::Running => &[Self::Completed, Self::Failed, Self::Cancelled],
            Self::Completed | Self::Failed | Self::Cancelled => &[],
        }
    }

    /// Returns `true` if moving to `target` is allowed.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        self.valid_transitions().contains(&target)
    }

    /// Checks the move to `target`, returning the typed error when forbidden.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransitionError`] when `target` is not reachable.
    pub fn transition_to(self, target: Self) -> Result<Self, InvalidTransitionError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(InvalidTransitionError {
                from: self,
                to: target,
            })
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = UnknownStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownStatusError {
                value: s.to_owned(),
            })
    }
}

/// Name-based view of the job state graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobStateMachine;

impl JobStateMachine {
    /// Whether `from` may move to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStatusError`] when either name is not a status.
    ///
    /// # Examples
    ///
    /// ```
    /// use scenepack::JobStateMachine;
    ///
    /// assert!(JobStateMachine::can_transition("pending", "running")?);
    /// assert!(!JobStateMachine::can_transition("completed", "pending")?);
    /// assert!(JobStateMachine::can_transition("paused", "running").is_err());
    /// # Ok::<(), scenepack::job::UnknownStatusError>(())
    /// ```
    pub fn can_transition(from: &str, to: &str) -> Result<bool, UnknownStatusError> {
        let from: JobStatus = from.parse()?;
        let to: JobStatus = to.parse()?;
        Ok(from.can_transition_to(to))
    }

    /// Checks a transition, distinguishing unknown names from forbidden edges.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::UnknownStatus`] for an unknown name and
    /// [`StateError::InvalidTransition`] for a forbidden edge.
    pub fn validate_transition(from: &str, to: &str) -> Result<(), StateError> {
        let from: JobStatus = from.parse()?;
        let to: JobStatus = to.parse()?;
        from.transition_to(to)?;
        Ok(())
    }

    /// States reachable in one step from `state`; empty for terminal states.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStatusError`] when `state` is not a status.
    pub fn allowed_transitions(state: &str) -> Result<&'static [JobStatus], UnknownStatusError> {
        Ok(state.parse::<JobStatus>()?.valid_transitions())
    }

    /// Whether `state` is terminal.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStatusError`] when `state` is not a status.
    pub fn is_final(state: &str) -> Result<bool, UnknownStatusError> {
        Ok(state.parse::<JobStatus>()?.is_terminal())
    }
}
