//! Jobs wrapping validation, packaging and repair work.
//!
//! # Sub-modules
//!
//! - [`state`] - Job statuses and the transition graph.
//! - [`record`] - The job record and its log.
//! - [`store`] - Storage seam with an in-memory implementation.
//! - [`clock`] - Time source for log timestamps.
//! - [`handlers`] - Per-type job handlers and the built-in stubs.
//! - [`orchestrator`] - Processing, status updates and cancellation.

pub mod clock;
pub mod error;
pub mod handlers;
pub mod orchestrator;
pub mod record;
pub mod state;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use error::{HandlerError, InvalidTransitionError, JobError, StateError, UnknownStatusError};
pub use handlers::{GenericHandler, JobContext, JobHandler, NarratingHandler};
pub use orchestrator::{JobOrchestrator, ProcessOutcome};
pub use record::{Job, JobId, LogLevel};
pub use state::{JobStateMachine, JobStatus};
pub use store::{InMemoryJobStore, JobStore};
