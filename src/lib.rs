//! Scene release packaging core.
//!
//! This crate turns free-form Scene rule text into a structured
//! [`RuleSpec`](rules::RuleSpec), validates candidate releases against it,
//! renders fixed-width NFO descriptions, and assembles ZIP archives with
//! verifiable checksums. Long-running operations are wrapped in jobs whose
//! lifecycle is enforced by a strict state machine.
//!
//! # Modules
//!
//! - [`config`] - TOML-backed configuration for formatter and packaging
//! - [`formatter`] - Canonical release names and metadata normalisation
//! - [`job`] - Job records, state machine, store, and orchestrator
//! - [`metadata`] - Dublin Core metadata read from EPUB files
//! - [`nfo`] - Fixed-width NFO and DIZ rendering
//! - [`packaging`] - Staging, archiving, checksums, and archive verification
//! - [`release`] - Caller-supplied release descriptors
//! - [`rules`] - Rule text parsing into structured specifications
//! - [`validator`] - Release compliance checks

pub mod config;
pub mod formatter;
pub mod job;
pub mod metadata;
pub mod nfo;
pub mod packaging;
pub mod release;
pub mod rules;
pub mod validator;

pub use config::{ConfigError, ScenepackConfig};
pub use job::{Job, JobError, JobId, JobOrchestrator, JobStateMachine, JobStatus};
pub use metadata::{MetadataError, extract_metadata};
pub use nfo::NfoFormatter;
pub use packaging::{PackageOutput, PackagingEngine, PackagingError};
pub use release::{FileEntry, Metadata, ReleaseDescriptor};
pub use rules::{RuleSpec, parse_rule_spec};
pub use validator::{ValidationResult, validate};
