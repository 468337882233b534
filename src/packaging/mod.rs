//! Release packaging: staging, NFO embedding, ZIP archiving and checksums.
//!
//! # Sub-modules
//!
//! - [`engine`] - `PackagingEngine`, which drives a packaging run.
//! - [`archive`] - Reproducible ZIP creation, verification and target-name
//!   validation.
//! - [`checksum`] - Streaming SHA-256 and MD5 digests.
//! - [`error`] - `PackagingError`.

pub mod archive;
pub mod checksum;
pub mod engine;
pub mod error;

pub use checksum::{Checksums, compute_checksums};
pub use engine::{PackageOutput, PackagingEngine};
pub use error::PackagingError;
