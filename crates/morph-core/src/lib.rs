//! Shared value types for the morph conversion toolkit.
//!
//! This crate defines the types every converter and the batch driver agree
//! on: the [`ConversionResult`] aggregator returned from a batch run, the
//! per-file [`FileOutcome`], and the two-level error taxonomy
//! ([`BatchError`] for fatal directory-level failures, [`FileError`] for
//! per-file failures that are recorded and recovered).

pub mod error;
pub mod result;

pub use error::{BatchError, FileError};
pub use result::{ConversionResult, FileOutcome};
