//! Error types for batch conversion.
//!
//! Errors split along the recovery boundary: a [`BatchError`] aborts the
//! whole run and surfaces to the caller, while a [`FileError`] is recorded
//! against the offending file and the batch continues.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Directory-level error. Always fatal for the batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The source folder does not exist.
    #[error("source folder not found: {0}")]
    SourceNotFound(PathBuf),

    /// The source path exists but is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The output directory could not be created or is not writable.
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        /// Path of the directory that could not be prepared.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },

    /// Converter options failed validation before any file was processed.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// IO error while enumerating the source directory.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// File-level error. Recorded into [`crate::ConversionResult::errors`] and
/// never propagated past the batch driver.
#[derive(Debug, Error)]
pub enum FileError {
    /// The input file could not be read.
    #[error("failed to read file: {0}")]
    Read(String),

    /// The input bytes could not be decoded (text encoding, image format).
    #[error("failed to decode content: {0}")]
    Decode(String),

    /// The conversion itself failed.
    #[error("failed to convert: {0}")]
    Convert(String),

    /// The output file could not be written.
    #[error("failed to write output: {0}")]
    Write(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_error_display() {
        let err = BatchError::SourceNotFound(PathBuf::from("/missing"));
        assert_eq!(err.to_string(), "source folder not found: /missing");

        let err = BatchError::InvalidOptions("quality must be between 0 and 100".into());
        assert!(err.to_string().contains("quality"));
    }

    #[test]
    fn file_error_display() {
        let err = FileError::Read("permission denied".into());
        assert_eq!(err.to_string(), "failed to read file: permission denied");

        let err = FileError::Write("disk full".into());
        assert_eq!(err.to_string(), "failed to write output: disk full");
    }

    #[test]
    fn io_error_converts_to_batch_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: BatchError = io_err.into();
        assert!(matches!(err, BatchError::Io(_)));
    }
}
