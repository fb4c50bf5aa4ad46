//! Batch outcome accounting.

use std::path::{Path, PathBuf};

use serde_json::json;

/// Outcome of one conversion attempt.
///
/// Converters return this instead of signalling expected conditions through
/// errors: a skip (destination already present, self-collision) is ordinary
/// data, not a failure. Failures travel as `Err(FileError)` alongside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file was converted and written to the given destination.
    Converted(PathBuf),
    /// The file was intentionally left alone; the string says why.
    Skipped(String),
}

/// Aggregate outcome record of a batch run.
///
/// Created empty by the batch driver, updated exactly once per candidate
/// file, and handed back immutably when the run finishes. The counts always
/// satisfy `total_converted() + total_skipped() + total_errors() ==`
/// number of candidate files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    /// Successfully converted files as (source, destination) pairs.
    pub converted: Vec<(PathBuf, PathBuf)>,
    /// Files intentionally not (re)converted.
    pub skipped: Vec<PathBuf>,
    /// Failed files with a human-readable message each.
    pub errors: Vec<(PathBuf, String)>,
    /// Directory the outputs were written into.
    pub output_dir: PathBuf,
}

impl ConversionResult {
    /// Create an empty result for a run writing into `output_dir`.
    #[must_use]
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            converted: Vec::new(),
            skipped: Vec::new(),
            errors: Vec::new(),
            output_dir,
        }
    }

    /// Record a successful conversion.
    pub fn add_converted(&mut self, source: PathBuf, destination: PathBuf) {
        self.converted.push((source, destination));
    }

    /// Record an intentionally skipped file.
    pub fn add_skipped(&mut self, source: PathBuf) {
        self.skipped.push(source);
    }

    /// Record a per-file failure.
    pub fn add_error(&mut self, source: PathBuf, message: impl Into<String>) {
        self.errors.push((source, message.into()));
    }

    /// Number of successfully converted files.
    #[must_use]
    pub fn total_converted(&self) -> usize {
        self.converted.len()
    }

    /// Number of skipped files.
    #[must_use]
    pub fn total_skipped(&self) -> usize {
        self.skipped.len()
    }

    /// Number of failed files.
    #[must_use]
    pub fn total_errors(&self) -> usize {
        self.errors.len()
    }

    /// Directory the outputs were written into.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// JSON-serializable summary of the run.
    #[must_use]
    pub fn summary(&self) -> serde_json::Value {
        json!({
            "total_converted": self.total_converted(),
            "skipped": self
                .skipped
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>(),
            "errors": self
                .errors
                .iter()
                .map(|(path, message)| {
                    json!({ "path": path.display().to_string(), "message": message })
                })
                .collect::<Vec<_>>(),
            "output_folder": self.output_dir.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_follow_recorded_outcomes() {
        let mut result = ConversionResult::new(PathBuf::from("/tmp/out"));
        result.add_converted(PathBuf::from("a.csv"), PathBuf::from("/tmp/out/a.json"));
        result.add_converted(PathBuf::from("b.csv"), PathBuf::from("/tmp/out/b.json"));
        result.add_skipped(PathBuf::from("c.csv"));
        result.add_error(PathBuf::from("d.csv"), "failed to read file: boom");

        assert_eq!(result.total_converted(), 2);
        assert_eq!(result.total_skipped(), 1);
        assert_eq!(result.total_errors(), 1);
    }

    #[test]
    fn summary_uses_reporting_keys() {
        let mut result = ConversionResult::new(PathBuf::from("/tmp/out"));
        result.add_converted(PathBuf::from("a.md"), PathBuf::from("/tmp/out/a.html"));
        result.add_error(PathBuf::from("b.md"), "failed to convert: bad input");

        let summary = result.summary();
        assert_eq!(summary["total_converted"], 1);
        assert_eq!(summary["output_folder"], "/tmp/out");
        assert_eq!(summary["skipped"].as_array().unwrap().len(), 0);
        assert_eq!(summary["errors"][0]["path"], "b.md");
        assert_eq!(summary["errors"][0]["message"], "failed to convert: bad input");
    }

    #[test]
    fn file_outcome_variants() {
        let converted = FileOutcome::Converted(PathBuf::from("out.webp"));
        let skipped = FileOutcome::Skipped("output already exists".into());
        assert_ne!(converted, skipped);
    }
}
