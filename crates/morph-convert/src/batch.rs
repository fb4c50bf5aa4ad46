//! Shared batch driver.
//!
//! Enumerates candidate files in a source directory, runs a per-file
//! conversion closure over them sequentially, and folds every outcome into
//! a [`ConversionResult`]. Enumeration is top-level only (subdirectories
//! are not descended into) and candidates are processed in sorted filename
//! order so runs are deterministic across platforms.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use morph_core::{BatchError, ConversionResult, FileError, FileOutcome};

/// Verify that `source_dir` exists and is a directory.
pub(crate) fn normalize_source(source_dir: &Path) -> Result<(), BatchError> {
    if !source_dir.exists() {
        return Err(BatchError::SourceNotFound(source_dir.to_path_buf()));
    }
    if !source_dir.is_dir() {
        return Err(BatchError::NotADirectory(source_dir.to_path_buf()));
    }
    Ok(())
}

/// Compile glob-style filename patterns, rejecting malformed ones up front.
fn compile_patterns(patterns: &[&str]) -> Result<Vec<Pattern>, BatchError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| BatchError::InvalidOptions(format!("bad pattern {p:?}: {e}")))
        })
        .collect()
}

/// Collect regular files in `source_dir` whose name matches any pattern,
/// sorted by filename.
fn find_source_files(source_dir: &Path, patterns: &[Pattern]) -> Result<Vec<PathBuf>, BatchError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(source_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if patterns.iter().any(|p| p.matches(&name)) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Run one batch: enumerate matching files in `source_dir`, call
/// `convert_one(source_file, output_dir)` for each, and record the outcome.
///
/// The output directory `<source_dir>/<output_folder_name>` is created if
/// missing. A failing `convert_one` is recorded into the result's `errors`
/// and the batch continues with the next file; only directory-level
/// problems abort the run.
///
/// # Errors
/// Returns a [`BatchError`] when the source directory is missing or not a
/// directory, a pattern is malformed, the output directory cannot be
/// created, or enumeration itself fails.
pub fn run_batch<F>(
    source_dir: &Path,
    patterns: &[&str],
    output_folder_name: &str,
    mut convert_one: F,
) -> Result<ConversionResult, BatchError>
where
    F: FnMut(&Path, &Path) -> Result<FileOutcome, FileError>,
{
    normalize_source(source_dir)?;
    let patterns = compile_patterns(patterns)?;

    let output_dir = source_dir.join(output_folder_name);
    fs::create_dir_all(&output_dir).map_err(|source| BatchError::OutputDir {
        path: output_dir.clone(),
        source,
    })?;

    let files = find_source_files(source_dir, &patterns)?;
    log::info!(
        "processing {} file(s) from {} into {}",
        files.len(),
        source_dir.display(),
        output_dir.display()
    );

    let mut result = ConversionResult::new(output_dir.clone());
    for file in files {
        match convert_one(&file, &output_dir) {
            Ok(FileOutcome::Converted(destination)) => {
                log::debug!("converted {} -> {}", file.display(), destination.display());
                result.add_converted(file, destination);
            }
            Ok(FileOutcome::Skipped(reason)) => {
                log::debug!("skipped {} ({reason})", file.display());
                result.add_skipped(file);
            }
            Err(err) => {
                log::warn!("error on {}: {err}", file.display());
                result.add_error(file, err.to_string());
            }
        }
    }

    Ok(result)
}

/// Destination path for `source` inside `output_dir`, with `extension`.
pub(crate) fn destination_for(source: &Path, output_dir: &Path, extension: &str) -> PathBuf {
    let stem = source.file_stem().unwrap_or_default().to_string_lossy();
    output_dir.join(format!("{stem}.{extension}"))
}

/// Remove a partial output left behind by a failed write, ignoring errors.
pub(crate) fn discard_partial_output(destination: &Path) {
    if destination.exists() {
        let _ = fs::remove_file(destination);
    }
}
