//! CSV to JSON converter.
//!
//! Detects the delimiter by counting candidate occurrences in the first
//! line (`,`, `;`, tab, `|`, `:`), falling back to comma when nothing
//! stands out. The first record is treated as the header row; every other
//! record becomes a JSON object mapping trimmed header names to coerced
//! cell values.

use std::fs;
use std::path::Path;

use encoding_rs::Encoding;
use morph_core::{BatchError, ConversionResult, FileError, FileOutcome};
use serde_json::{Map, Value};

use crate::batch::{destination_for, discard_partial_output, run_batch};

const DEFAULT_PATTERNS: &[&str] = &["*.csv", "*.CSV"];

/// Options for [`convert_csv_to_json`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvToJsonOptions {
    /// Indent the JSON output.
    pub pretty: bool,
    /// Text encoding label used to decode input files (WHATWG names,
    /// e.g. `utf-8`, `windows-1252`).
    pub encoding: String,
    /// Name of the output directory created inside the source folder.
    pub output_folder: String,
}

impl Default for CsvToJsonOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            encoding: "utf-8".to_string(),
            output_folder: "json".to_string(),
        }
    }
}

impl CsvToJsonOptions {
    /// Disable pretty-printing.
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Set the input text encoding by label.
    #[must_use]
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Set the output folder name.
    #[must_use]
    pub fn with_output_folder(mut self, name: impl Into<String>) -> Self {
        self.output_folder = name.into();
        self
    }

    fn resolve_encoding(&self) -> Result<&'static Encoding, BatchError> {
        Encoding::for_label(self.encoding.as_bytes()).ok_or_else(|| {
            BatchError::InvalidOptions(format!("unknown encoding label {:?}", self.encoding))
        })
    }
}

/// Candidate delimiters, in priority order for ties.
const DELIMITERS: [char; 5] = [',', ';', '\t', '|', ':'];

/// Pick the delimiter with the highest count in the first line. Ties and
/// all-zero counts resolve to comma, so detection is deterministic.
fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or_default();

    let mut best = ',';
    let mut max_count = 0;
    for &delim in &DELIMITERS {
        let count = first_line.matches(delim).count();
        if count > max_count {
            max_count = count;
            best = delim;
        }
    }
    best
}

/// Coerce a raw cell into a JSON value.
///
/// Empty cells become null; integer- and float-parseable strings become
/// numbers (integral floats collapse to integers); `true`/`false` become
/// booleans regardless of case; everything else is kept as a trimmed
/// string.
fn coerce_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        if float.is_finite() {
            if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
                return Value::from(float as i64);
            }
            return Value::from(float);
        }
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(trimmed.to_string())
}

/// Parse decoded CSV text into an array of row objects.
fn parse_rows(content: &str, delimiter: char) -> Result<Vec<Value>, FileError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| FileError::Convert(format!("bad header row: {e}")))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    let mut ragged = false;
    for record in reader.records() {
        let record = record.map_err(|e| FileError::Convert(format!("bad record: {e}")))?;
        if record.len() != headers.len() {
            ragged = true;
        }
        let mut row = Map::new();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = record.get(i).map_or(Value::Null, coerce_value);
            row.insert(header.clone(), value);
        }
        rows.push(Value::Object(row));
    }

    if ragged {
        log::warn!("inconsistent column counts; short rows padded with null");
    }
    Ok(rows)
}

fn convert_one(
    source: &Path,
    output_dir: &Path,
    encoding: &'static Encoding,
    pretty: bool,
) -> Result<FileOutcome, FileError> {
    let bytes = fs::read(source).map_err(|e| FileError::Read(e.to_string()))?;
    let (content, _, had_errors) = encoding.decode(&bytes);
    if had_errors {
        return Err(FileError::Decode(format!(
            "input is not valid {}",
            encoding.name()
        )));
    }

    let delimiter = detect_delimiter(&content);
    log::debug!("{}: delimiter {delimiter:?}", source.display());
    let rows = parse_rows(&content, delimiter)?;

    let json = if pretty {
        serde_json::to_string_pretty(&rows)
    } else {
        serde_json::to_string(&rows)
    }
    .map_err(|e| FileError::Convert(format!("serialization failed: {e}")))?;

    let destination = destination_for(source, output_dir, "json");
    if let Err(e) = fs::write(&destination, json) {
        discard_partial_output(&destination);
        return Err(FileError::Write(e.to_string()));
    }
    Ok(FileOutcome::Converted(destination))
}

/// Convert every CSV file in `source_dir` to a JSON document.
///
/// # Errors
/// Returns a [`BatchError`] for directory-level failures and invalid
/// options; per-file failures are recorded in the result.
pub fn convert_csv_to_json(
    source_dir: &Path,
    options: &CsvToJsonOptions,
) -> Result<ConversionResult, BatchError> {
    let encoding = options.resolve_encoding()?;
    run_batch(
        source_dir,
        DEFAULT_PATTERNS,
        &options.output_folder,
        |source, output_dir| convert_one(source, output_dir, encoding, options.pretty),
    )
}
