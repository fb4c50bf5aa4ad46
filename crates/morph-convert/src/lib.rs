//! Batch file-format converters.
//!
//! Each converter validates its options, then hands a per-file closure to
//! the shared batch driver in [`batch`]. One bad file never aborts a run;
//! its failure is recorded into the returned
//! [`ConversionResult`](morph_core::ConversionResult) and the batch moves
//! on. Directory-level problems (missing source folder, unwritable output
//! path, invalid options) abort immediately with a
//! [`BatchError`](morph_core::BatchError).

pub mod batch;
pub mod csv2json;
pub mod html2md;
pub mod img2webp;
pub mod md2html;
pub mod text2pdf;

pub use batch::run_batch;
pub use csv2json::{convert_csv_to_json, CsvToJsonOptions};
pub use html2md::{convert_html_to_markdown, HeadingStyle, HtmlToMarkdownOptions};
pub use img2webp::{convert_images_to_webp, WebpOptions};
pub use md2html::{convert_markdown_to_html, MarkdownToHtmlOptions, Theme};
pub use text2pdf::{convert_text_to_pdf, TextToPdfOptions};
