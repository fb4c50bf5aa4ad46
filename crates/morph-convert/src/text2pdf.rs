//! Plain text to PDF converter.
//!
//! Lays text onto paginated A4 pages (size configurable). Fonts resolve
//! either to one of the standard PDF fonts by name, or to a TrueType file
//! that gets embedded into the document. Long lines wrap at word
//! boundaries using the font's em-width metric, vertical overflow starts a
//! new page, and blank lines survive as vertical spacing.

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use morph_core::{BatchError, ConversionResult, FileError, FileOutcome};

use crate::batch::{destination_for, discard_partial_output, run_batch};

const DEFAULT_PATTERNS: &[&str] = &["*.txt", "*.md", "*.markdown"];

const POINTS_PER_INCH: f64 = 72.0;
/// A4 portrait in PostScript points.
pub const A4_POINTS: (f64, f64) = (595.276, 841.89);
const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Standard PDF fonts with the width of 'M' in thousandths of an em.
/// The em width drives the character budget used for word wrapping.
const STANDARD_FONTS: &[(&str, f64)] = &[
    ("Courier", 600.0),
    ("Courier-Bold", 600.0),
    ("Courier-Oblique", 600.0),
    ("Courier-BoldOblique", 600.0),
    ("Helvetica", 833.0),
    ("Helvetica-Bold", 833.0),
    ("Helvetica-Oblique", 833.0),
    ("Helvetica-BoldOblique", 833.0),
    ("Times-Roman", 889.0),
    ("Times-Bold", 944.0),
    ("Times-Italic", 889.0),
    ("Times-BoldItalic", 889.0),
];

/// Options for [`convert_text_to_pdf`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextToPdfOptions {
    /// Font name: a standard PDF font unless `font_path` is given.
    pub font_name: String,
    /// TrueType font file to embed instead of a standard font.
    pub font_path: Option<PathBuf>,
    /// Font size in points.
    pub font_size: f64,
    /// Page margin in inches.
    pub margin: f64,
    /// Page size in points (width, height).
    pub page_size: (f64, f64),
    /// Name of the output directory created inside the source folder.
    pub output_folder: String,
}

impl Default for TextToPdfOptions {
    fn default() -> Self {
        Self {
            font_name: "Courier".to_string(),
            font_path: None,
            font_size: 12.0,
            margin: 1.0,
            page_size: A4_POINTS,
            output_folder: "pdf".to_string(),
        }
    }
}

impl TextToPdfOptions {
    /// Set the font name.
    #[must_use]
    pub fn with_font_name(mut self, name: impl Into<String>) -> Self {
        self.font_name = name.into();
        self
    }

    /// Embed a TrueType font from the given file.
    #[must_use]
    pub fn with_font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    /// Set the font size in points.
    #[must_use]
    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    /// Set the page margin in inches.
    #[must_use]
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Set the output folder name.
    #[must_use]
    pub fn with_output_folder(mut self, name: impl Into<String>) -> Self {
        self.output_folder = name.into();
        self
    }

    fn validate(&self) -> Result<(), BatchError> {
        if !(self.font_size > 0.0) {
            return Err(BatchError::InvalidOptions(format!(
                "font size must be positive, got {}",
                self.font_size
            )));
        }
        if self.margin < 0.0 {
            return Err(BatchError::InvalidOptions(format!(
                "margin must be zero or positive, got {}",
                self.margin
            )));
        }
        Ok(())
    }
}

/// A font ready for use in the generated documents.
enum ResolvedFont {
    /// One of the standard PDF fonts; nothing to embed.
    Standard {
        base_font: &'static str,
        em_width: f64,
    },
    /// A TrueType font embedded into every produced file.
    TrueType {
        base_font: String,
        data: Vec<u8>,
        em_width: f64,
        widths: Vec<i64>,
        ascent: f64,
        descent: f64,
        cap_height: f64,
        bbox: [f64; 4],
    },
}

impl ResolvedFont {
    fn em_width(&self) -> f64 {
        match self {
            Self::Standard { em_width, .. } | Self::TrueType { em_width, .. } => *em_width,
        }
    }
}

/// Load metrics and raw data from a TrueType file.
fn load_truetype(path: &Path, fallback_name: &str) -> Result<ResolvedFont, BatchError> {
    let register_err = |detail: String| {
        BatchError::InvalidOptions(format!(
            "unable to register font from {}: {detail}",
            path.display()
        ))
    };

    let font = font_kit::font::Font::from_path(path, 0).map_err(|e| register_err(e.to_string()))?;
    let metrics = font.metrics();
    let scale = 1000.0 / f64::from(metrics.units_per_em);

    let advance = |c: char| -> Option<f64> {
        let glyph = font.glyph_for_char(c)?;
        let vector = font.advance(glyph).ok()?;
        Some(f64::from(vector.x()) * scale)
    };

    // Widths for the printable ASCII range the layout engine emits.
    let widths: Vec<i64> = (32u8..=126)
        .map(|code| advance(code as char).unwrap_or(0.0).round() as i64)
        .collect();
    let em_width = advance('M').unwrap_or(600.0);

    let data = font
        .copy_font_data()
        .ok_or_else(|| register_err("font carries no raw data".to_string()))?
        .to_vec();
    let base_font = font
        .postscript_name()
        .unwrap_or_else(|| fallback_name.to_string());

    let bbox = metrics.bounding_box;
    Ok(ResolvedFont::TrueType {
        base_font,
        data,
        em_width,
        widths,
        ascent: f64::from(metrics.ascent) * scale,
        descent: f64::from(metrics.descent) * scale,
        cap_height: f64::from(metrics.cap_height) * scale,
        bbox: [
            f64::from(bbox.origin_x()) * scale,
            f64::from(bbox.origin_y()) * scale,
            f64::from(bbox.max_x()) * scale,
            f64::from(bbox.max_y()) * scale,
        ],
    })
}

/// Resolve the configured font, failing before any file is processed.
fn resolve_font(options: &TextToPdfOptions) -> Result<ResolvedFont, BatchError> {
    if let Some(path) = &options.font_path {
        return load_truetype(path, &options.font_name);
    }
    STANDARD_FONTS
        .iter()
        .find(|(name, _)| *name == options.font_name)
        .map(|&(base_font, em_width)| ResolvedFont::Standard { base_font, em_width })
        .ok_or_else(|| {
            BatchError::InvalidOptions(format!(
                "unknown font {:?}: expected a TrueType file or one of the standard PDF fonts",
                options.font_name
            ))
        })
}

/// Wrap text at word boundaries to a character budget, preserving blank
/// lines.
fn wrap_lines(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
            } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        lines.push(current);
    }
    lines
}

/// Map a line onto the bytes of the PDF text encoding; characters outside
/// Latin-1 degrade to '?'.
fn encode_text(line: &str) -> Vec<u8> {
    line.chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect()
}

fn add_font_object(doc: &mut Document, font: &ResolvedFont) -> Result<Object, FileError> {
    match font {
        ResolvedFont::Standard { base_font, .. } => {
            let id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => *base_font,
                "Encoding" => "WinAnsiEncoding",
            });
            Ok(id.into())
        }
        ResolvedFont::TrueType {
            base_font,
            data,
            widths,
            ascent,
            descent,
            cap_height,
            bbox,
            ..
        } => {
            let font_file_id = doc.add_object(Stream::new(
                dictionary! { "Length1" => data.len() as i64 },
                data.clone(),
            ));
            let descriptor_id = doc.add_object(dictionary! {
                "Type" => "FontDescriptor",
                "FontName" => Object::Name(base_font.clone().into_bytes()),
                "Flags" => 32,
                "FontBBox" => bbox.iter().map(|v| Object::Real(*v as f32)).collect::<Vec<_>>(),
                "ItalicAngle" => 0,
                "Ascent" => Object::Real(*ascent as f32),
                "Descent" => Object::Real(*descent as f32),
                "CapHeight" => Object::Real(*cap_height as f32),
                "StemV" => 80,
                "FontFile2" => font_file_id,
            });
            let id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "TrueType",
                "BaseFont" => Object::Name(base_font.clone().into_bytes()),
                "FirstChar" => 32,
                "LastChar" => 126,
                "Widths" => widths.iter().map(|w| Object::Integer(*w)).collect::<Vec<_>>(),
                "FontDescriptor" => descriptor_id,
                "Encoding" => "WinAnsiEncoding",
            });
            Ok(id.into())
        }
    }
}

/// Build a complete PDF document from already-wrapped lines.
fn build_pdf(
    lines: &[String],
    font: &ResolvedFont,
    options: &TextToPdfOptions,
) -> Result<Vec<u8>, FileError> {
    let (page_width, page_height) = options.page_size;
    let margin = options.margin * POINTS_PER_INCH;
    let line_height = options.font_size * LINE_HEIGHT_FACTOR;
    let top = page_height - margin;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_ref = add_font_object(&mut doc, font)?;
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_ref },
    });

    let start_page = |ops: &mut Vec<Operation>| {
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec!["F1".into(), Object::Real(options.font_size as f32)],
        ));
        ops.push(Operation::new("TL", vec![Object::Real(line_height as f32)]));
        ops.push(Operation::new(
            "Td",
            vec![Object::Real(margin as f32), Object::Real(top as f32)],
        ));
    };
    let finish_page = |doc: &mut Document,
                       ops: Vec<Operation>,
                       kids: &mut Vec<Object>|
     -> Result<(), FileError> {
        let mut ops = ops;
        ops.push(Operation::new("ET", vec![]));
        let content = Content { operations: ops };
        let encoded = content
            .encode()
            .map_err(|e| FileError::Convert(format!("content stream: {e}")))?;
        let stream_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => stream_id,
        });
        kids.push(page_id.into());
        Ok(())
    };

    let mut kids: Vec<Object> = Vec::new();
    let mut ops: Vec<Operation> = Vec::new();
    start_page(&mut ops);
    let mut cursor = top;

    for line in lines {
        if cursor < margin + line_height {
            finish_page(&mut doc, std::mem::take(&mut ops), &mut kids)?;
            start_page(&mut ops);
            cursor = top;
        }
        if !line.is_empty() {
            ops.push(Operation::new(
                "Tj",
                vec![Object::string_literal(encode_text(line))],
            ));
        }
        ops.push(Operation::new("T*", vec![]));
        cursor -= line_height;
    }
    finish_page(&mut doc, ops, &mut kids)?;

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(page_width as f32),
                Object::Real(page_height as f32),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| FileError::Convert(format!("pdf serialization: {e}")))?;
    Ok(buffer)
}

fn convert_one(
    source: &Path,
    output_dir: &Path,
    font: &ResolvedFont,
    options: &TextToPdfOptions,
) -> Result<FileOutcome, FileError> {
    let text = fs::read_to_string(source).map_err(|e| FileError::Read(e.to_string()))?;

    let (page_width, _) = options.page_size;
    let text_width = page_width - 2.0 * options.margin * POINTS_PER_INCH;
    let char_width = (font.em_width() / 1000.0 * options.font_size).max(1.0);
    let max_chars = ((text_width / char_width) as usize).max(10);

    let lines = wrap_lines(&text, max_chars);
    let bytes = build_pdf(&lines, font, options)?;

    let destination = destination_for(source, output_dir, "pdf");
    if let Err(e) = fs::write(&destination, bytes) {
        discard_partial_output(&destination);
        return Err(FileError::Write(e.to_string()));
    }
    Ok(FileOutcome::Converted(destination))
}

/// Convert every text file in `source_dir` to a paginated PDF.
///
/// # Errors
/// Returns a [`BatchError`] for directory-level failures, invalid layout
/// options, or a font that cannot be resolved; per-file failures are
/// recorded in the result.
pub fn convert_text_to_pdf(
    source_dir: &Path,
    options: &TextToPdfOptions,
) -> Result<ConversionResult, BatchError> {
    options.validate()?;
    let font = resolve_font(options)?;
    run_batch(
        source_dir,
        DEFAULT_PATTERNS,
        &options.output_folder,
        |source, output_dir| convert_one(source, output_dir, &font, options),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn wrapping_preserves_blank_lines() {
        let lines = wrap_lines("first\n\nsecond\n", 40);
        assert_eq!(lines, ["first", "", "second"]);
    }

    #[test]
    fn wrapping_breaks_at_word_boundaries() {
        let lines = wrap_lines("alpha beta gamma delta", 11);
        assert_eq!(lines, ["alpha beta", "gamma delta"]);
    }

    #[test]
    fn text_encoding_degrades_outside_latin1() {
        assert_eq!(encode_text("abc"), b"abc");
        assert_eq!(encode_text("caf\u{e9}"), b"caf\xe9");
        assert_eq!(encode_text("\u{1f600}"), b"?");
    }

    #[test]
    fn produces_a_loadable_pdf() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("note.txt"), "Hello PDF world\n").unwrap();

        let result = convert_text_to_pdf(tmp.path(), &TextToPdfOptions::default()).unwrap();
        assert_eq!(result.total_converted(), 1);

        let bytes = fs::read(result.output_dir().join("note.pdf")).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn long_documents_paginate() {
        let tmp = TempDir::new().unwrap();
        let text: String = (0..120).map(|i| format!("line number {i}\n")).collect();
        fs::write(tmp.path().join("long.txt"), text).unwrap();

        let result = convert_text_to_pdf(tmp.path(), &TextToPdfOptions::default()).unwrap();
        let bytes = fs::read(result.output_dir().join("long.pdf")).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn unknown_font_fails_before_processing() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("note.txt"), "x\n").unwrap();

        let options = TextToPdfOptions::default().with_font_name("Comic-Sans");
        let err = convert_text_to_pdf(tmp.path(), &options).unwrap_err();
        assert!(matches!(err, BatchError::InvalidOptions(_)));
    }

    #[test]
    fn zero_font_size_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let options = TextToPdfOptions::default().with_font_size(0.0);
        let err = convert_text_to_pdf(tmp.path(), &options).unwrap_err();
        assert!(matches!(err, BatchError::InvalidOptions(_)));
    }

    #[test]
    fn negative_margin_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let options = TextToPdfOptions::default().with_margin(-0.5);
        let err = convert_text_to_pdf(tmp.path(), &options).unwrap_err();
        assert!(matches!(err, BatchError::InvalidOptions(_)));
    }

    #[test]
    fn markdown_sources_are_candidates_too() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("readme.md"), "# heading\n\nbody\n").unwrap();

        let result = convert_text_to_pdf(tmp.path(), &TextToPdfOptions::default()).unwrap();
        assert_eq!(result.total_converted(), 1);
        assert!(result.output_dir().join("readme.pdf").exists());
    }
}
