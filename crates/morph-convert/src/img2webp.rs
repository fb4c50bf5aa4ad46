//! Bitmap image to WebP converter.
//!
//! Static images are re-encoded through the `webp` encoder honoring the
//! quality setting or the lossless flag. Animated GIF sources keep every
//! frame and its delay in an animated WebP. Existing outputs are skipped
//! unless overwriting is enabled.

use std::fs;
use std::io::BufReader;
use std::path::Path;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, Frame, ImageReader};
use morph_core::{BatchError, ConversionResult, FileError, FileOutcome};
use webp::{AnimEncoder, AnimFrame, Encoder, WebPConfig};

use crate::batch::{destination_for, discard_partial_output, run_batch};

const DEFAULT_PATTERNS: &[&str] = &[
    "*.jpg", "*.jpeg", "*.png", "*.gif", "*.bmp", "*.tif", "*.tiff", "*.webp",
];

/// Options for [`convert_images_to_webp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebpOptions {
    /// Target quality, 0-100. Ignored for lossless encoding.
    pub quality: u8,
    /// Force lossless encoding.
    pub lossless: bool,
    /// Re-create outputs that already exist instead of skipping them.
    pub overwrite: bool,
    /// Name of the output directory created inside the source folder.
    pub output_folder: String,
}

impl Default for WebpOptions {
    fn default() -> Self {
        Self {
            quality: 80,
            lossless: false,
            overwrite: false,
            output_folder: "webp".to_string(),
        }
    }
}

impl WebpOptions {
    /// Set the target quality (0-100).
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Force lossless encoding.
    #[must_use]
    pub fn with_lossless(mut self, lossless: bool) -> Self {
        self.lossless = lossless;
        self
    }

    /// Re-create outputs that already exist.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set the output folder name.
    #[must_use]
    pub fn with_output_folder(mut self, name: impl Into<String>) -> Self {
        self.output_folder = name.into();
        self
    }

    fn validate(&self) -> Result<(), BatchError> {
        if self.quality > 100 {
            return Err(BatchError::InvalidOptions(format!(
                "quality must be between 0 and 100, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

/// Normalize to the pixel formats the WebP encoder accepts: RGBA when the
/// source carries an alpha channel, RGB otherwise.
fn normalize_color(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

fn encode_static(source: &Path, quality: u8, lossless: bool) -> Result<Vec<u8>, FileError> {
    let image = ImageReader::open(source)
        .map_err(|e| FileError::Read(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| FileError::Read(e.to_string()))?
        .decode()
        .map_err(|e| FileError::Decode(e.to_string()))?;

    let image = normalize_color(image);
    let encoder =
        Encoder::from_image(&image).map_err(|e| FileError::Convert(format!("webp: {e}")))?;
    let memory = if lossless {
        encoder.encode_lossless()
    } else {
        encoder.encode(f32::from(quality))
    };
    Ok(memory.to_vec())
}

fn encode_animation(frames: Vec<Frame>, quality: u8, lossless: bool) -> Result<Vec<u8>, FileError> {
    let mut config =
        WebPConfig::new().map_err(|()| FileError::Convert("webp configuration failed".into()))?;
    config.lossless = i32::from(lossless);
    config.quality = f32::from(quality);
    config.method = 6;

    let buffers: Vec<_> = frames
        .iter()
        .map(|frame| {
            let (numer, denom) = frame.delay().numer_denom_ms();
            let millis = if denom == 0 { 100 } else { numer / denom };
            (frame.buffer().clone(), millis as i32)
        })
        .collect();

    let (width, height) = buffers
        .first()
        .map(|(buffer, _)| buffer.dimensions())
        .ok_or_else(|| FileError::Decode("animation has no frames".into()))?;

    let mut encoder = AnimEncoder::new(width, height, &config);
    let mut timestamp = 0i32;
    for (buffer, millis) in &buffers {
        encoder.add_frame(AnimFrame::from_rgba(
            buffer.as_raw(),
            width,
            height,
            timestamp,
        ));
        timestamp += millis;
    }
    Ok(encoder.encode().to_vec())
}

/// Decode a GIF's frames, returning them only when it is truly animated.
fn animated_gif_frames(source: &Path) -> Result<Option<Vec<Frame>>, FileError> {
    let file = fs::File::open(source).map_err(|e| FileError::Read(e.to_string()))?;
    let decoder =
        GifDecoder::new(BufReader::new(file)).map_err(|e| FileError::Decode(e.to_string()))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| FileError::Decode(e.to_string()))?;
    if frames.len() > 1 {
        Ok(Some(frames))
    } else {
        Ok(None)
    }
}

fn convert_one(
    source: &Path,
    output_dir: &Path,
    options: &WebpOptions,
) -> Result<FileOutcome, FileError> {
    let destination = destination_for(source, output_dir, "webp");

    // Re-encoding a file onto itself can only happen when the output folder
    // resolves back to the source directory; never clobber the input.
    let same_dir = source.parent().and_then(|p| fs::canonicalize(p).ok())
        == fs::canonicalize(output_dir).ok();
    if same_dir && source.file_name() == destination.file_name() {
        return Ok(FileOutcome::Skipped(
            "destination equals source".to_string(),
        ));
    }

    if !options.overwrite && destination.exists() {
        return Ok(FileOutcome::Skipped("output already exists".to_string()));
    }

    let is_gif = source
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gif"));
    let encoded = if is_gif {
        match animated_gif_frames(source)? {
            Some(frames) => encode_animation(frames, options.quality, options.lossless)?,
            None => encode_static(source, options.quality, options.lossless)?,
        }
    } else {
        encode_static(source, options.quality, options.lossless)?
    };

    if let Err(e) = fs::write(&destination, encoded) {
        discard_partial_output(&destination);
        return Err(FileError::Write(e.to_string()));
    }
    Ok(FileOutcome::Converted(destination))
}

/// Convert every bitmap image in `source_dir` to WebP.
///
/// # Errors
/// Returns a [`BatchError`] for directory-level failures and invalid
/// options (quality outside 0-100); per-file failures are recorded in the
/// result.
pub fn convert_images_to_webp(
    source_dir: &Path,
    options: &WebpOptions,
) -> Result<ConversionResult, BatchError> {
    options.validate()?;
    run_batch(
        source_dir,
        DEFAULT_PATTERNS,
        &options.output_folder,
        |source, output_dir| convert_one(source, output_dir, options),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifEncoder;
    use image::codecs::webp::WebPDecoder;
    use image::{Delay, GenericImageView, Rgba, RgbaImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str) {
        let image = RgbaImage::from_pixel(4, 4, Rgba([200, 40, 40, 255]));
        image.save(dir.join(name)).unwrap();
    }

    fn write_animated_gif(dir: &Path, name: &str, frame_count: usize) {
        let file = fs::File::create(dir.join(name)).unwrap();
        let mut encoder = GifEncoder::new(file);
        let frames = (0..frame_count).map(|i| {
            let shade = (i * 60) as u8;
            let buffer = RgbaImage::from_pixel(8, 8, Rgba([shade, 255 - shade, 0, 255]));
            Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(100, 1))
        });
        encoder.encode_frames(frames).unwrap();
    }

    #[test]
    fn converts_static_images() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "red.png");

        let result = convert_images_to_webp(tmp.path(), &WebpOptions::default()).unwrap();
        assert_eq!(result.total_converted(), 1);

        let out = result.output_dir().join("red.webp");
        assert!(out.exists());
        let decoded = ImageReader::open(&out)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(decoded.dimensions(), (4, 4));
    }

    #[test]
    fn animated_gif_preserves_frame_count() {
        let tmp = TempDir::new().unwrap();
        write_animated_gif(tmp.path(), "loop.gif", 3);

        let result = convert_images_to_webp(tmp.path(), &WebpOptions::default()).unwrap();
        assert_eq!(result.total_converted(), 1);

        let bytes = fs::read(result.output_dir().join("loop.webp")).unwrap();
        let decoder = WebPDecoder::new(Cursor::new(bytes)).unwrap();
        assert!(decoder.has_animation());
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 3);
    }

    #[test]
    fn rerun_without_overwrite_skips_everything() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "a.png");
        write_png(tmp.path(), "b.png");

        let options = WebpOptions::default();
        let first = convert_images_to_webp(tmp.path(), &options).unwrap();
        assert_eq!(first.total_converted(), 2);

        let second = convert_images_to_webp(tmp.path(), &options).unwrap();
        assert_eq!(second.total_converted(), 0);
        assert_eq!(second.total_skipped(), first.total_converted());
    }

    #[test]
    fn overwrite_reconverts_existing_outputs() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "a.png");

        let options = WebpOptions::default();
        convert_images_to_webp(tmp.path(), &options).unwrap();
        let again =
            convert_images_to_webp(tmp.path(), &options.clone().with_overwrite(true)).unwrap();
        assert_eq!(again.total_converted(), 1);
        assert_eq!(again.total_skipped(), 0);
    }

    #[test]
    fn corrupt_image_is_a_per_file_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("broken.png"), b"not an image at all").unwrap();
        write_png(tmp.path(), "fine.png");

        let result = convert_images_to_webp(tmp.path(), &WebpOptions::default()).unwrap();
        assert_eq!(result.total_converted(), 1);
        assert_eq!(result.total_errors(), 1);
    }

    #[test]
    fn out_of_range_quality_fails_fast() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "a.png");

        let options = WebpOptions::default().with_quality(150);
        let err = convert_images_to_webp(tmp.path(), &options).unwrap_err();
        assert!(matches!(err, BatchError::InvalidOptions(_)));
        assert!(!tmp.path().join("webp").exists());
    }

    #[test]
    fn webp_source_in_same_folder_output_skips_self() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "seed.png");
        // First produce a .webp sitting next to its future output path.
        let options = WebpOptions::default().with_output_folder(".".to_string());
        let first = convert_images_to_webp(tmp.path(), &options).unwrap();
        assert_eq!(first.total_converted(), 1);

        // The generated seed.webp is now a candidate whose destination is
        // itself; it must be skipped, not clobbered.
        let second =
            convert_images_to_webp(tmp.path(), &options.clone().with_overwrite(true)).unwrap();
        assert!(second.skipped.iter().any(|p| p.ends_with("seed.webp")));
    }
}
