//! morph - batch file-format conversion CLI.
//!
//! One subcommand per converter; each takes a source directory, runs the
//! whole batch, and reports the converted/skipped/error counts. Per-file
//! failures never fail the process - only directory-level problems
//! (missing source folder, unwritable output path, invalid options) exit
//! non-zero.

mod config;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use morph_core::ConversionResult;
use morph_convert::{
    convert_csv_to_json, convert_html_to_markdown, convert_images_to_webp,
    convert_markdown_to_html, convert_text_to_pdf, CsvToJsonOptions, HeadingStyle,
    HtmlToMarkdownOptions, MarkdownToHtmlOptions, TextToPdfOptions, Theme, WebpOptions,
};

use config::Config;

/// Converter catalog shown by the `formats` subcommand.
const CONVERTERS: &[(&str, &str)] = &[
    ("html2md", "Convert HTML documents to Markdown"),
    ("img2webp", "Convert bitmap images to WebP"),
    ("csv2json", "Convert CSV files into JSON documents"),
    ("md2html", "Render Markdown documents as themed HTML"),
    ("text2pdf", "Generate paginated PDF files from plain text"),
];

/// Verbosity level for output control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    const fn should_show_output(self) -> bool {
        !matches!(self, Self::Quiet)
    }

    const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose)
    }
}

/// Markdown heading flavor for `html2md`.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum HeadingStyleArg {
    Atx,
    Setext,
}

impl From<HeadingStyleArg> for HeadingStyle {
    fn from(value: HeadingStyleArg) -> Self {
        match value {
            HeadingStyleArg::Atx => Self::Atx,
            HeadingStyleArg::Setext => Self::Setext,
        }
    }
}

fn heading_style_from_config(value: &str) -> Option<HeadingStyle> {
    match value.to_ascii_lowercase().as_str() {
        "atx" => Some(HeadingStyle::Atx),
        "setext" => Some(HeadingStyle::Setext),
        _ => None,
    }
}

/// Stylesheet theme for `md2html`.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ThemeArg {
    Default,
    Github,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Default => Self::Default,
            ThemeArg::Github => Self::Github,
            ThemeArg::Dark => Self::Dark,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "morph",
    about = "A swiss-army knife for common file format conversions",
    long_about = "Batch file-format conversions: HTML to Markdown, images to WebP,\n\
                  CSV to JSON, Markdown to HTML, and plain text to PDF.\n\
                  \n\
                  Each subcommand converts every matching file in a source directory\n\
                  and writes the results into an output folder next to the inputs.\n\
                  Defaults can be set via a .morph.toml configuration file.",
    version
)]
struct Args {
    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show detailed processing information
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert HTML documents to Markdown
    Html2md {
        /// Folder containing HTML files
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Heading style (default: atx, or from config)
        #[arg(long, value_enum)]
        heading_style: Option<HeadingStyleArg>,

        /// Bullet character for unordered lists: -, * or +
        #[arg(long)]
        bullet: Option<char>,

        /// Soft wrap width in characters (0 disables wrapping)
        #[arg(long, value_name = "WIDTH")]
        wrap: Option<usize>,

        /// Name of the output directory (default: markdown)
        #[arg(long, value_name = "NAME")]
        output_folder: Option<String>,

        /// Print the summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Convert bitmap images to WebP
    Img2webp {
        /// Folder containing image files
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// WebP quality, 0-100 (default: 80, or from config)
        #[arg(long)]
        quality: Option<u8>,

        /// Force lossless encoding
        #[arg(long)]
        lossless: bool,

        /// Re-create files even if they already exist
        #[arg(long)]
        overwrite: bool,

        /// Name of the output directory (default: webp)
        #[arg(long, value_name = "NAME")]
        output_folder: Option<String>,

        /// Print the summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Convert CSV files into JSON documents
    Csv2json {
        /// Folder containing CSV files
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Disable pretty-printed JSON output
        #[arg(long)]
        no_pretty: bool,

        /// Input text encoding (default: utf-8, or from config)
        #[arg(long, value_name = "LABEL")]
        encoding: Option<String>,

        /// Name of the output directory (default: json)
        #[arg(long, value_name = "NAME")]
        output_folder: Option<String>,

        /// Print the summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Render Markdown documents as themed HTML
    Md2html {
        /// Folder containing Markdown files
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// CSS theme (default: default, or from config)
        #[arg(long, value_enum)]
        theme: Option<ThemeArg>,

        /// Inline CSS appended after the selected theme
        #[arg(long, value_name = "CSS")]
        extra_css: Option<String>,

        /// Name of the output directory (default: html)
        #[arg(long, value_name = "NAME")]
        output_folder: Option<String>,

        /// Print the summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Generate paginated PDF files from plain text
    Text2pdf {
        /// Folder containing text files
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Standard PDF font name (default: Courier, or from config)
        #[arg(long, value_name = "NAME")]
        font_name: Option<String>,

        /// TrueType font file to embed instead of a standard font
        #[arg(long, value_name = "FILE")]
        font_path: Option<PathBuf>,

        /// Font size in points (default: 12)
        #[arg(long, value_name = "POINTS")]
        font_size: Option<f64>,

        /// Page margin in inches (default: 1.0)
        #[arg(long, value_name = "INCHES")]
        margin: Option<f64>,

        /// Name of the output directory (default: pdf)
        #[arg(long, value_name = "NAME")]
        output_folder: Option<String>,

        /// Print the summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List available converters
    Formats {
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::discover();
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);

    match args.command {
        Commands::Html2md {
            source,
            heading_style,
            bullet,
            wrap,
            output_folder,
            json,
        } => {
            let defaults = config.html2md.unwrap_or_default();
            let mut options = HtmlToMarkdownOptions::default();
            options.heading_style = heading_style.map(Into::into).or_else(|| {
                defaults
                    .heading_style
                    .as_deref()
                    .and_then(heading_style_from_config)
            })
            .unwrap_or_default();
            if let Some(bullet) = bullet.or(defaults.bullet) {
                options.bullet = bullet;
            }
            if let Some(wrap) = wrap.or(defaults.wrap) {
                options.wrap_width = wrap;
            }
            if let Some(name) = output_folder.or(defaults.output_folder) {
                options.output_folder = name;
            }

            let result = with_progress(&source, verbosity, json, || {
                convert_html_to_markdown(&source, &options)
            })?;
            report(&result, json, verbosity);
            Ok(())
        }

        Commands::Img2webp {
            source,
            quality,
            lossless,
            overwrite,
            output_folder,
            json,
        } => {
            let defaults = config.img2webp.unwrap_or_default();
            let mut options = WebpOptions::default();
            if let Some(quality) = quality.or(defaults.quality) {
                options.quality = quality;
            }
            options.lossless = lossless || defaults.lossless.unwrap_or(false);
            options.overwrite = overwrite || defaults.overwrite.unwrap_or(false);
            if let Some(name) = output_folder.or(defaults.output_folder) {
                options.output_folder = name;
            }

            let result = with_progress(&source, verbosity, json, || {
                convert_images_to_webp(&source, &options)
            })?;
            report(&result, json, verbosity);
            Ok(())
        }

        Commands::Csv2json {
            source,
            no_pretty,
            encoding,
            output_folder,
            json,
        } => {
            let defaults = config.csv2json.unwrap_or_default();
            let mut options = CsvToJsonOptions::default();
            options.pretty = if no_pretty {
                false
            } else {
                defaults.pretty.unwrap_or(true)
            };
            if let Some(encoding) = encoding.or(defaults.encoding) {
                options.encoding = encoding;
            }
            if let Some(name) = output_folder.or(defaults.output_folder) {
                options.output_folder = name;
            }

            let result = with_progress(&source, verbosity, json, || {
                convert_csv_to_json(&source, &options)
            })?;
            report(&result, json, verbosity);
            Ok(())
        }

        Commands::Md2html {
            source,
            theme,
            extra_css,
            output_folder,
            json,
        } => {
            let defaults = config.md2html.unwrap_or_default();
            let mut options = MarkdownToHtmlOptions::default();
            options.theme = match theme {
                Some(theme) => theme.into(),
                None => defaults
                    .theme
                    .as_deref()
                    .map(|name| {
                        name.parse::<Theme>()
                            .map_err(|e| anyhow::anyhow!(e))
                            .context("invalid theme in configuration")
                    })
                    .transpose()?
                    .unwrap_or_default(),
            };
            options.extra_css = extra_css.or(defaults.extra_css);
            if let Some(name) = output_folder.or(defaults.output_folder) {
                options.output_folder = name;
            }

            let result = with_progress(&source, verbosity, json, || {
                convert_markdown_to_html(&source, &options)
            })?;
            report(&result, json, verbosity);
            Ok(())
        }

        Commands::Text2pdf {
            source,
            font_name,
            font_path,
            font_size,
            margin,
            output_folder,
            json,
        } => {
            let defaults = config.text2pdf.unwrap_or_default();
            let mut options = TextToPdfOptions::default();
            if let Some(name) = font_name.or(defaults.font_name) {
                options.font_name = name;
            }
            options.font_path = font_path.or(defaults.font_path);
            if let Some(size) = font_size.or(defaults.font_size) {
                options.font_size = size;
            }
            if let Some(margin) = margin.or(defaults.margin) {
                options.margin = margin;
            }
            if let Some(name) = output_folder.or(defaults.output_folder) {
                options.output_folder = name;
            }

            let result = with_progress(&source, verbosity, json, || {
                convert_text_to_pdf(&source, &options)
            })?;
            report(&result, json, verbosity);
            Ok(())
        }

        Commands::Formats { json } => {
            formats_command(json);
            Ok(())
        }

        Commands::Completion { shell } => {
            generate(shell, &mut Args::command(), "morph", &mut io::stdout());
            Ok(())
        }
    }
}

/// Run a batch with a spinner on stderr unless quiet or JSON output is
/// requested.
fn with_progress<F>(
    source: &std::path::Path,
    verbosity: Verbosity,
    json: bool,
    run: F,
) -> Result<ConversionResult>
where
    F: FnOnce() -> std::result::Result<ConversionResult, morph_core::BatchError>,
{
    let spinner = if verbosity.should_show_output() && !json {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .expect("template is compile-time constant"),
        );
        pb.set_message(format!("Converting files in {}", source.display()));
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    } else {
        ProgressBar::hidden()
    };

    let result = run();
    spinner.finish_and_clear();
    result.with_context(|| format!("conversion failed for {}", source.display()))
}

/// Print the run summary to stdout.
fn report(result: &ConversionResult, json: bool, verbosity: Verbosity) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result.summary()).expect("summary is valid JSON")
        );
        return;
    }
    if !verbosity.should_show_output() {
        return;
    }

    println!("{}", "=== Conversion Summary ===".bold());
    println!(
        "{:<16} {}",
        "Output folder:",
        result.output_dir().display().to_string().cyan()
    );
    println!(
        "{:<16} {}",
        "Converted:",
        result.total_converted().to_string().green()
    );
    println!(
        "{:<16} {}",
        "Skipped:",
        result.total_skipped().to_string().yellow()
    );
    println!(
        "{:<16} {}",
        "Errors:",
        if result.total_errors() > 0 {
            result.total_errors().to_string().red()
        } else {
            result.total_errors().to_string().normal()
        }
    );
    for (path, message) in &result.errors {
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        println!("  {} {}: {}", "✗".red().bold(), name, message.red());
    }
    if verbosity.is_verbose() {
        for (source, destination) in &result.converted {
            let from = source.file_name().unwrap_or_default().to_string_lossy();
            let to = destination.file_name().unwrap_or_default().to_string_lossy();
            println!("  {} {} -> {}", "✓".green().bold(), from, to);
        }
    }
}

/// List the available converters.
fn formats_command(json: bool) {
    if json {
        let listing: Vec<serde_json::Value> = CONVERTERS
            .iter()
            .map(|(name, description)| {
                serde_json::json!({ "name": name, "description": description })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&listing).expect("listing is valid JSON")
        );
        return;
    }
    println!("Available converters:\n");
    for (name, description) in CONVERTERS {
        println!("  {name:<10} {description}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert!(!Verbosity::Quiet.should_show_output());
        assert!(Verbosity::Verbose.is_verbose());
    }

    #[test]
    fn heading_style_config_values_parse() {
        assert!(matches!(
            heading_style_from_config("ATX"),
            Some(HeadingStyle::Atx)
        ));
        assert!(matches!(
            heading_style_from_config("setext"),
            Some(HeadingStyle::Setext)
        ));
        assert!(heading_style_from_config("banner").is_none());
    }
}
