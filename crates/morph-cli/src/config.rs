//! Configuration file support.
//!
//! Defaults for every subcommand can be stored in a `.morph.toml` file.
//! Two locations are consulted: the user's home directory, then the
//! current working directory; a section present in the project file
//! replaces the same section from the user file. Command-line arguments
//! always win over configuration values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// File name looked up in both the project and home directories.
pub const CONFIG_FILE_NAME: &str = ".morph.toml";

/// Defaults for the `html2md` subcommand.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Html2mdConfig {
    pub heading_style: Option<String>,
    pub bullet: Option<char>,
    pub wrap: Option<usize>,
    pub output_folder: Option<String>,
}

/// Defaults for the `img2webp` subcommand.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Img2webpConfig {
    pub quality: Option<u8>,
    pub lossless: Option<bool>,
    pub overwrite: Option<bool>,
    pub output_folder: Option<String>,
}

/// Defaults for the `csv2json` subcommand.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Csv2jsonConfig {
    pub pretty: Option<bool>,
    pub encoding: Option<String>,
    pub output_folder: Option<String>,
}

/// Defaults for the `md2html` subcommand.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Md2htmlConfig {
    pub theme: Option<String>,
    pub extra_css: Option<String>,
    pub output_folder: Option<String>,
}

/// Defaults for the `text2pdf` subcommand.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Text2pdfConfig {
    pub font_name: Option<String>,
    pub font_path: Option<PathBuf>,
    pub font_size: Option<f64>,
    pub margin: Option<f64>,
    pub output_folder: Option<String>,
}

/// Root configuration structure, one optional section per subcommand.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub html2md: Option<Html2mdConfig>,
    pub img2webp: Option<Img2webpConfig>,
    pub csv2json: Option<Csv2jsonConfig>,
    pub md2html: Option<Md2htmlConfig>,
    pub text2pdf: Option<Text2pdfConfig>,
}

impl Config {
    /// Parse a configuration file, returning `None` when it is absent.
    /// A present-but-malformed file is reported and otherwise ignored so a
    /// stray config never blocks conversions.
    fn load(path: &Path) -> Option<Self> {
        let contents = fs::read_to_string(path).ok()?;
        match toml::from_str(&contents) {
            Ok(config) => Some(config),
            Err(err) => {
                log::warn!("ignoring malformed config {}: {err}", path.display());
                None
            }
        }
    }

    /// Load and merge the user and project configuration files.
    #[must_use]
    pub fn discover() -> Self {
        let user = dirs::home_dir()
            .map(|home| home.join(CONFIG_FILE_NAME))
            .and_then(|path| Self::load(&path));
        let project = Self::load(Path::new(CONFIG_FILE_NAME));
        Self::merge(user, project)
    }

    /// Merge two configurations; project sections replace user sections.
    #[must_use]
    pub fn merge(user: Option<Self>, project: Option<Self>) -> Self {
        let user = user.unwrap_or_default();
        let project = project.unwrap_or_default();
        Self {
            html2md: project.html2md.or(user.html2md),
            img2webp: project.img2webp.or(user.img2webp),
            csv2json: project.csv2json.or(user.csv2json),
            md2html: project.md2html.or(user.md2html),
            text2pdf: project.text2pdf.or(user.text2pdf),
        }
    }
}
