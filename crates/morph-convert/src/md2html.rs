//! Markdown to HTML converter.
//!
//! Renders Markdown with tables, fenced code blocks, footnotes and
//! strikethrough enabled, gives every heading a deterministic slug id,
//! expands a `[TOC]` paragraph into a table of contents, and wraps the
//! result in a themed standalone HTML document. Identical input and
//! options always produce byte-identical output.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use morph_core::{BatchError, ConversionResult, FileError, FileOutcome};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::batch::{destination_for, discard_partial_output, run_batch};

const DEFAULT_PATTERNS: &[&str] = &["*.md", "*.markdown"];

const THEME_DEFAULT: &str = "\
body { font-family: system-ui, -apple-system, 'Segoe UI', sans-serif; margin: 2rem auto; max-width: 60rem; line-height: 1.6; color: #222; padding: 0 1.5rem; }
h1, h2, h3, h4, h5, h6 { font-weight: 600; line-height: 1.2; margin-top: 2rem; }
h1 { font-size: 2.2rem; border-bottom: 2px solid #eee; padding-bottom: .5rem; }
h2 { font-size: 1.8rem; border-bottom: 1px solid #eee; padding-bottom: .4rem; }
pre { background: #f6f8fa; padding: 1rem; border-radius: .5rem; overflow: auto; }
code { background: rgba(27,31,35,.05); padding: .2rem .4rem; border-radius: .35rem; font-family: ui-monospace, Menlo, Consolas, monospace; }
table { border-collapse: collapse; margin: 1.5rem 0; width: 100%; }
th, td { border: 1px solid #d0d7de; padding: .6rem; text-align: left; }
blockquote { border-left: .25rem solid #d0d7de; margin: 1rem 0; padding: 0 1rem; color: #57606a; }";

const THEME_GITHUB: &str = "\
body { font-family: system-ui, -apple-system, 'Segoe UI', sans-serif; margin: 2rem auto; max-width: 60rem; line-height: 1.6; color: #24292f; padding: 0 1.5rem; background: #fff; }
h1, h2, h3, h4, h5, h6 { font-weight: 600; line-height: 1.25; margin-top: 2rem; }
h1 { font-size: 2rem; border-bottom: 1px solid #d0d7de; padding-bottom: .5rem; }
h2 { font-size: 1.6rem; border-bottom: 1px solid #d0d7de; padding-bottom: .4rem; }
a { color: #0969da; text-decoration: none; }
a:hover { text-decoration: underline; }
code { background: rgba(175,184,193,.2); padding: .2rem .4rem; border-radius: .35rem; font-family: ui-monospace, Menlo, Consolas, monospace; }
pre { background: #f6f8fa; padding: 1rem; border-radius: .5rem; overflow: auto; }
table { border-collapse: collapse; margin: 1.5rem 0; width: 100%; }
th, td { border: 1px solid #d0d7de; padding: .6rem; text-align: left; }
blockquote { border-left: .25rem solid #d0d7de; margin: 1rem 0; padding: 0 1rem; color: #57606a; }";

const THEME_DARK: &str = "\
body { font-family: system-ui, -apple-system, 'Segoe UI', sans-serif; margin: 2rem auto; max-width: 60rem; line-height: 1.6; color: #c9d1d9; padding: 0 1.5rem; background: #0d1117; }
a { color: #58a6ff; }
h1, h2, h3, h4, h5, h6 { font-weight: 600; line-height: 1.25; margin-top: 2rem; color: #f0f6fc; }
h1 { font-size: 2rem; border-bottom: 1px solid #21262d; padding-bottom: .5rem; }
h2 { font-size: 1.6rem; border-bottom: 1px solid #21262d; padding-bottom: .4rem; }
code { background: rgba(110,118,129,.4); padding: .2rem .4rem; border-radius: .35rem; font-family: ui-monospace, Menlo, Consolas, monospace; color: #e6edf3; }
pre { background: #161b22; padding: 1rem; border-radius: .5rem; overflow: auto; }
table { border-collapse: collapse; margin: 1.5rem 0; width: 100%; }
th, td { border: 1px solid #30363d; padding: .6rem; text-align: left; }
blockquote { border-left: .25rem solid #30363d; margin: 1rem 0; padding: 0 1rem; color: #8b949e; }";

/// Stylesheet theme for generated documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Neutral light theme.
    #[default]
    Default,
    /// GitHub-like light theme.
    Github,
    /// Dark theme.
    Dark,
}

impl Theme {
    /// The theme's stylesheet.
    #[must_use]
    pub fn css(self) -> &'static str {
        match self {
            Self::Default => THEME_DEFAULT,
            Self::Github => THEME_GITHUB,
            Self::Dark => THEME_DARK,
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "github" => Ok(Self::Github),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme {other:?}")),
        }
    }
}

/// Options for [`convert_markdown_to_html`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownToHtmlOptions {
    /// Stylesheet theme.
    pub theme: Theme,
    /// Extra CSS appended after the theme stylesheet.
    pub extra_css: Option<String>,
    /// Name of the output directory created inside the source folder.
    pub output_folder: String,
}

impl Default for MarkdownToHtmlOptions {
    fn default() -> Self {
        Self {
            theme: Theme::Default,
            extra_css: None,
            output_folder: "html".to_string(),
        }
    }
}

impl MarkdownToHtmlOptions {
    /// Set the theme.
    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Append extra CSS after the theme stylesheet.
    #[must_use]
    pub fn with_extra_css(mut self, css: impl Into<String>) -> Self {
        self.extra_css = Some(css.into());
        self
    }

    /// Set the output folder name.
    #[must_use]
    pub fn with_output_folder(mut self, name: impl Into<String>) -> Self {
        self.output_folder = name.into();
        self
    }
}

/// Heading slug: lowercase, alphanumerics kept, everything else collapsed
/// into single dashes. Duplicate slugs get `-1`, `-2`, ... suffixes.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

struct Heading {
    level: u8,
    text: String,
    slug: String,
}

/// Collect headings (with deduplicated slugs) from the event stream.
fn collect_headings(events: &[Event]) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut seen: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let mut current: Option<(u8, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some((*level as u8, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, buf)) = current.as_mut() {
                    buf.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text)) = current.take() {
                    let base = slugify(&text);
                    let count = seen.entry(base.clone()).or_insert(0);
                    let slug = if *count == 0 {
                        base.clone()
                    } else {
                        format!("{base}-{count}")
                    };
                    *count += 1;
                    headings.push(Heading { level, text, slug });
                }
            }
            _ => {}
        }
    }
    headings
}

/// Render a nested-looking table of contents list.
fn toc_html(headings: &[Heading]) -> String {
    let mut out = String::from("<ul class=\"toc\">\n");
    for heading in headings {
        let _ = writeln!(
            out,
            "<li class=\"toc-level-{}\"><a href=\"#{}\">{}</a></li>",
            heading.level,
            heading.slug,
            escape_html(&heading.text)
        );
    }
    out.push_str("</ul>");
    out
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render Markdown to an HTML body fragment with heading ids and `[TOC]`
/// expansion.
#[must_use]
pub fn render_body(markdown: &str) -> String {
    let mut parser_options = Options::empty();
    parser_options.insert(Options::ENABLE_TABLES);
    parser_options.insert(Options::ENABLE_FOOTNOTES);
    parser_options.insert(Options::ENABLE_STRIKETHROUGH);
    parser_options.insert(Options::ENABLE_TASKLISTS);

    let events: Vec<Event> = Parser::new_ext(markdown, parser_options).collect();
    let headings = collect_headings(&events);
    let toc = toc_html(&headings);

    let mut out_events: Vec<Event> = Vec::with_capacity(events.len());
    let mut heading_index = 0usize;
    let mut i = 0usize;
    while i < events.len() {
        // A paragraph containing exactly the text "[TOC]" becomes the
        // table of contents.
        if let Event::Start(Tag::Paragraph) = &events[i] {
            if let (Some(Event::Text(text)), Some(Event::End(TagEnd::Paragraph))) =
                (events.get(i + 1), events.get(i + 2))
            {
                if text.trim() == "[TOC]" {
                    out_events.push(Event::Html(CowStr::from(toc.clone())));
                    i += 3;
                    continue;
                }
            }
        }
        match &events[i] {
            Event::Start(Tag::Heading {
                level,
                classes,
                attrs,
                ..
            }) => {
                let slug = headings
                    .get(heading_index)
                    .map(|h| h.slug.clone())
                    .unwrap_or_default();
                heading_index += 1;
                out_events.push(Event::Start(Tag::Heading {
                    level: *level,
                    id: Some(CowStr::from(slug)),
                    classes: classes.clone(),
                    attrs: attrs.clone(),
                }));
            }
            other => out_events.push(other.clone()),
        }
        i += 1;
    }

    let mut body = String::new();
    html::push_html(&mut body, out_events.into_iter());
    body
}

/// Tags that open an indented container in the reformatted output.
const CONTAINER_TAGS: &[&str] = &[
    "ul", "ol", "table", "thead", "tbody", "tr", "blockquote", "div", "section",
];
/// Block tags placed on their own line without increasing the indent.
const LEAF_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "th", "td", "pre", "hr",
];

fn tag_name(tag: &str) -> &str {
    let inner = tag.trim_start_matches('<').trim_start_matches('/');
    let end = inner
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(inner.len());
    &inner[..end]
}

/// Reformat an HTML fragment for readability: block-level tags start on
/// their own line, containers indent their children, `<pre>` content is
/// left untouched.
#[must_use]
pub fn reformat_fragment(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len() + fragment.len() / 4);
    let mut depth = 0usize;
    let mut in_pre = false;
    let mut rest = fragment;

    fn push_line(out: &mut String, depth: usize, tag: &str) {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(tag);
    }

    while let Some(start) = rest.find('<') {
        let (text, tail) = rest.split_at(start);
        if in_pre {
            out.push_str(text);
        } else if !text.trim().is_empty() {
            out.push_str(text.trim_matches('\n'));
        }

        let Some(end) = tail.find('>') else {
            out.push_str(tail);
            return out;
        };
        let tag = &tail[..=end];
        rest = &tail[end + 1..];

        let name = tag_name(tag);
        let closing = tag.starts_with("</");

        if in_pre {
            out.push_str(tag);
            if closing && name == "pre" {
                in_pre = false;
            }
            continue;
        }

        if CONTAINER_TAGS.contains(&name) {
            if closing {
                depth = depth.saturating_sub(1);
                push_line(&mut out, depth, tag);
            } else {
                push_line(&mut out, depth, tag);
                depth += 1;
            }
        } else if LEAF_TAGS.contains(&name) {
            if closing {
                out.push_str(tag);
            } else {
                push_line(&mut out, depth, tag);
                if name == "pre" {
                    in_pre = true;
                }
            }
        } else {
            out.push_str(tag);
        }
    }
    if !rest.trim().is_empty() {
        out.push_str(rest.trim_matches('\n'));
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Assemble the standalone HTML document around a rendered body.
fn wrap_document(title: &str, body: &str, options: &MarkdownToHtmlOptions) -> String {
    let mut css = options.theme.css().to_string();
    if let Some(extra) = &options.extra_css {
        css.push('\n');
        css.push_str(extra);
    }
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n\
         <style>\n{}\n</style>\n\
         </head>\n\
         <body>\n{}</body>\n\
         </html>\n",
        escape_html(title),
        css,
        reformat_fragment(body)
    )
}

fn convert_one(
    source: &Path,
    output_dir: &Path,
    options: &MarkdownToHtmlOptions,
) -> Result<FileOutcome, FileError> {
    let markdown = fs::read_to_string(source).map_err(|e| FileError::Read(e.to_string()))?;
    let body = render_body(&markdown);
    let title = source.file_stem().unwrap_or_default().to_string_lossy();
    let document = wrap_document(&title, &body, options);

    let destination = destination_for(source, output_dir, "html");
    if let Err(e) = fs::write(&destination, document) {
        discard_partial_output(&destination);
        return Err(FileError::Write(e.to_string()));
    }
    Ok(FileOutcome::Converted(destination))
}

/// Convert every Markdown document in `source_dir` to a standalone HTML
/// file.
///
/// # Errors
/// Returns a [`BatchError`] for directory-level failures; per-file
/// failures are recorded in the result.
pub fn convert_markdown_to_html(
    source_dir: &Path,
    options: &MarkdownToHtmlOptions,
) -> Result<ConversionResult, BatchError> {
    run_batch(
        source_dir,
        DEFAULT_PATTERNS,
        &options.output_folder,
        |source, output_dir| convert_one(source, output_dir, options),
    )
}
