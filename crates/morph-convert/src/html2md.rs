//! HTML to Markdown converter.
//!
//! Walks the parsed DOM and emits Markdown blocks. Headings follow the
//! configured style (ATX `#` prefixes, or Setext underlines for the first
//! two levels), unordered lists use the configured bullet character, and an
//! optional soft wrap re-flows paragraph text at word boundaries.

use std::fs;
use std::path::Path;

use morph_core::{BatchError, ConversionResult, FileError, FileOutcome};
use scraper::{ElementRef, Html, Node};

use crate::batch::{destination_for, discard_partial_output, run_batch};

const DEFAULT_PATTERNS: &[&str] = &["*.html", "*.htm"];

/// Markdown heading flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingStyle {
    /// `# Heading` prefixes for all levels.
    #[default]
    Atx,
    /// `===`/`---` underlines for levels 1-2, ATX for deeper levels.
    Setext,
}

/// Options for [`convert_html_to_markdown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlToMarkdownOptions {
    /// Heading rendering style.
    pub heading_style: HeadingStyle,
    /// Bullet character for unordered lists (`-`, `*` or `+`).
    pub bullet: char,
    /// Soft wrap width for paragraph text; 0 disables wrapping.
    pub wrap_width: usize,
    /// Name of the output directory created inside the source folder.
    pub output_folder: String,
}

impl Default for HtmlToMarkdownOptions {
    fn default() -> Self {
        Self {
            heading_style: HeadingStyle::Atx,
            bullet: '-',
            wrap_width: 0,
            output_folder: "markdown".to_string(),
        }
    }
}

impl HtmlToMarkdownOptions {
    /// Set the heading style.
    #[must_use]
    pub fn with_heading_style(mut self, style: HeadingStyle) -> Self {
        self.heading_style = style;
        self
    }

    /// Set the unordered-list bullet character.
    #[must_use]
    pub fn with_bullet(mut self, bullet: char) -> Self {
        self.bullet = bullet;
        self
    }

    /// Set the soft wrap width (0 disables wrapping).
    #[must_use]
    pub fn with_wrap_width(mut self, width: usize) -> Self {
        self.wrap_width = width;
        self
    }

    /// Set the output folder name.
    #[must_use]
    pub fn with_output_folder(mut self, name: impl Into<String>) -> Self {
        self.output_folder = name.into();
        self
    }

    fn validate(&self) -> Result<(), BatchError> {
        if !matches!(self.bullet, '-' | '*' | '+') {
            return Err(BatchError::InvalidOptions(format!(
                "bullet must be one of '-', '*', '+', got {:?}",
                self.bullet
            )));
        }
        Ok(())
    }
}

/// Collapse HTML whitespace runs into single spaces.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Render the inline content of an element (text, emphasis, links, images).
fn inline_text(element: ElementRef) -> String {
    let mut out = String::new();
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&collapse_whitespace(text)),
            Node::Element(_) => {
                let el = ElementRef::wrap(child).expect("element node wraps");
                match el.value().name() {
                    "strong" | "b" => {
                        let inner = inline_text(el);
                        let inner = inner.trim();
                        if !inner.is_empty() {
                            out.push_str(&format!("**{inner}**"));
                        }
                    }
                    "em" | "i" => {
                        let inner = inline_text(el);
                        let inner = inner.trim();
                        if !inner.is_empty() {
                            out.push_str(&format!("*{inner}*"));
                        }
                    }
                    "code" => {
                        let inner: String = el.text().collect();
                        out.push_str(&format!("`{}`", inner.trim()));
                    }
                    "a" => {
                        let inner = inline_text(el);
                        let inner = inner.trim();
                        match el.value().attr("href") {
                            Some(href) if !inner.is_empty() => {
                                out.push_str(&format!("[{inner}]({href})"));
                            }
                            _ => out.push_str(inner),
                        }
                    }
                    "img" => {
                        let alt = el.value().attr("alt").unwrap_or_default();
                        let src = el.value().attr("src").unwrap_or_default();
                        out.push_str(&format!("![{alt}]({src})"));
                    }
                    "br" => out.push('\n'),
                    "script" | "style" => {}
                    _ => out.push_str(&inline_text(el)),
                }
            }
            _ => {}
        }
    }
    out
}

/// Wrap a paragraph at word boundaries, preserving explicit line breaks.
fn soft_wrap(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }
    let mut lines = Vec::new();
    for input_line in text.lines() {
        let mut current = String::new();
        for word in input_line.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
            } else if current.chars().count() + 1 + word.chars().count() <= width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        lines.push(current);
    }
    lines.join("\n")
}

struct MarkdownRenderer<'a> {
    options: &'a HtmlToMarkdownOptions,
    blocks: Vec<String>,
}

impl<'a> MarkdownRenderer<'a> {
    fn new(options: &'a HtmlToMarkdownOptions) -> Self {
        Self {
            options,
            blocks: Vec::new(),
        }
    }

    fn push_block(&mut self, block: String) {
        if !block.trim().is_empty() {
            self.blocks.push(block);
        }
    }

    fn heading(&mut self, level: usize, element: ElementRef) {
        let text = inline_text(element).trim().to_string();
        if text.is_empty() {
            return;
        }
        let block = match (self.options.heading_style, level) {
            (HeadingStyle::Setext, 1) => format!("{text}\n{}", "=".repeat(text.chars().count())),
            (HeadingStyle::Setext, 2) => format!("{text}\n{}", "-".repeat(text.chars().count())),
            _ => format!("{} {text}", "#".repeat(level)),
        };
        self.push_block(block);
    }

    fn paragraph(&mut self, element: ElementRef) {
        let text = inline_text(element).trim().to_string();
        self.push_block(soft_wrap(&text, self.options.wrap_width));
    }

    fn code_block(&mut self, element: ElementRef) {
        let code: String = element.text().collect();
        let language = element
            .select(&scraper::Selector::parse("code").expect("static selector"))
            .next()
            .and_then(|code_el| code_el.value().attr("class"))
            .and_then(|class| class.strip_prefix("language-"))
            .unwrap_or_default();
        self.push_block(format!("```{language}\n{}\n```", code.trim_end()));
    }

    fn blockquote(&mut self, element: ElementRef) {
        let mut inner = MarkdownRenderer::new(self.options);
        inner.walk_children(element);
        let quoted = inner
            .blocks
            .join("\n\n")
            .lines()
            .map(|line| format!("> {line}").trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        self.push_block(quoted);
    }

    fn list(&mut self, element: ElementRef, ordered: bool) {
        let lines = self.list_lines(element, ordered, 0);
        self.push_block(lines.join("\n"));
    }

    fn list_lines(&self, element: ElementRef, ordered: bool, depth: usize) -> Vec<String> {
        let indent = "  ".repeat(depth);
        let mut lines = Vec::new();
        let mut index = 0usize;
        for child in element.children() {
            let Some(li) = ElementRef::wrap(child) else {
                continue;
            };
            if li.value().name() != "li" {
                continue;
            }
            index += 1;
            let marker = if ordered {
                format!("{index}.")
            } else {
                self.options.bullet.to_string()
            };

            // Item text excludes any nested list, which is rendered below it.
            let mut item_text = String::new();
            let mut nested: Vec<String> = Vec::new();
            for part in li.children() {
                match part.value() {
                    Node::Text(text) => item_text.push_str(&collapse_whitespace(text)),
                    Node::Element(_) => {
                        let el = ElementRef::wrap(part).expect("element node wraps");
                        match el.value().name() {
                            "ul" => nested.extend(self.list_lines(el, false, depth + 1)),
                            "ol" => nested.extend(self.list_lines(el, true, depth + 1)),
                            _ => item_text.push_str(&inline_text(el)),
                        }
                    }
                    _ => {}
                }
            }
            lines.push(format!("{indent}{marker} {}", item_text.trim()));
            lines.extend(nested);
        }
        lines
    }

    fn table(&mut self, element: ElementRef) {
        let row_selector = scraper::Selector::parse("tr").expect("static selector");
        let cell_selector = scraper::Selector::parse("th, td").expect("static selector");

        let mut rows: Vec<Vec<String>> = Vec::new();
        for row in element.select(&row_selector) {
            let cells: Vec<String> = row
                .select(&cell_selector)
                .map(|cell| inline_text(cell).trim().replace('|', "\\|"))
                .collect();
            if !cells.is_empty() {
                rows.push(cells);
            }
        }
        if rows.is_empty() {
            return;
        }

        let num_cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut lines = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let mut padded = row.clone();
            padded.resize(num_cols, String::new());
            lines.push(format!("| {} |", padded.join(" | ")));
            if i == 0 {
                lines.push(format!("|{}", " --- |".repeat(num_cols)));
            }
        }
        self.push_block(lines.join("\n"));
    }

    fn walk_children(&mut self, element: ElementRef) {
        // Loose text directly under a container becomes its own paragraph.
        let mut pending_text = String::new();
        for child in element.children() {
            match child.value() {
                Node::Text(text) => pending_text.push_str(&collapse_whitespace(text)),
                Node::Element(_) => {
                    let el = ElementRef::wrap(child).expect("element node wraps");
                    let name = el.value().name();
                    let is_block = matches!(
                        name,
                        "h1" | "h2"
                            | "h3"
                            | "h4"
                            | "h5"
                            | "h6"
                            | "p"
                            | "ul"
                            | "ol"
                            | "pre"
                            | "blockquote"
                            | "hr"
                            | "table"
                            | "div"
                            | "section"
                            | "article"
                            | "main"
                            | "header"
                            | "footer"
                            | "body"
                            | "html"
                            | "figure"
                    );
                    if is_block && !pending_text.trim().is_empty() {
                        let text = pending_text.trim().to_string();
                        self.push_block(soft_wrap(&text, self.options.wrap_width));
                    }
                    if is_block {
                        pending_text.clear();
                    }
                    match name {
                        "h1" => self.heading(1, el),
                        "h2" => self.heading(2, el),
                        "h3" => self.heading(3, el),
                        "h4" => self.heading(4, el),
                        "h5" => self.heading(5, el),
                        "h6" => self.heading(6, el),
                        "p" => self.paragraph(el),
                        "ul" => self.list(el, false),
                        "ol" => self.list(el, true),
                        "pre" => self.code_block(el),
                        "blockquote" => self.blockquote(el),
                        "hr" => self.push_block("---".to_string()),
                        "table" => self.table(el),
                        "head" | "script" | "style" | "nav" => {}
                        _ if is_block => self.walk_children(el),
                        _ => pending_text.push_str(&inline_text(el)),
                    }
                }
                _ => {}
            }
        }
        if !pending_text.trim().is_empty() {
            let text = pending_text.trim().to_string();
            self.push_block(soft_wrap(&text, self.options.wrap_width));
        }
    }
}

/// Render an HTML document as Markdown text.
#[must_use]
pub fn render_markdown(html: &str, options: &HtmlToMarkdownOptions) -> String {
    let document = Html::parse_document(html);
    let mut renderer = MarkdownRenderer::new(options);
    renderer.walk_children(document.root_element());
    renderer.blocks.join("\n\n")
}

fn convert_one(
    source: &Path,
    output_dir: &Path,
    options: &HtmlToMarkdownOptions,
) -> Result<FileOutcome, FileError> {
    let html = fs::read_to_string(source).map_err(|e| FileError::Read(e.to_string()))?;
    let markdown = render_markdown(&html, options);

    let destination = destination_for(source, output_dir, "md");
    if let Err(e) = fs::write(&destination, format!("{}\n", markdown.trim())) {
        discard_partial_output(&destination);
        return Err(FileError::Write(e.to_string()));
    }
    Ok(FileOutcome::Converted(destination))
}

/// Convert every HTML document in `source_dir` to a Markdown file.
///
/// # Errors
/// Returns a [`BatchError`] for directory-level failures and invalid
/// options; per-file failures are recorded in the result.
pub fn convert_html_to_markdown(
    source_dir: &Path,
    options: &HtmlToMarkdownOptions,
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
    use tempfile::TempDir;

    #[test]
    fn atx_headings_and_paragraphs() {
        let md = render_markdown(
            "<h1>Title</h1><p>Some <strong>bold</strong> text.</p>",
            &HtmlToMarkdownOptions::default(),
        );
        assert_eq!(md, "# Title\n\nSome **bold** text.");
    }

    #[test]
    fn setext_headings_underline_first_two_levels() {
        let options =
            HtmlToMarkdownOptions::default().with_heading_style(HeadingStyle::Setext);
        let md = render_markdown("<h1>One</h1><h2>Two</h2><h3>Three</h3>", &options);
        assert_eq!(md, "One\n===\n\nTwo\n---\n\n### Three");
    }

    #[test]
    fn bullet_character_is_configurable() {
        let options = HtmlToMarkdownOptions::default().with_bullet('*');
        let md = render_markdown("<ul><li>first</li><li>second</li></ul>", &options);
        assert_eq!(md, "* first\n* second");
    }

    #[test]
    fn ordered_lists_are_numbered() {
        let md = render_markdown(
            "<ol><li>one</li><li>two</li></ol>",
            &HtmlToMarkdownOptions::default(),
        );
        assert_eq!(md, "1. one\n2. two");
    }

    #[test]
    fn nested_lists_indent() {
        let md = render_markdown(
            "<ul><li>outer<ul><li>inner</li></ul></li></ul>",
            &HtmlToMarkdownOptions::default(),
        );
        assert_eq!(md, "- outer\n  - inner");
    }

    #[test]
    fn links_images_and_code() {
        let md = render_markdown(
            r#"<p>See <a href="https://example.com">docs</a> and <code>run()</code>.</p><p><img alt="logo" src="logo.png"></p>"#,
            &HtmlToMarkdownOptions::default(),
        );
        assert_eq!(
            md,
            "See [docs](https://example.com) and `run()`.\n\n![logo](logo.png)"
        );
    }

    #[test]
    fn fenced_code_blocks_keep_language() {
        let md = render_markdown(
            "<pre><code class=\"language-rust\">fn main() {}</code></pre>",
            &HtmlToMarkdownOptions::default(),
        );
        assert_eq!(md, "```rust\nfn main() {}\n```");
    }

    #[test]
    fn blockquotes_are_prefixed() {
        let md = render_markdown(
            "<blockquote><p>quoted</p></blockquote>",
            &HtmlToMarkdownOptions::default(),
        );
        assert_eq!(md, "> quoted");
    }

    #[test]
    fn tables_become_pipe_tables() {
        let md = render_markdown(
            "<table><tr><th>a</th><th>b</th></tr><tr><td>1</td><td>2</td></tr></table>",
            &HtmlToMarkdownOptions::default(),
        );
        assert_eq!(md, "| a | b |\n| --- | --- |\n| 1 | 2 |");
    }

    #[test]
    fn soft_wrap_reflows_at_word_boundaries() {
        let options = HtmlToMarkdownOptions::default().with_wrap_width(10);
        let md = render_markdown("<p>alpha beta gamma delta</p>", &options);
        assert_eq!(md, "alpha beta\ngamma\ndelta");
    }

    #[test]
    fn zero_wrap_width_disables_wrapping() {
        let md = render_markdown(
            "<p>alpha beta gamma delta</p>",
            &HtmlToMarkdownOptions::default(),
        );
        assert_eq!(md, "alpha beta gamma delta");
    }

    #[test]
    fn invalid_bullet_fails_before_processing() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("page.html"), "<p>x</p>").unwrap();

        let options = HtmlToMarkdownOptions::default().with_bullet('~');
        let err = convert_html_to_markdown(tmp.path(), &options).unwrap_err();
        assert!(matches!(err, BatchError::InvalidOptions(_)));
    }

    #[test]
    fn batch_writes_markdown_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("page.html"),
            "<html><body><h1>Hi</h1><p>Body.</p></body></html>",
        )
        .unwrap();
        fs::write(tmp.path().join("notes.txt"), "not html").unwrap();

        let result =
            convert_html_to_markdown(tmp.path(), &HtmlToMarkdownOptions::default()).unwrap();
        assert_eq!(result.total_converted(), 1);

        let md = fs::read_to_string(result.output_dir().join("page.md")).unwrap();
        assert_eq!(md, "# Hi\n\nBody.\n");
    }
}
