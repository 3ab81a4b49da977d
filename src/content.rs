//! Content loading: front matter and body.
//!
//! A content file is an optional front-matter block followed by the body:
//!
//! ```text
//! ---
//! name: Test
//! date: 01-01-2024
//! ---
//! Hello, *world*.
//! ```
//!
//! The loader only splits the file. Front matter goes to the registration's
//! [`Scheme`](crate::scheme::Scheme); the body goes through a [`BodyRenderer`]
//! chosen by config, and its output is handed to the builder untouched.

use crate::config::{BodyFormat, MarkdownConfig};
use maud::Render;
use pulldown_cmark::{Options, Parser, html as md_html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DELIMITER: &str = "---";

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Front matter opened with `---` but never closed: {0}")]
    UnterminatedFrontMatter(PathBuf),
}

/// A content file split into its two parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    /// Raw front-matter text without delimiters. Empty when the file has none.
    pub front_matter: String,
    pub body: String,
}

pub fn load(path: &Path) -> Result<Content, ContentError> {
    let text = fs::read_to_string(path)?;
    let (front_matter, body) =
        split(&text).ok_or_else(|| ContentError::UnterminatedFrontMatter(path.to_path_buf()))?;
    Ok(Content {
        front_matter: front_matter.to_string(),
        body: body.to_string(),
    })
}

/// Split text at the front-matter delimiters.
///
/// Returns `("", text)` when the first line is not `---`, and `None` when the
/// block is opened but never closed.
pub fn split(text: &str) -> Option<(&str, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(after_open) = strip_delimiter_line(text) else {
        return Some(("", text));
    };

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            let front_matter = &after_open[..offset];
            let body = &after_open[offset + line.len()..];
            return Some((front_matter, body));
        }
        offset += line.len();
    }
    None
}

/// If `text` starts with a delimiter line, return what follows it.
fn strip_delimiter_line(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(DELIMITER)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}

/// Turns a raw body into markup a builder can embed as a raw node.
pub trait BodyRenderer: Send + Sync {
    fn render(&self, body: &str) -> String;
}

/// CommonMark via pulldown-cmark.
#[derive(Debug, Clone)]
pub struct Markdown {
    options: Options,
}

impl Markdown {
    pub fn new(config: &MarkdownConfig) -> Self {
        let mut options = Options::empty();
        options.set(Options::ENABLE_TABLES, config.tables);
        options.set(Options::ENABLE_FOOTNOTES, config.footnotes);
        options.set(Options::ENABLE_STRIKETHROUGH, config.strikethrough);
        options.set(Options::ENABLE_SMART_PUNCTUATION, config.smart_punctuation);
        Self { options }
    }
}

impl BodyRenderer for Markdown {
    fn render(&self, body: &str) -> String {
        let parser = Parser::new_ext(body, self.options);
        let mut html = String::new();
        md_html::push_html(&mut html, parser);
        html
    }
}

/// Escaped text, one `<p>` per blank-line separated paragraph.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl BodyRenderer for PlainText {
    fn render(&self, body: &str) -> String {
        let mut html = String::new();
        let mut paragraph: Vec<&str> = Vec::new();
        // `lines` drops `\r\n` as well as `\n`; the trailing "" flushes the last paragraph.
        for line in body.lines().chain(std::iter::once("")) {
            if !line.trim().is_empty() {
                paragraph.push(line);
                continue;
            }
            if !paragraph.is_empty() {
                html.push_str("<p>");
                paragraph.join("\n").trim().render_to(&mut html);
                html.push_str("</p>");
                paragraph.clear();
            }
        }
        html
    }
}

/// The body exactly as written (for content that already is HTML).
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl BodyRenderer for Verbatim {
    fn render(&self, body: &str) -> String {
        body.to_string()
    }
}

pub fn renderer_for(format: BodyFormat, markdown: &MarkdownConfig) -> Box<dyn BodyRenderer> {
    match format {
        BodyFormat::Markdown => Box::new(Markdown::new(markdown)),
        BodyFormat::Text => Box::new(PlainText),
        BodyFormat::Verbatim => Box::new(Verbatim),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn split_front_matter_and_body() {
        let (fm, body) = split("---\nname: Test\n---\nHello\n").unwrap();
        assert_eq!(fm, "name: Test\n");
        assert_eq!(body, "Hello\n");
    }

    #[test]
    fn no_delimiter_means_all_body() {
        let (fm, body) = split("Hello\n---\nworld").unwrap();
        assert_eq!(fm, "");
        assert_eq!(body, "Hello\n---\nworld");
    }

    #[test]
    fn empty_front_matter_block() {
        let (fm, body) = split("---\n---\nbody").unwrap();
        assert_eq!(fm, "");
        assert_eq!(body, "body");
    }

    #[test]
    fn crlf_and_bom_are_tolerated() {
        let (fm, body) = split("\u{feff}---\r\nname: x\r\n---\r\nbody\r\n").unwrap();
        assert_eq!(fm, "name: x\r\n");
        assert_eq!(body, "body\r\n");
    }

    #[test]
    fn closing_delimiter_at_end_of_file() {
        let (fm, body) = split("---\nname: x\n---").unwrap();
        assert_eq!(fm, "name: x\n");
        assert_eq!(body, "");
    }

    #[test]
    fn unterminated_block_is_none() {
        assert_eq!(split("---\nname: x\nno end"), None);
    }

    #[test]
    fn dashes_prefix_is_not_a_delimiter() {
        let (fm, body) = split("----\ntext").unwrap();
        assert_eq!(fm, "");
        assert_eq!(body, "----\ntext");
    }

    #[test]
    fn load_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.md");
        fs::write(&path, "---\nname: Test\n---\nHello").unwrap();
        let content = load(&path).unwrap();
        assert_eq!(content.front_matter, "name: Test\n");
        assert_eq!(content.body, "Hello");
    }

    #[test]
    fn load_unterminated_reports_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.md");
        fs::write(&path, "---\nname: Test\n").unwrap();
        match load(&path) {
            Err(ContentError::UnterminatedFrontMatter(p)) => assert_eq!(p, path),
            other => panic!("expected unterminated error, got {other:?}"),
        }
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            load(&tmp.path().join("nope.md")),
            Err(ContentError::Io(_))
        ));
    }

    #[test]
    fn markdown_renders_html() {
        let md = Markdown::new(&MarkdownConfig::default());
        assert_eq!(md.render("Hello *there*"), "<p>Hello <em>there</em></p>\n");
    }

    #[test]
    fn markdown_tables_follow_config() {
        let table = "| a |\n|---|\n| 1 |\n";
        let with = Markdown::new(&MarkdownConfig::default()).render(table);
        assert!(with.contains("<table>"));

        let config = MarkdownConfig {
            tables: false,
            ..MarkdownConfig::default()
        };
        let without = Markdown::new(&config).render(table);
        assert!(!without.contains("<table>"));
    }

    #[test]
    fn plain_text_escapes_and_wraps_paragraphs() {
        let html = PlainText.render("a < b\n\n\nc & d\n");
        assert_eq!(html, "<p>a &lt; b</p><p>c &amp; d</p>");
    }

    #[test]
    fn plain_text_splits_crlf_paragraphs() {
        let html = PlainText.render("first line\r\nsame paragraph\r\n\r\nsecond\r\n");
        assert_eq!(html, "<p>first line\nsame paragraph</p><p>second</p>");
    }

    #[test]
    fn verbatim_passes_through() {
        assert_eq!(Verbatim.render("<b>x</b>"), "<b>x</b>");
    }
}
