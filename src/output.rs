//! CLI output formatting for builds.
//!
//! Output is grouped by registration, in build order. Each registration is a
//! header line (its pattern, page count, and scheme name if it has one),
//! followed by one indented line per page mapping source to output:
//!
//! ```text
//! blogs/ (2 pages, scheme: post)
//!     001 blogs/a.md → blogs/a.html
//!     002 blogs/b.md → blogs/b.html
//! index.md (1 page)
//!     001 index.md → index.html
//!
//! Built 3 pages from 2 registrations
//! ```
//!
//! `check --json` instead prints the page store as a JSON array, and nothing
//! else, so it can be piped into other tools.
//!
//! Format functions are pure and return `Vec<String>`, so they can be tested
//! without capturing stdout. The `print_*` wrappers write to stdout.

use crate::registry::Registration;
use crate::site::{PageStore, Site};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Header line for one registration.
fn registration_header(registration: &Registration, count: usize) -> String {
    match registration.scheme() {
        Some(scheme) => format!(
            "{} ({}, scheme: {})",
            registration.pattern(),
            plural(count, "page"),
            scheme.name()
        ),
        None => format!("{} ({})", registration.pattern(), plural(count, "page")),
    }
}

fn display_path(path: &std::path::Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Format the pages of a finished build (or check).
///
/// `verb` is the summary's leading word, e.g. `"Built"` or `"Checked"`.
pub fn format_build_output(site: &Site, store: &PageStore, verb: &str) -> Vec<String> {
    let mut lines = Vec::new();

    for registration in site.registrations() {
        let pages = store.pages(registration.id());
        lines.push(registration_header(registration, pages.len()));
        for (idx, page) in pages.iter().enumerate() {
            lines.push(format!(
                "{}{} {} → {}",
                indent(1),
                format_index(idx + 1),
                display_path(page.source()),
                display_path(page.output()),
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "{verb} {} from {}",
        plural(store.len(), "page"),
        plural(site.registrations().count(), "registration")
    ));
    lines
}

pub fn print_build_output(site: &Site, store: &PageStore, verb: &str) {
    for line in format_build_output(site, store, verb) {
        println!("{}", line);
    }
}

/// The page store as pretty JSON: one object per page, in build order.
pub fn format_pages_json(store: &PageStore) -> serde_json::Result<String> {
    serde_json::to_string_pretty(store)
}

/// Print only the JSON document to stdout; logs go to stderr.
pub fn print_pages_json(store: &PageStore) -> serde_json::Result<()> {
    println!("{}", format_pages_json(store)?);
    Ok(())
}
