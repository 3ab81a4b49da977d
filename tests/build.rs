//! End-to-end builds through the public API.
//!
//! Each test lays out a source tree in a temp dir, registers builders the
//! way a site binary would, runs a full build, and inspects the output tree.
//!
//! Run with: cargo test --test build

use folio::config::SiteConfig;
use folio::node::{Attribute, ConstructionError, Element, Node, Tag};
use folio::scheme::{self, FieldType, Scheme};
use folio::site::{BuildContext, BuildError, Site};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
}

fn read_tree(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    if !root.exists() {
        return BTreeMap::new();
    }
    WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e.path().strip_prefix(root).unwrap().to_path_buf();
            (relative, fs::read(e.path()).unwrap())
        })
        .collect()
}

fn config(tmp: &TempDir) -> SiteConfig {
    SiteConfig {
        source: tmp.path().join("src"),
        output: tmp.path().join("out"),
        ..SiteConfig::default()
    }
}

fn post() -> Scheme {
    Scheme::builder("post")
        .required("name", FieldType::String)
        .required("date", FieldType::Date)
        .build()
        .unwrap()
}

fn post_page(ctx: &BuildContext<'_>) -> Result<Node, ConstructionError> {
    let date = ctx.properties.date("date").map(scheme::format_date);
    Element::builder(Tag::Html)
        .child(
            Element::builder(Tag::Body)
                .child(Node::heading(1, ctx.properties.str("name").unwrap_or_default())?)
                .child(Element::builder(Tag::P).text(date.unwrap_or_default()).build()?)
                .child(Node::raw(ctx.body))
                .build()?,
        )
        .build()
}

/// Posts under `blogs/`, then an index linking each of them.
fn blog(config: SiteConfig) -> Site {
    let mut site = Site::new(config);
    let posts = site.add("blogs/", Some(post()), post_page).unwrap();
    site.add("index.md", None, move |ctx| {
        let links = ctx
            .pages(posts)
            .iter()
            .map(|p| {
                Element::builder(Tag::A)
                    .attr(Attribute::Href, p.href())
                    .text(p.properties().str("name").unwrap_or_default())
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Element::builder(Tag::Ul).children(links).build()
    })
    .unwrap();
    site
}

fn blog_sources(config: &SiteConfig) {
    write_file(
        &config.source,
        "blogs/a.md",
        "---\nname: Test\ndate: 01-01-2024\n---\nHello",
    );
    write_file(
        &config.source,
        "blogs/2024/b.md",
        "---\nname: Later\ndate: 02-02-2024\n---\nWorld",
    );
    write_file(&config.source, "index.md", "");
}

#[test]
fn post_renders_front_matter_and_body() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    blog_sources(&config);

    blog(config.clone()).build().unwrap();

    let html = fs::read_to_string(config.output.join("blogs/a.html")).unwrap();
    assert_eq!(
        html,
        "<!DOCTYPE html><html><body><h1>Test</h1><p>01-01-2024</p><p>Hello</p>\n</body></html>"
    );
}

#[test]
fn output_tree_mirrors_source_tree() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    blog_sources(&config);

    blog(config.clone()).build().unwrap();

    let files: Vec<PathBuf> = read_tree(&config.output).into_keys().collect();
    assert_eq!(
        files,
        vec![
            PathBuf::from("blogs/2024/b.html"),
            PathBuf::from("blogs/a.html"),
            PathBuf::from("index.html"),
        ]
    );
}

#[test]
fn index_lists_pages_of_earlier_registration() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    blog_sources(&config);

    let store = blog(config.clone()).build().unwrap();

    let index = fs::read_to_string(config.output.join("index.html")).unwrap();
    assert_eq!(
        index,
        r#"<ul><a href="blogs/2024/b.html">Later</a><a href="blogs/a.html">Test</a></ul>"#
    );
    assert_eq!(store.len(), 3);
}

#[test]
fn missing_literal_file_fails_without_output() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    write_file(
        &config.source,
        "blogs/a.md",
        "---\nname: Test\ndate: 01-01-2024\n---\nHello",
    );

    let err = blog(config.clone()).build().unwrap_err();
    assert!(matches!(err, BuildError::Resolution { ref pattern, .. } if pattern == "index.md"));
    assert!(read_tree(&config.output).is_empty());
}

#[test]
fn malformed_date_names_the_file() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    blog_sources(&config);
    write_file(
        &config.source,
        "blogs/bad.md",
        "---\nname: Bad\ndate: 2024-01-01\n---\n",
    );

    let err = blog(config.clone()).build().unwrap_err();
    match err {
        BuildError::Scheme { path, .. } => assert!(path.ends_with("blogs/bad.md")),
        other => panic!("expected scheme error, got {other:?}"),
    }
    assert!(read_tree(&config.output).is_empty());
}

#[test]
fn rebuild_is_byte_identical() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    blog_sources(&config);
    let site = blog(config.clone());

    site.build().unwrap();
    let first = read_tree(&config.output);
    site.build().unwrap();
    let second = read_tree(&config.output);

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}
