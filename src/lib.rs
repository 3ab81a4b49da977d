//! # Folio
//!
//! A static site engine. Content files (a front-matter block plus a markdown
//! body) become HTML pages through builder functions you write in Rust
//! against a small markup-node tree.
//!
//! # Architecture: Register, Then Build
//!
//! ```text
//! 1. Register   site.add("blogs/", Some(post), blog)    (no filesystem access)
//!               site.add("index.md", None, index)
//! 2. Build      for each registration, in order:
//!                   src/<pattern>  →  load → scheme → builder  →  Page
//! 3. Write      every Page  →  out/<source path>.html
//! ```
//!
//! A builder receives the rendered body, the typed front matter, and
//! read access to every page built by earlier registrations. That last part is
//! what makes index pages possible: register the blog first, then the index
//! builder lists `ctx.pages(blog)`.
//!
//! ```rust,no_run
//! use folio::config::SiteConfig;
//! use folio::node::{Attribute, Element, Node, Tag};
//! use folio::scheme::{FieldType, Scheme};
//! use folio::site::Site;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let post = Scheme::builder("post")
//!     .required("name", FieldType::String)
//!     .required("date", FieldType::Date)
//!     .build()?;
//!
//! let mut site = Site::new(SiteConfig::default());
//! let blog = site.add("blogs/", Some(post), |ctx| {
//!     Element::builder(Tag::Article)
//!         .child(Node::heading(1, ctx.properties.str("name").unwrap_or_default())?)
//!         .child(Node::raw(ctx.body))
//!         .build()
//! })?;
//! site.add("index.md", None, move |ctx| {
//!     let links = ctx
//!         .pages(blog)
//!         .iter()
//!         .map(|p| Element::builder(Tag::A).attr(Attribute::Href, p.href()).build())
//!         .collect::<Result<Vec<_>, _>>()?;
//!     Element::builder(Tag::Nav).children(links).build()
//! })?;
//! site.build()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`node`] | Markup node tree: tags, attributes, validation, HTML rendering |
//! | [`scheme`] | Typed front-matter schemes, values, and the fixed date format |
//! | [`content`] | Front-matter splitting and body renderers (markdown, text, verbatim) |
//! | [`registry`] | Route patterns, builder ids, ordered registrations |
//! | [`site`] | Build orchestration, pages, the page store, build errors |
//! | [`config`] | `folio.toml` loading, layering, and validation |
//! | [`output`] | CLI output formatting of build results |
//!
//! # Design Decisions
//!
//! ## Closed Tags and Attributes
//!
//! Element kinds and attribute keys are enums, not strings. A typo in an
//! attribute name is a compile error, and string-keyed input is validated
//! when the element is built. Void elements (`img`, `link`, ...) reject
//! children at construction time, so rendering can never fail.
//!
//! ## Provenance by Id, Not by Path
//!
//! Every registration gets a [`registry::BuilderId`]. Pages carry the id of
//! the registration that built them, and cross-page queries filter on it.
//! Two registrations can share a directory without their pages mixing.
//!
//! ## Fail Fast, Write Last
//!
//! A missing literal file, a bad front-matter field, or an invalid node
//! aborts the build. Pages are only written once every registration
//! succeeded, so a broken build never leaves a half-updated output tree.
//! Output is regenerable from scratch; there is no incremental mode.

pub mod config;
pub mod content;
pub mod node;
pub mod output;
pub mod registry;
pub mod scheme;
pub mod site;

#[cfg(test)]
pub(crate) mod test_helpers;
