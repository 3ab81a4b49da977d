//! Markup node tree.
//!
//! Pages are described as a tree of [`Node`] values and rendered to HTML text
//! in one depth-first pass. The tree is deliberately small and closed:
//!
//! - **[`Tag`]** has one variant per supported element kind. Void kinds
//!   (`img`, `link`, `meta`, `br`, `hr`) can never hold children.
//! - **[`Attribute`]** is a closed set of keys. String-keyed construction goes
//!   through [`Attribute::from_str`], so an unknown key is rejected when the
//!   element is built, never when it is rendered.
//! - **[`Node::Raw`]** carries pre-rendered markup (the markdown body) that
//!   must not be escaped a second time.
//!
//! ## Rendering
//!
//! ```text
//! Element(div, {class: "a<b"}, [Text("x & y")])
//!     → <div class="a&lt;b">x &amp; y</div>
//! Element(img, {src: "/a.svg"}, [])
//!     → <img src="/a.svg">
//! ```
//!
//! Attributes are written in the declaration order of [`Attribute`], which
//! keeps output byte-stable across builds. Escaping is delegated to maud's
//! [`Render`] impl for `str`, the same escaping the site's maud fragments get.
//! [`Node`] implements [`maud::Render`], and a [`maud::Markup`] converts into a
//! raw node, so both styles can be mixed inside a builder.

use maud::{Markup, Render};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("<{0}> is a void element and cannot have children")]
    VoidChildren(&'static str),
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),
    #[error("Heading size must be 1-6, got {0}")]
    HeadingSize(u8),
}

/// Heading level, always within `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Heading(u8);

impl Heading {
    pub fn new(size: u8) -> Result<Self, ConstructionError> {
        if (1..=6).contains(&size) {
            Ok(Heading(size))
        } else {
            Err(ConstructionError::HeadingSize(size))
        }
    }

    pub fn size(self) -> u8 {
        self.0
    }
}

/// Element kinds the tree can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Html,
    Head,
    Body,
    Title,
    Meta,
    Link,
    Style,
    Script,
    Header,
    Footer,
    Main,
    Nav,
    Article,
    Section,
    Div,
    Span,
    A,
    Img,
    H(Heading),
    P,
    Ul,
    Ol,
    Li,
    Strong,
    Em,
    Code,
    Pre,
    Br,
    Hr,
}

impl Tag {
    pub fn name(self) -> &'static str {
        match self {
            Tag::Html => "html",
            Tag::Head => "head",
            Tag::Body => "body",
            Tag::Title => "title",
            Tag::Meta => "meta",
            Tag::Link => "link",
            Tag::Style => "style",
            Tag::Script => "script",
            Tag::Header => "header",
            Tag::Footer => "footer",
            Tag::Main => "main",
            Tag::Nav => "nav",
            Tag::Article => "article",
            Tag::Section => "section",
            Tag::Div => "div",
            Tag::Span => "span",
            Tag::A => "a",
            Tag::Img => "img",
            Tag::H(h) => match h.size() {
                1 => "h1",
                2 => "h2",
                3 => "h3",
                4 => "h4",
                5 => "h5",
                _ => "h6",
            },
            Tag::P => "p",
            Tag::Ul => "ul",
            Tag::Ol => "ol",
            Tag::Li => "li",
            Tag::Strong => "strong",
            Tag::Em => "em",
            Tag::Code => "code",
            Tag::Pre => "pre",
            Tag::Br => "br",
            Tag::Hr => "hr",
        }
    }

    /// Void elements render without a closing tag and never have children.
    pub fn is_void(self) -> bool {
        matches!(self, Tag::Img | Tag::Link | Tag::Meta | Tag::Br | Tag::Hr)
    }
}

/// Recognized attribute keys.
///
/// Variant order is the serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    Id,
    Class,
    Href,
    Src,
    Alt,
    Rel,
    Type,
    Title,
    Lang,
    Charset,
    Name,
    Content,
    Target,
    Style,
    Width,
    Height,
}

impl Attribute {
    pub const ALL: [Attribute; 16] = [
        Attribute::Id,
        Attribute::Class,
        Attribute::Href,
        Attribute::Src,
        Attribute::Alt,
        Attribute::Rel,
        Attribute::Type,
        Attribute::Title,
        Attribute::Lang,
        Attribute::Charset,
        Attribute::Name,
        Attribute::Content,
        Attribute::Target,
        Attribute::Style,
        Attribute::Width,
        Attribute::Height,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Attribute::Id => "id",
            Attribute::Class => "class",
            Attribute::Href => "href",
            Attribute::Src => "src",
            Attribute::Alt => "alt",
            Attribute::Rel => "rel",
            Attribute::Type => "type",
            Attribute::Title => "title",
            Attribute::Lang => "lang",
            Attribute::Charset => "charset",
            Attribute::Name => "name",
            Attribute::Content => "content",
            Attribute::Target => "target",
            Attribute::Style => "style",
            Attribute::Width => "width",
            Attribute::Height => "height",
        }
    }
}

impl FromStr for Attribute {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| ConstructionError::UnknownAttribute(s.to_string()))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated element: tag, attributes, children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: Tag,
    attributes: BTreeMap<Attribute, String>,
    children: Vec<Node>,
}

impl Element {
    pub fn builder(tag: Tag) -> ElementBuilder {
        ElementBuilder {
            tag,
            attributes: BTreeMap::new(),
            children: Vec::new(),
            error: None,
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn attribute(&self, key: Attribute) -> Option<&str> {
        self.attributes.get(&key).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (Attribute, &str)> {
        self.attributes.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }
}

/// Accumulates an element; all validation happens in [`build`](Self::build).
///
/// The first invalid step is remembered and reported, so a chain reads
/// straight through and fails once at the end.
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    tag: Tag,
    attributes: BTreeMap<Attribute, String>,
    children: Vec<Node>,
    error: Option<ConstructionError>,
}

impl ElementBuilder {
    /// Set an attribute; a repeated key keeps the last value.
    pub fn attr(mut self, key: Attribute, value: impl Into<String>) -> Self {
        self.attributes.insert(key, value.into());
        self
    }

    /// Set an attribute by its HTML name, rejecting names outside [`Attribute`].
    pub fn attr_named(self, name: &str, value: impl Into<String>) -> Self {
        match name.parse::<Attribute>() {
            Ok(key) => self.attr(key, value),
            Err(e) => self.fail(e),
        }
    }

    pub fn class(self, value: impl Into<String>) -> Self {
        self.attr(Attribute::Class, value)
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn build(self) -> Result<Node, ConstructionError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if self.tag.is_void() && !self.children.is_empty() {
            return Err(ConstructionError::VoidChildren(self.tag.name()));
        }
        Ok(Node::Element(Element {
            tag: self.tag,
            attributes: self.attributes,
            children: self.children,
        }))
    }

    fn fail(mut self, error: ConstructionError) -> Self {
        self.error.get_or_insert(error);
        self
    }
}

/// A node in the markup tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Text, escaped on render.
    Text(String),
    /// Pre-rendered markup, emitted verbatim.
    Raw(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Node {
        Node::Text(text.into())
    }

    pub fn raw(html: impl Into<String>) -> Node {
        Node::Raw(html.into())
    }

    /// An `<hN>` element holding a single text child.
    pub fn heading(size: u8, text: impl Into<String>) -> Result<Node, ConstructionError> {
        Element::builder(Tag::H(Heading::new(size)?))
            .text(text)
            .build()
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn render(&self) -> String {
        let mut buffer = String::new();
        self.render_to(&mut buffer);
        buffer
    }

    pub fn render_to(&self, buffer: &mut String) {
        match self {
            Node::Text(text) => escape_into(buffer, text),
            Node::Raw(html) => buffer.push_str(html),
            Node::Element(element) => {
                let name = element.tag.name();
                buffer.push('<');
                buffer.push_str(name);
                for (key, value) in &element.attributes {
                    buffer.push(' ');
                    buffer.push_str(key.name());
                    buffer.push_str("=\"");
                    escape_into(buffer, value);
                    buffer.push('"');
                }
                buffer.push('>');
                if element.tag.is_void() {
                    return;
                }
                for child in &element.children {
                    child.render_to(buffer);
                }
                buffer.push_str("</");
                buffer.push_str(name);
                buffer.push('>');
            }
        }
    }

    /// Render as a full document: an `<html>` root gets a doctype.
    pub fn render_document(&self) -> String {
        let mut buffer = String::new();
        if matches!(self, Node::Element(e) if e.tag == Tag::Html) {
            buffer.push_str("<!DOCTYPE html>");
        }
        self.render_to(&mut buffer);
        buffer
    }
}

fn escape_into(buffer: &mut String, text: &str) {
    <str as Render>::render_to(text, buffer);
}

impl Render for Node {
    fn render_to(&self, buffer: &mut String) {
        Node::render_to(self, buffer);
    }
}

impl From<Markup> for Node {
    fn from(markup: Markup) -> Self {
        Node::Raw(markup.into_string())
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}
