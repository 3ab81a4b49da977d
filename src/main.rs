use clap::{Parser, Subcommand};
use folio::config::{self, SiteConfig};
use folio::node::{Attribute, ConstructionError, Element, Heading, Node, Tag};
use folio::output;
use folio::scheme::{self, FieldType, Scheme};
use folio::site::{BuildContext, Page, Site};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Static site builder for a personal blog")]
#[command(long_about = "\
Static site builder for a personal blog

Content structure:

  src/
  ├── index.md                 # Home page, lists every post
  └── blogs/                   # One page per post
      ├── a.md
      └── 2024/b.md

Posts need front matter:

  ---
  name: My First Post
  date: 01-01-2024
  ---
  Markdown body...

Output mirrors the source tree: src/blogs/a.md → out/blogs/a.html.
Run 'folio gen-config' to generate a documented folio.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = "folio.toml", global = true)]
    config: PathBuf,

    /// Content directory (overrides the config file)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Output directory (overrides the config file)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Log progress (otherwise RUST_LOG decides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build every page and write the output tree
    Build,
    /// Build every page in memory and report, without writing
    Check {
        /// Print the built pages as JSON instead of the summary
        #[arg(long)]
        json: bool,
    },
    /// Print a stock folio.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Build => {
            let site = blog_site(load_config(&cli)?)?;
            println!("==> Building {}", site.config().source.display());
            let store = site.build()?;
            output::print_build_output(&site, &store, "Built");
            println!("==> Build complete: {}", site.config().output.display());
        }
        Command::Check { json } => {
            let site = blog_site(load_config(&cli)?)?;
            let store = site.check()?;
            if json {
                output::print_pages_json(&store)?;
            } else {
                output::print_build_output(&site, &store, "Checked");
                println!("==> Content is valid");
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Resolve config: stock defaults, then the config file, then CLI flags.
fn load_config(cli: &Cli) -> Result<SiteConfig, config::ConfigError> {
    let mut overrides = toml::Table::new();
    if let Some(source) = &cli.source {
        overrides.insert(
            "source".into(),
            toml::Value::String(source.to_string_lossy().into_owned()),
        );
    }
    if let Some(output) = &cli.output {
        overrides.insert(
            "output".into(),
            toml::Value::String(output.to_string_lossy().into_owned()),
        );
    }
    config::load_config(&cli.config, Some(toml::Value::Table(overrides)))
}

// ============================================================================
// The blog
// ============================================================================

const AUTHOR: &str = "Ariel Alon";

fn post_scheme() -> Result<Scheme, scheme::SchemeError> {
    Scheme::builder("post")
        .required("name", FieldType::String)
        .required("date", FieldType::Date)
        .build()
}

/// Register the blog's pages: every post, then the index listing them.
fn blog_site(config: SiteConfig) -> Result<Site, Box<dyn std::error::Error>> {
    let mut site = Site::new(config);
    let blog = site.add("blogs/", Some(post_scheme()?), blog_page)?;
    site.add("index.md", None, move |ctx| {
        let cards = ctx
            .pages(blog)
            .iter()
            .map(blog_card)
            .collect::<Result<Vec<_>, _>>()?;
        page(
            Element::builder(Tag::Article)
                .child(heading_block(Node::heading(1, "Index")?)?)
                .child(Node::raw(ctx.body))
                .build()?,
            Some(Element::builder(Tag::Div).class("blog-cards").children(cards).build()?),
        )
    })?;
    Ok(site)
}

fn blog_page(ctx: &BuildContext<'_>) -> Result<Node, ConstructionError> {
    let name = ctx.properties.str("name").unwrap_or_default();
    let date = ctx
        .properties
        .date("date")
        .map(scheme::format_date)
        .unwrap_or_default();
    page(
        Element::builder(Tag::Article)
            .child(
                Element::builder(Tag::Div)
                    .class("heading")
                    .child(Node::heading(1, name)?)
                    .child(Element::builder(Tag::P).text(date).build()?)
                    .build()?,
            )
            .child(Node::raw(ctx.body))
            .build()?,
        None,
    )
}

fn blog_card(blog: &Page) -> Result<Node, ConstructionError> {
    let props = blog.properties();
    let date = props.date("date").map(scheme::format_date).unwrap_or_default();
    Element::builder(Tag::A)
        .class("blog-card")
        .attr(Attribute::Href, blog.href())
        .child(
            Element::builder(Tag::H(Heading::new(2)?))
                .class("name")
                .text(props.str("name").unwrap_or_default())
                .build()?,
        )
        .child(Element::builder(Tag::Div).class("date").text(date).build()?)
        .build()
}

fn heading_block(heading: Node) -> Result<Node, ConstructionError> {
    Element::builder(Tag::Div).class("heading").child(heading).build()
}

/// Full document: head, navbar, the main article, and optional extra content.
fn page(article: Node, extra: Option<Node>) -> Result<Node, ConstructionError> {
    Element::builder(Tag::Html)
        .child(head()?)
        .child(
            Element::builder(Tag::Body)
                .child(navbar()?)
                .child(article)
                .children(extra)
                .build()?,
        )
        .build()
}

fn head() -> Result<Node, ConstructionError> {
    Element::builder(Tag::Head)
        .child(Element::builder(Tag::Title).text(AUTHOR).build()?)
        .child(
            Element::builder(Tag::Link)
                .attr(Attribute::Rel, "stylesheet")
                .attr(Attribute::Type, "text/css")
                .attr(Attribute::Href, "/styles.css")
                .build()?,
        )
        .build()
}

fn navbar() -> Result<Node, ConstructionError> {
    let home = Element::builder(Tag::A)
        .attr(Attribute::Href, "/")
        .text(AUTHOR)
        .build()?;
    let github = Element::builder(Tag::A)
        .attr(Attribute::Href, "https://github.com/ArielAlon24")
        .child(
            Element::builder(Tag::Img)
                .attr(Attribute::Src, "/assets/github-mark.svg")
                .attr(Attribute::Alt, "Github Icon")
                .class("icon")
                .build()?,
        )
        .build()?;
    Element::builder(Tag::Nav)
        .class("navbar")
        .child(Element::builder(Tag::Div).class("left-nav").child(home).build()?)
        .child(Element::builder(Tag::Div).class("right-nav").child(github).build()?)
        .build()
}
