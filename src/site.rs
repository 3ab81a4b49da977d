//! Build orchestration.
//!
//! A [`Site`] collects registrations, then [`Site::build`] turns the source
//! tree into rendered pages in one pass:
//!
//! ```text
//! for each registration, in insertion order:
//!     resolve pattern  →  sorted source files
//!     for each file:   load → scheme.parse → body renderer → builder → Page
//!     commit pages to the PageStore (later builders can now query them)
//! write every page to <output>/<source path with .html extension>
//! ```
//!
//! ## Ordering Guarantee
//!
//! Registrations are processed strictly in the order they were added, so a
//! builder registered later (an index page listing blog posts) always sees
//! the complete set of pages of every registration before it, through
//! [`BuildContext::pages`]. Within one registration, files may be loaded and
//! built in parallel on a rayon pool; the registration's pages are committed
//! in sorted source order only after all of them succeeded.
//!
//! Registrations may overlap (`blogs/` plus a dedicated `blogs/special.md`).
//! Each keeps its own page for the file; on disk the later registration's
//! page wins, since pages are written in build order.
//!
//! ## Failure
//!
//! Every error aborts the build. Pages are written only after all
//! registrations succeeded, so a failed build leaves the output tree untouched.

use crate::config::{self, ConfigError, SiteConfig};
use crate::content::{self, BodyRenderer, ContentError};
use crate::node::{ConstructionError, Node};
use crate::registry::{BuilderId, Pattern, Registration, Registry};
use crate::scheme::{Record, Scheme, SchemeError};
use rayon::prelude::*;
use serde::Serialize;
use serde::ser::Serializer;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Pattern {pattern} matches no file: {}", .path.display())]
    Resolution { pattern: String, path: PathBuf },
    #[error("Failed to load {}: {source}", .path.display())]
    Load { path: PathBuf, source: ContentError },
    #[error("Invalid front matter in {}: {source}", .path.display())]
    Scheme { path: PathBuf, source: SchemeError },
    #[error("Builder failed for {}: {source}", .path.display())]
    Construction {
        path: PathBuf,
        source: ConstructionError,
    },
    #[error(
        "{} and {} both render to {}",
        .first.display(),
        .second.display(),
        .output.display()
    )]
    OutputCollision {
        output: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// The result of building one content file.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    creator: BuilderId,
    /// Relative to the source root.
    source: PathBuf,
    /// Relative to the output root.
    output: PathBuf,
    properties: Record,
    #[serde(skip)]
    tree: Node,
}

impl Page {
    /// The registration that produced this page.
    pub fn creator(&self) -> BuilderId {
        self.creator
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn properties(&self) -> &Record {
        &self.properties
    }

    pub fn tree(&self) -> &Node {
        &self.tree
    }

    /// Output path relative to the output root, `/`-separated, for links.
    pub fn href(&self) -> String {
        self.output
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// The rendered document as written to disk.
    pub fn html(&self) -> String {
        self.tree.render_document()
    }
}

/// All pages of one build, grouped by the registration that produced them.
#[derive(Debug, Default)]
pub struct PageStore {
    by_creator: Vec<Vec<Page>>,
}

impl PageStore {
    /// Pages produced by `creator`, in sorted source order.
    ///
    /// Empty for registrations that have not been processed yet.
    pub fn pages(&self, creator: BuilderId) -> &[Page] {
        self.by_creator
            .get(creator.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get(&self, creator: BuilderId, source: &Path) -> Option<&Page> {
        self.pages(creator).iter().find(|p| p.source == source)
    }

    /// Every page, in build order.
    pub fn iter(&self) -> impl Iterator<Item = &Page> {
        self.by_creator.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.by_creator.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn commit(&mut self, creator: BuilderId, pages: Vec<Page>) {
        if self.by_creator.len() <= creator.index() {
            self.by_creator.resize_with(creator.index() + 1, Vec::new);
        }
        self.by_creator[creator.index()] = pages;
    }
}

impl Serialize for PageStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// What a builder sees while building one page.
pub struct BuildContext<'a> {
    /// The body after the configured body renderer; embed with [`Node::raw`].
    pub body: &'a str,
    pub properties: &'a Record,
    /// Relative to the source root.
    pub source: &'a Path,
    /// Relative to the output root.
    pub output: &'a Path,
    store: &'a PageStore,
}

impl<'a> BuildContext<'a> {
    /// Pages of an earlier registration.
    pub fn pages(&self, creator: BuilderId) -> &'a [Page] {
        self.store.pages(creator)
    }
}

/// Registrations plus the configuration needed to build them.
pub struct Site {
    config: SiteConfig,
    registry: Registry,
    renderer: Box<dyn BodyRenderer>,
}

impl Site {
    pub fn new(config: SiteConfig) -> Self {
        let renderer = content::renderer_for(config.body, &config.markdown);
        Self {
            config,
            registry: Registry::default(),
            renderer,
        }
    }

    /// Replace the body renderer chosen by config.
    pub fn with_body_renderer(mut self, renderer: impl BodyRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Register a builder for `pattern`. Never touches the filesystem.
    pub fn add<F>(
        &mut self,
        pattern: &str,
        scheme: Option<Scheme>,
        builder: F,
    ) -> Result<BuilderId, ConfigError>
    where
        F: Fn(&BuildContext<'_>) -> Result<Node, ConstructionError> + Send + Sync + 'static,
    {
        self.registry.register(pattern, scheme, builder)
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn registrations(&self) -> impl Iterator<Item = &Registration> {
        self.registry.iter()
    }

    pub fn registration(&self, id: BuilderId) -> Option<&Registration> {
        self.registry.get(id)
    }

    /// Build every page and write it under the output root.
    pub fn build(&self) -> Result<PageStore, BuildError> {
        let store = self.build_pages()?;
        self.write_pages(&store)?;
        info!(
            pages = store.len(),
            output = %self.config.output.display(),
            "Build complete"
        );
        Ok(store)
    }

    /// Build every page in memory without writing anything.
    pub fn check(&self) -> Result<PageStore, BuildError> {
        self.build_pages()
    }

    fn build_pages(&self) -> Result<PageStore, BuildError> {
        self.config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config::effective_threads(&self.config.processing))
            .build()?;

        let mut store = PageStore::default();

        for registration in self.registry.iter() {
            let files = resolve(&self.config.source, registration.pattern())?;
            info!(
                pattern = %registration.pattern(),
                files = files.len(),
                "Building registration"
            );

            let results: Vec<Result<Page, BuildError>> = pool.install(|| {
                files
                    .par_iter()
                    .map(|source| self.build_page(registration, source, &store))
                    .collect()
            });
            // First failure in sorted order, independent of thread scheduling.
            let pages = results.into_iter().collect::<Result<Vec<_>, _>>()?;

            // Registrations may overlap; only pages of the same one must not
            // share an output path.
            check_outputs(&pages)?;
            store.commit(registration.id(), pages);
        }
        Ok(store)
    }

    fn build_page(
        &self,
        registration: &Registration,
        source: &Path,
        store: &PageStore,
    ) -> Result<Page, BuildError> {
        let path = self.config.source.join(source);
        let loaded = content::load(&path).map_err(|e| BuildError::Load {
            path: path.clone(),
            source: e,
        })?;

        let properties = match registration.scheme() {
            Some(scheme) => scheme
                .parse(&loaded.front_matter)
                .map_err(|e| BuildError::Scheme {
                    path: path.clone(),
                    source: e,
                })?,
            None => Record::default(),
        };

        let body = self.renderer.render(&loaded.body);
        let output = output_path(source);
        let context = BuildContext {
            body: &body,
            properties: &properties,
            source,
            output: &output,
            store,
        };
        let tree = (registration.builder)(&context).map_err(|e| BuildError::Construction {
            path: path.clone(),
            source: e,
        })?;

        debug!(source = %source.display(), output = %output.display(), "Built page");
        Ok(Page {
            creator: registration.id(),
            source: source.to_path_buf(),
            output,
            properties,
            tree,
        })
    }

    fn write_pages(&self, store: &PageStore) -> Result<(), BuildError> {
        for page in store.iter() {
            let path = self.config.output.join(&page.output);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| BuildError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
            fs::write(&path, page.html()).map_err(|e| BuildError::Io {
                path: path.clone(),
                source: e,
            })?;
        }
        Ok(())
    }
}

/// Source files matching `pattern`, relative to `root`, sorted.
fn resolve(root: &Path, pattern: &Pattern) -> Result<Vec<PathBuf>, BuildError> {
    match pattern {
        Pattern::File(relative) => {
            let path = root.join(relative);
            if path.is_file() {
                Ok(vec![relative.clone()])
            } else {
                Err(BuildError::Resolution {
                    pattern: pattern.to_string(),
                    path,
                })
            }
        }
        Pattern::Directory(relative) => {
            let dir = root.join(relative);
            if !dir.is_dir() {
                warn!(pattern = %pattern, "Directory does not exist, no pages built");
                return Ok(Vec::new());
            }
            let mut files = Vec::new();
            let walker = WalkDir::new(&dir)
                .follow_links(true)
                .min_depth(1)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
            for entry in walker {
                let entry = entry.map_err(|e| BuildError::Io {
                    path: dir.clone(),
                    source: e.into(),
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Ok(relative) = entry.path().strip_prefix(root) {
                    files.push(relative.to_path_buf());
                }
            }
            files.sort();
            if files.is_empty() {
                warn!(pattern = %pattern, "Directory pattern matched no files");
            }
            Ok(files)
        }
    }
}

/// Reject two pages of one registration that render to the same file.
fn check_outputs(pages: &[Page]) -> Result<(), BuildError> {
    let mut outputs: HashMap<&Path, &Path> = HashMap::new();
    for page in pages {
        if let Some(first) = outputs.insert(&page.output, &page.source) {
            return Err(BuildError::OutputCollision {
                output: page.output.clone(),
                first: first.to_path_buf(),
                second: page.source.clone(),
            });
        }
    }
    Ok(())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// `blogs/a.md` → `blogs/a.html`.
fn output_path(source: &Path) -> PathBuf {
    source.with_extension("html")
}
