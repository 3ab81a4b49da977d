//! Registrations: which builder handles which content files.
//!
//! A registration ties a route [`Pattern`] to a builder function and an
//! optional [`Scheme`]. Registrations are kept in insertion order, and each
//! one is identified by a [`BuilderId`] handed back when it is added. Pages
//! remember the id of the registration that produced them, which is what
//! cross-page queries filter on.
//!
//! ## Patterns
//!
//! | Pattern      | Matches                                   |
//! |--------------|-------------------------------------------|
//! | `index.md`   | exactly `<source>/index.md` (must exist)  |
//! | `blogs/`     | every file under `<source>/blogs/`        |
//! | `""` or `/`  | every file under `<source>`               |

use crate::config::ConfigError;
use crate::node::{ConstructionError, Node};
use crate::scheme::Scheme;
use crate::site::BuildContext;
use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Identity of a registration, assigned in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BuilderId(pub(crate) usize);

impl BuilderId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Page builder: turns one content file into a node tree.
pub type Builder = dyn Fn(&BuildContext<'_>) -> Result<Node, ConstructionError> + Send + Sync;

/// Where a registration looks for content, relative to the source root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    File(PathBuf),
    Directory(PathBuf),
}

impl Pattern {
    /// Parse a route pattern. A trailing `/` (or an empty pattern) selects a
    /// directory, anything else a single file.
    pub fn parse(raw: &str) -> Result<Pattern, ConfigError> {
        let invalid = |reason| ConfigError::InvalidPattern {
            pattern: raw.to_string(),
            reason,
        };
        let is_dir = raw.is_empty() || raw.ends_with('/');
        let path = Path::new(raw);

        let mut normalized = PathBuf::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => normalized.push(part),
                Component::CurDir => {}
                Component::ParentDir => return Err(invalid("must not contain `..`")),
                Component::RootDir | Component::Prefix(_) if raw != "/" => {
                    return Err(invalid("must be relative to the source root"));
                }
                Component::RootDir | Component::Prefix(_) => {}
            }
        }

        if is_dir {
            Ok(Pattern::Directory(normalized))
        } else if normalized.as_os_str().is_empty() {
            Err(invalid("does not name a file"))
        } else {
            Ok(Pattern::File(normalized))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Pattern::File(p) | Pattern::Directory(p) => p,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path().to_string_lossy().replace('\\', "/");
        match self {
            Pattern::File(_) => f.write_str(&path),
            Pattern::Directory(_) if path.is_empty() => f.write_str("/"),
            Pattern::Directory(_) => write!(f, "{path}/"),
        }
    }
}

pub struct Registration {
    pub(crate) id: BuilderId,
    pub(crate) pattern: Pattern,
    pub(crate) scheme: Option<Scheme>,
    pub(crate) builder: Box<Builder>,
}

impl Registration {
    pub fn id(&self) -> BuilderId {
        self.id
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn scheme(&self) -> Option<&Scheme> {
        self.scheme.as_ref()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("pattern", &self.pattern)
            .field("scheme", &self.scheme.as_ref().map(Scheme::name))
            .finish_non_exhaustive()
    }
}

/// Ordered registrations, rejecting duplicate patterns.
#[derive(Debug, Default)]
pub struct Registry {
    registrations: Vec<Registration>,
}

impl Registry {
    pub fn register<F>(
        &mut self,
        pattern: &str,
        scheme: Option<Scheme>,
        builder: F,
    ) -> Result<BuilderId, ConfigError>
    where
        F: Fn(&BuildContext<'_>) -> Result<Node, ConstructionError> + Send + Sync + 'static,
    {
        let pattern = Pattern::parse(pattern)?;
        if self.registrations.iter().any(|r| r.pattern == pattern) {
            return Err(ConfigError::DuplicatePattern(pattern.to_string()));
        }
        let id = BuilderId(self.registrations.len());
        self.registrations.push(Registration {
            id,
            pattern,
            scheme,
            builder: Box::new(builder),
        });
        Ok(id)
    }

    pub fn get(&self, id: BuilderId) -> Option<&Registration> {
        self.registrations.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.iter()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Element, Tag};

    fn noop(_: &BuildContext<'_>) -> Result<Node, ConstructionError> {
        Element::builder(Tag::Div).build()
    }

    #[test]
    fn parse_file_and_directory_patterns() {
        assert_eq!(
            Pattern::parse("index.md").unwrap(),
            Pattern::File(PathBuf::from("index.md"))
        );
        assert_eq!(
            Pattern::parse("blogs/").unwrap(),
            Pattern::Directory(PathBuf::from("blogs"))
        );
        assert_eq!(
            Pattern::parse("./notes/2024/").unwrap(),
            Pattern::Directory(PathBuf::from("notes/2024"))
        );
        assert_eq!(Pattern::parse("").unwrap(), Pattern::Directory(PathBuf::new()));
        assert_eq!(Pattern::parse("/").unwrap(), Pattern::Directory(PathBuf::new()));
    }

    #[test]
    fn parse_rejects_escaping_and_absolute_patterns() {
        assert!(matches!(
            Pattern::parse("../secrets.md"),
            Err(ConfigError::InvalidPattern { .. })
        ));
        assert!(matches!(
            Pattern::parse("/etc/passwd"),
            Err(ConfigError::InvalidPattern { .. })
        ));
        assert!(matches!(
            Pattern::parse("."),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn pattern_display() {
        assert_eq!(Pattern::parse("blogs/").unwrap().to_string(), "blogs/");
        assert_eq!(Pattern::parse("a/b.md").unwrap().to_string(), "a/b.md");
        assert_eq!(Pattern::parse("").unwrap().to_string(), "/");
    }

    #[test]
    fn ids_follow_insertion_order() {
        let mut registry = Registry::default();
        let a = registry.register("blogs/", None, noop).unwrap();
        let b = registry.register("index.md", None, noop).unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        let patterns: Vec<String> = registry.iter().map(|r| r.pattern().to_string()).collect();
        assert_eq!(patterns, vec!["blogs/", "index.md"]);
    }

    #[test]
    fn duplicate_pattern_fails_fast() {
        let mut registry = Registry::default();
        registry.register("blogs/", None, noop).unwrap();
        let err = registry.register("./blogs/", None, noop).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePattern(p) if p == "blogs/"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn file_and_directory_with_same_path_are_distinct() {
        let mut registry = Registry::default();
        registry.register("notes/", None, noop).unwrap();
        registry.register("notes", None, noop).unwrap();
        assert_eq!(registry.len(), 2);
    }
}
