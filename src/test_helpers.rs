//! Shared test utilities for the folio test suite.
//!
//! Tests build throwaway source trees inside a `TempDir`, point a
//! [`SiteConfig`] at them, and inspect what ends up under the output root.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let config = site_config(tmp.path());
//! write_file(&config.source, "blogs/a.md", "---\nname: A\n---\nHello");
//! // ... build ...
//! assert_eq!(read_tree(&config.output).len(), 1);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::SiteConfig;

/// Config with `source = <root>/src` and `output = <root>/out`, single worker
/// so test builds are deterministic in scheduling as well as in output.
pub fn site_config(root: &Path) -> SiteConfig {
    let mut config = SiteConfig {
        source: root.join("src"),
        output: root.join("out"),
        ..SiteConfig::default()
    };
    config.processing.max_processes = Some(1);
    config
}

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
}

/// Every file under `root` mapped to its bytes. Empty if `root` is missing.
pub fn read_tree(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
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
