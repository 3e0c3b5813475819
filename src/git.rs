//! Repository resolution
//!
//! A configured path may point at a work tree root or at a subdirectory of
//! one. Commands always run from the work tree root; a subdirectory becomes
//! a `-- <prefix>` path restriction.

use std::path::{Path, PathBuf};

use git2::Repository;
use log::debug;

use crate::collector::error::{CollectError, CollectResult};

/// A repository to collect, resolved from a configured path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryTarget {
    /// Work tree root (git directory for bare repositories)
    pub root: PathBuf,
    /// Basename of the configured path, the repository key of every map
    pub name: String,
    /// Configured path relative to `root`, if it is a subdirectory
    pub prefix: Option<String>,
}

impl RepositoryTarget {
    /// Validate `path` with git2 and locate its work tree
    pub fn resolve<P: AsRef<Path>>(path: P) -> CollectResult<Self> {
        let path = path.as_ref();
        debug!("Resolving repository at: {}", path.display());

        if !path.exists() {
            return Err(CollectError::MissingPath(path.to_path_buf()));
        }
        let canonical = path.canonicalize().map_err(|source| CollectError::Path {
            path: path.to_path_buf(),
            source,
        })?;

        let repo = Repository::discover(&canonical).map_err(|source| CollectError::NotARepository {
            path: path.to_path_buf(),
            source,
        })?;

        let root = match repo.workdir() {
            Some(workdir) => workdir.canonicalize().map_err(|source| CollectError::Path {
                path: workdir.to_path_buf(),
                source,
            })?,
            None => {
                debug!("Repository is bare: {}", repo.path().display());
                canonical.clone()
            }
        };

        let prefix = canonical
            .strip_prefix(&root)
            .ok()
            .filter(|relative| !relative.as_os_str().is_empty())
            .map(|relative| {
                relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            });

        let name = canonical
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| canonical.to_string_lossy().to_string());

        debug!("Repository '{}' at {} (prefix {:?})", name, root.display(), prefix);
        Ok(Self { root, name, prefix })
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// `-- <prefix>` arguments, empty for the whole work tree
    pub fn path_filter(&self) -> Vec<String> {
        match &self.prefix {
            Some(prefix) => vec!["--".to_string(), prefix.clone()],
            None => Vec::new(),
        }
    }
}
