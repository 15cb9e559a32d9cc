//! Path containment for the sandboxed tool set.
//!
//! Every file operation resolves its path through [`PathValidator`] before
//! touching the filesystem. Resolution is deny-by-default: anything that
//! does not provably land inside the configured root is rejected.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};

use crate::error::{AgentError, Result};

/// Filesystem probe used for best-effort symlink resolution.
///
/// An `Err` means the target does not exist (yet); callers fall back to the
/// lexically normalized path, so paths meant for creation still validate.
pub trait SymlinkProbe: Send + Sync {
    fn resolve(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Production probe backed by `std::fs::canonicalize`.
pub struct FsProbe;

impl SymlinkProbe for FsProbe {
    fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        path.canonicalize()
    }
}

/// Resolves and contains any path within a root directory.
///
/// The root is fixed at construction and the validator is freely shareable
/// across concurrent runs.
#[derive(Clone)]
pub struct PathValidator {
    root: PathBuf,
    probe: Arc<dyn SymlinkProbe>,
}

impl PathValidator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_probe(root, Arc::new(FsProbe))
    }

    /// Construct with a custom probe so tests can simulate both existing
    /// and not-yet-existing targets.
    pub fn with_probe(root: impl Into<PathBuf>, probe: Arc<dyn SymlinkProbe>) -> Self {
        let root = root.into();
        let absolute = std::path::absolute(&root).unwrap_or(root);
        // Canonicalize the root when it exists so symlinked roots (e.g.
        // /tmp on macOS) compare correctly against canonicalized children.
        let root = probe.resolve(&absolute).unwrap_or_else(|_| normalize(&absolute));
        debug!("PathValidator initialized with root: {}", root.display());
        Self { root, probe }
    }

    /// The sandbox root (absolute, normalized).
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate and resolve a path to an absolute path inside the root.
    ///
    /// Relative paths resolve against the root; absolute paths are
    /// normalized as-is. Symlinks are resolved when the target exists.
    /// Returns a `SecurityViolation` for anything resolving outside.
    pub fn validate(&self, path_str: &str) -> Result<PathBuf> {
        if path_str.trim().is_empty() {
            return Err(AgentError::validation("path", "cannot be empty"));
        }

        let path = Path::new(path_str);
        let resolved = if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.root.join(path))
        };

        // Best-effort: targets that do not exist yet keep the lexical path.
        let resolved = self.probe.resolve(&resolved).unwrap_or(resolved);

        if resolved.starts_with(&self.root) {
            debug!("Validated path: {} -> {}", path_str, resolved.display());
            Ok(resolved)
        } else {
            warn!(
                "Security violation: path '{}' resolves outside root '{}'",
                resolved.display(),
                self.root.display()
            );
            Err(AgentError::SecurityViolation {
                path: resolved,
                root: self.root.clone(),
            })
        }
    }
}

/// Lexical normalization: drops `.`, pops `..`. Popping past the root keeps
/// the root, so escapes surface as paths that fail the containment check
/// rather than panics.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
