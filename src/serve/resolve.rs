use std::path::{Component, Path, PathBuf};

use crate::config::Config;

/// Why a request path could not be mapped to a candidate file.
#[derive(Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// The normalized path would lie outside the configured root.
    OutsideRoot,
}

/// The per-request outcome of path resolution. Never cached across requests.
#[derive(Debug)]
pub struct ResolvedPath {
    /// Absolute candidate path, after any default-document substitution.
    pub path: PathBuf,
    pub exists: bool,
    pub is_dir: bool,
}

/// Maps request paths to filesystem paths under the configured root.
#[derive(Debug)]
pub struct Resolver {
    root: PathBuf,
    index: String,
}

impl Resolver {
    pub fn new(cfg: &Config) -> Self {
        // Resolve symlinks in the root once so every candidate is anchored
        // to the real tree. A root that does not exist yet keeps its
        // configured form; every lookup under it will simply miss.
        let root = cfg.root.canonicalize().unwrap_or_else(|_| cfg.root.clone());
        Self {
            root,
            index: cfg.index.clone(),
        }
    }

    /// Path of the default document at the root, used by the SPA fallback.
    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index)
    }

    /// Resolves a request target to a candidate file.
    ///
    /// `/` becomes the default document; a candidate that turns out to be a
    /// directory gets the default document appended and is re-checked, so a
    /// directory request never surfaces as-is. Containment is enforced
    /// before any filesystem access.
    pub async fn resolve(&self, request_path: &str) -> Result<ResolvedPath, ResolveError> {
        let path = request_path.split('?').next().unwrap_or("/");
        let rel = if path == "/" {
            self.index.as_str()
        } else {
            path.trim_start_matches('/')
        };

        let candidate = self.contain(Path::new(rel))?;
        let mut resolved = self.stat(candidate).await?;

        if resolved.exists && resolved.is_dir {
            let with_index = resolved.path.join(&self.index);
            resolved = self.stat(with_index).await?;
        }

        Ok(resolved)
    }

    /// Normalizes `rel` underneath the root, component by component.
    ///
    /// `..` pops only what was pushed; a traversal that would climb above
    /// the root is rejected outright rather than clamped, before any
    /// existence check runs.
    fn contain(&self, rel: &Path) -> Result<PathBuf, ResolveError> {
        let mut out = self.root.clone();
        let mut depth = 0usize;

        for comp in rel.components() {
            match comp {
                Component::Normal(seg) => {
                    out.push(seg);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(ResolveError::OutsideRoot);
                    }
                    out.pop();
                    depth -= 1;
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(ResolveError::OutsideRoot);
                }
            }
        }

        Ok(out)
    }

    /// Checks a candidate on disk. The lexical guard in `contain` cannot
    /// see symlinks, so anything that exists is canonicalized and must
    /// still sit under the canonical root.
    async fn stat(&self, path: PathBuf) -> Result<ResolvedPath, ResolveError> {
        let md = match tokio::fs::metadata(&path).await {
            Ok(md) => md,
            Err(_) => {
                return Ok(ResolvedPath {
                    exists: false,
                    is_dir: false,
                    path,
                });
            }
        };

        match tokio::fs::canonicalize(&path).await {
            Ok(real) if real.starts_with(&self.root) => Ok(ResolvedPath {
                exists: true,
                is_dir: md.is_dir(),
                path: real,
            }),
            Ok(_) => Err(ResolveError::OutsideRoot),
            // Raced with a deletion between metadata and canonicalize.
            Err(_) => Ok(ResolvedPath {
                exists: false,
                is_dir: false,
                path,
            }),
        }
    }
}
