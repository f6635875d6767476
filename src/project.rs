//! Project root discovery and target validation.
//!
//! The project root is the nearest directory holding the marker file. Every
//! target handed to the build tool must live beneath it; the tool receives
//! the root-relative path and runs with the root as its working directory.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::errors::{WrapError, WrapResult};

#[derive(Debug, Clone)]
pub struct ProjectRoot {
    dir: PathBuf,
    marker: String,
}

/// A validated build input beneath the project root.
#[derive(Debug, Clone)]
pub struct Target {
    pub path: PathBuf,
    pub relative: PathBuf,
}

impl Target {
    /// Directory the target lives in; the local secrets entry goes here.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }
}

/// Directories to search from, in order: the executable's own directory,
/// then the current working directory.
pub fn search_starts() -> Vec<PathBuf> {
    let mut starts = Vec::new();
    if let Some(dir) = std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf)) {
        starts.push(dir);
    }
    if let Ok(cwd) = std::env::current_dir() {
        if !starts.contains(&cwd) {
            starts.push(cwd);
        }
    }
    starts
}

/// Walk each start directory and its ancestors; the first directory that
/// contains `marker` is the project root.
pub fn find_project_root(starts: &[PathBuf], marker: &str) -> WrapResult<ProjectRoot> {
    for start in starts {
        let Ok(current) = dunce::canonicalize(start) else {
            debug!(start = %start.display(), "skipping unresolvable search start");
            continue;
        };
        if let Some(dir) = current.ancestors().find(|dir| dir.join(marker).exists()) {
            info!(root = %dir.display(), "project root resolved");
            return Ok(ProjectRoot { dir: dir.to_path_buf(), marker: marker.to_string() });
        }
        debug!(start = %current.display(), marker, "no marker above search start");
    }
    Err(WrapError::MarkerNotFound { marker: marker.to_string() })
}

impl ProjectRoot {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The shared secrets file (the marker itself).
    pub fn secrets_file(&self) -> PathBuf {
        self.dir.join(&self.marker)
    }

    /// Resolve `input` against `cwd`, require it to exist and to sit beneath
    /// the root.
    pub fn resolve_target(&self, input: &Path, cwd: &Path) -> WrapResult<Target> {
        let joined = if input.is_absolute() { input.to_path_buf() } else { cwd.join(input) };
        let path = dunce::canonicalize(&joined).map_err(|_| WrapError::TargetMissing(normalize(&joined)))?;
        let relative = match path.strip_prefix(&self.dir) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
            _ => return Err(WrapError::OutsideRoot { path, root: self.dir.clone() }),
        };
        debug!(target = %path.display(), relative = %relative.display(), "target resolved");
        Ok(Target { path, relative })
    }
}

/// Drop `.` and fold `..` without touching the filesystem. Display only.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for part in path.components() {
        match part {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(part);
                }
            }
            other => out.push(other),
        }
    }
    out
}
