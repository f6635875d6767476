//! Scoped provisioning of the shared secrets file beside a target.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{WrapError, WrapResult};

/// Local secrets entry for the duration of one build. Dropping the guard
/// removes the entry if, and only if, this guard created it.
#[derive(Debug)]
pub struct SecretsLink {
    local: PathBuf,
    created: bool,
}

impl SecretsLink {
    /// Make `shared` visible as `dir/<file name>`. An existing entry is left
    /// alone; otherwise a symlink is tried first and a copy is the fallback.
    pub fn provision(shared: &Path, dir: &Path) -> WrapResult<Self> {
        let name = shared.file_name().unwrap_or(shared.as_os_str());
        let local = dir.join(name);
        // a dangling link counts as present: it is not ours to replace
        if fs::symlink_metadata(&local).is_ok() {
            debug!(path = %local.display(), "local secrets already present");
            return Ok(Self { local, created: false });
        }
        if let Err(e) = symlink(shared, &local) {
            warn!(path = %local.display(), error = %e, "symlink failed, copying secrets instead");
            fs::copy(shared, &local).map_err(|source| WrapError::Secrets { path: local.clone(), source })?;
        }
        debug!(path = %local.display(), "local secrets created");
        Ok(Self { local, created: true })
    }

    pub fn path(&self) -> &Path {
        &self.local
    }

    pub fn created(&self) -> bool {
        self.created
    }
}

impl Drop for SecretsLink {
    fn drop(&mut self) {
        if !self.created {
            return;
        }
        // symlink_metadata so a link whose source vanished is still removed
        if fs::symlink_metadata(&self.local).is_ok() {
            match fs::remove_file(&self.local) {
                Ok(()) => debug!(path = %self.local.display(), "local secrets removed"),
                Err(e) => debug!(path = %self.local.display(), error = %e, "ignoring cleanup failure"),
            }
        }
    }
}

#[cfg(unix)]
fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

#[cfg(not(any(unix, windows)))]
fn symlink(_src: &Path, _dst: &Path) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "symlinks unsupported"))
}
