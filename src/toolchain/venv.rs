//! Isolated Python environment holding the build tool.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Config;
use crate::errors::{WrapError, WrapResult};
use crate::project::ProjectRoot;
use crate::toolchain::{Invocation, Launcher, Toolchain};

#[derive(Debug, Clone)]
pub struct VirtualEnv {
    dir: PathBuf,
    root: PathBuf,
}

impl VirtualEnv {
    pub fn new(root: &ProjectRoot, cfg: &Config) -> Self {
        Self { dir: root.dir().join(&cfg.venv.dir), root: root.dir().to_path_buf() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Interpreter inside the environment.
    pub fn python(&self) -> PathBuf {
        if cfg!(windows) {
            self.dir.join("Scripts").join("python.exe")
        } else {
            self.dir.join("bin").join("python")
        }
    }

    /// Make sure the environment exists, creating it (or recreating it when
    /// `recreate` is set) and installing the tool into it.
    pub async fn ensure<L: Launcher + ?Sized>(
        &self,
        launcher: &L,
        cfg: &Config,
        recreate: bool,
    ) -> WrapResult<()> {
        if recreate && self.exists() {
            info!(dir = %self.dir.display(), "removing environment");
            fs::remove_dir_all(&self.dir)
                .map_err(|source| WrapError::VenvRemove { path: self.dir.clone(), source })?;
        }
        if self.exists() {
            info!(dir = %self.dir.display(), "reusing environment");
            return Ok(());
        }

        let python = self.python();
        let steps: [(&'static str, Invocation); 3] = [
            (
                "venv",
                Invocation::new(&cfg.venv.python, &self.root).args(["-m", "venv"]).arg(self.dir.as_os_str()),
            ),
            (
                "pip upgrade",
                Invocation::new(&python, &self.root).args(["-m", "pip", "install", "--upgrade", "pip"]),
            ),
            (
                "tool install",
                Invocation::new(&python, &self.root).args(["-m", "pip", "install", cfg.tool.package.as_str()]),
            ),
        ];
        for (step, inv) in &steps {
            info!(step = *step, command = %inv, "provisioning environment");
            println!("{inv}");
            let exit = launcher.launch(inv).await?;
            if !exit.success() {
                return Err(WrapError::Provision { step: *step, code: exit.code });
            }
        }
        Ok(())
    }

    pub fn toolchain(&self, cfg: &Config) -> Toolchain {
        Toolchain::module(self.python(), &cfg.tool.module)
    }
}
