pub mod exec;
pub mod venv;

use async_trait::async_trait;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::Tool;
use crate::errors::{WrapError, WrapResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubCommand {
    Compile,
    Run,
    Clean,
}

impl SubCommand {
    pub fn for_build(compile_only: bool) -> Self {
        if compile_only { SubCommand::Compile } else { SubCommand::Run }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubCommand::Compile => "compile",
            SubCommand::Run => "run",
            SubCommand::Clean => "clean",
        }
    }
}

impl fmt::Display for SubCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One external process: what to run, with which arguments, from where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, cwd: &Path) -> Self {
        Self { program: program.into(), args: Vec::new(), cwd: cwd.to_path_buf() }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for a in &self.args {
            write!(f, " {}", a.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Exit of a finished child; `code` is `None` when a signal ended it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exit {
    pub code: Option<i32>,
}

impl Exit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for Exit {
    fn from(status: std::process::ExitStatus) -> Self {
        Self { code: status.code() }
    }
}

#[async_trait]
pub trait Launcher: Send + Sync {
    /// Run `inv` to completion.
    async fn launch(&self, inv: &Invocation) -> WrapResult<Exit>;
}

/// How the build tool is reached: a program plus any fixed leading
/// arguments (`-m esphome` when going through an interpreter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    program: PathBuf,
    leading: Vec<OsString>,
}

impl Toolchain {
    /// The tool's executable as found on `PATH`.
    pub fn on_path(tool: &Tool) -> WrapResult<Self> {
        let program = which::which(&tool.executable)
            .map_err(|source| WrapError::ToolNotFound { name: tool.executable.clone(), source })?;
        Ok(Self { program, leading: Vec::new() })
    }

    /// The tool run as `python -m <module>`.
    pub fn module(python: PathBuf, module: &str) -> Self {
        Self { program: python, leading: vec!["-m".into(), module.into()] }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// `<program> [leading] -s <key> <value> <sub> <target> [extra]`
    pub fn invocation(
        &self,
        sub: SubCommand,
        substitution: (&str, &str),
        target: &Path,
        extra: &[OsString],
        cwd: &Path,
    ) -> Invocation {
        Invocation::new(&self.program, cwd)
            .args(self.leading.iter().cloned())
            .args(["-s", substitution.0, substitution.1, sub.as_str()])
            .arg(target.as_os_str())
            .args(extra.iter().cloned())
    }
}
