use std::path::PathBuf;
use std::process::ExitCode;

use thiserror::Error;

use crate::toolchain::SubCommand;

#[derive(Debug, Error)]
pub enum WrapError {
    #[error("Could not find {marker} in any parent directory.")]
    MarkerNotFound { marker: String },
    #[error("YAML file not found: {}", .0.display())]
    TargetMissing(PathBuf),
    #[error("YAML file must be inside the project directory.")]
    OutsideRoot { path: PathBuf, root: PathBuf },
    #[error("failed to provision {}", path.display())]
    Secrets {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{name} not found on PATH")]
    ToolNotFound {
        name: String,
        #[source]
        source: which::Error,
    },
    #[error("failed to start {}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{step} step failed ({})", describe(*code))]
    ToolFailed { step: SubCommand, code: Option<i32> },
    #[error("environment provisioning failed at `{step}` ({}); retry with --reinstall", describe(*code))]
    Provision { step: &'static str, code: Option<i32> },
    #[error("failed to remove environment {}", path.display())]
    VenvRemove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("interrupted")]
    Interrupted,
}

fn describe(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit status {c}"),
        None => "terminated by signal".to_string(),
    }
}

impl WrapError {
    pub fn code(&self) -> &'static str {
        match self {
            WrapError::MarkerNotFound { .. } => "MarkerNotFound",
            WrapError::TargetMissing(_) => "TargetMissing",
            WrapError::OutsideRoot { .. } => "OutsideRoot",
            WrapError::Secrets { .. } => "Secrets",
            WrapError::ToolNotFound { .. } => "ToolNotFound",
            WrapError::Spawn { .. } => "Spawn",
            WrapError::ToolFailed { .. } => "ToolFailed",
            WrapError::Provision { .. } => "Provision",
            WrapError::VenvRemove { .. } => "VenvRemove",
            WrapError::Interrupted => "Interrupted",
        }
    }

    /// Process exit status for this failure. A failing tool hands its own
    /// status through; codes that do not fit a byte, or that would read as
    /// success, collapse to 1.
    pub fn exit_status(&self) -> u8 {
        match self {
            WrapError::ToolFailed { code: Some(c), .. } => match u8::try_from(*c) {
                Ok(0) | Err(_) => 1,
                Ok(c) => c,
            },
            WrapError::Interrupted => 130,
            _ => 1,
        }
    }
}

pub type WrapResult<T> = Result<T, WrapError>;

/// Print the failure chain and turn the outcome into the process status.
pub fn report(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let status = err
                .downcast_ref::<WrapError>()
                .map(WrapError::exit_status)
                .unwrap_or(1);
            tracing::debug!(
                code = err.downcast_ref::<WrapError>().map(WrapError::code).unwrap_or("Other"),
                status,
                "wrapper failed"
            );
            eprintln!("{}", render(&err));
            ExitCode::from(status)
        }
    }
}

/// The line shown to the user: the full cause chain, prefixed with
/// `Error: ` except for the not-found line, which has always printed bare.
pub fn render(err: &anyhow::Error) -> String {
    match err.downcast_ref::<WrapError>() {
        Some(WrapError::TargetMissing(_)) => format!("{err:#}"),
        _ => format!("Error: {err:#}"),
    }
}
