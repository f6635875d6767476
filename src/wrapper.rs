//! The build flow shared by both wrappers: provision the local secrets,
//! run the tool against the target, release the secrets again.

use std::ffi::OsString;

use tracing::info;

use crate::config::Config;
use crate::errors::{WrapError, WrapResult};
use crate::project::{ProjectRoot, Target};
use crate::secrets::SecretsLink;
use crate::toolchain::{Launcher, SubCommand, Toolchain};

#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub device_id: String,
    pub compile_only: bool,
    pub clean_first: bool,
    pub extra_args: Vec<OsString>,
}

/// Run the requested steps. The local secrets entry lives exactly as long
/// as this call, whichever way it returns.
pub async fn execute<L: Launcher + ?Sized>(
    launcher: &L,
    cfg: &Config,
    root: &ProjectRoot,
    target: &Target,
    toolchain: &Toolchain,
    req: &BuildRequest,
) -> WrapResult<()> {
    let _secrets = SecretsLink::provision(&root.secrets_file(), target.dir())?;

    let mut steps = Vec::with_capacity(2);
    if req.clean_first {
        steps.push(SubCommand::Clean);
    }
    steps.push(SubCommand::for_build(req.compile_only));

    for step in steps {
        let extra: &[OsString] = if step == SubCommand::Clean { &[] } else { &req.extra_args };
        let inv = toolchain.invocation(
            step,
            (cfg.tool.substitution.as_str(), req.device_id.as_str()),
            &target.relative,
            extra,
            root.dir(),
        );

        println!("\nProject root: {}", root.dir().display());
        println!("Running command:");
        println!("{inv}");
        println!();

        info!(step = %step, device_id = %req.device_id, "delegating to build tool");
        let exit = launcher.launch(&inv).await?;
        if !exit.success() {
            return Err(WrapError::ToolFailed { step, code: exit.code });
        }
    }
    Ok(())
}
