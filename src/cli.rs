//! Command-line interface definitions for both wrappers.

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser};

use crate::config::Config;
use crate::logging;
use crate::project::{self, ProjectRoot, Target};
use crate::toolchain::{exec::ProcessLauncher, venv::VirtualEnv, Toolchain};
use crate::wrapper::{self, BuildRequest};

/// Arguments common to both wrappers.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Path to YAML file (relative or absolute)
    #[arg(value_name = "YAML")]
    pub yaml: PathBuf,

    /// Device ID (used for substitutions)
    #[arg(long)]
    pub device_id: String,

    /// Only compile, do not upload
    #[arg(long)]
    pub compile_only: bool,

    /// Wrapper settings file (TOML, or JSON by extension)
    #[arg(long, env = "ESPHOME_BUILD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Extra arguments passed to the build tool after the YAML path
    #[arg(last = true, value_name = "ARGS")]
    pub forward: Vec<OsString>,
}

/// ESPHome build & upload wrapper
#[derive(Parser, Debug)]
#[command(name = "esphome-build", version)]
pub struct Cli {
    #[command(flatten)]
    pub build: BuildArgs,
}

/// ESPHome build & upload wrapper (isolated environment)
#[derive(Parser, Debug)]
#[command(name = "esphome-build-venv", version)]
pub struct VenvCli {
    #[command(flatten)]
    pub build: BuildArgs,

    /// Run a clean step before building
    #[arg(long)]
    pub clean: bool,

    /// Delete and recreate the environment
    #[arg(long)]
    pub reinstall: bool,
}

struct Prepared {
    cfg: Config,
    root: ProjectRoot,
    target: Target,
}

fn prepare(args: &BuildArgs) -> anyhow::Result<Prepared> {
    let cfg = Config::load_or_default(args.config.as_deref()).context("loading config")?;
    cfg.validate().context("validating config")?;
    logging::init(&cfg.log);

    let root = project::find_project_root(&project::search_starts(), &cfg.project.marker)?;
    let cwd = std::env::current_dir().context("reading current directory")?;
    let target = root.resolve_target(&args.yaml, &cwd)?;
    Ok(Prepared { cfg, root, target })
}

fn request(args: &BuildArgs, clean_first: bool) -> BuildRequest {
    BuildRequest {
        device_id: args.device_id.clone(),
        compile_only: args.compile_only,
        clean_first,
        extra_args: args.forward.clone(),
    }
}

/// Build with the tool found on `PATH`.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let launcher = ProcessLauncher::new().context("installing interrupt handler")?;
    let Prepared { cfg, root, target } = prepare(&cli.build)?;
    let toolchain = Toolchain::on_path(&cfg.tool)?;
    wrapper::execute(&launcher, &cfg, &root, &target, &toolchain, &request(&cli.build, false)).await?;
    Ok(())
}

/// Build through the project's isolated environment, provisioning it first.
pub async fn run_venv(cli: VenvCli) -> anyhow::Result<()> {
    let launcher = ProcessLauncher::new().context("installing interrupt handler")?;
    let Prepared { cfg, root, target } = prepare(&cli.build)?;
    let env = VirtualEnv::new(&root, &cfg);
    env.ensure(&launcher, &cfg, cli.reinstall).await?;
    let toolchain = env.toolchain(&cfg);
    wrapper::execute(&launcher, &cfg, &root, &target, &toolchain, &request(&cli.build, cli.clean))
        .await?;
    Ok(())
}
