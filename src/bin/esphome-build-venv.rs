//! esphome-build-venv - ESPHome wrapper that runs the tool from an isolated
//! Python environment at the project root.
//!
//! Usage:
//!   esphome-build-venv devices/kitchen.yaml --device-id kitchen
//!   esphome-build-venv devices/kitchen.yaml --device-id kitchen --clean --reinstall

use clap::Parser;
use esphome_build::{cli, errors};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = cli::VenvCli::parse();
    errors::report(cli::run_venv(args).await)
}
