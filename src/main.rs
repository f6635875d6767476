//! esphome-build - ESPHome build & upload wrapper.
//!
//! Usage:
//!   esphome-build devices/kitchen.yaml --device-id kitchen
//!   esphome-build devices/kitchen.yaml --device-id kitchen --compile-only
//!   esphome-build devices/kitchen.yaml --device-id kitchen -- --device /dev/ttyUSB0

use clap::Parser;
use esphome_build::{cli, errors};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = cli::Cli::parse();
    errors::report(cli::run(args).await)
}
