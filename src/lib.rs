//! Wrappers around the ESPHome command line that find the project root,
//! lend the shared `secrets.yaml` to the configuration being built, and
//! hand everything else to `esphome`.

pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod project;
pub mod secrets;
pub mod toolchain;
pub mod wrapper;
