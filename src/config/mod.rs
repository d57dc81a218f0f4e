// src/config/mod.rs

//! Configuration loading and validation for drivervisor.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like a non-empty readiness marker and a
//!   positive startup timeout (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{parse_duration, ConfigFile, DriverConfig, DriverSection, RawConfigFile, RunSection};
