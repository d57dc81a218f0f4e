// src/config/validate.rs

use crate::config::model::{
    parse_duration, ConfigFile, DriverConfig, DriverSection, RawConfigFile,
};
use crate::errors::{DrivervisorError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DrivervisorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let driver = validate_driver_section(&raw.driver)?;
        Ok(ConfigFile::new_unchecked(driver, raw.run))
    }
}

fn validate_driver_section(raw: &DriverSection) -> Result<DriverConfig> {
    if raw.binary.trim().is_empty() {
        return Err(DrivervisorError::ConfigError(
            "[driver].binary must not be empty".to_string(),
        ));
    }

    if raw.ready_marker.is_empty() {
        return Err(DrivervisorError::ConfigError(
            "[driver].ready_marker must not be empty".to_string(),
        ));
    }

    let startup_timeout = parse_duration(&raw.startup_timeout)
        .map_err(|e| DrivervisorError::ConfigError(format!("[driver].startup_timeout: {e}")))?;

    if startup_timeout.is_zero() {
        return Err(DrivervisorError::ConfigError(
            "[driver].startup_timeout must be greater than zero".to_string(),
        ));
    }

    Ok(DriverConfig {
        binary: raw.binary.clone(),
        args: raw.args.clone(),
        ready_marker: raw.ready_marker.clone(),
        startup_timeout,
    })
}
