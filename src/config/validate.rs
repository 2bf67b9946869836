// src/config/validate.rs

use std::str::FromStr;

use crate::config::model::{ConfigFile, RawConfigFile, ResourceConfig};
use crate::errors::{ResflowError, Result};
use crate::resource::filter::Charset;
use crate::resource::patterns::PatternMatcher;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ResflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.project, raw.unit))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_units(cfg)?;
    validate_project_section(cfg)?;
    validate_units(cfg)?;
    Ok(())
}

fn ensure_has_units(cfg: &RawConfigFile) -> Result<()> {
    if cfg.unit.is_empty() {
        return Err(ResflowError::ConfigError(
            "config must contain at least one [unit.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_project_section(cfg: &RawConfigFile) -> Result<()> {
    // case_sensitivity is strongly typed and validated during deserialization.
    for (field, value) in [
        ("encoding", &cfg.project.encoding),
        ("properties_encoding", &cfg.project.properties_encoding),
    ] {
        Charset::from_str(value).map_err(|e| {
            ResflowError::ConfigError(format!("[project].{field}: {e}"))
        })?;
    }

    if let Some(dir) = &cfg.project.cache_dir {
        if dir.trim().is_empty() {
            return Err(ResflowError::ConfigError(
                "[project].cache_dir must not be empty".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_units(cfg: &RawConfigFile) -> Result<()> {
    for (name, unit) in cfg.unit.iter() {
        if name.trim().is_empty() {
            return Err(ResflowError::ConfigError(
                "unit names must not be empty".to_string(),
            ));
        }
        validate_resources(name, "resources", &unit.resources)?;
        validate_resources(name, "test_resources", &unit.test_resources)?;
    }
    Ok(())
}

fn validate_resources(unit: &str, field: &str, resources: &[ResourceConfig]) -> Result<()> {
    for (idx, res) in resources.iter().enumerate() {
        if res.directory.trim().is_empty() {
            return Err(ResflowError::ConfigError(format!(
                "unit '{unit}' {field}[{idx}] has an empty `directory`"
            )));
        }
        PatternMatcher::new(&res.includes, &res.excludes).map_err(|e| {
            ResflowError::ConfigError(format!("unit '{unit}' {field}[{idx}]: {e}"))
        })?;
    }
    Ok(())
}
