use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::units::PressureUnit;

pub const CONFIG_ENV: &str = "PRESSURE_CONVERTER_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Unit converted from when none is given
    pub default_from: String,
    /// Unit converted to when none is given
    pub default_to: String,
    /// Log usage events
    pub telemetry: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_from: String::from("bar"),
            default_to: String::from("psi"),
            telemetry: true,
        }
    }
}

impl Config {
    pub fn default_units(&self) -> Result<(PressureUnit, PressureUnit)> {
        let from = parse_unit(&self.default_from).context("invalid default_from")?;
        let to = parse_unit(&self.default_to).context("invalid default_to")?;
        Ok((from, to))
    }
}

fn parse_unit(raw: &str) -> Result<PressureUnit> {
    raw.parse::<PressureUnit>()
        .map_err(|_| anyhow::anyhow!("unknown unit: {raw}"))
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pressure-converter").join("config.toml"))
}

pub fn resolve_config_path(config_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = config_path {
        return Some(path.to_path_buf());
    }
    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        if let Some(stripped) = env_path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return Some(home.join(stripped));
            }
        }
        return Some(PathBuf::from(env_path));
    }
    default_config_path()
}

/// Load configuration from a TOML file. If the file doesn't exist, default
/// values are returned.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let Some(path) = resolve_config_path(config_path) else {
        return Ok(Config::default());
    };
    if !path.exists() {
        log::debug!("No config at {}; using defaults", path.display());
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: Config = toml::from_str(&contents)
        .with_context(|| format!("parsing config {}", path.display()))?;
    cfg.default_units()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = load_config(Some(tmp.path().join("absent.toml").as_path())).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(
            cfg.default_units().unwrap(),
            (PressureUnit::Bar, PressureUnit::Psi)
        );
    }

    #[test]
    fn partial_file_fills_remaining_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "default_to = \"kpa\"\ntelemetry = false\n").unwrap();
        let cfg = load_config(Some(path.as_path())).unwrap();
        assert_eq!(cfg.default_from, "bar");
        assert_eq!(cfg.default_to, "kpa");
        assert!(!cfg.telemetry);
    }

    #[test]
    fn unknown_default_unit_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "default_from = \"furlong\"\n").unwrap();
        let err = load_config(Some(path.as_path())).unwrap_err();
        assert!(format!("{err:#}").contains("furlong"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "telemetry = maybe\n").unwrap();
        assert!(load_config(Some(path.as_path())).is_err());
    }

    #[test]
    fn env_path_overrides_default_and_expands_home() {
        std::env::set_var(CONFIG_ENV, "~/pressure/custom.toml");
        let expanded = resolve_config_path(None);
        std::env::set_var(CONFIG_ENV, "/etc/pressure/custom.toml");
        let plain = resolve_config_path(None);
        std::env::remove_var(CONFIG_ENV);

        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, Some(home.join("pressure/custom.toml")));
        assert_eq!(plain, Some(PathBuf::from("/etc/pressure/custom.toml")));
        assert_ne!(plain, default_config_path());
    }

    #[test]
    fn explicit_path_wins() {
        let explicit = PathBuf::from("/tmp/explicit.toml");
        assert_eq!(resolve_config_path(Some(explicit.as_path())), Some(explicit));
    }
}
