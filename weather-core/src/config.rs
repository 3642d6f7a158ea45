use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::model::UnitPreference;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_CITY_COUNTRY: &str = "us";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// city_country = "us"
/// units = "fahrenheit"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeather API key.
    pub api_key: Option<String>,

    pub base_url: String,

    /// Country code appended to city searches, e.g. "us". Empty disables scoping.
    pub city_country: Option<String>,

    pub request_timeout_secs: u64,

    /// Unit shown on startup.
    pub units: UnitPreference,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            city_country: Some(DEFAULT_CITY_COUNTRY.to_string()),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            units: UnitPreference::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the file holding the last used location.
    pub fn location_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("last_location.json"))
    }

    /// Returns the API key, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key.trim().to_string());
    }

    /// Country scope for city searches; blank values disable scoping.
    pub fn city_country(&self) -> Option<&str> {
        self.city_country.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_openweather() {
        let cfg = Config::default();

        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.city_country(), Some("us"));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.units, UnitPreference::Celsius);
        assert!(cfg.api_key().is_none());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg = Config::from_toml("api_key = \"KEY\"\nunits = \"fahrenheit\"\n").expect("parse");

        assert_eq!(cfg.api_key(), Some("KEY"));
        assert_eq!(cfg.units, UnitPreference::Fahrenheit);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.city_country(), Some("us"));
    }

    #[test]
    fn blank_values_are_treated_as_unset() {
        let cfg = Config::from_toml("api_key = \"  \"\ncity_country = \"\"\n").expect("parse");

        assert!(cfg.api_key().is_none());
        assert!(cfg.city_country().is_none());
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let cfg = Config::from_toml("request_timeout_secs = 0").expect("parse");
        assert_eq!(cfg.request_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn unknown_unit_is_rejected() {
        assert!(Config::from_toml("units = \"kelvin\"").is_err());
    }

    #[test]
    fn toml_roundtrip_keeps_settings() {
        let mut cfg = Config::default();
        cfg.set_api_key(" OPEN_KEY ".into());
        cfg.units = UnitPreference::Fahrenheit;

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed = Config::from_toml(&text).expect("parse");

        assert_eq!(parsed.api_key(), Some("OPEN_KEY"));
        assert_eq!(parsed.units, UnitPreference::Fahrenheit);
    }
}
