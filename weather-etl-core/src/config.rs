use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    notify::discord, retry::RetryPolicy, schedule::DailySchedule, sensor::SensorConfig,
    source::openweather,
};

/// Weather API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherApiConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    /// Value of the `q` query parameter, e.g. "Portland".
    pub city_query: String,
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self {
            api_base: openweather::DEFAULT_API_BASE.to_string(),
            api_key: None,
            city_query: "Portland".to_string(),
        }
    }
}

/// Discord bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub api_base: String,
    pub bot_token: Option<String>,
    pub channel_id: Option<String>,
    /// Message text sent with the file. Defaults to a sentence naming the city.
    pub caption: Option<String>,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base: discord::DEFAULT_API_BASE.to_string(),
            bot_token: None,
            channel_id: None,
            caption: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from("output") }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub start_date: NaiveDate,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { start_date: DailySchedule::default_start() }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [weather]
/// api_key = "..."
/// city_query = "Portland"
///
/// [discord]
/// bot_token = "..."
/// channel_id = "..."
///
/// [output]
/// dir = "/var/lib/weather-etl/output"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub weather: WeatherApiConfig,
    pub discord: DiscordConfig,
    pub output: OutputConfig,
    pub sensor: SensorConfig,
    pub retry: RetryPolicy,
    pub schedule: ScheduleConfig,
}

/// Environment variables that take precedence over the config file.
pub const ENV_WEATHER_API_KEY: &str = "WEATHER_API_KEY";
pub const ENV_WEATHER_API_BASE: &str = "WEATHER_API_BASE";
pub const ENV_CITY_QUERY: &str = "WEATHER_CITY_QUERY";
pub const ENV_OUTPUT_DIR: &str = "WEATHER_OUTPUT_DIR";
pub const ENV_DISCORD_BOT_TOKEN: &str = "DISCORD_BOT_TOKEN";
pub const ENV_DISCORD_CHANNEL_ID: &str = "DISCORD_CHANNEL_ID";
pub const ENV_DISCORD_API_BASE: &str = "DISCORD_API_BASE";

impl Config {
    /// Load config from the default location, or an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-etl", "weather-etl")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Apply overrides from an arbitrary lookup, keyed by the `ENV_*` names.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup(ENV_WEATHER_API_KEY) {
            self.weather.api_key = Some(v);
        }
        if let Some(v) = lookup(ENV_WEATHER_API_BASE) {
            self.weather.api_base = v;
        }
        if let Some(v) = lookup(ENV_CITY_QUERY) {
            self.weather.city_query = v;
        }
        if let Some(v) = lookup(ENV_OUTPUT_DIR) {
            self.output.dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_DISCORD_BOT_TOKEN) {
            self.discord.bot_token = Some(v);
        }
        if let Some(v) = lookup(ENV_DISCORD_CHANNEL_ID) {
            self.discord.channel_id = Some(v);
        }
        if let Some(v) = lookup(ENV_DISCORD_API_BASE) {
            self.discord.api_base = v;
        }
        self
    }

    pub fn weather_api_key(&self) -> Result<&str> {
        required(self.weather.api_key.as_deref(), "weather API key", ENV_WEATHER_API_KEY)
    }

    pub fn discord_bot_token(&self) -> Result<&str> {
        required(self.discord.bot_token.as_deref(), "Discord bot token", ENV_DISCORD_BOT_TOKEN)
    }

    pub fn discord_channel_id(&self) -> Result<&str> {
        required(self.discord.channel_id.as_deref(), "Discord channel id", ENV_DISCORD_CHANNEL_ID)
    }
}

fn required<'a>(value: Option<&'a str>, what: &str, env: &str) -> Result<&'a str> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        anyhow!(
            "No {what} configured.\n\
             Hint: run `weather-etl configure` or set {env}."
        )
    })
}
