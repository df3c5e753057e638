use crate::schedule::potency::Potency;
use crate::schedule::recurrence::{FREQUENCY_RANGE, INTERVAL_HOURS_RANGE};
use anyhow::{Context, Result};
use chrono::NaiveTime;
use config::{Config as ConfigBuilder, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::path::PathBuf;

pub const APP_DIR: &str = ".symptomly";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub reminders: RemindersConfig,
    #[serde(default)]
    pub remedies: RemediesConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub state: StateConfig,
}

/// The daily "log your symptoms" reminder.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RemindersConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Local time of day, `HH:MM`.
    #[serde(default = "default_reminder_time")]
    pub time: String,
}

fn default_true() -> bool {
    true
}

fn default_reminder_time() -> String {
    "20:00".to_string()
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            time: default_reminder_time(),
        }
    }
}

impl RemindersConfig {
    pub fn validate(&self) -> Result<()> {
        self.parsed_time()?;
        Ok(())
    }

    pub fn parsed_time(&self) -> Result<NaiveTime> {
        parse_time(&self.time)
    }
}

/// Defaults offered when logging a remedy from the command line.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RemediesConfig {
    pub default_potency: String,
    pub default_recurrence_days: u32,
    pub default_frequency: u32,
    pub default_interval_hours: u32,
}

impl Default for RemediesConfig {
    fn default() -> Self {
        Self {
            default_potency: Potency::default().to_string(),
            default_recurrence_days: 30,
            default_frequency: 2,
            default_interval_hours: 12,
        }
    }
}

impl RemediesConfig {
    pub fn validate(&self) -> Result<()> {
        let potency = Potency::from_label(&self.default_potency);
        if potency == Potency::Other {
            anyhow::bail!(
                "Invalid default potency '{}', expected one of 6C, 30C, 200C, 1M",
                self.default_potency
            );
        }
        if self.default_recurrence_days == 0 {
            anyhow::bail!("Default recurrence length must be at least one day");
        }
        if !FREQUENCY_RANGE.contains(&self.default_frequency) {
            anyhow::bail!(
                "Default frequency {} is outside {}-{}",
                self.default_frequency,
                FREQUENCY_RANGE.start(),
                FREQUENCY_RANGE.end()
            );
        }
        if !INTERVAL_HOURS_RANGE.contains(&self.default_interval_hours) {
            anyhow::bail!(
                "Default interval {}h is outside {}-{}h",
                self.default_interval_hours,
                INTERVAL_HOURS_RANGE.start(),
                INTERVAL_HOURS_RANGE.end()
            );
        }
        Ok(())
    }

    pub fn potency(&self) -> Potency {
        Potency::from_label(&self.default_potency)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TimelineConfig {
    pub page_size: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self { page_size: 20 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StateConfig {
    /// Optional override for state directory (for testing)
    pub state_dir_override: Option<PathBuf>,
}

/// Parse a `HH:MM` time of day.
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    crate::utils::time::parse_clock(s).context("Invalid reminders.time")
}

impl Config {
    /// Validate all configuration
    pub fn validate(&self) -> Result<()> {
        self.reminders.validate()?;
        self.remedies.validate()?;
        if self.timeline.page_size == 0 {
            anyhow::bail!("Timeline page size must be greater than 0");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let config_dir = home::home_dir()
        .context("Could not find home directory")?
        .join(APP_DIR);
    Ok(config_dir.join("config.toml"))
}

pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let loader = ConfigBuilder::builder()
        .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
        .build()
        .context("Failed to build config loader")?;

    loader
        .try_deserialize()
        .context("Failed to parse config file")
}

pub fn load() -> Result<Config> {
    let config_path = config_path()?;
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let config = load_from_path(&config_path)?;
    config.validate()?;
    Ok(config)
}

pub fn save_to_path<P: AsRef<Path>>(config: &Config, path: P) -> Result<()> {
    let toml_string = toml::to_string_pretty(config).context("Failed to serialize config")?;

    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }
    std::fs::write(path, toml_string).context("Failed to write config file")?;

    Ok(())
}
