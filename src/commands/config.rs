use crate::config::{self, Config};
use anyhow::{Context, Result};
use std::path::Path;

pub fn list(config: &Config) -> Result<()> {
    let toml_str = toml::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{}", toml_str);
    Ok(())
}

pub fn get(key: &str, config: &Config) -> Result<()> {
    let value = serde_json::to_value(config).context("Failed to serialize config")?;

    // Dot notation: "reminders.time"
    let mut current = &value;
    for part in key.split('.') {
        current = current
            .get(part)
            .with_context(|| format!("Key not found: {}", key))?;
    }

    match current {
        serde_json::Value::String(s) => println!("{}", s),
        serde_json::Value::Null => println!("(unset)"),
        v => println!("{}", v),
    }
    Ok(())
}

pub fn set(key: &str, value: &str) -> Result<()> {
    let path = config::config_path()?;
    set_in_file(&path, key, value)?;
    println!("✓ Set {} = {}", key, value);
    if key.starts_with("reminders.") {
        println!("Run 'symptomly reminders sync' to apply the new reminder settings.");
    }
    Ok(())
}

/// Update one dotted key in the TOML file at `path`, creating the file if
/// needed. The result must still be a valid [`Config`] or nothing is written.
///
/// Comments in the existing file are not preserved.
pub fn set_in_file(path: &Path, key: &str, value: &str) -> Result<Config> {
    let parts: Vec<&str> = key.split('.').collect();
    let (leaf, sections) = parts
        .split_last()
        .filter(|(leaf, _)| !leaf.is_empty())
        .with_context(|| format!("Invalid key: {}", key))?;

    let known = toml::Value::try_from(Config::default()).context("Failed to serialize config")?;
    let mut table = &known;
    for section in sections {
        table = table
            .get(*section)
            .with_context(|| format!("Key not found: {}", key))?;
    }
    // `state_dir_override` has no default, so it is absent from the defaults
    if table.get(*leaf).is_none() && key != "state.state_dir_override" {
        anyhow::bail!("Key not found: {}", key);
    }

    let mut document: toml::Value = if path.exists() {
        let raw = std::fs::read_to_string(path).context("Failed to read config file")?;
        toml::from_str(&raw).context("Failed to parse config file")?
    } else {
        toml::Value::Table(toml::map::Map::new())
    };

    let mut table = document
        .as_table_mut()
        .context("Config file is not a TOML table")?;
    for section in sections {
        table = table
            .entry(section.to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()))
            .as_table_mut()
            .with_context(|| format!("'{}' is not a section", section))?;
    }
    table.insert(leaf.to_string(), parse_value(value));

    let updated: Config = document
        .clone()
        .try_into()
        .with_context(|| format!("Invalid value for {}: {}", key, value))?;
    updated.validate()?;

    config::save_to_path(&updated, path)?;
    tracing::info!(key, value, "config updated");
    Ok(updated)
}

fn parse_value(raw: &str) -> toml::Value {
    if let Ok(flag) = raw.parse::<bool>() {
        toml::Value::Boolean(flag)
    } else if let Ok(number) = raw.parse::<i64>() {
        toml::Value::Integer(number)
    } else {
        toml::Value::String(raw.to_string())
    }
}
