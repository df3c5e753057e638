pub mod config;
pub mod remedy;
pub mod reminders;
pub mod symptom;
pub mod timeline;

use crate::config::Config;
use crate::platform;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

/// Lock and journal paths, honouring `state.state_dir_override`.
pub(crate) fn journal_paths(config: &Config) -> Result<(PathBuf, PathBuf)> {
    platform::journal_paths(config.state.state_dir_override.as_ref())
}

pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// First eight hex digits, enough to address an entry from the command line.
pub(crate) fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

pub(crate) fn format_stamp(at: &NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

/// Cut `text` to `width` characters, marking the cut with an ellipsis.
pub(crate) fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}
