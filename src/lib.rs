pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod platform;
pub mod reminders;
pub mod schedule;
pub mod store;
pub mod utils;

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, ValueEnum, Debug, Default, Serialize)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
