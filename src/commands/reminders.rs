use crate::OutputFormat;
use crate::commands::{journal_paths, now, print_json, truncate};
use crate::config::Config;
use crate::reminders::sync_daily_symptom_reminder;
use crate::schedule::triggers::TriggerDescriptor;
use crate::store::{Journal, with_journal_lock};
use crate::utils::time::parse_date;
use anyhow::Result;

fn print_table(reminders: &[&TriggerDescriptor]) {
    println!("{:<26} {:<36} {}", "When", "Title", "Message");
    println!("{}", "-".repeat(90));
    for reminder in reminders {
        println!(
            "{:<26} {:<36} {}",
            reminder.trigger.to_string(),
            truncate(&reminder.title, 36),
            reminder.body
        );
    }
}

pub fn list(config: &Config, format: OutputFormat) -> Result<()> {
    let (_, journal_path) = journal_paths(config)?;
    let journal = Journal::load(&journal_path)?;
    let reminders = journal.reminders.list();

    match format {
        OutputFormat::Json => print_json(&reminders),
        OutputFormat::Text if reminders.is_empty() => {
            println!("No reminders scheduled. Run 'symptomly reminders sync' to set them up.");
            Ok(())
        }
        OutputFormat::Text => {
            print_table(&reminders);
            Ok(())
        }
    }
}

/// Reminders whose calendar trigger fires on `date`.
pub fn on(config: &Config, date: &str, format: OutputFormat) -> Result<()> {
    let (_, journal_path) = journal_paths(config)?;
    let journal = Journal::load(&journal_path)?;
    let day = parse_date(date, now().date())?;
    let reminders = journal.reminders.firing_on(day);

    match format {
        OutputFormat::Json => print_json(&reminders),
        OutputFormat::Text if reminders.is_empty() => {
            println!("No reminders on {}.", day.format("%a %b %-d, %Y"));
            Ok(())
        }
        OutputFormat::Text => {
            println!("Reminders on {}:", day.format("%a %b %-d, %Y"));
            print_table(&reminders);
            Ok(())
        }
    }
}

/// Regenerate every remedy reminder and apply the daily reminder settings.
pub fn sync(config: &Config) -> Result<()> {
    let (lock_path, journal_path) = journal_paths(config)?;
    let time = config.reminders.parsed_time()?;

    let (registered, total) = with_journal_lock(&lock_path, &journal_path, |journal| {
        let registered = journal.resync_reminders(now().date())?;
        sync_daily_symptom_reminder(&mut journal.reminders, config.reminders.enabled, time)?;
        Ok((registered, journal.reminders.len()))
    })?;

    println!("✓ Rescheduled {} remedy reminder(s)", registered);
    if config.reminders.enabled {
        println!("✓ Daily symptom reminder set for {}", time.format("%H:%M"));
    } else {
        println!("Daily symptom reminder is disabled");
    }
    tracing::info!(total, "reminders synced");
    Ok(())
}
