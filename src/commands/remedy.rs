use crate::OutputFormat;
use crate::commands::{format_stamp, journal_paths, now, print_json, short_id, truncate};
use crate::config::Config;
use crate::error::JournalError;
use crate::models::Remedy;
use crate::models::timeline::{active_remedies_at, remedies_on, upcoming_recurring};
use crate::schedule::duration::{DurationUnit, format_duration};
use crate::schedule::potency::Potency;
use crate::schedule::recurrence::{Recurrence, RecurrencePlan};
use crate::schedule::window::WindowEdit;
use crate::store::{Journal, with_journal_lock};
use crate::utils::suggest::suggest as suggest_names;
use crate::utils::time::{parse_date, parse_timestamp};
use anyhow::{Context, Result};
use chrono::{Days, NaiveDate, NaiveDateTime};
use clap::Args;
use serde::Serialize;

const UPCOMING_DAYS: u64 = 14;

#[derive(Args, Debug, Clone, Default)]
pub struct RecurrenceArgs {
    #[arg(
        long,
        help = "daily, multiple-times-per-day, every-other-day, weekly, biweekly, monthly (or 'none' when editing)"
    )]
    pub recur: Option<String>,
    #[arg(long, help = "Last day of the recurrence (YYYY-MM-DD)")]
    pub until: Option<String>,
    #[arg(long, help = "Doses per day for multiple-times-per-day (2-12)")]
    pub frequency: Option<u32>,
    #[arg(long, help = "Hours between doses for multiple-times-per-day (1-12)")]
    pub interval: Option<u32>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct WaitArgs {
    #[arg(long, help = "Wait-and-watch length, in --unit")]
    pub wait: Option<i64>,
    #[arg(long, help = "hours, days, weeks or months")]
    pub unit: Option<DurationUnit>,
    #[arg(long, help = "Explicit effectiveness due date (YYYY-MM-DD HH:MM)")]
    pub due: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Remedy name, e.g. "Arnica montana"
    pub name: String,
    #[arg(long, short, help = "6C, 30C, 200C, 1M or Other (defaults to remedies.default_potency)")]
    pub potency: Option<String>,
    #[arg(long, help = "Label for an 'Other' potency, e.g. LM1")]
    pub custom_potency: Option<String>,
    #[arg(long, default_value = "now", help = "When it was taken")]
    pub at: String,
    #[arg(long, help = "When it was prescribed (defaults to --at)")]
    pub prescribed_at: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[command(flatten)]
    pub wait: WaitArgs,
    #[command(flatten)]
    pub recurrence: RecurrenceArgs,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Remedy ID (or a unique prefix)
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, short)]
    pub potency: Option<String>,
    #[arg(long)]
    pub custom_potency: Option<String>,
    #[arg(long)]
    pub at: Option<String>,
    #[arg(long)]
    pub prescribed_at: Option<String>,
    #[arg(long, help = "New notes (empty string clears them)")]
    pub notes: Option<String>,
    #[command(flatten)]
    pub wait: WaitArgs,
    #[command(flatten)]
    pub recurrence: RecurrenceArgs,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListScope {
    /// Remedies with an occurrence on one day
    #[default]
    Day,
    /// Remedies whose wait window covers the present moment
    Active,
    /// Recurring remedies still running
    Upcoming,
    All,
}

#[derive(Serialize)]
struct RemedyView<'a> {
    #[serde(flatten)]
    remedy: &'a Remedy,
    display_potency: &'a str,
    wait_period: String,
    wait_period_seconds: i64,
    recurrence_summary: Option<String>,
}

impl<'a> From<&'a Remedy> for RemedyView<'a> {
    fn from(remedy: &'a Remedy) -> Self {
        Self {
            remedy,
            display_potency: remedy.display_potency(),
            wait_period: format_duration(remedy.wait_value, remedy.wait_unit),
            wait_period_seconds: remedy.wait_period_seconds(),
            recurrence_summary: recurrence_summary(remedy),
        }
    }
}

fn recurrence_summary(remedy: &Remedy) -> Option<String> {
    remedy
        .recurrence
        .as_ref()
        .map(|plan| format!("{} until {}", plan.recurrence, plan.ends_at.date()))
}

fn parse_potency(
    label: Option<&str>,
    custom: Option<String>,
    fallback: Potency,
) -> (Potency, Option<String>) {
    match label {
        // An unknown label is taken as the custom potency itself
        Some(label) => match Potency::from_label(label) {
            Potency::Other if !label.trim().eq_ignore_ascii_case("other") => {
                (Potency::Other, custom.or_else(|| Some(label.trim().to_string())))
            }
            potency => (potency, custom),
        },
        None if custom.is_some() => (Potency::Other, custom),
        None => (fallback, None),
    }
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 0).unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN))
}

/// Build the recurrence a remedy should carry after applying `args`.
///
/// `None` from the outer option means the flags leave the current plan alone.
fn plan_from_args(
    args: &RecurrenceArgs,
    current: Option<RecurrencePlan>,
    taken_at: NaiveDateTime,
    config: &Config,
) -> Result<Option<Option<RecurrencePlan>>> {
    let today = now().date();
    let until = args
        .until
        .as_deref()
        .map(|d| parse_date(d, today).map(end_of_day))
        .transpose()?;

    if let Some(rule) = args.recur.as_deref() {
        if rule.trim().eq_ignore_ascii_case("none") {
            return Ok(Some(None));
        }

        let defaults = &config.remedies;
        let (current_frequency, current_interval) = match current.map(|p| p.recurrence) {
            Some(Recurrence::MultipleTimesPerDay {
                frequency,
                interval_hours,
            }) => (frequency, interval_hours),
            _ => (None, None),
        };
        let frequency = args
            .frequency
            .or(current_frequency)
            .unwrap_or(defaults.default_frequency);
        let interval = args
            .interval
            .or(current_interval)
            .unwrap_or(defaults.default_interval_hours);
        let recurrence = Recurrence::from_rule(rule, Some(frequency.into()), Some(interval.into()))
            .with_context(|| format!("Unknown recurrence rule '{}'", rule))?;

        let ends_at = until
            .or(current.map(|p| p.ends_at))
            .unwrap_or_else(|| {
                let days = Days::new(defaults.default_recurrence_days.into());
                end_of_day(taken_at.date().checked_add_days(days).unwrap_or(taken_at.date()))
            });
        return Ok(Some(Some(RecurrencePlan::new(recurrence, ends_at))));
    }

    let touches_plan = until.is_some() || args.frequency.is_some() || args.interval.is_some();
    if !touches_plan {
        return Ok(None);
    }
    let Some(mut plan) = current else {
        anyhow::bail!("This remedy does not recur. Pass --recur to set a recurrence first.");
    };

    if let Some(until) = until {
        plan.ends_at = until;
    }
    if let Recurrence::MultipleTimesPerDay {
        frequency,
        interval_hours,
    } = plan.recurrence
    {
        plan.recurrence = Recurrence::multiple_times_per_day(
            args.frequency.or(frequency).unwrap_or(config.remedies.default_frequency),
            args.interval
                .or(interval_hours)
                .unwrap_or(config.remedies.default_interval_hours),
        );
    } else if args.frequency.is_some() || args.interval.is_some() {
        anyhow::bail!("--frequency and --interval only apply to multiple-times-per-day");
    }
    Ok(Some(Some(plan)))
}

/// Apply wait-window flags in order: duration, then unit, then explicit due date.
fn apply_wait_args(remedy: &mut Remedy, args: &WaitArgs) -> Result<()> {
    match (args.wait, args.unit) {
        (Some(value), unit) => remedy.apply_window(WindowEdit::Duration {
            value,
            unit: unit.unwrap_or(remedy.wait_unit),
        }),
        (None, Some(unit)) => remedy.apply_window(WindowEdit::Unit(unit)),
        (None, None) => {}
    }
    if let Some(due) = args.due.as_deref() {
        let due = parse_timestamp(due, now())?;
        remedy.apply_window(WindowEdit::DueAt(due));
    }
    Ok(())
}

pub fn log(config: &Config, args: &LogArgs, format: OutputFormat) -> Result<()> {
    let (lock_path, journal_path) = journal_paths(config)?;
    let current = now();
    let taken_at = parse_timestamp(&args.at, current)?;
    let prescribed_at = match args.prescribed_at.as_deref() {
        Some(at) => parse_timestamp(at, current)?,
        None => taken_at,
    };
    let (potency, custom) = parse_potency(
        args.potency.as_deref(),
        args.custom_potency.clone(),
        config.remedies.potency(),
    );

    let mut remedy = Remedy::log(&args.name, potency, custom, taken_at, prescribed_at)?
        .with_notes(args.notes.clone());
    apply_wait_args(&mut remedy, &args.wait)?;
    if let Some(plan) = plan_from_args(&args.recurrence, None, taken_at, config)? {
        remedy.set_recurrence(plan);
    }

    let remedy = with_journal_lock(&lock_path, &journal_path, |journal| {
        Ok(journal.add_remedy(remedy)?.clone())
    })?;

    match format {
        OutputFormat::Json => print_json(&RemedyView::from(&remedy))?,
        OutputFormat::Text => {
            println!(
                "✓ Logged remedy {} {} at {} [{}]",
                remedy.name,
                remedy.display_potency(),
                format_stamp(&remedy.taken_at),
                short_id(&remedy.id)
            );
            println!(
                "  Wait and watch for {} (until {})",
                format_duration(remedy.wait_value, remedy.wait_unit),
                format_stamp(&remedy.due_at)
            );
            if let Some(summary) = recurrence_summary(&remedy) {
                println!(
                    "  Repeats {}, {} reminder(s) scheduled",
                    summary,
                    remedy.notification_handles.len()
                );
            }
        }
    }
    Ok(())
}

pub fn list(
    config: &Config,
    date: Option<&str>,
    scope: ListScope,
    format: OutputFormat,
) -> Result<()> {
    let (_, journal_path) = journal_paths(config)?;
    let journal = Journal::load(&journal_path)?;
    let current = now();

    let remedies: Vec<&Remedy> = match scope {
        ListScope::Day => {
            let day = parse_date(date.unwrap_or("today"), current.date())?;
            remedies_on(&journal.remedies, day)
        }
        ListScope::Active => active_remedies_at(&journal.remedies, current),
        ListScope::Upcoming => upcoming_recurring(&journal.remedies, current.date()),
        ListScope::All => {
            let mut all: Vec<&Remedy> = journal.remedies.iter().collect();
            all.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));
            all
        }
    };

    if let OutputFormat::Json = format {
        let views: Vec<RemedyView> = remedies.into_iter().map(RemedyView::from).collect();
        return print_json(&views);
    }

    if remedies.is_empty() {
        println!("No remedies found.");
        return Ok(());
    }

    println!(
        "{:<10} {:<17} {:<26} {:<8} {:<17} {}",
        "ID", "Taken", "Remedy", "Potency", "Due", "Recurrence"
    );
    println!("{}", "-".repeat(100));
    for remedy in remedies {
        println!(
            "{:<10} {:<17} {:<26} {:<8} {:<17} {}",
            short_id(&remedy.id),
            format_stamp(&remedy.taken_at),
            truncate(&remedy.name, 26),
            truncate(remedy.display_potency(), 8),
            format_stamp(&remedy.due_at),
            recurrence_summary(remedy).unwrap_or_else(|| "-".to_string())
        );
    }
    Ok(())
}

pub fn show(config: &Config, id: &str, format: OutputFormat) -> Result<()> {
    let (_, journal_path) = journal_paths(config)?;
    let journal = Journal::load(&journal_path)?;
    let remedy = journal.remedy(id)?;

    if let OutputFormat::Json = format {
        return print_json(&RemedyView::from(remedy));
    }

    let current = now();
    println!("Remedy {}: {}", short_id(&remedy.id), remedy.name);
    println!("Potency: {}", remedy.display_potency());
    println!("Taken: {}", format_stamp(&remedy.taken_at));
    println!("Prescribed: {}", format_stamp(&remedy.prescribed_at));
    println!(
        "Wait and watch: {} (due {}){}",
        format_duration(remedy.wait_value, remedy.wait_unit),
        format_stamp(&remedy.due_at),
        if remedy.is_active_at(current) { ", active now" } else { "" }
    );
    if let Some(notes) = &remedy.notes {
        println!("Notes: {}", notes);
    }

    let Some(summary) = recurrence_summary(remedy) else {
        return Ok(());
    };
    println!("Recurrence: {}", summary);

    let today = current.date();
    let horizon = today
        .checked_add_days(Days::new(UPCOMING_DAYS - 1))
        .unwrap_or(today);
    let upcoming = remedy.occurrences_between(today, horizon);
    if !upcoming.is_empty() {
        let days: Vec<String> = upcoming.iter().map(|d| d.format("%a %b %-d").to_string()).collect();
        println!("Next {} days: {}", UPCOMING_DAYS, days.join(", "));
    }

    let reminders = journal.reminders.owned_by(&remedy.notification_handles);
    if reminders.is_empty() {
        println!("Reminders: none");
    } else {
        println!("Reminders:");
        for reminder in reminders {
            println!("  - {}", reminder.trigger);
        }
    }
    Ok(())
}

pub fn edit(config: &Config, args: &EditArgs, format: OutputFormat) -> Result<()> {
    let (lock_path, journal_path) = journal_paths(config)?;
    let current = now();
    let taken_at = args
        .at
        .as_deref()
        .map(|at| parse_timestamp(at, current))
        .transpose()?;
    let prescribed_at = args
        .prescribed_at
        .as_deref()
        .map(|at| parse_timestamp(at, current))
        .transpose()?;

    let remedy = with_journal_lock(&lock_path, &journal_path, |journal| {
        let remedy = journal.update_remedy(&args.id, |remedy| {
            if let Some(name) = args.name.as_deref() {
                let name = name.trim();
                if name.is_empty() {
                    return Err(JournalError::EmptyName("Remedy").into());
                }
                remedy.name = name.to_string();
            }
            if args.potency.is_some() || args.custom_potency.is_some() {
                let (potency, custom) = parse_potency(
                    args.potency.as_deref(),
                    args.custom_potency.clone().or_else(|| remedy.custom_potency.clone()),
                    remedy.potency,
                );
                remedy.set_potency(potency, custom)?;
            }
            if let Some(taken_at) = taken_at {
                remedy.apply_window(WindowEdit::TakenAt(taken_at));
            }
            if let Some(prescribed_at) = prescribed_at {
                remedy.prescribed_at = prescribed_at;
            }
            apply_wait_args(remedy, &args.wait)?;
            if let Some(notes) = args.notes.clone() {
                remedy.set_notes(Some(notes));
            }
            if let Some(plan) =
                plan_from_args(&args.recurrence, remedy.recurrence, remedy.taken_at, config)?
            {
                remedy.set_recurrence(plan);
            }
            Ok(())
        })?;
        Ok(remedy.clone())
    })?;

    match format {
        OutputFormat::Json => print_json(&RemedyView::from(&remedy))?,
        OutputFormat::Text => {
            println!("✓ Updated remedy {} ({})", remedy.name, short_id(&remedy.id));
            println!(
                "  {} {}, due {}",
                remedy.display_potency(),
                format_duration(remedy.wait_value, remedy.wait_unit),
                format_stamp(&remedy.due_at)
            );
            if let Some(summary) = recurrence_summary(&remedy) {
                println!(
                    "  Repeats {}, {} reminder(s) scheduled",
                    summary,
                    remedy.notification_handles.len()
                );
            }
        }
    }
    Ok(())
}

pub fn delete(config: &Config, id: &str) -> Result<()> {
    let (lock_path, journal_path) = journal_paths(config)?;

    with_journal_lock(&lock_path, &journal_path, |journal| {
        let cancelled = journal.remedy(id)?.notification_handles.len();
        let removed = journal.remove_remedy(id)?;
        println!(
            "✓ Deleted remedy {} ({}), cancelled {} reminder(s)",
            removed.name,
            short_id(&removed.id),
            cancelled
        );
        Ok(())
    })
}

pub fn suggest(config: &Config, query: &str, limit: usize, format: OutputFormat) -> Result<()> {
    let (_, journal_path) = journal_paths(config)?;
    let journal = Journal::load(&journal_path)?;
    let names = suggest_names(query, &journal.remedy_names(), limit);

    match format {
        OutputFormat::Json => print_json(&names)?,
        OutputFormat::Text if names.is_empty() => println!("No suggestions for '{}'.", query),
        OutputFormat::Text => {
            for name in names {
                println!("{}", name);
            }
        }
    }
    Ok(())
}
