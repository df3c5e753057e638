use crate::OutputFormat;
use crate::commands::{format_stamp, journal_paths, now, print_json, short_id, truncate};
use crate::config::Config;
use crate::models::timeline::{active_remedies_at, symptoms_on};
use crate::models::{Remedy, Severity, Symptom};
use crate::store::{Journal, with_journal_lock};
use crate::utils::time::{parse_date, parse_timestamp};
use anyhow::Result;
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// What you are feeling, e.g. "Headache"
    pub name: String,
    #[arg(
        long,
        short,
        default_value = "mild",
        help = "0-5 or resolved, mild, moderate, severe, very-severe, extreme"
    )]
    pub severity: Severity,
    #[arg(long, default_value = "now", help = "When it started (HH:MM or YYYY-MM-DD HH:MM)")]
    pub at: String,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Serialize)]
struct SymptomView<'a> {
    #[serde(flatten)]
    symptom: &'a Symptom,
    severity_name: &'static str,
    active_remedies: Vec<String>,
}

impl<'a> SymptomView<'a> {
    fn new(symptom: &'a Symptom, remedies: &[Remedy]) -> Self {
        Self {
            symptom,
            severity_name: symptom.severity.display_name(),
            active_remedies: active_remedies_at(remedies, symptom.timestamp)
                .into_iter()
                .map(|r| format!("{} {}", r.name, r.display_potency()))
                .collect(),
        }
    }
}

pub fn log(config: &Config, args: &LogArgs, format: OutputFormat) -> Result<()> {
    let (lock_path, journal_path) = journal_paths(config)?;
    let timestamp = parse_timestamp(&args.at, now())?;
    let symptom = Symptom::new(&args.name, args.severity, timestamp, args.notes.clone())?;

    let symptom = with_journal_lock(&lock_path, &journal_path, |journal| {
        Ok(journal.add_symptom(symptom).clone())
    })?;

    match format {
        OutputFormat::Json => print_json(&symptom)?,
        OutputFormat::Text => println!(
            "✓ Logged symptom {} ({}) at {} [{}]",
            symptom.name,
            symptom.severity,
            format_stamp(&symptom.timestamp),
            short_id(&symptom.id)
        ),
    }
    Ok(())
}

pub fn list(config: &Config, date: Option<&str>, all: bool, format: OutputFormat) -> Result<()> {
    let (_, journal_path) = journal_paths(config)?;
    let journal = Journal::load(&journal_path)?;

    let symptoms: Vec<&Symptom> = if all {
        let mut all: Vec<&Symptom> = journal.symptoms.iter().collect();
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        all
    } else {
        let day = parse_date(date.unwrap_or("today"), now().date())?;
        symptoms_on(&journal.symptoms, day)
    };

    if let OutputFormat::Json = format {
        let views: Vec<SymptomView> = symptoms
            .iter()
            .map(|s| SymptomView::new(s, &journal.remedies))
            .collect();
        return print_json(&views);
    }

    if symptoms.is_empty() {
        println!("No symptoms logged.");
        return Ok(());
    }

    println!(
        "{:<10} {:<17} {:<28} {:<12} {}",
        "ID", "When", "Symptom", "Severity", "Notes"
    );
    println!("{}", "-".repeat(90));
    for symptom in symptoms {
        println!(
            "{:<10} {:<17} {:<28} {:<12} {}",
            short_id(&symptom.id),
            format_stamp(&symptom.timestamp),
            truncate(&symptom.name, 28),
            symptom.severity.display_name(),
            symptom.notes.as_deref().map(|n| truncate(n, 40)).unwrap_or_default()
        );
    }
    Ok(())
}

pub fn show(config: &Config, id: &str, format: OutputFormat) -> Result<()> {
    let (_, journal_path) = journal_paths(config)?;
    let journal = Journal::load(&journal_path)?;
    let symptom = journal.symptom(id)?;
    let view = SymptomView::new(symptom, &journal.remedies);

    if let OutputFormat::Json = format {
        return print_json(&view);
    }

    println!("Symptom {}: {}", short_id(&symptom.id), symptom.name);
    println!("Severity: {}", symptom.severity);
    println!("Logged: {}", format_stamp(&symptom.timestamp));
    if let Some(resolved_at) = &symptom.resolved_at {
        println!("Resolved: {}", format_stamp(resolved_at));
    }
    if let Some(notes) = &symptom.notes {
        println!("Notes: {}", notes);
    }
    if view.active_remedies.is_empty() {
        println!("No remedy was in its wait window at the time.");
    } else {
        println!("Remedies in their wait window at the time:");
        for remedy in &view.active_remedies {
            println!("  - {}", remedy);
        }
    }
    Ok(())
}

pub fn resolve(config: &Config, id: &str, at: &str, notes: Option<String>) -> Result<()> {
    let (lock_path, journal_path) = journal_paths(config)?;
    let at = parse_timestamp(at, now())?;

    with_journal_lock(&lock_path, &journal_path, |journal| {
        let symptom = journal.symptom_mut(id)?;
        symptom.resolve(at, notes);
        println!("✓ Resolved symptom {} ({})", symptom.name, short_id(&symptom.id));
        Ok(())
    })
}

pub fn reopen(config: &Config, id: &str) -> Result<()> {
    let (lock_path, journal_path) = journal_paths(config)?;

    with_journal_lock(&lock_path, &journal_path, |journal| {
        let symptom = journal.symptom_mut(id)?;
        if !symptom.is_resolved() {
            println!("Symptom {} is not resolved.", symptom.name);
            return Ok(());
        }
        symptom.reopen();
        println!("✓ Reopened symptom {} as {}", symptom.name, symptom.severity);
        Ok(())
    })
}

pub fn delete(config: &Config, id: &str) -> Result<()> {
    let (lock_path, journal_path) = journal_paths(config)?;

    with_journal_lock(&lock_path, &journal_path, |journal| {
        let removed = journal.remove_symptom(id)?;
        println!("✓ Deleted symptom {} ({})", removed.name, short_id(&removed.id));
        Ok(())
    })
}
