use crate::OutputFormat;
use crate::commands::{journal_paths, now, print_json};
use crate::config::Config;
use crate::models::timeline::{build_timeline, page};
use crate::models::{DateRange, KindFilter, TimelineFilter, TimelineItem};
use crate::store::Journal;
use crate::utils::markdown::{outline, timeline_to_markdown, to_html};
use crate::utils::time::parse_date;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use termtree::Tree;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RangePreset {
    Today,
    Yesterday,
    /// The last seven days, today included
    #[default]
    Week,
    /// The last thirty days, today included
    Last30,
    /// The current calendar month
    Month,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    #[default]
    All,
    Symptoms,
    Remedies,
}

impl From<KindArg> for KindFilter {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::All => KindFilter::All,
            KindArg::Symptoms => KindFilter::Symptoms,
            KindArg::Remedies => KindFilter::Remedies,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(long, value_enum, help = "Preset period (default: week)")]
    pub range: Option<RangePreset>,
    #[arg(long, help = "Three days either side of this date", conflicts_with = "range")]
    pub date: Option<String>,
    #[arg(long, help = "Start of a custom period", conflicts_with_all = ["range", "date"])]
    pub from: Option<String>,
    #[arg(long, help = "End of a custom period (defaults to today)", requires = "from")]
    pub to: Option<String>,
    #[arg(
        long,
        default_value_t = 0,
        allow_negative_numbers = true,
        help = "Shift the period by whole weeks, e.g. -1 for the week before"
    )]
    pub offset: i64,
    #[arg(long, value_enum, default_value_t = KindArg::All)]
    pub kind: KindArg,
    #[arg(long, help = "Only entries whose name or notes contain this text")]
    pub search: Option<String>,
}

impl FilterArgs {
    pub fn date_range(&self, today: NaiveDate) -> Result<DateRange> {
        let range = if let Some(from) = self.from.as_deref() {
            let start = parse_date(from, today)?;
            let end = match self.to.as_deref() {
                Some(to) => parse_date(to, today)?,
                None => today,
            };
            DateRange::new(start, end)
        } else if let Some(date) = self.date.as_deref() {
            DateRange::around(parse_date(date, today)?)
        } else {
            match self.range.unwrap_or_default() {
                RangePreset::Today => DateRange::today(today),
                RangePreset::Yesterday => DateRange::yesterday(today),
                RangePreset::Week => DateRange::last_days(today, 7),
                RangePreset::Last30 => DateRange::last_days(today, 30),
                RangePreset::Month => DateRange::this_month(today),
            }
        };
        Ok(range.shifted(self.offset * 7))
    }

    pub fn filter(&self, today: NaiveDate) -> Result<TimelineFilter> {
        Ok(TimelineFilter {
            kind: self.kind.into(),
            search: self.search.clone(),
            range: Some(self.date_range(today)?),
        })
    }
}

#[derive(Serialize)]
struct TimelinePage<'a> {
    range: DateRange,
    items: &'a [TimelineItem],
    has_more: bool,
}

fn load_items(config: &Config, filter: &TimelineFilter) -> Result<Vec<TimelineItem>> {
    let (_, journal_path) = journal_paths(config)?;
    let journal = Journal::load(&journal_path)?;
    Ok(build_timeline(&journal.symptoms, &journal.remedies, filter))
}

pub fn show(
    config: &Config,
    args: &FilterArgs,
    page_number: usize,
    tree: bool,
    format: OutputFormat,
) -> Result<()> {
    let filter = args.filter(now().date())?;
    let range = filter.range.unwrap_or_else(|| DateRange::today(now().date()));
    let items = load_items(config, &filter)?;
    let (shown, has_more) = page(
        &items,
        page_number.saturating_sub(1),
        config.timeline.page_size,
    );

    if let OutputFormat::Json = format {
        return print_json(&TimelinePage {
            range,
            items: shown,
            has_more,
        });
    }

    if shown.is_empty() {
        println!("No entries between {}.", range);
        return Ok(());
    }

    if tree {
        println!("{}", build_tree(&range, shown));
    } else {
        println!("Timeline: {}", range);
        println!("{:<17} {:<8} {:<28} {}", "When", "Kind", "Name", "Details");
        println!("{}", "-".repeat(90));
        for item in shown {
            println!(
                "{:<17} {:<8} {:<28} {}",
                item.timestamp.format("%Y-%m-%d %H:%M"),
                item.kind,
                item.name,
                item.details
            );
        }
    }

    if has_more {
        println!(
            "\n{} of {} entries shown. Use --page {} for more.",
            shown.len(),
            items.len(),
            page_number.max(1) + 1
        );
    }
    Ok(())
}

/// Range at the root, one branch per day, entries as leaves.
fn build_tree(range: &DateRange, items: &[TimelineItem]) -> Tree<String> {
    let mut root = Tree::new(range.to_string());
    let mut day: Option<(NaiveDate, Tree<String>)> = None;

    for item in items {
        let date = item.timestamp.date();
        if day.as_ref().is_none_or(|(d, _)| *d != date) {
            if let Some((_, branch)) = day.take() {
                root.push(branch);
            }
            day = Some((date, Tree::new(date.format("%a %b %-d").to_string())));
        }
        if let Some((_, branch)) = day.as_mut() {
            branch.push(Tree::new(format!(
                "{} {} {} ({})",
                item.timestamp.format("%H:%M"),
                item.kind,
                item.name,
                item.details
            )));
        }
    }
    if let Some((_, branch)) = day {
        root.push(branch);
    }
    root
}

pub fn export(
    config: &Config,
    args: &FilterArgs,
    html: bool,
    output: Option<&PathBuf>,
) -> Result<()> {
    let filter = args.filter(now().date())?;
    let items = load_items(config, &filter)?;
    let markdown = timeline_to_markdown(&items, filter.range.as_ref());
    let rendered = if html { to_html(&markdown) } else { markdown.clone() };

    let Some(path) = output else {
        print!("{}", rendered);
        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, rendered)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), entries = items.len(), "exported timeline");

    let days = outline(&markdown).iter().filter(|(level, _)| *level == 2).count();
    println!(
        "✓ Exported {} entries across {} day(s) to {}",
        items.len(),
        days,
        path.display()
    );
    Ok(())
}
