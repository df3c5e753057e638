use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use symptomly::OutputFormat;
use symptomly::commands;
use symptomly::commands::remedy::ListScope;
use symptomly::commands::timeline::FilterArgs;
use symptomly::config;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "symptomly")]
#[command(about = "Symptom and remedy journal with wait-and-watch tracking")]
#[command(version)]
struct Cli {
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log and review symptoms
    Symptom(SymptomArgs),
    /// Log remedies, their wait windows and recurrences
    Remedy(RemedyArgs),
    /// Symptoms and remedies merged by time
    Timeline(TimelineArgs),
    /// Scheduled reminders
    Reminders(RemindersArgs),
    /// List configuration
    Config(ConfigArgs),
}

#[derive(Args)]
struct SymptomArgs {
    #[command(subcommand)]
    action: SymptomAction,
}

#[derive(Subcommand)]
enum SymptomAction {
    /// Log a symptom
    Log(commands::symptom::LogArgs),
    /// Symptoms logged on one day
    List {
        #[arg(long, help = "Day to list (today, yesterday or YYYY-MM-DD)")]
        date: Option<String>,
        #[arg(long, help = "Every symptom, newest first", conflicts_with = "date")]
        all: bool,
    },
    /// Show one symptom and the remedies active when it was logged
    Show {
        #[arg(help = "Symptom ID (or a unique prefix)")]
        id: String,
    },
    /// Mark a symptom as resolved
    Resolve {
        id: String,
        #[arg(long, default_value = "now")]
        at: String,
        #[arg(long, help = "Replace the notes")]
        notes: Option<String>,
    },
    /// Undo a resolve
    Reopen { id: String },
    Delete { id: String },
}

#[derive(Args)]
struct RemedyArgs {
    #[command(subcommand)]
    action: RemedyAction,
}

#[derive(Subcommand)]
enum RemedyAction {
    /// Log a remedy
    Log(commands::remedy::LogArgs),
    /// Remedies taken or scheduled on one day
    List {
        #[arg(long, help = "Day to list (today, yesterday or YYYY-MM-DD)")]
        date: Option<String>,
        #[arg(long, help = "Remedies still in their wait window", conflicts_with_all = ["date", "upcoming", "all"])]
        active: bool,
        #[arg(long, help = "Recurring remedies that have not ended", conflicts_with_all = ["date", "all"])]
        upcoming: bool,
        #[arg(long, help = "Every remedy, newest first", conflicts_with = "date")]
        all: bool,
    },
    /// Show a remedy with its wait window, recurrence and reminders
    Show {
        #[arg(help = "Remedy ID (or a unique prefix)")]
        id: String,
    },
    /// Edit a remedy; reminders are regenerated
    Edit(commands::remedy::EditArgs),
    /// Delete a remedy and cancel its reminders
    Delete { id: String },
    /// Suggest remedy names
    Suggest {
        query: String,
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Args)]
struct TimelineArgs {
    #[command(subcommand)]
    action: TimelineAction,
}

#[derive(Subcommand)]
enum TimelineAction {
    /// Print the timeline
    Show {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "1", help = "Show this many pages")]
        page: usize,
        #[arg(long, help = "Group entries by day as a tree")]
        tree: bool,
    },
    /// Export the timeline as Markdown
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, help = "Render HTML instead of Markdown")]
        html: bool,
        #[arg(long, short, help = "Write to a file instead of stdout")]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RemindersArgs {
    #[command(subcommand)]
    action: RemindersAction,
}

#[derive(Subcommand)]
enum RemindersAction {
    /// List every scheduled reminder
    List,
    /// Reminders that fire on a day
    On {
        #[arg(default_value = "today")]
        date: String,
    },
    /// Regenerate reminders from remedies and settings
    Sync,
}

#[derive(Parser)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Subcommand)]
enum ConfigAction {
    List,
    Set { key: String, value: String },
    Get { key: String },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("SYMPTOMLY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let format = cli.format;

    let config = config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load config, using defaults");
        eprintln!("Warning: config ignored ({e:#}). Fix it with 'symptomly config set ...'");
        config::Config::default()
    });

    match &cli.command {
        Commands::Symptom(args) => match &args.action {
            SymptomAction::Log(log) => commands::symptom::log(&config, log, format)?,
            SymptomAction::List { date, all } => {
                commands::symptom::list(&config, date.as_deref(), *all, format)?
            }
            SymptomAction::Show { id } => commands::symptom::show(&config, id, format)?,
            SymptomAction::Resolve { id, at, notes } => {
                commands::symptom::resolve(&config, id, at, notes.clone())?
            }
            SymptomAction::Reopen { id } => commands::symptom::reopen(&config, id)?,
            SymptomAction::Delete { id } => commands::symptom::delete(&config, id)?,
        },
        Commands::Remedy(args) => match &args.action {
            RemedyAction::Log(log) => commands::remedy::log(&config, log, format)?,
            RemedyAction::List {
                date,
                active,
                upcoming,
                all,
            } => {
                let scope = match (*active, *upcoming, *all) {
                    (true, _, _) => ListScope::Active,
                    (_, true, _) => ListScope::Upcoming,
                    (_, _, true) => ListScope::All,
                    _ => ListScope::Day,
                };
                commands::remedy::list(&config, date.as_deref(), scope, format)?
            }
            RemedyAction::Show { id } => commands::remedy::show(&config, id, format)?,
            RemedyAction::Edit(edit) => commands::remedy::edit(&config, edit, format)?,
            RemedyAction::Delete { id } => commands::remedy::delete(&config, id)?,
            RemedyAction::Suggest { query, limit } => {
                commands::remedy::suggest(&config, query, *limit, format)?
            }
        },
        Commands::Timeline(args) => match &args.action {
            TimelineAction::Show { filter, page, tree } => {
                commands::timeline::show(&config, filter, *page, *tree, format)?
            }
            TimelineAction::Export {
                filter,
                html,
                output,
            } => commands::timeline::export(&config, filter, *html, output.as_ref())?,
        },
        Commands::Reminders(args) => match &args.action {
            RemindersAction::List => commands::reminders::list(&config, format)?,
            RemindersAction::On { date } => commands::reminders::on(&config, date, format)?,
            RemindersAction::Sync => commands::reminders::sync(&config)?,
        },
        Commands::Config(args) => match &args.action {
            ConfigAction::List => commands::config::list(&config)?,
            ConfigAction::Set { key, value } => commands::config::set(key, value)?,
            ConfigAction::Get { key } => commands::config::get(key, &config)?,
        },
    }

    Ok(())
}
