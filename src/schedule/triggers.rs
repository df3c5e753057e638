use crate::schedule::recurrence::{Recurrence, RecurrencePlan};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const SECONDS_PER_DAY: u32 = 86_400;

pub const DAILY_SYMPTOM_REMINDER_ID: &str = "daily-symptom-reminder";

/// Calendar components a reminder fires on. Unset components match anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarTrigger {
    pub hour: u32,
    pub minute: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<Weekday>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    pub repeats: bool,
}

impl CalendarTrigger {
    pub fn daily_at(time: NaiveTime) -> Self {
        Self {
            hour: time.hour(),
            minute: time.minute(),
            weekday: None,
            day_of_month: None,
            repeats: true,
        }
    }

    pub fn on_weekday(mut self, weekday: Weekday) -> Self {
        self.weekday = Some(weekday);
        self
    }

    pub fn on_day_of_month(mut self, day: u32) -> Self {
        self.day_of_month = Some(day);
        self
    }

    pub fn time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }

    pub fn fires_on(&self, date: NaiveDate) -> bool {
        self.weekday.is_none_or(|w| w == date.weekday())
            && self.day_of_month.is_none_or(|d| d == date.day())
    }
}

impl std::fmt::Display for CalendarTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cadence = match (self.weekday, self.day_of_month) {
            (Some(weekday), _) => format!("every {}", weekday),
            (None, Some(day)) => format!("monthly on day {}", day),
            (None, None) => "daily".to_string(),
        };
        write!(f, "{} at {:02}:{:02}", cadence, self.hour, self.minute)
    }
}

/// One reminder to hand to the notification scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDescriptor {
    pub identifier: String,
    pub trigger: CalendarTrigger,
    pub title: String,
    pub body: String,
}

impl TriggerDescriptor {
    pub fn new(trigger: CalendarTrigger, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            identifier: format!("remedy-{}", Uuid::new_v4()),
            trigger,
            title: title.into(),
            body: body.into(),
        }
    }
}

/// What a reminder says about the remedy it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ReminderContent<'a> {
    pub name: &'a str,
    pub potency: &'a str,
}

impl ReminderContent<'_> {
    fn title(&self) -> String {
        format!("Remedy reminder: {}", self.name)
    }

    fn body(&self) -> String {
        format!("Time to take {} {}", self.name, self.potency)
    }
}

/// Reminder schedule for a remedy taken at `taken_at`.
///
/// Each rule becomes repeating calendar triggers at the taken time of day.
/// Every-other-day and biweekly plans repeat daily and weekly respectively,
/// since a calendar trigger cannot skip a cycle. Multiple-times-per-day plans
/// spread `frequency` triggers evenly from midnight.
pub fn generate_trigger_schedule(
    taken_at: NaiveDateTime,
    plan: Option<&RecurrencePlan>,
    content: ReminderContent<'_>,
) -> Vec<TriggerDescriptor> {
    let Some(plan) = plan else {
        return Vec::new();
    };

    let base = CalendarTrigger::daily_at(taken_at.time());
    let triggers: Vec<TriggerDescriptor> = match plan.recurrence {
        Recurrence::Daily | Recurrence::EveryOtherDay => {
            vec![TriggerDescriptor::new(base, content.title(), content.body())]
        }
        Recurrence::MultipleTimesPerDay { frequency, .. } => match frequency {
            Some(frequency) if frequency > 0 => spread_over_day(frequency)
                .enumerate()
                .map(|(i, trigger)| {
                    let body = format!("{} (dose {} of {})", content.body(), i + 1, frequency);
                    TriggerDescriptor::new(trigger, content.title(), body)
                })
                .collect(),
            _ => {
                tracing::debug!(name = content.name, "no dose count, skipping reminders");
                Vec::new()
            }
        },
        Recurrence::Weekly | Recurrence::Biweekly => vec![TriggerDescriptor::new(
            base.on_weekday(taken_at.weekday()),
            content.title(),
            content.body(),
        )],
        Recurrence::Monthly => vec![TriggerDescriptor::new(
            base.on_day_of_month(taken_at.day()),
            content.title(),
            content.body(),
        )],
    };

    tracing::debug!(
        name = content.name,
        rule = plan.recurrence.rule_name(),
        count = triggers.len(),
        "generated reminder schedule"
    );
    triggers
}

fn spread_over_day(frequency: u32) -> impl Iterator<Item = CalendarTrigger> {
    let step = SECONDS_PER_DAY / frequency;
    (0..frequency).map(move |i| {
        let offset = i * step;
        CalendarTrigger {
            hour: offset / 3600,
            minute: (offset % 3600) / 60,
            weekday: None,
            day_of_month: None,
            repeats: true,
        }
    })
}

pub fn daily_symptom_reminder(time: NaiveTime) -> TriggerDescriptor {
    TriggerDescriptor {
        identifier: DAILY_SYMPTOM_REMINDER_ID.to_string(),
        trigger: CalendarTrigger::daily_at(time),
        title: "Daily Symptom Check".to_string(),
        body: "Don't forget to log your symptoms for today!".to_string(),
    }
}
