use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::RangeInclusive;

pub const FREQUENCY_RANGE: RangeInclusive<u32> = 2..=12;
pub const INTERVAL_HOURS_RANGE: RangeInclusive<u32> = 1..=12;

/// How often a remedy is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recurrence {
    Daily,
    /// `frequency` is `None` only for records that lost their dose count; such
    /// a plan still occurs every day but produces no reminders.
    MultipleTimesPerDay {
        frequency: Option<u32>,
        interval_hours: Option<u32>,
    },
    EveryOtherDay,
    Weekly,
    Biweekly,
    Monthly,
}

impl Recurrence {
    pub const RULE_NAMES: [&'static str; 6] = [
        "Daily",
        "Multiple times per day",
        "Every other day",
        "Weekly",
        "Biweekly",
        "Monthly",
    ];

    /// Clamps both values into their allowed ranges.
    pub fn multiple_times_per_day(frequency: u32, interval_hours: u32) -> Self {
        Self::MultipleTimesPerDay {
            frequency: Some(clamp_into(frequency, FREQUENCY_RANGE)),
            interval_hours: Some(clamp_into(interval_hours, INTERVAL_HOURS_RANGE)),
        }
    }

    pub fn rule_name(&self) -> &'static str {
        match self {
            Self::Daily => Self::RULE_NAMES[0],
            Self::MultipleTimesPerDay { .. } => Self::RULE_NAMES[1],
            Self::EveryOtherDay => Self::RULE_NAMES[2],
            Self::Weekly => Self::RULE_NAMES[3],
            Self::Biweekly => Self::RULE_NAMES[4],
            Self::Monthly => Self::RULE_NAMES[5],
        }
    }

    /// Build from a stored or typed rule name. Unknown names give `None`.
    ///
    /// Matching ignores case, spaces, dashes and underscores, so
    /// `"every-other-day"` and `"everyOtherDay"` both work.
    pub fn from_rule(
        rule: &str,
        frequency: Option<i64>,
        interval_hours: Option<i64>,
    ) -> Option<Self> {
        let key: String = rule
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        let recurrence = match key.as_str() {
            "daily" => Self::Daily,
            "multipletimesperday" => Self::MultipleTimesPerDay {
                frequency: frequency.map(|f| clamp_i64(f, FREQUENCY_RANGE)),
                interval_hours: interval_hours.map(|i| clamp_i64(i, INTERVAL_HOURS_RANGE)),
            },
            "everyotherday" => Self::EveryOtherDay,
            "weekly" => Self::Weekly,
            "biweekly" => Self::Biweekly,
            "monthly" => Self::Monthly,
            _ => return None,
        };
        Some(recurrence)
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultipleTimesPerDay {
                frequency: Some(frequency),
                interval_hours,
            } => {
                write!(f, "{} times per day", frequency)?;
                if let Some(hours) = interval_hours {
                    write!(f, ", {}h apart", hours)?;
                }
                Ok(())
            }
            other => f.write_str(other.rule_name()),
        }
    }
}

fn clamp_into(value: u32, range: RangeInclusive<u32>) -> u32 {
    value.clamp(*range.start(), *range.end())
}

fn clamp_i64(value: i64, range: RangeInclusive<u32>) -> u32 {
    value.clamp(*range.start() as i64, *range.end() as i64) as u32
}

/// A recurrence together with the last moment it may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrencePlan {
    pub recurrence: Recurrence,
    pub ends_at: NaiveDateTime,
}

impl RecurrencePlan {
    pub fn new(recurrence: Recurrence, ends_at: NaiveDateTime) -> Self {
        Self {
            recurrence,
            ends_at,
        }
    }

    /// Decode loose fields. A missing or unknown rule, or a missing end
    /// date, means the remedy does not recur.
    pub fn decode(
        rule: Option<&str>,
        frequency: Option<i64>,
        interval_hours: Option<i64>,
        ends_at: Option<NaiveDateTime>,
    ) -> Option<Self> {
        let recurrence = Recurrence::from_rule(rule?, frequency, interval_hours)?;
        Some(Self::new(recurrence, ends_at?))
    }

    pub fn record(&self) -> RecurrenceRecord {
        let (frequency, interval_hours) = match self.recurrence {
            Recurrence::MultipleTimesPerDay {
                frequency,
                interval_hours,
            } => (frequency.map(i64::from), interval_hours.map(i64::from)),
            _ => (None, None),
        };
        RecurrenceRecord {
            rule: Some(self.recurrence.rule_name().to_string()),
            frequency,
            interval_hours,
            ends_at: Some(self.ends_at),
        }
    }
}

/// Flat storage shape of a recurrence plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRecord {
    #[serde(default)]
    pub rule: Option<String>,
    #[serde(default)]
    pub frequency: Option<i64>,
    #[serde(default)]
    pub interval_hours: Option<i64>,
    #[serde(default)]
    pub ends_at: Option<NaiveDateTime>,
}

impl RecurrenceRecord {
    pub fn decode(&self) -> Option<RecurrencePlan> {
        RecurrencePlan::decode(
            self.rule.as_deref(),
            self.frequency,
            self.interval_hours,
            self.ends_at,
        )
    }
}

impl Serialize for RecurrencePlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.record().serialize(serializer)
    }
}

/// `Option<RecurrencePlan>` field adapter: undecodable records read as `None`.
pub mod lenient {
    use super::{RecurrencePlan, RecurrenceRecord};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        plan: &Option<RecurrencePlan>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        plan.as_ref().map(RecurrencePlan::record).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<RecurrencePlan>, D::Error> {
        let record = Option::<RecurrenceRecord>::deserialize(deserializer)?;
        Ok(record.and_then(|r| r.decode()))
    }
}

impl<'de> Deserialize<'de> for RecurrencePlan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = RecurrenceRecord::deserialize(deserializer)?;
        record
            .decode()
            .ok_or_else(|| serde::de::Error::custom("incomplete or unknown recurrence rule"))
    }
}

/// Does a remedy taken at `taken_at` have an occurrence on `date`?
///
/// Comparison is by calendar day: the taken day and the end day are both
/// inside the range.
pub fn has_occurrence_on(
    taken_at: NaiveDateTime,
    plan: Option<&RecurrencePlan>,
    date: NaiveDate,
) -> bool {
    let first = taken_at.date();
    if date < first {
        return false;
    }

    let Some(plan) = plan else {
        return date == first;
    };
    if date > plan.ends_at.date() {
        return false;
    }

    let days = (date - first).num_days();
    let same_weekday = date.weekday() == first.weekday();
    match plan.recurrence {
        Recurrence::Daily | Recurrence::MultipleTimesPerDay { .. } => true,
        Recurrence::EveryOtherDay => days % 2 == 0,
        Recurrence::Weekly => same_weekday && days % 7 == 0,
        Recurrence::Biweekly => same_weekday && (days / 7) % 2 == 0,
        Recurrence::Monthly => date.day() == first.day(),
    }
}

/// Every occurrence date in `[from, to]`, in order.
pub fn occurrences_between(
    taken_at: NaiveDateTime,
    plan: Option<&RecurrencePlan>,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|day| *day <= to)
        .filter(|day| has_occurrence_on(taken_at, plan, *day))
        .collect()
}
