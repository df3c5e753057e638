use crate::models::remedy::Remedy;
use crate::models::symptom::Symptom;
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Symptom,
    Remedy,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symptom => f.write_str("Symptom"),
            Self::Remedy => f.write_str("Remedy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineItem {
    pub id: Uuid,
    pub timestamp: NaiveDateTime,
    pub kind: ItemKind,
    pub name: String,
    pub details: String,
}

impl TimelineItem {
    pub fn from_symptom(symptom: &Symptom) -> Self {
        Self {
            id: symptom.id,
            timestamp: symptom.timestamp,
            kind: ItemKind::Symptom,
            name: symptom.name.clone(),
            details: with_notes(
                format!("Severity: {}", symptom.severity),
                symptom.notes.as_deref(),
            ),
        }
    }

    pub fn from_remedy(remedy: &Remedy) -> Self {
        Self {
            id: remedy.id,
            timestamp: remedy.taken_at,
            kind: ItemKind::Remedy,
            name: remedy.name.clone(),
            details: with_notes(
                format!("Potency: {}", remedy.display_potency()),
                remedy.notes.as_deref(),
            ),
        }
    }
}

fn with_notes(details: String, notes: Option<&str>) -> String {
    match notes {
        Some(notes) => format!("{} - {}", details, notes),
        None => details,
    }
}

/// Inclusive range of whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Reversed bounds are swapped.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn today(today: NaiveDate) -> Self {
        Self::day(today)
    }

    pub fn yesterday(today: NaiveDate) -> Self {
        Self::day(today.pred_opt().unwrap_or(today))
    }

    /// The last `days` days, ending today.
    pub fn last_days(today: NaiveDate, days: u64) -> Self {
        let start = today
            .checked_sub_days(Days::new(days.saturating_sub(1)))
            .unwrap_or(NaiveDate::MIN);
        Self::new(start, today)
    }

    pub fn this_month(today: NaiveDate) -> Self {
        Self::new(today.with_day(1).unwrap_or(today), today)
    }

    /// A week centred on `date`.
    pub fn around(date: NaiveDate) -> Self {
        let start = date.checked_sub_days(Days::new(3)).unwrap_or(date);
        let end = date.checked_add_days(Days::new(3)).unwrap_or(date);
        Self::new(start, end)
    }

    /// The same span moved by `days` (negative moves back).
    pub fn shifted(&self, days: i64) -> Self {
        let shift = |d: NaiveDate| {
            if days >= 0 {
                d.checked_add_days(Days::new(days as u64))
            } else {
                d.checked_sub_days(Days::new(days.unsigned_abs()))
            }
            .unwrap_or(d)
        };
        Self::new(shift(self.start), shift(self.end))
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.contains_date(at.date())
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt = "%b %-d, %Y";
        if self.start == self.end {
            write!(f, "{}", self.start.format(fmt))
        } else {
            write!(f, "{} - {}", self.start.format(fmt), self.end.format(fmt))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    All,
    Symptoms,
    Remedies,
}

impl KindFilter {
    fn allows(self, kind: ItemKind) -> bool {
        matches!(
            (self, kind),
            (Self::All, _) | (Self::Symptoms, ItemKind::Symptom) | (Self::Remedies, ItemKind::Remedy)
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimelineFilter {
    pub kind: KindFilter,
    /// Case-insensitive substring of the name or notes.
    pub search: Option<String>,
    pub range: Option<DateRange>,
}

impl TimelineFilter {
    fn matches(&self, kind: ItemKind, at: NaiveDateTime, name: &str, notes: Option<&str>) -> bool {
        if !self.kind.allows(kind) {
            return false;
        }
        if self.range.is_some_and(|r| !r.contains(at)) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => {
                let query = query.to_lowercase();
                name.to_lowercase().contains(&query)
                    || notes.is_some_and(|n| n.to_lowercase().contains(&query))
            }
            _ => true,
        }
    }
}

/// Symptoms and remedies merged into one list, newest first.
pub fn build_timeline(
    symptoms: &[Symptom],
    remedies: &[Remedy],
    filter: &TimelineFilter,
) -> Vec<TimelineItem> {
    let symptom_items = symptoms
        .iter()
        .filter(|s| filter.matches(ItemKind::Symptom, s.timestamp, &s.name, s.notes.as_deref()))
        .map(TimelineItem::from_symptom);
    let remedy_items = remedies
        .iter()
        .filter(|r| filter.matches(ItemKind::Remedy, r.taken_at, &r.name, r.notes.as_deref()))
        .map(TimelineItem::from_remedy);

    let mut items: Vec<TimelineItem> = symptom_items.chain(remedy_items).collect();
    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    items
}

/// Everything up to and including page `page` (zero based), and whether more remain.
pub fn page<T>(items: &[T], page: usize, per_page: usize) -> (&[T], bool) {
    let end = page
        .saturating_add(1)
        .saturating_mul(per_page.max(1))
        .min(items.len());
    (&items[..end], end < items.len())
}

pub fn symptoms_on(symptoms: &[Symptom], date: NaiveDate) -> Vec<&Symptom> {
    let mut found: Vec<&Symptom> = symptoms.iter().filter(|s| s.occurs_on(date)).collect();
    found.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    found
}

/// Remedies with an occurrence on `date`, recurring ones included.
pub fn remedies_on(remedies: &[Remedy], date: NaiveDate) -> Vec<&Remedy> {
    let mut found: Vec<&Remedy> = remedies
        .iter()
        .filter(|r| r.has_occurrence_on(date))
        .collect();
    found.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));
    found
}

/// Recurring remedies still running after `today` that were not taken today.
pub fn upcoming_recurring(remedies: &[Remedy], today: NaiveDate) -> Vec<&Remedy> {
    let mut found: Vec<&Remedy> = remedies
        .iter()
        .filter(|r| {
            r.recurrence
                .as_ref()
                .is_some_and(|plan| plan.ends_at.date() > today)
                && r.taken_at.date() != today
        })
        .collect();
    found.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));
    found
}

/// Remedies whose wait window covers `at`.
pub fn active_remedies_at(remedies: &[Remedy], at: NaiveDateTime) -> Vec<&Remedy> {
    remedies.iter().filter(|r| r.is_active_at(at)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::symptom::Severity;
    use crate::schedule::potency::Potency;
    use crate::schedule::recurrence::{Recurrence, RecurrencePlan};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn at(m: u32, d: u32, h: u32) -> NaiveDateTime {
        date(m, d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn fixture() -> (Vec<Symptom>, Vec<Remedy>) {
        let symptoms = vec![
            Symptom::new("Headache", Severity::Moderate, at(3, 1, 8), Some("after coffee".into()))
                .unwrap(),
            Symptom::new("Cough", Severity::Mild, at(3, 3, 20), None).unwrap(),
        ];
        let mut daily = Remedy::log("Bryonia", Potency::C6, None, at(3, 2, 9), at(3, 2, 9)).unwrap();
        daily.set_recurrence(Some(RecurrencePlan::new(Recurrence::Daily, at(3, 10, 0))));
        let single = Remedy::log("Arnica montana", Potency::C30, None, at(3, 1, 12), at(3, 1, 12))
            .unwrap()
            .with_notes(Some("for the headache".into()));
        (symptoms, vec![daily, single])
    }

    #[test]
    fn test_timeline_newest_first_with_details() {
        let (symptoms, remedies) = fixture();
        let items = build_timeline(&symptoms, &remedies, &TimelineFilter::default());
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Cough", "Bryonia", "Arnica montana", "Headache"]);
        assert_eq!(items[2].details, "Potency: 30C - for the headache");
        assert_eq!(items[3].details, "Severity: Moderate - after coffee");
        assert_eq!(items[0].details, "Severity: Mild");
    }

    #[test]
    fn test_search_matches_name_or_notes() {
        let (symptoms, remedies) = fixture();
        let filter = TimelineFilter {
            search: Some("HEADACHE".into()),
            ..Default::default()
        };
        let items = build_timeline(&symptoms, &remedies, &filter);
        assert_eq!(items.len(), 2);

        let filter = TimelineFilter {
            kind: KindFilter::Remedies,
            search: Some("headache".into()),
            ..Default::default()
        };
        let items = build_timeline(&symptoms, &remedies, &filter);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ItemKind::Remedy);
    }

    #[test]
    fn test_range_filter_uses_taken_day() {
        let (symptoms, remedies) = fixture();
        let filter = TimelineFilter {
            range: Some(DateRange::day(date(3, 2))),
            ..Default::default()
        };
        let items = build_timeline(&symptoms, &remedies, &filter);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Bryonia");
    }

    #[test]
    fn test_page_is_cumulative() {
        let items: Vec<u32> = (0..45).collect();
        let (shown, more) = page(&items, 0, 20);
        assert_eq!((shown.len(), more), (20, true));
        let (shown, more) = page(&items, 1, 20);
        assert_eq!((shown.len(), more), (40, true));
        let (shown, more) = page(&items, 2, 20);
        assert_eq!((shown.len(), more), (45, false));
        let (shown, more) = page(&[] as &[u32], 0, 20);
        assert_eq!((shown.len(), more), (0, false));
    }

    #[test]
    fn test_daily_views() {
        let (symptoms, remedies) = fixture();
        assert_eq!(symptoms_on(&symptoms, date(3, 3)).len(), 1);
        let on_fifth: Vec<&str> = remedies_on(&remedies, date(3, 5))
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(on_fifth, vec!["Bryonia"]);
        let on_first = remedies_on(&remedies, date(3, 1));
        assert_eq!(on_first.len(), 1);
    }

    #[test]
    fn test_upcoming_recurring() {
        let (_, remedies) = fixture();
        assert_eq!(upcoming_recurring(&remedies, date(3, 5)).len(), 1);
        assert!(upcoming_recurring(&remedies, date(3, 2)).is_empty());
        assert!(upcoming_recurring(&remedies, date(3, 10)).is_empty());
    }

    #[test]
    fn test_active_remedies_at() {
        let (_, remedies) = fixture();
        // Bryonia 6C covers one day, Arnica 30C one week
        let active: Vec<&str> = active_remedies_at(&remedies, at(3, 3, 10))
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(active, vec!["Arnica montana"]);
    }

    #[test]
    fn test_date_range_presets() {
        let today = date(3, 15);
        assert_eq!(DateRange::yesterday(today), DateRange::day(date(3, 14)));
        assert_eq!(DateRange::last_days(today, 7), DateRange::new(date(3, 9), today));
        assert_eq!(DateRange::this_month(today).start, date(3, 1));
        assert_eq!(DateRange::around(today), DateRange::new(date(3, 12), date(3, 18)));
        assert_eq!(
            DateRange::new(date(3, 18), date(3, 12)),
            DateRange::new(date(3, 12), date(3, 18))
        );
        assert_eq!(
            DateRange::around(today).shifted(-7),
            DateRange::new(date(3, 5), date(3, 11))
        );
        assert_eq!(DateRange::around(today).days().count(), 7);
        assert_eq!(DateRange::around(today).to_string(), "Mar 12, 2024 - Mar 18, 2024");
    }
}
