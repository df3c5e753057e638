//! Wait-and-watch windows: when a remedy's effect should be judged.
//!
//! The due date is always computed with calendar arithmetic (a month lands on
//! the same day of the next month, clamped to the month's last day). Going the
//! other way, the elapsed calendar components are folded into hours with the
//! fixed factors from [`crate::schedule::duration`] and a display unit is
//! picked from that total, so the two directions are close but not exact
//! inverses.

use crate::schedule::duration::{
    self, DurationUnit, HOURS_PER_DAY, HOURS_PER_MONTH, HOURS_PER_WEEK,
};
use crate::schedule::potency::Potency;
use chrono::{Datelike, Days, Duration, Months, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub fn apply_potency_default(potency: Potency) -> (i64, DurationUnit) {
    potency.default_wait_period()
}

/// `taken_at` plus `value` calendar units. Values below 1 are clamped first.
///
/// Falls back to `taken_at` when the result leaves chrono's representable range.
pub fn compute_due_date(
    taken_at: NaiveDateTime,
    value: i64,
    unit: DurationUnit,
) -> NaiveDateTime {
    let value = duration::clamp(value, unit);
    let due = match unit {
        DurationUnit::Hour => {
            Duration::try_hours(value).and_then(|d| taken_at.checked_add_signed(d))
        }
        DurationUnit::Day => taken_at.checked_add_days(Days::new(value as u64)),
        DurationUnit::Week => taken_at.checked_add_days(Days::new(value as u64 * 7)),
        DurationUnit::Month => taken_at.checked_add_months(Months::new(value as u32)),
    };
    due.unwrap_or_else(|| {
        tracing::warn!(%taken_at, value, ?unit, "due date out of range, keeping taken time");
        taken_at
    })
}

/// Calendar components between two instants, largest unit first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Elapsed {
    pub months: i64,
    pub weeks: i64,
    pub days: i64,
    pub hours: i64,
}

impl Elapsed {
    pub fn between(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        if to <= from {
            return Self::default();
        }

        let span = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
        let mut months = span.max(0) as u32;
        while months > 0
            && from
                .checked_add_months(Months::new(months))
                .map_or(true, |anchor| anchor > to)
        {
            months -= 1;
        }

        let anchor = from.checked_add_months(Months::new(months)).unwrap_or(from);
        let rest = to - anchor;
        let weeks = rest.num_weeks();
        Self {
            months: months as i64,
            weeks,
            days: rest.num_days() - weeks * 7,
            hours: rest.num_hours() - rest.num_days() * 24,
        }
    }

    pub fn total_hours(&self) -> i64 {
        self.hours
            + self.days * HOURS_PER_DAY
            + self.weeks * HOURS_PER_WEEK
            + self.months * HOURS_PER_MONTH
    }
}

pub fn derive_duration_from_due_date(
    taken_at: NaiveDateTime,
    due_at: NaiveDateTime,
) -> (i64, DurationUnit) {
    let total = Elapsed::between(taken_at, due_at).total_hours();
    let (value, unit) = duration::select_best_unit(total);
    (duration::clamp(value, unit), unit)
}

/// A single edit to a wait window. Each edit names the field that wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEdit {
    TakenAt(NaiveDateTime),
    Value(i64),
    Unit(DurationUnit),
    Duration { value: i64, unit: DurationUnit },
    Potency(Potency),
    DueAt(NaiveDateTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitWindow {
    pub taken_at: NaiveDateTime,
    pub value: i64,
    pub unit: DurationUnit,
    pub due_at: NaiveDateTime,
}

impl WaitWindow {
    pub fn new(taken_at: NaiveDateTime, value: i64, unit: DurationUnit) -> Self {
        let value = duration::clamp(value, unit);
        Self {
            taken_at,
            value,
            unit,
            due_at: compute_due_date(taken_at, value, unit),
        }
    }

    pub fn for_potency(taken_at: NaiveDateTime, potency: Potency) -> Self {
        let (value, unit) = apply_potency_default(potency);
        Self::new(taken_at, value, unit)
    }

    /// Rebuild the window around an existing due date, e.g. one read from storage.
    pub fn from_due_date(taken_at: NaiveDateTime, due_at: NaiveDateTime) -> Self {
        let due_at = due_at.max(taken_at);
        let (value, unit) = derive_duration_from_due_date(taken_at, due_at);
        Self {
            taken_at,
            value,
            unit,
            due_at,
        }
    }

    pub fn apply(self, edit: WindowEdit) -> Self {
        match edit {
            WindowEdit::TakenAt(taken_at) => Self::new(taken_at, self.value, self.unit),
            WindowEdit::Value(value) => Self::new(self.taken_at, value, self.unit),
            WindowEdit::Unit(unit) => {
                let value = duration::convert_clamped(self.value, self.unit, unit);
                Self::new(self.taken_at, value, unit)
            }
            WindowEdit::Duration { value, unit } => Self::new(self.taken_at, value, unit),
            WindowEdit::Potency(potency) => Self::for_potency(self.taken_at, potency),
            WindowEdit::DueAt(due_at) => Self::from_due_date(self.taken_at, due_at),
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.taken_at <= at && at <= self.due_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_30c_default_lands_a_week_later() {
        let taken = at(2024, 1, 1, 10, 0);
        let (value, unit) = apply_potency_default(Potency::C30);
        assert_eq!((value, unit), (1, DurationUnit::Week));
        assert_eq!(compute_due_date(taken, value, unit), at(2024, 1, 8, 10, 0));
    }

    #[test]
    fn test_month_addition_clamps_to_month_end() {
        let taken = at(2024, 1, 31, 9, 0);
        assert_eq!(compute_due_date(taken, 1, DurationUnit::Month), at(2024, 2, 29, 9, 0));
        assert_eq!(
            compute_due_date(at(2023, 1, 31, 9, 0), 1, DurationUnit::Month),
            at(2023, 2, 28, 9, 0)
        );
    }

    #[test]
    fn test_hour_and_day_units_roll_over_midnight() {
        let taken = at(2024, 3, 30, 22, 0);
        assert_eq!(compute_due_date(taken, 5, DurationUnit::Hour), at(2024, 3, 31, 3, 0));
        assert_eq!(compute_due_date(taken, 3, DurationUnit::Day), at(2024, 4, 2, 22, 0));
    }

    #[test]
    fn test_out_of_range_values_are_clamped_before_adding() {
        let taken = at(2024, 1, 1, 0, 0);
        assert_eq!(compute_due_date(taken, 0, DurationUnit::Day), at(2024, 1, 2, 0, 0));
        assert_eq!(compute_due_date(taken, 500, DurationUnit::Hour), at(2024, 1, 4, 0, 0));
    }

    #[test]
    fn test_derive_48_hours_stays_in_hours() {
        let derived = derive_duration_from_due_date(at(2024, 1, 1, 0, 0), at(2024, 1, 3, 0, 0));
        assert_eq!(derived, (48, DurationUnit::Hour));
    }

    #[test]
    fn test_derive_is_approximate_inverse() {
        let taken = at(2024, 1, 1, 10, 0);
        let due = compute_due_date(taken, 1, DurationUnit::Week);
        assert_eq!(derive_duration_from_due_date(taken, due), (7, DurationUnit::Day));

        let due = compute_due_date(taken, 2, DurationUnit::Month);
        assert_eq!(derive_duration_from_due_date(taken, due), (60, DurationUnit::Day));
    }

    #[test]
    fn test_derive_long_windows_clamp() {
        let derived = derive_duration_from_due_date(at(2020, 1, 1, 0, 0), at(2024, 1, 1, 0, 0));
        assert_eq!(derived, (24, DurationUnit::Month));
    }

    #[test]
    fn test_derive_backwards_due_date() {
        let derived = derive_duration_from_due_date(at(2024, 1, 3, 0, 0), at(2024, 1, 1, 0, 0));
        assert_eq!(derived, (1, DurationUnit::Hour));
    }

    #[test]
    fn test_elapsed_components() {
        let elapsed = Elapsed::between(at(2024, 1, 15, 8, 0), at(2024, 3, 27, 11, 0));
        assert_eq!(
            elapsed,
            Elapsed {
                months: 2,
                weeks: 1,
                days: 5,
                hours: 3
            }
        );
    }

    #[test]
    fn test_elapsed_from_month_end() {
        // Jan 31 + 1 month is Feb 29, which is still before Mar 1
        let elapsed = Elapsed::between(at(2024, 1, 31, 0, 0), at(2024, 3, 1, 0, 0));
        assert_eq!(elapsed.months, 1);
        assert_eq!(elapsed.days, 1);
    }

    #[test]
    fn test_due_edit_is_not_overwritten() {
        let window = WaitWindow::for_potency(at(2024, 1, 1, 10, 0), Potency::C30);
        let edited = window.apply(WindowEdit::DueAt(at(2024, 1, 3, 16, 30)));
        assert_eq!(edited.due_at, at(2024, 1, 3, 16, 30));
        assert_eq!((edited.value, edited.unit), (2, DurationUnit::Day));
    }

    #[test]
    fn test_due_edit_before_taken_is_raised() {
        let window = WaitWindow::for_potency(at(2024, 1, 5, 10, 0), Potency::C6);
        let edited = window.apply(WindowEdit::DueAt(at(2024, 1, 1, 0, 0)));
        assert_eq!(edited.due_at, edited.taken_at);
        assert_eq!((edited.value, edited.unit), (1, DurationUnit::Hour));
    }

    #[test]
    fn test_unit_edit_converts_value() {
        let window = WaitWindow::new(at(2024, 1, 1, 0, 0), 2, DurationUnit::Week);
        let edited = window.apply(WindowEdit::Unit(DurationUnit::Day));
        assert_eq!((edited.value, edited.unit), (14, DurationUnit::Day));
        assert_eq!(edited.due_at, at(2024, 1, 15, 0, 0));

        let edited = edited.apply(WindowEdit::Unit(DurationUnit::Hour));
        assert_eq!((edited.value, edited.unit), (72, DurationUnit::Hour));
    }

    #[test]
    fn test_taken_edit_moves_due_date() {
        let window = WaitWindow::new(at(2024, 1, 1, 0, 0), 3, DurationUnit::Day);
        let edited = window.apply(WindowEdit::TakenAt(at(2024, 2, 1, 6, 0)));
        assert_eq!(edited.due_at, at(2024, 2, 4, 6, 0));
        assert_eq!(edited.value, 3);
    }

    #[test]
    fn test_potency_edit_resets_duration() {
        let window = WaitWindow::new(at(2024, 1, 1, 0, 0), 3, DurationUnit::Day);
        let edited = window.apply(WindowEdit::Potency(Potency::M1));
        assert_eq!((edited.value, edited.unit), (2, DurationUnit::Month));
        assert_eq!(edited.due_at, at(2024, 3, 1, 0, 0));
    }

    #[test]
    fn test_value_edit_clamps() {
        let window = WaitWindow::new(at(2024, 1, 1, 0, 0), 1, DurationUnit::Month);
        assert_eq!(window.apply(WindowEdit::Value(99)).value, 24);
        assert_eq!(window.apply(WindowEdit::Value(-3)).value, 1);
    }
}
