use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

pub const HOURS_PER_DAY: i64 = 24;
pub const HOURS_PER_WEEK: i64 = 7 * HOURS_PER_DAY;
pub const HOURS_PER_MONTH: i64 = 30 * HOURS_PER_DAY;

/// Coarse unit for a wait-and-watch duration.
///
/// The hour factors are fixed approximations (a month is always 30 days) and
/// only drive display-unit switching; due dates use calendar arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Hour,
    Day,
    Week,
    Month,
}

impl DurationUnit {
    pub const ALL: [DurationUnit; 4] = [Self::Hour, Self::Day, Self::Week, Self::Month];

    pub fn hours(self) -> i64 {
        match self {
            Self::Hour => 1,
            Self::Day => HOURS_PER_DAY,
            Self::Week => HOURS_PER_WEEK,
            Self::Month => HOURS_PER_MONTH,
        }
    }

    /// Values a user may pick for this unit.
    pub fn allowed_range(self) -> RangeInclusive<i64> {
        match self {
            Self::Hour => 1..=72,
            Self::Day => 1..=180,
            Self::Week => 1..=52,
            Self::Month => 1..=24,
        }
    }

    pub fn label(self, value: i64) -> &'static str {
        match (self, value == 1) {
            (Self::Hour, true) => "hour",
            (Self::Hour, false) => "hours",
            (Self::Day, true) => "day",
            (Self::Day, false) => "days",
            (Self::Week, true) => "week",
            (Self::Week, false) => "weeks",
            (Self::Month, true) => "month",
            (Self::Month, false) => "months",
        }
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label(2))
    }
}

impl FromStr for DurationUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h" | "hour" | "hours" => Ok(Self::Hour),
            "d" | "day" | "days" => Ok(Self::Day),
            "w" | "week" | "weeks" | "weekofmonth" | "weekofyear" => Ok(Self::Week),
            "m" | "month" | "months" => Ok(Self::Month),
            other => Err(format!(
                "Unknown duration unit '{}', expected hours, days, weeks or months",
                other
            )),
        }
    }
}

pub fn to_hours(value: i64, unit: DurationUnit) -> i64 {
    value.saturating_mul(unit.hours())
}

/// Floor division: the remainder is dropped.
pub fn from_hours(hours: i64, unit: DurationUnit) -> i64 {
    hours.div_euclid(unit.hours())
}

pub fn convert(value: i64, from: DurationUnit, to: DurationUnit) -> i64 {
    from_hours(to_hours(value, from), to)
}

pub fn clamp(value: i64, unit: DurationUnit) -> i64 {
    let range = unit.allowed_range();
    value.clamp(*range.start(), *range.end())
}

/// Re-express a value in another unit, keeping it inside the new unit's range.
pub fn convert_clamped(value: i64, from: DurationUnit, to: DurationUnit) -> i64 {
    clamp(convert(value, from, to), to)
}

/// Pick the coarsest unit that keeps `total_hours` readable. Never yields 0.
pub fn select_best_unit(total_hours: i64) -> (i64, DurationUnit) {
    let unit = if total_hours <= 48 {
        DurationUnit::Hour
    } else if total_hours <= 180 * HOURS_PER_DAY {
        DurationUnit::Day
    } else if total_hours <= 52 * HOURS_PER_WEEK {
        DurationUnit::Week
    } else {
        DurationUnit::Month
    };
    ((total_hours / unit.hours()).max(1), unit)
}

pub fn format_duration(value: i64, unit: DurationUnit) -> String {
    format!("{} {}", value, unit.label(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_multiples_round_trip() {
        for unit in DurationUnit::ALL {
            for n in [0, 1, 5, 17] {
                let hours = n * unit.hours();
                assert_eq!(to_hours(from_hours(hours, unit), unit), hours);
            }
        }
    }

    #[test]
    fn test_convert_floors() {
        assert_eq!(convert(36, DurationUnit::Hour, DurationUnit::Day), 1);
        assert_eq!(convert(2, DurationUnit::Week, DurationUnit::Day), 14);
        assert_eq!(convert(1, DurationUnit::Month, DurationUnit::Week), 4);
        assert_eq!(convert(3, DurationUnit::Day, DurationUnit::Week), 0);
    }

    #[test]
    fn test_convert_clamped_stays_in_range() {
        let inputs = [i64::MIN, -500, -1, 0, 1, 3, 71, 1_000, 99_999, i64::MAX];
        for from in DurationUnit::ALL {
            for to in DurationUnit::ALL {
                for value in inputs {
                    let converted = convert_clamped(value, from, to);
                    assert!(
                        to.allowed_range().contains(&converted),
                        "{} {:?} -> {:?} gave {}",
                        value,
                        from,
                        to,
                        converted
                    );
                }
            }
        }
    }

    #[test]
    fn test_unit_switch_keeps_duration() {
        // 3 days shown as hours, then back to days
        let hours = convert_clamped(3, DurationUnit::Day, DurationUnit::Hour);
        assert_eq!(hours, 72);
        assert_eq!(convert_clamped(hours, DurationUnit::Hour, DurationUnit::Day), 3);

        // 3 days has no whole week, the lower bound applies
        assert_eq!(convert_clamped(3, DurationUnit::Day, DurationUnit::Week), 1);
    }

    #[test]
    fn test_select_best_unit_boundaries() {
        assert_eq!(select_best_unit(48), (48, DurationUnit::Hour));
        assert_eq!(select_best_unit(49), (2, DurationUnit::Day));
        assert_eq!(select_best_unit(180 * 24), (180, DurationUnit::Day));
        assert_eq!(select_best_unit(180 * 24 + 1), (25, DurationUnit::Week));
        assert_eq!(select_best_unit(52 * 168), (52, DurationUnit::Week));
        assert_eq!(select_best_unit(52 * 168 + 1), (12, DurationUnit::Month));
    }

    #[test]
    fn test_select_best_unit_never_zero() {
        for hours in [i64::MIN, -10, 0, 1, 47, 48, 50, 5_000, 9_000, 100_000] {
            let (value, unit) = select_best_unit(hours);
            assert!(value >= 1);
            if hours >= unit.hours() {
                assert!(value * unit.hours() <= hours);
            }
        }
    }

    #[test]
    fn test_parse_unit_synonyms() {
        assert_eq!("weekOfMonth".parse::<DurationUnit>(), Ok(DurationUnit::Week));
        assert_eq!("Days".parse::<DurationUnit>(), Ok(DurationUnit::Day));
        assert!("fortnight".parse::<DurationUnit>().is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(1, DurationUnit::Week), "1 week");
        assert_eq!(format_duration(12, DurationUnit::Hour), "12 hours");
    }
}
